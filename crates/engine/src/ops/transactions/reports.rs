use std::collections::HashMap;

use chrono::Datelike;
use serde::Serialize;
use uuid::Uuid;

use sea_orm::{Condition, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{EntryKind, ResultEngine, categories, transactions, util::parse_uuid};

use super::super::{Engine, with_tx};
use super::DateRange;

/// Aggregated amount for one category within a reporting period.
///
/// `category_id`/`category_name` are `None` for the bucket of transactions
/// with no category assigned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub total_minor: i64,
}

/// Income and expense totals for one bucket of a time series.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BucketTotals {
    pub income_minor: i64,
    pub expense_minor: i64,
}

impl BucketTotals {
    fn absorb(&mut self, kind: EntryKind, amount_minor: i64) {
        match kind {
            EntryKind::Income => self.income_minor += amount_minor,
            EntryKind::Expense => self.expense_minor += amount_minor,
        }
    }
}

fn in_range(filter: &DateRange) -> Condition {
    Condition::all()
        .add(transactions::Column::OccurredAt.gte(filter.from()))
        .add(transactions::Column::OccurredAt.lt(filter.to()))
}

impl Engine {
    /// Per-category totals for `kind` within `range`, largest first.
    ///
    /// Transactions without a category are folded into a trailing unnamed
    /// bucket when present.
    pub async fn category_totals(
        &self,
        kind: EntryKind,
        range: &DateRange,
    ) -> ResultEngine<Vec<CategoryTotal>> {
        with_tx!(self, |db_tx| {
            let rows = transactions::Entity::find()
                .filter(transactions::Column::Kind.eq(kind.as_str()))
                .filter(in_range(range))
                .find_also_related(categories::Entity)
                .all(&db_tx)
                .await?;

            let mut totals: HashMap<Option<String>, (Option<String>, i64)> = HashMap::new();
            for (tx_model, category_model) in rows {
                let entry = totals
                    .entry(tx_model.category_id.clone())
                    .or_insert_with(|| (category_model.map(|c| c.name), 0));
                entry.1 += tx_model.amount_minor;
            }

            let mut out = Vec::with_capacity(totals.len());
            for (category_id, (category_name, total_minor)) in totals {
                let category_id = category_id
                    .map(|id| parse_uuid(&id, "category"))
                    .transpose()?;
                out.push(CategoryTotal {
                    category_id,
                    category_name,
                    total_minor,
                });
            }
            // Largest first; uncategorized last among equals.
            out.sort_by(|a, b| {
                b.total_minor
                    .cmp(&a.total_minor)
                    .then_with(|| a.category_name.is_none().cmp(&b.category_name.is_none()))
                    .then_with(|| a.category_name.cmp(&b.category_name))
            });
            Ok(out)
        })
    }

    /// Daily income/expense totals for the week in `range`.
    ///
    /// `range` must come from [`DateRange::week_of`]; index 0 is Monday.
    pub async fn weekly_series(&self, range: &DateRange) -> ResultEngine<[BucketTotals; 7]> {
        with_tx!(self, |db_tx| {
            let rows = transactions::Entity::find()
                .filter(in_range(range))
                .order_by_asc(transactions::Column::OccurredAt)
                .all(&db_tx)
                .await?;

            let mut buckets = [BucketTotals::default(); 7];
            for tx_model in rows {
                let kind = EntryKind::try_from(tx_model.kind.as_str())?;
                let day = tx_model.occurred_at.weekday().num_days_from_monday() as usize;
                buckets[day].absorb(kind, tx_model.amount_minor);
            }
            Ok(buckets)
        })
    }

    /// Monthly income/expense totals for a calendar year; index 0 is January.
    pub async fn monthly_series(&self, year: i32) -> ResultEngine<[BucketTotals; 12]> {
        let range = DateRange::year(year)?;
        with_tx!(self, |db_tx| {
            let rows = transactions::Entity::find()
                .filter(in_range(&range))
                .order_by_asc(transactions::Column::OccurredAt)
                .all(&db_tx)
                .await?;

            let mut buckets = [BucketTotals::default(); 12];
            for tx_model in rows {
                let kind = EntryKind::try_from(tx_model.kind.as_str())?;
                let month = tx_model.occurred_at.month0() as usize;
                buckets[month].absorb(kind, tx_model.amount_minor);
            }
            Ok(buckets)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_absorbs_by_kind() {
        let mut bucket = BucketTotals::default();
        bucket.absorb(EntryKind::Income, 1_000);
        bucket.absorb(EntryKind::Expense, 250);
        bucket.absorb(EntryKind::Expense, 250);
        assert_eq!(bucket.income_minor, 1_000);
        assert_eq!(bucket.expense_minor, 500);
    }
}
