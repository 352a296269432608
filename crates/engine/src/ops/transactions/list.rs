use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use sea_orm::{
    ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, Statement, TransactionTrait, prelude::*,
};

use crate::{
    EngineError, EntryKind, ResultEngine, Transaction, categories, transactions,
};

use super::super::{Engine, with_tx};

/// Half-open UTC date range `[from, to)` used for period filters.
///
/// Replaces ad-hoc string-built date predicates with an explicit value
/// object that queries bind as parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

impl DateRange {
    /// A calendar month. `month` is 1-based.
    pub fn month(year: i32, month: u32) -> ResultEngine<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| EngineError::InvalidAmount(format!("invalid month: {year}-{month}")))?;
        let end = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(|| EngineError::InvalidAmount(format!("invalid month: {year}-{month}")))?;
        Ok(Self::from_dates(start, end))
    }

    /// A calendar year.
    pub fn year(year: i32) -> ResultEngine<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| EngineError::InvalidAmount(format!("invalid year: {year}")))?;
        let end = NaiveDate::from_ymd_opt(year + 1, 1, 1)
            .ok_or_else(|| EngineError::InvalidAmount(format!("invalid year: {year}")))?;
        Ok(Self::from_dates(start, end))
    }

    /// The Monday-to-Sunday week containing `day`.
    pub fn week_of(day: NaiveDate) -> Self {
        let monday = day - Duration::days(i64::from(day.weekday().num_days_from_monday()));
        Self::from_dates(monday, monday + Duration::days(7))
    }

    /// The calendar month containing `now`.
    pub fn current_month(now: DateTime<Utc>) -> Self {
        // Construction from a valid date cannot fail.
        Self::month(now.year(), now.month()).unwrap_or(Self {
            from: now,
            to: now,
        })
    }

    pub fn from(&self) -> DateTime<Utc> {
        self.from
    }

    pub fn to(&self) -> DateTime<Utc> {
        self.to
    }

    fn from_dates(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            from: Utc.from_utc_datetime(&start.and_hms_opt(0, 0, 0).unwrap_or_default()),
            to: Utc.from_utc_datetime(&end.and_hms_opt(0, 0, 0).unwrap_or_default()),
        }
    }
}

/// Filters for listing transactions.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    /// If present, only transactions of this kind are returned.
    pub kind: Option<EntryKind>,
    /// If present, only transactions with `occurred_at` in the range.
    pub range: Option<DateRange>,
    /// If present, at most this many of the most recent transactions.
    pub limit: Option<u64>,
}

trait ApplyTxFilters: QueryFilter + Sized {
    fn apply_tx_filters(self, filter: &TransactionListFilter) -> Self;
}

impl<T> ApplyTxFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_tx_filters(mut self, filter: &TransactionListFilter) -> Self {
        if let Some(kind) = filter.kind {
            self = self.filter(transactions::Column::Kind.eq(kind.as_str()));
        }
        if let Some(range) = filter.range {
            self = self
                .filter(transactions::Column::OccurredAt.gte(range.from()))
                .filter(transactions::Column::OccurredAt.lt(range.to()));
        }
        self
    }
}

impl Engine {
    /// Lists transactions in creation order, newest first.
    pub async fn list_transactions(
        &self,
        filter: &TransactionListFilter,
    ) -> ResultEngine<Vec<Transaction>> {
        with_tx!(self, |db_tx| {
            let mut query = transactions::Entity::find()
                .order_by_desc(transactions::Column::CreatedAt)
                .order_by_desc(transactions::Column::Id)
                .apply_tx_filters(filter);
            if let Some(limit) = filter.limit {
                query = query.limit(limit);
            }

            let models = query.all(&db_tx).await?;
            models.into_iter().map(Transaction::try_from).collect()
        })
    }

    /// Fetch a single transaction joined with its category name.
    pub async fn transaction_with_category(
        &self,
        transaction_id: Uuid,
    ) -> ResultEngine<(Transaction, Option<String>)> {
        with_tx!(self, |db_tx| {
            let row = transactions::Entity::find_by_id(transaction_id.to_string())
                .find_also_related(categories::Entity)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;

            let (tx_model, category_model) = row;
            let tx = Transaction::try_from(tx_model)?;
            Ok((tx, category_model.map(|c| c.name)))
        })
    }

    /// Sum of amounts for `kind` within `range`, 0 when no rows match.
    pub async fn sum_for_range(&self, kind: EntryKind, range: &DateRange) -> ResultEngine<i64> {
        with_tx!(self, |db_tx| {
            let stmt = Statement::from_sql_and_values(
                db_tx.get_database_backend(),
                "SELECT COALESCE(SUM(amount_minor), 0) AS sum \
                 FROM transactions \
                 WHERE kind = ? AND occurred_at >= ? AND occurred_at < ?",
                vec![kind.as_str().into(), range.from().into(), range.to().into()],
            );
            let row = db_tx.query_one(stmt).await?;
            Ok(row.and_then(|r| r.try_get("", "sum").ok()).unwrap_or(0))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_range_is_half_open() {
        let range = DateRange::month(2026, 8).unwrap();
        assert_eq!(range.from().to_rfc3339(), "2026-08-01T00:00:00+00:00");
        assert_eq!(range.to().to_rfc3339(), "2026-09-01T00:00:00+00:00");
    }

    #[test]
    fn december_rolls_into_next_year() {
        let range = DateRange::month(2025, 12).unwrap();
        assert_eq!(range.to().to_rfc3339(), "2026-01-01T00:00:00+00:00");
    }

    #[test]
    fn invalid_month_is_rejected() {
        assert!(DateRange::month(2026, 13).is_err());
        assert!(DateRange::month(2026, 0).is_err());
    }

    #[test]
    fn week_of_starts_on_monday() {
        // 2026-08-28 is a Friday.
        let day = NaiveDate::from_ymd_opt(2026, 8, 28).unwrap();
        let range = DateRange::week_of(day);
        assert_eq!(range.from().to_rfc3339(), "2026-08-24T00:00:00+00:00");
        assert_eq!(range.to().to_rfc3339(), "2026-08-31T00:00:00+00:00");
    }
}
