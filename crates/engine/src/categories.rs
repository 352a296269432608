//! Category primitives.
//!
//! A `Category` is a flat classificatory tag referenced by transactions. It
//! has no balance effect and shares the [`EntryKind`] discriminator with
//! transactions.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, EntryKind, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub kind: EntryKind,
    pub created_at: DateTime<Utc>,
}

/// Seed set installed at first initialization. Re-running the seed must not
/// duplicate entries.
pub const DEFAULT_CATEGORIES: &[(&str, EntryKind)] = &[
    ("Salary", EntryKind::Income),
    ("Bonus", EntryKind::Income),
    ("Investment", EntryKind::Income),
    ("Sales", EntryKind::Income),
    ("Gift", EntryKind::Income),
    ("Other", EntryKind::Income),
    ("Food & Drink", EntryKind::Expense),
    ("Transport", EntryKind::Expense),
    ("Shopping", EntryKind::Expense),
    ("Bills", EntryKind::Expense),
    ("Entertainment", EntryKind::Expense),
    ("Health", EntryKind::Expense),
    ("Education", EntryKind::Expense),
    ("Donation", EntryKind::Expense),
    ("Other", EntryKind::Expense),
];

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub name_key: String,
    pub kind: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Category {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "category")?,
            name: model.name,
            kind: EntryKind::try_from(model.kind.as_str())?,
            created_at: model.created_at,
        })
    }
}

impl Category {
    pub(crate) fn to_active_model(&self, name_key: String) -> ActiveModel {
        ActiveModel {
            id: ActiveValue::Set(self.id.to_string()),
            name: ActiveValue::Set(self.name.clone()),
            name_key: ActiveValue::Set(name_key),
            kind: ActiveValue::Set(self.kind.as_str().to_string()),
            created_at: ActiveValue::Set(self.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_set_has_no_duplicate_pairs() {
        let mut seen = std::collections::HashSet::new();
        for (name, kind) in DEFAULT_CATEGORIES {
            assert!(seen.insert((*name, kind.as_str())));
        }
    }

    #[test]
    fn model_rejects_unknown_kind() {
        let model = Model {
            id: Uuid::new_v4().to_string(),
            name: "Transfers".to_string(),
            name_key: "transfers".to_string(),
            kind: "transfer".to_string(),
            created_at: Utc::now(),
        };
        assert!(Category::try_from(model).is_err());
    }
}
