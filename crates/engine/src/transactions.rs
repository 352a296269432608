//! Transaction primitives.
//!
//! A `Transaction` is a single income or expense event affecting exactly one
//! wallet. Its signed effect (`+amount` for income, `-amount` for expense) is
//! what ledger operations fold into wallet balances.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

/// Income/expense discriminator shared by categories and transactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Income,
    Expense,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Signed balance effect of an amount under this kind.
    #[must_use]
    pub fn signed_effect(self, amount_minor: i64) -> i64 {
        match self {
            Self::Income => amount_minor,
            Self::Expense => -amount_minor,
        }
    }
}

impl TryFrom<&str> for EntryKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::InvalidName(format!(
                "invalid entry kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub name: String,
    pub amount_minor: i64,
    pub kind: EntryKind,
    pub category_id: Option<Uuid>,
    pub wallet_id: Uuid,
    /// When the event happened, user-editable.
    pub occurred_at: DateTime<Utc>,
    /// When the record was created, set once.
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        amount_minor: i64,
        kind: EntryKind,
        category_id: Option<Uuid>,
        wallet_id: Uuid,
        occurred_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            amount_minor,
            kind,
            category_id,
            wallet_id,
            occurred_at,
            created_at,
        })
    }

    /// Signed balance effect of this transaction on its wallet.
    #[must_use]
    pub fn signed_effect(&self) -> i64 {
        self.kind.signed_effect(self.amount_minor)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub amount_minor: i64,
    pub kind: String,
    pub category_id: Option<String>,
    pub wallet_id: String,
    pub occurred_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::WalletId",
        to = "super::wallets::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Wallets,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Categories,
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallets.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            name: ActiveValue::Set(tx.name.clone()),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            category_id: ActiveValue::Set(tx.category_id.map(|id| id.to_string())),
            wallet_id: ActiveValue::Set(tx.wallet_id.to_string()),
            occurred_at: ActiveValue::Set(tx.occurred_at),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            name: model.name,
            amount_minor: model.amount_minor,
            kind: EntryKind::try_from(model.kind.as_str())?,
            category_id: model
                .category_id
                .as_deref()
                .map(|id| parse_uuid(id, "category"))
                .transpose()?,
            wallet_id: parse_uuid(&model.wallet_id, "wallet")?,
            occurred_at: model.occurred_at,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn signed_effect_by_kind() {
        assert_eq!(EntryKind::Income.signed_effect(250), 250);
        assert_eq!(EntryKind::Expense.signed_effect(250), -250);
    }

    #[test]
    fn rejects_non_positive_amount() {
        for amount in [0, -10] {
            let err = Transaction::new(
                "Lunch".to_string(),
                amount,
                EntryKind::Expense,
                None,
                Uuid::new_v4(),
                Utc.timestamp_opt(0, 0).unwrap(),
                Utc.timestamp_opt(0, 0).unwrap(),
            )
            .unwrap_err();
            assert_eq!(
                err,
                EngineError::InvalidAmount("amount_minor must be > 0".to_string())
            );
        }
    }

    #[test]
    fn model_round_trip_keeps_optional_category() {
        let tx = Transaction::new(
            "Groceries".to_string(),
            1500,
            EntryKind::Expense,
            None,
            Uuid::new_v4(),
            Utc.timestamp_opt(10, 0).unwrap(),
            Utc.timestamp_opt(20, 0).unwrap(),
        )
        .unwrap();

        let active = ActiveModel::from(&tx);
        let model = Model {
            id: match active.id {
                ActiveValue::Set(v) => v,
                _ => unreachable!(),
            },
            name: tx.name.clone(),
            amount_minor: tx.amount_minor,
            kind: tx.kind.as_str().to_string(),
            category_id: None,
            wallet_id: tx.wallet_id.to_string(),
            occurred_at: tx.occurred_at,
            created_at: tx.created_at,
        };

        assert_eq!(Transaction::try_from(model).unwrap(), tx);
    }
}
