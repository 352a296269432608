//! The module contains the `Wallet` struct and its persistence model.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

/// A wallet.
///
/// A wallet is a representation of a real wallet, a bank account or anything
/// else where money is kept. Its balance is mutated exclusively by ledger
/// operations; the store itself never enforces a sign policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Stable identifier for this wallet.
    ///
    /// Generated once and persisted, so the wallet can be renamed without
    /// breaking transaction references.
    pub id: Uuid,
    pub name: String,
    pub balance_minor: i64,
    pub created_at: DateTime<Utc>,
}

impl Wallet {
    pub fn new(name: String, balance_minor: i64, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            balance_minor,
            created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub balance_minor: i64,
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

impl From<&Wallet> for ActiveModel {
    fn from(value: &Wallet) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            name: ActiveValue::Set(value.name.clone()),
            balance_minor: ActiveValue::Set(value.balance_minor),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for Wallet {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "wallet")?,
            name: model.name,
            balance_minor: model.balance_minor,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn round_trips_through_model() {
        let wallet = Wallet::new(
            "Cash".to_string(),
            1040,
            Utc.timestamp_opt(0, 0).unwrap(),
        );
        let model = Model {
            id: wallet.id.to_string(),
            name: wallet.name.clone(),
            balance_minor: wallet.balance_minor,
            created_at: wallet.created_at,
        };

        assert_eq!(Wallet::try_from(model).unwrap(), wallet);
    }

    #[test]
    fn rejects_malformed_id() {
        let model = Model {
            id: "not-a-uuid".to_string(),
            name: "Cash".to_string(),
            balance_minor: 0,
            created_at: Utc.timestamp_opt(0, 0).unwrap(),
        };

        assert_eq!(
            Wallet::try_from(model).unwrap_err(),
            EngineError::InvalidId("invalid wallet id".to_string())
        );
    }
}
