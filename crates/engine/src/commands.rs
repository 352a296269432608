//! Command structs for ledger write operations.
//!
//! These types group parameters for add/update, keeping call sites readable
//! and avoiding long argument lists. Operations return `Result` values;
//! there are no completion callbacks.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::EntryKind;

/// Create a transaction against a wallet.
#[derive(Clone, Debug)]
pub struct AddTransactionCmd {
    pub name: String,
    pub amount_minor: i64,
    pub kind: EntryKind,
    pub category_id: Option<Uuid>,
    pub wallet_id: Uuid,
    pub occurred_at: DateTime<Utc>,
}

impl AddTransactionCmd {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        amount_minor: i64,
        kind: EntryKind,
        wallet_id: Uuid,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            amount_minor,
            kind,
            category_id: None,
            wallet_id,
            occurred_at,
        }
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }
}

/// The transaction's state before an edit, supplied by the caller and used to
/// compute the balance reversal.
#[derive(Clone, Copy, Debug)]
pub struct TransactionSnapshot {
    pub amount_minor: i64,
    pub kind: EntryKind,
    pub wallet_id: Uuid,
}

impl From<&crate::Transaction> for TransactionSnapshot {
    fn from(tx: &crate::Transaction) -> Self {
        Self {
            amount_minor: tx.amount_minor,
            kind: tx.kind,
            wallet_id: tx.wallet_id,
        }
    }
}

/// Update an existing transaction, rebalancing one or two wallets.
#[derive(Clone, Debug)]
pub struct UpdateTransactionCmd {
    pub transaction_id: Uuid,
    pub old: TransactionSnapshot,
    pub name: String,
    pub amount_minor: i64,
    pub kind: EntryKind,
    pub category_id: Option<Uuid>,
    pub wallet_id: Uuid,
    pub occurred_at: DateTime<Utc>,
}

impl UpdateTransactionCmd {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        transaction_id: Uuid,
        old: TransactionSnapshot,
        name: impl Into<String>,
        amount_minor: i64,
        kind: EntryKind,
        wallet_id: Uuid,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            transaction_id,
            old,
            name: name.into(),
            amount_minor,
            kind,
            category_id: None,
            wallet_id,
            occurred_at,
        }
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }
}
