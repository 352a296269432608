//! The ledger consistency engine.
//!
//! The engine keeps wallet balances in lockstep with the transaction
//! history: every add/update/delete adjusts the affected wallet balances and
//! the transaction records inside one database transaction, so an observer
//! never sees one without the other.

pub use categories::{Category, DEFAULT_CATEGORIES};
pub use commands::{AddTransactionCmd, TransactionSnapshot, UpdateTransactionCmd};
pub use error::EngineError;
pub use money::MoneyCents;
pub use ops::{
    BucketTotals, CategoryTotal, DateRange, Engine, EngineBuilder, TransactionListFilter,
};
pub use transactions::{EntryKind, Transaction};
pub use wallets::Wallet;

mod categories;
mod commands;
mod error;
mod money;
mod ops;
mod transactions;
mod util;
mod wallets;

type ResultEngine<T> = Result<T, EngineError>;
