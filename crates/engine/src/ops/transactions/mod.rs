mod list;
mod reports;
mod write;

pub use list::{DateRange, TransactionListFilter};
pub use reports::{BucketTotals, CategoryTotal};
