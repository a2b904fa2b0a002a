//! Core domain entities
//!
//! Source records as exported by Financier, and the destination-shaped
//! entities they are mapped into. Pure data plus validation; no I/O beyond
//! reading the export file.

mod account;
pub mod budget;
mod category;
pub mod ids;
mod payee;
pub mod result;
pub mod source;
mod transaction;

pub use account::{Account, AccountType};
pub use budget::{BudgetMonthEntry, MonthCategoryParser};
pub use category::{Category, CategoryGroup, DestinationCategory, INCOME_CATEGORY_NAME};
pub use ids::canonical_id;
pub use payee::{DestinationPayee, Payee};
pub use source::{Export, Field, RecordKind, SourceRecord, TransactionCategory};
pub use transaction::Transaction;
