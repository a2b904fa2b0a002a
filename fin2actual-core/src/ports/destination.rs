//! Destination port - the budgeting system entities are replayed into

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::{
    Account, Category, CategoryGroup, DestinationCategory, DestinationPayee, Payee, Transaction,
};

/// Destination budget abstraction
///
/// Every call is awaited before the next one is issued: creation order
/// decides display order for entities without an explicit sort field, and
/// later stages read ids produced by earlier ones.
#[async_trait]
pub trait Destination: Send + Sync {
    /// Destination name (e.g., "actual", "memory")
    fn name(&self) -> &str;

    // === Unit of work ===

    /// Open the named import. Called once, before any other mutation.
    async fn begin_import(&self, label: &str) -> Result<()>;

    /// Close the import opened by `begin_import`
    async fn finish_import(&self) -> Result<()>;

    // === Creation ===

    /// Create an account with a zero starting balance, returning its id
    async fn create_account(&self, account: &Account) -> Result<String>;

    async fn create_category_group(&self, group: &CategoryGroup) -> Result<String>;

    /// `category.group_id` must already be a destination id
    async fn create_category(&self, category: &Category) -> Result<String>;

    async fn create_payee(&self, payee: &Payee) -> Result<String>;

    // === Listing ===

    async fn list_categories(&self) -> Result<Vec<DestinationCategory>>;

    /// All payees, including the per-account transfer payees
    async fn list_payees(&self) -> Result<Vec<DestinationPayee>>;

    // === Transactions and budgets ===

    /// Add fully-resolved transactions to one account
    async fn add_transactions(&self, account_id: &str, transactions: &[Transaction]) -> Result<()>;

    /// `month` is `YYYY-MM`
    async fn set_budget_amount(&self, month: &str, category_id: &str, amount: i64) -> Result<()>;

    async fn set_budget_carryover(&self, month: &str, category_id: &str, carryover: bool)
        -> Result<()>;
}
