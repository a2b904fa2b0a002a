//! In-memory destination
//!
//! Behaves like an empty Actual budget: it starts with the built-in Income
//! group and category, creates a transfer payee for every new account and
//! rejects references to ids it never handed out. Used for `--dry-run` and
//! by the tests.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{
    Account, Category, CategoryGroup, DestinationCategory, DestinationPayee, Payee, Transaction,
    INCOME_CATEGORY_NAME,
};
use crate::ports::Destination;

/// An account as the destination stored it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredAccount {
    pub id: String,
    pub name: String,
    pub account_type: String,
    pub closed: bool,
    pub offbudget: bool,
    pub note: Option<String>,
    pub initial_balance: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredGroup {
    pub id: String,
    pub name: String,
}

/// One `set_budget_amount` / `set_budget_carryover` call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetCall {
    pub month: String,
    pub category: String,
    pub amount: Option<i64>,
    pub carryover: Option<bool>,
}

#[derive(Debug, Default)]
struct MemoryState {
    import_label: Option<String>,
    finished: bool,
    accounts: Vec<StoredAccount>,
    groups: Vec<StoredGroup>,
    categories: Vec<DestinationCategory>,
    payees: Vec<DestinationPayee>,
    /// (account id, transaction) in submission order
    transactions: Vec<(String, Transaction)>,
    budget_calls: Vec<BudgetCall>,
    calls: Vec<String>,
}

impl MemoryState {
    fn seeded() -> Self {
        let group_id = new_id();
        Self {
            groups: vec![StoredGroup {
                id: group_id.clone(),
                name: "Income".to_string(),
            }],
            categories: vec![DestinationCategory {
                id: new_id(),
                name: INCOME_CATEGORY_NAME.to_string(),
                group_id: Some(group_id),
                is_income: true,
            }],
            ..Self::default()
        }
    }

    fn has_account(&self, id: &str) -> bool {
        self.accounts.iter().any(|a| a.id == id)
    }

    fn check_transaction(&self, tx: &Transaction) -> Result<()> {
        if let Some(category) = tx.category.as_deref() {
            if !self.categories.iter().any(|c| c.id == category) {
                return Err(Error::destination(format!(
                    "transaction {} references unknown category {}",
                    tx.id, category
                )));
            }
        }
        if let Some(payee) = tx.payee.as_deref() {
            if !self.payees.iter().any(|p| p.id == payee) {
                return Err(Error::destination(format!(
                    "transaction {} references unknown payee {}",
                    tx.id, payee
                )));
            }
        }
        for sub in tx.splits() {
            self.check_transaction(sub)?;
        }
        Ok(())
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Destination that keeps everything in process memory
pub struct InMemoryDestination {
    state: Mutex<MemoryState>,
    fail_on: Option<String>,
}

impl InMemoryDestination {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState::seeded()),
            fail_on: None,
        }
    }

    /// A destination whose `operation` call always fails
    pub fn failing_on(operation: impl Into<String>) -> Self {
        Self {
            fail_on: Some(operation.into()),
            ..Self::new()
        }
    }

    /// Destination without the built-in Income category
    pub fn without_income() -> Self {
        let destination = Self::new();
        if let Ok(mut state) = destination.state.lock() {
            state.categories.clear();
        }
        destination
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|e| Error::destination(format!("memory state poisoned: {}", e)))
    }

    /// Record the call and fail it if this destination was told to
    fn enter(&self, operation: &str) -> Result<MutexGuard<'_, MemoryState>> {
        let mut state = self.lock()?;
        state.calls.push(operation.to_string());
        if self.fail_on.as_deref() == Some(operation) {
            return Err(Error::destination(format!("{} rejected", operation)));
        }
        Ok(state)
    }

    pub fn accounts(&self) -> Vec<StoredAccount> {
        self.lock().map(|s| s.accounts.clone()).unwrap_or_default()
    }

    pub fn category_groups(&self) -> Vec<StoredGroup> {
        self.lock().map(|s| s.groups.clone()).unwrap_or_default()
    }

    pub fn categories(&self) -> Vec<DestinationCategory> {
        self.lock().map(|s| s.categories.clone()).unwrap_or_default()
    }

    pub fn payees(&self) -> Vec<DestinationPayee> {
        self.lock().map(|s| s.payees.clone()).unwrap_or_default()
    }

    pub fn transactions(&self) -> Vec<(String, Transaction)> {
        self.lock().map(|s| s.transactions.clone()).unwrap_or_default()
    }

    pub fn budget_calls(&self) -> Vec<BudgetCall> {
        self.lock().map(|s| s.budget_calls.clone()).unwrap_or_default()
    }

    /// Operation names in the order they were called
    pub fn calls(&self) -> Vec<String> {
        self.lock().map(|s| s.calls.clone()).unwrap_or_default()
    }

    pub fn import_label(&self) -> Option<String> {
        self.lock().ok().and_then(|s| s.import_label.clone())
    }

    pub fn is_finished(&self) -> bool {
        self.lock().map(|s| s.finished).unwrap_or(false)
    }
}

impl Default for InMemoryDestination {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Destination for InMemoryDestination {
    fn name(&self) -> &str {
        "memory"
    }

    async fn begin_import(&self, label: &str) -> Result<()> {
        let mut state = self.enter("begin_import")?;
        if state.import_label.is_some() {
            return Err(Error::destination("an import is already running"));
        }
        state.import_label = Some(label.to_string());
        Ok(())
    }

    async fn finish_import(&self) -> Result<()> {
        let mut state = self.enter("finish_import")?;
        if state.import_label.is_none() {
            return Err(Error::destination("no import is running"));
        }
        state.finished = true;
        Ok(())
    }

    async fn create_account(&self, account: &Account) -> Result<String> {
        let mut state = self.enter("create_account")?;
        let id = new_id();
        state.accounts.push(StoredAccount {
            id: id.clone(),
            name: account.name.clone(),
            account_type: account.account_type.as_str().to_string(),
            closed: account.closed,
            offbudget: account.offbudget,
            note: account.note.clone(),
            initial_balance: 0,
        });
        state.payees.push(DestinationPayee {
            id: new_id(),
            name: String::new(),
            transfer_acct: Some(id.clone()),
        });
        Ok(id)
    }

    async fn create_category_group(&self, group: &CategoryGroup) -> Result<String> {
        let mut state = self.enter("create_category_group")?;
        let id = new_id();
        state.groups.push(StoredGroup {
            id: id.clone(),
            name: group.name.clone(),
        });
        Ok(id)
    }

    async fn create_category(&self, category: &Category) -> Result<String> {
        let mut state = self.enter("create_category")?;
        if !state.groups.iter().any(|g| g.id == category.group_id) {
            return Err(Error::destination(format!(
                "category {} references unknown group {}",
                category.name, category.group_id
            )));
        }
        let id = new_id();
        state.categories.push(DestinationCategory {
            id: id.clone(),
            name: category.name.clone(),
            group_id: Some(category.group_id.clone()),
            is_income: false,
        });
        Ok(id)
    }

    async fn create_payee(&self, payee: &Payee) -> Result<String> {
        let mut state = self.enter("create_payee")?;
        let id = new_id();
        state.payees.push(DestinationPayee {
            id: id.clone(),
            name: payee.name.clone(),
            transfer_acct: None,
        });
        Ok(id)
    }

    async fn list_categories(&self) -> Result<Vec<DestinationCategory>> {
        let state = self.enter("list_categories")?;
        Ok(state.categories.clone())
    }

    async fn list_payees(&self) -> Result<Vec<DestinationPayee>> {
        let state = self.enter("list_payees")?;
        Ok(state.payees.clone())
    }

    async fn add_transactions(&self, account_id: &str, transactions: &[Transaction]) -> Result<()> {
        let mut state = self.enter("add_transactions")?;
        if !state.has_account(account_id) {
            return Err(Error::destination(format!("unknown account {}", account_id)));
        }
        for tx in transactions {
            state.check_transaction(tx)?;
        }
        state.transactions.extend(
            transactions
                .iter()
                .map(|tx| (account_id.to_string(), tx.clone())),
        );
        Ok(())
    }

    async fn set_budget_amount(&self, month: &str, category_id: &str, amount: i64) -> Result<()> {
        let mut state = self.enter("set_budget_amount")?;
        state.budget_calls.push(BudgetCall {
            month: month.to_string(),
            category: category_id.to_string(),
            amount: Some(amount),
            carryover: None,
        });
        Ok(())
    }

    async fn set_budget_carryover(
        &self,
        month: &str,
        category_id: &str,
        carryover: bool,
    ) -> Result<()> {
        let mut state = self.enter("set_budget_carryover")?;
        state.budget_calls.push(BudgetCall {
            month: month.to_string(),
            category: category_id.to_string(),
            amount: None,
            carryover: Some(carryover),
        });
        Ok(())
    }
}
