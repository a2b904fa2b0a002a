//! Import service - replays a mapped export into a destination
//!
//! Stages run strictly in order and every destination call is awaited
//! before the next is made. Any error stops the import where it is; entities
//! already created stay in the destination.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::result::{Error, Result};
use crate::domain::{BudgetMonthEntry, DestinationPayee, Transaction, INCOME_CATEGORY_NAME};
use crate::ports::Destination;
use crate::services::plan::ImportPlan;
use crate::services::resolver::{IdMap, INCOME_KEY};
use crate::services::transfer::{FlattenedTransactions, TransferResolver};

/// Import stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportStage {
    Begin,
    Accounts,
    CategoryGroups,
    Categories,
    Payees,
    TransferPayees,
    References,
    Transactions,
    Budgets,
    Finish,
}

impl ImportStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStage::Begin => "begin",
            ImportStage::Accounts => "accounts",
            ImportStage::CategoryGroups => "category-groups",
            ImportStage::Categories => "categories",
            ImportStage::Payees => "payees",
            ImportStage::TransferPayees => "transfer-payees",
            ImportStage::References => "references",
            ImportStage::Transactions => "transactions",
            ImportStage::Budgets => "budgets",
            ImportStage::Finish => "finish",
        }
    }
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress callbacks; every method defaults to doing nothing
pub trait ImportObserver: Send + Sync {
    fn stage_started(&self, _stage: ImportStage, _total: usize) {}
    fn advanced(&self, _stage: ImportStage, _count: usize) {}
    fn stage_finished(&self, _stage: ImportStage) {}
}

pub struct NoopObserver;

impl ImportObserver for NoopObserver {}

/// What an import created
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub label: String,
    pub destination: String,
    pub accounts: usize,
    pub category_groups: usize,
    pub categories: usize,
    pub payees: usize,
    pub transactions: usize,
    pub transfers: usize,
    pub budget_amounts: usize,
    pub carryovers: usize,
    pub warnings: Vec<String>,
}

/// An import error together with the stage it happened in
#[derive(Debug, thiserror::Error)]
#[error("import failed during {stage}: {source}")]
pub struct ImportFailure {
    pub stage: ImportStage,
    pub source: Error,
}

pub struct ImportService {
    destination: Arc<dyn Destination>,
}

impl ImportService {
    pub fn new(destination: Arc<dyn Destination>) -> Self {
        Self { destination }
    }

    pub fn destination_name(&self) -> &str {
        self.destination.name()
    }

    /// Run the whole import as one forward pass
    pub async fn run(
        &self,
        plan: ImportPlan,
        label: &str,
        observer: &dyn ImportObserver,
    ) -> std::result::Result<ImportSummary, ImportFailure> {
        let mut run = ImportRun {
            destination: self.destination.as_ref(),
            observer,
            ids: IdMap::new(),
            stage: ImportStage::Begin,
            summary: ImportSummary {
                label: label.to_string(),
                destination: self.destination.name().to_string(),
                warnings: plan.warnings.clone(),
                ..ImportSummary::default()
            },
        };

        match run.execute(plan, label).await {
            Ok(()) => Ok(run.summary),
            Err(source) => Err(ImportFailure {
                stage: run.stage,
                source,
            }),
        }
    }
}

/// State owned by one import run
struct ImportRun<'a> {
    destination: &'a dyn Destination,
    observer: &'a dyn ImportObserver,
    ids: IdMap,
    stage: ImportStage,
    summary: ImportSummary,
}

impl ImportRun<'_> {
    fn enter(&mut self, stage: ImportStage, total: usize) {
        self.stage = stage;
        self.observer.stage_started(stage, total);
    }

    fn leave(&self) {
        self.observer.stage_finished(self.stage);
    }

    fn step(&self) {
        self.observer.advanced(self.stage, 1);
    }

    async fn execute(&mut self, mut plan: ImportPlan, label: &str) -> Result<()> {
        self.enter(ImportStage::Begin, 1);
        self.destination.begin_import(label).await?;
        self.leave();

        self.create_accounts(&mut plan).await?;
        self.create_category_groups(&mut plan).await?;
        self.create_categories(&mut plan).await?;
        self.create_payees(&mut plan).await?;

        self.enter(ImportStage::TransferPayees, 1);
        let payees = self.destination.list_payees().await?;
        self.leave();

        self.rewrite_references(&mut plan.transactions, &payees)?;
        self.submit_transactions(plan.transactions).await?;
        self.apply_budgets(&plan.budget_months).await?;

        self.enter(ImportStage::Finish, 1);
        self.destination.finish_import().await?;
        self.leave();
        Ok(())
    }

    async fn create_accounts(&mut self, plan: &mut ImportPlan) -> Result<()> {
        self.enter(ImportStage::Accounts, plan.accounts.len());
        for account in plan.accounts.iter_mut() {
            let id = self.destination.create_account(account).await?;
            self.ids.record(&account.id, &id)?;
            account.id = id;
            self.summary.accounts += 1;
            self.step();
        }
        self.leave();
        Ok(())
    }

    async fn create_category_groups(&mut self, plan: &mut ImportPlan) -> Result<()> {
        self.enter(ImportStage::CategoryGroups, plan.category_groups.len());
        for group in plan.category_groups.iter_mut() {
            let id = self.destination.create_category_group(group).await?;
            self.ids.record(&group.id, &id)?;
            group.id = id;
            self.summary.category_groups += 1;
            self.step();
        }
        self.leave();
        Ok(())
    }

    async fn create_categories(&mut self, plan: &mut ImportPlan) -> Result<()> {
        self.enter(ImportStage::Categories, plan.categories.len());
        for category in plan.categories.iter_mut() {
            category.group_id = self.ids.resolve(&category.group_id)?.to_string();
            let id = self.destination.create_category(category).await?;
            self.ids.record(&category.id, &id)?;
            category.id = id;
            self.summary.categories += 1;
            self.step();
        }

        let income = self
            .destination
            .list_categories()
            .await?
            .into_iter()
            .find(|c| c.name == INCOME_CATEGORY_NAME)
            .ok_or_else(|| {
                Error::not_found(format!(
                    "destination has no '{}' category",
                    INCOME_CATEGORY_NAME
                ))
            })?;
        self.ids.record(INCOME_KEY, &income.id)?;
        self.leave();
        Ok(())
    }

    async fn create_payees(&mut self, plan: &mut ImportPlan) -> Result<()> {
        self.enter(ImportStage::Payees, plan.payees.len());
        for payee in plan.payees.iter_mut() {
            let id = self.destination.create_payee(payee).await?;
            self.ids.record(&payee.id, &id)?;
            payee.id = id;
            self.summary.payees += 1;
            self.step();
        }
        self.leave();
        Ok(())
    }

    /// Swap provisional ids for destination ids and resolve transfer legs
    fn rewrite_references(
        &mut self,
        transactions: &mut [Transaction],
        payees: &[DestinationPayee],
    ) -> Result<()> {
        self.enter(ImportStage::References, transactions.len());
        let flat = FlattenedTransactions::build(transactions);
        let resolver = TransferResolver::new(&flat, &self.ids, payees);

        for tx in transactions.iter_mut() {
            self.ids.rewrite_transaction(tx)?;
            self.summary.transfers += resolver.resolve(tx)?;
            self.observer.advanced(ImportStage::References, 1);
        }
        self.leave();
        Ok(())
    }

    /// Post transactions grouped by account, accounts in first-seen order
    async fn submit_transactions(&mut self, transactions: Vec<Transaction>) -> Result<()> {
        self.enter(ImportStage::Transactions, transactions.len());

        let mut order: Vec<String> = Vec::new();
        let mut by_account: HashMap<String, Vec<Transaction>> = HashMap::new();
        for tx in transactions {
            let account = tx.account.clone().ok_or_else(|| {
                Error::integrity(format!("transaction {} has no account", tx.id))
            })?;
            if !by_account.contains_key(&account) {
                order.push(account.clone());
            }
            by_account.entry(account).or_default().push(tx);
        }

        for account in order {
            let batch = by_account.remove(&account).unwrap_or_default();
            self.destination.add_transactions(&account, &batch).await?;
            self.summary.transactions += batch.len();
            self.observer.advanced(self.stage, batch.len());
        }
        self.leave();
        Ok(())
    }

    async fn apply_budgets(&mut self, budget_months: &[BudgetMonthEntry]) -> Result<()> {
        self.enter(ImportStage::Budgets, budget_months.len());
        for entry in budget_months {
            let category = self.ids.resolve(&entry.category)?.to_string();
            self.destination
                .set_budget_amount(&entry.month, &category, entry.amount)
                .await?;
            self.summary.budget_amounts += 1;
            if entry.carryover {
                self.destination
                    .set_budget_carryover(&entry.month, &category, true)
                    .await?;
                self.summary.carryovers += 1;
            }
            self.step();
        }
        self.leave();
        Ok(())
    }
}
