//! Import plan - everything mapped before the destination is touched

use serde::Serialize;

use crate::domain::result::Result;
use crate::domain::{
    Account, BudgetMonthEntry, Category, CategoryGroup, Export, MonthCategoryParser, Payee,
    Transaction,
};
use crate::services::mapper;

/// Mapped entities in creation order, with provisional ids
///
/// Building a plan runs every mapper, so mapping errors (unknown account
/// types, bad dates, malformed month-category ids) surface here and never
/// halfway through an import.
#[derive(Debug, Clone)]
pub struct ImportPlan {
    pub accounts: Vec<Account>,
    pub category_groups: Vec<CategoryGroup>,
    pub categories: Vec<Category>,
    pub payees: Vec<Payee>,
    pub transactions: Vec<Transaction>,
    pub budget_months: Vec<BudgetMonthEntry>,
    pub warnings: Vec<String>,
}

impl ImportPlan {
    pub fn from_export(export: &Export) -> Result<Self> {
        let parser = MonthCategoryParser::new()?;
        let budget_months = export
            .month_categories()
            .map(|record| parser.entry(record))
            .collect::<Result<Vec<_>>>()?;

        let transactions = mapper::map_transactions(export)?;

        let mut warnings = Vec::new();
        let ignored = export.ignored_count();
        if ignored > 0 {
            warnings.push(format!(
                "{} document(s) of unsupported kinds will be ignored",
                ignored
            ));
        }
        let orphans = transactions.iter().filter(|t| t.account.is_none()).count();
        if orphans > 0 {
            warnings.push(format!(
                "{} transaction(s) have no account and will fail the import",
                orphans
            ));
        }

        Ok(Self {
            accounts: mapper::map_accounts(export)?,
            category_groups: mapper::map_category_groups(export),
            categories: mapper::map_categories(export)?,
            payees: mapper::map_payees(export),
            transactions,
            budget_months,
            warnings,
        })
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            accounts: self.accounts.len(),
            category_groups: self.category_groups.len(),
            categories: self.categories.len(),
            payees: self.payees.len(),
            transactions: self.transactions.len(),
            subtransactions: self
                .transactions
                .iter()
                .map(|t| t.node_count() - 1)
                .sum(),
            transfers: self
                .transactions
                .iter()
                .map(count_transfers)
                .sum(),
            budget_months: self.budget_months.len(),
            warnings: self.warnings.clone(),
        }
    }
}

fn count_transfers(tx: &Transaction) -> usize {
    usize::from(tx.is_transfer()) + tx.splits().iter().map(count_transfers).sum::<usize>()
}

/// Entity counts for `plan` output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub accounts: usize,
    pub category_groups: usize,
    pub categories: usize,
    pub payees: usize,
    pub transactions: usize,
    pub subtransactions: usize,
    pub transfers: usize,
    pub budget_months: usize,
    pub warnings: Vec<String>,
}
