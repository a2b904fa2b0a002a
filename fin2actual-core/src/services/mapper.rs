//! Entity and transaction mappers
//!
//! Project typed Financier records into destination-shaped entities. Output
//! order is creation order, so every mapper sorts by the record's `sort`
//! field with a stable sort (ties keep export order).

use chrono::NaiveDate;

use crate::domain::result::{Error, Result};
use crate::domain::source::{SourceSplit, SourceTransaction};
use crate::domain::{
    canonical_id, Account, AccountType, Category, CategoryGroup, Export, Field, Payee,
    Transaction, TransactionCategory,
};
use crate::services::resolver::INCOME_KEY;

/// Stable sort by Financier's numeric `sort` field, missing values first as 0
fn sorted_by<'a, T>(items: impl Iterator<Item = &'a T>, sort: impl Fn(&T) -> Option<f64>) -> Vec<&'a T>
where
    T: 'a,
{
    let mut items: Vec<&T> = items.collect();
    items.sort_by(|a, b| sort(*a).unwrap_or(0.0).total_cmp(&sort(*b).unwrap_or(0.0)));
    items
}

pub fn map_accounts(export: &Export) -> Result<Vec<Account>> {
    sorted_by(export.accounts(), |a| a.sort)
        .into_iter()
        .map(|source| {
            let tag = source.account_type.as_deref().ok_or_else(|| {
                Error::mapping(format!("account {} has no type", source.id))
            })?;
            let account_type = AccountType::from_financier(tag)
                .map_err(|e| Error::mapping(format!("account {}: {}", source.id, e)))?;

            Ok(Account {
                id: canonical_id(&source.id).to_string(),
                name: source.name.clone(),
                account_type,
                closed: source.closed.unwrap_or(false),
                offbudget: !source.on_budget.unwrap_or(true),
                note: source.note.clone(),
                source_id: source.id.clone(),
            })
        })
        .collect()
}

pub fn map_category_groups(export: &Export) -> Vec<CategoryGroup> {
    sorted_by(export.category_groups(), |g| g.sort)
        .into_iter()
        .map(|source| CategoryGroup {
            id: canonical_id(&source.id).to_string(),
            name: source.name.clone(),
            source_id: source.id.clone(),
        })
        .collect()
}

/// Month-category documents never reach this mapper: they are classified
/// as a separate record kind at ingestion.
pub fn map_categories(export: &Export) -> Result<Vec<Category>> {
    sorted_by(export.categories(), |c| c.sort)
        .into_iter()
        .map(|source| {
            let group = source.master_category.as_deref().ok_or_else(|| {
                Error::mapping(format!("category {} has no master category", source.id))
            })?;
            Ok(Category {
                id: canonical_id(&source.id).to_string(),
                name: source.name.clone(),
                group_id: group.to_string(),
                source_id: source.id.clone(),
            })
        })
        .collect()
}

pub fn map_payees(export: &Export) -> Vec<Payee> {
    sorted_by(export.payees(), |p| p.sort)
        .into_iter()
        .map(|source| Payee {
            id: canonical_id(&source.id).to_string(),
            name: source.name.clone(),
            source_id: source.id.clone(),
        })
        .collect()
}

/// Map every transaction document, in export order
pub fn map_transactions(export: &Export) -> Result<Vec<Transaction>> {
    export.transactions().map(map_transaction).collect()
}

/// Map one top-level transaction and its splits
pub fn map_transaction(source: &SourceTransaction) -> Result<Transaction> {
    let raw_date = source
        .date
        .as_deref()
        .ok_or_else(|| Error::mapping(format!("transaction {} has no date", source.id)))?;
    let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|_| {
        Error::mapping(format!(
            "transaction {} has invalid date '{}'",
            source.id, raw_date
        ))
    })?;
    let cleared = source.cleared.unwrap_or(false);

    Ok(Transaction {
        id: canonical_id(&source.id).to_string(),
        account: present_string(&source.account),
        amount: source.value,
        date,
        notes: present_string(&source.memo),
        cleared,
        category: map_category(&source.category),
        payee: present_string(&source.payee),
        transfer: present_string(&source.transfer),
        subtransactions: map_splits(source.splits.as_deref(), date, cleared),
    })
}

/// Splits inherit account, date and cleared state from their parent
fn map_split(split: &SourceSplit, date: NaiveDate, cleared: bool) -> Transaction {
    Transaction {
        id: split.id.clone(),
        account: None,
        amount: split.value,
        date,
        notes: present_string(&split.memo),
        cleared,
        category: map_category(&split.category),
        payee: present_string(&split.payee),
        transfer: present_string(&split.transfer),
        subtransactions: map_splits(split.splits.as_deref(), date, cleared),
    }
}

fn map_splits(splits: Option<&[SourceSplit]>, date: NaiveDate, cleared: bool) -> Option<Vec<Transaction>> {
    match splits {
        Some(splits) if !splits.is_empty() => Some(
            splits
                .iter()
                .map(|split| map_split(split, date, cleared))
                .collect(),
        ),
        _ => None,
    }
}

/// Empty strings count as missing, like the falsy checks in Financier itself
fn present_string(field: &Field<String>) -> Option<String> {
    field
        .as_present()
        .filter(|s| !s.is_empty())
        .cloned()
}

fn map_category(field: &Field<String>) -> Option<String> {
    let raw = field.as_present().filter(|s| !s.is_empty())?;
    match TransactionCategory::parse(raw) {
        TransactionCategory::Split => None,
        TransactionCategory::Income | TransactionCategory::IncomeNextMonth => {
            Some(INCOME_KEY.to_string())
        }
        TransactionCategory::Category(id) => Some(id),
    }
}
