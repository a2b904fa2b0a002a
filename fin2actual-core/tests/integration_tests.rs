//! Integration tests for fin2actual-core
//!
//! Full imports from Financier-shaped JSON into the in-memory destination,
//! which checks every reference it receives the way Actual would.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;

use fin2actual_core::adapters::memory::InMemoryDestination;
use fin2actual_core::config::Config;
use fin2actual_core::domain::{Export, Transaction};
use fin2actual_core::ports::Destination;
use fin2actual_core::services::{ImportPlan, ImportService, ImportStage, ImportSummary, NoopObserver};
use fin2actual_core::{Error, Fin2ActualContext};

// ============================================================================
// Test Helpers
// ============================================================================

const BUDGET: &str = "b_7c1e";

fn id(kind: &str, uuid: &str) -> String {
    format!("{}_{}_{}", BUDGET, kind, uuid)
}

fn account(uuid: &str, name: &str, sort: i64) -> Value {
    json!({ "_id": id("account", uuid), "name": name, "type": "DEBIT", "sort": sort, "onBudget": true })
}

fn plan(docs: Value) -> ImportPlan {
    let export = Export::from_json(docs).expect("export should parse");
    ImportPlan::from_export(&export).expect("export should map")
}

async fn import(docs: Value) -> (Arc<InMemoryDestination>, ImportSummary) {
    let dest = Arc::new(InMemoryDestination::new());
    let summary = ImportService::new(dest.clone())
        .run(plan(docs), "financier", &NoopObserver)
        .await
        .expect("import should succeed");
    (dest, summary)
}

fn destination_account(dest: &InMemoryDestination, name: &str) -> String {
    dest.accounts()
        .into_iter()
        .find(|a| a.name == name)
        .map(|a| a.id)
        .expect("account should exist")
}

fn transfer_payee(dest: &InMemoryDestination, account_id: &str) -> String {
    dest.payees()
        .into_iter()
        .find(|p| p.is_transfer_payee_for(account_id))
        .map(|p| p.id)
        .expect("transfer payee should exist")
}

fn submitted(dest: &InMemoryDestination, tx_id: &str) -> (String, Transaction) {
    dest.transactions()
        .into_iter()
        .find(|(_, t)| t.id == tx_id)
        .expect("transaction should be submitted")
}

// ============================================================================
// Creation Order
// ============================================================================

#[tokio::test]
async fn test_accounts_are_created_in_sort_order() {
    let (dest, summary) = import(json!([
        account("a2", "Sort two", 2),
        account("a0", "Sort zero", 0),
        account("a1", "Sort one", 1),
    ]))
    .await;

    let names: Vec<String> = dest.accounts().into_iter().map(|a| a.name).collect();
    assert_eq!(names, vec!["Sort zero", "Sort one", "Sort two"]);
    assert_eq!(summary.accounts, 3);
}

#[tokio::test]
async fn test_categories_land_in_their_groups() {
    let (dest, _) = import(json!([
        { "_id": id("master-category", "g1"), "name": "Bills", "sort": 1 },
        { "_id": id("master-category", "g0"), "name": "Everyday", "sort": 0 },
        { "_id": id("category", "c1"), "name": "Rent", "masterCategory": "g1", "sort": 0 },
        { "_id": id("category", "c2"), "name": "Groceries", "masterCategory": "g0", "sort": 0 },
    ]))
    .await;

    let groups = dest.category_groups();
    let bills = groups.iter().find(|g| g.name == "Bills").unwrap();
    let categories = dest.categories();
    let rent = categories.iter().find(|c| c.name == "Rent").unwrap();
    assert_eq!(rent.group_id.as_deref(), Some(bills.id.as_str()));

    // Built-in Income group first, then Everyday before Bills
    let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["Income", "Everyday", "Bills"]);
}

// ============================================================================
// Transactions and Transfers
// ============================================================================

#[tokio::test]
async fn test_references_are_rewritten_to_destination_ids() {
    let (dest, _) = import(json!([
        account("a1", "Checking", 0),
        { "_id": id("master-category", "g1"), "name": "Bills" },
        { "_id": id("category", "c1"), "name": "Rent", "masterCategory": "g1" },
        { "_id": id("payee", "p1"), "name": "Landlord" },
        {
            "_id": id("transaction", "t1"), "value": -120000, "date": "2024-03-01",
            "account": "a1", "category": "c1", "payee": "p1", "memo": "March", "cleared": true
        },
        {
            "_id": id("transaction", "t2"), "value": 300000, "date": "2024-03-02",
            "account": "a1", "category": "incomeNextMonth"
        }
    ]))
    .await;

    let checking = destination_account(&dest, "Checking");
    let (account, t1) = submitted(&dest, "t1");
    assert_eq!(account, checking);
    assert_eq!(t1.amount, -120000);
    assert_eq!(t1.notes.as_deref(), Some("March"));
    assert!(t1.cleared);

    let rent = dest.categories().into_iter().find(|c| c.name == "Rent").unwrap();
    assert_eq!(t1.category.as_deref(), Some(rent.id.as_str()));
    let landlord = dest.payees().into_iter().find(|p| p.name == "Landlord").unwrap();
    assert_eq!(t1.payee.as_deref(), Some(landlord.id.as_str()));

    let income = dest.categories().into_iter().find(|c| c.is_income).unwrap();
    let (_, t2) = submitted(&dest, "t2");
    assert_eq!(t2.category.as_deref(), Some(income.id.as_str()));
}

#[tokio::test]
async fn test_transfer_pair_resolves_to_each_others_accounts() {
    let (dest, summary) = import(json!([
        account("x", "Checking", 0),
        account("y", "Savings", 1),
        {
            "_id": id("transaction", "ta"), "value": -5000, "date": "2024-01-10",
            "account": "x", "transfer": "tb"
        },
        {
            "_id": id("transaction", "tb"), "value": 5000, "date": "2024-01-10",
            "account": "y", "transfer": "ta"
        }
    ]))
    .await;

    let x = destination_account(&dest, "Checking");
    let y = destination_account(&dest, "Savings");

    let (_, ta) = submitted(&dest, "ta");
    let (_, tb) = submitted(&dest, "tb");
    assert_eq!(ta.payee, Some(transfer_payee(&dest, &y)));
    assert_eq!(tb.payee, Some(transfer_payee(&dest, &x)));
    assert_eq!(summary.transfers, 2);
}

#[tokio::test]
async fn test_split_with_transfer_leg() {
    let (dest, summary) = import(json!([
        account("x", "Checking", 0),
        account("y", "Savings", 1),
        { "_id": id("master-category", "g1"), "name": "Bills" },
        { "_id": id("category", "c1"), "name": "Rent", "masterCategory": "g1" },
        {
            "_id": id("transaction", "t1"), "value": -10000, "date": "2024-02-01",
            "account": "x", "category": "split",
            "splits": [
                { "id": "s1", "value": -6000, "category": "c1", "memo": "rent share" },
                { "id": "s2", "value": -4000, "transfer": "t2" }
            ]
        },
        {
            "_id": id("transaction", "t2"), "value": 4000, "date": "2024-02-01",
            "account": "y", "transfer": "s2"
        }
    ]))
    .await;

    let x = destination_account(&dest, "Checking");
    let y = destination_account(&dest, "Savings");

    let (account, parent) = submitted(&dest, "t1");
    assert_eq!(account, x);
    assert!(parent.category.is_none());

    let legs = parent.splits();
    assert_eq!(legs.len(), 2);
    assert_eq!(legs[0].notes.as_deref(), Some("rent share"));
    assert_eq!(legs[1].payee, Some(transfer_payee(&dest, &y)));
    assert_eq!(legs[1].date, parent.date);

    // The counterpart of a split leg lives in the split's parent account
    let (_, t2) = submitted(&dest, "t2");
    assert_eq!(t2.payee, Some(transfer_payee(&dest, &x)));
    assert_eq!(summary.transfers, 2);
}

#[tokio::test]
async fn test_split_leg_account_is_taken_from_parent() {
    let (dest, _) = import(json!([
        account("x", "Checking", 0),
        account("y", "Savings", 1),
        account("z", "Cash", 2),
        {
            "_id": id("transaction", "p"), "value": -500, "date": "2024-06-01",
            "account": "x", "category": "split",
            "splits": [{ "id": "s1", "value": -500, "account": "z", "transfer": "b" }]
        },
        {
            "_id": id("transaction", "b"), "value": 500, "date": "2024-06-01",
            "account": "y", "transfer": "s1"
        }
    ]))
    .await;

    let x = destination_account(&dest, "Checking");
    let z = destination_account(&dest, "Cash");

    let (_, b) = submitted(&dest, "b");
    assert_eq!(b.payee, Some(transfer_payee(&dest, &x)));
    assert_ne!(b.payee, Some(transfer_payee(&dest, &z)));

    let (account, parent) = submitted(&dest, "p");
    assert_eq!(account, x);
    assert!(parent.splits()[0].account.is_none());
}

#[tokio::test]
async fn test_transactions_are_grouped_per_account() {
    let (dest, summary) = import(json!([
        account("x", "Checking", 0),
        account("y", "Savings", 1),
        { "_id": id("transaction", "t1"), "value": 1, "date": "2024-01-01", "account": "y" },
        { "_id": id("transaction", "t2"), "value": 2, "date": "2024-01-02", "account": "x" },
        { "_id": id("transaction", "t3"), "value": 3, "date": "2024-01-03", "account": "y" }
    ]))
    .await;

    let add_calls = dest.calls().iter().filter(|c| *c == "add_transactions").count();
    assert_eq!(add_calls, 2);
    assert_eq!(summary.transactions, 3);

    let ids: Vec<String> = dest.transactions().into_iter().map(|(_, t)| t.id).collect();
    assert_eq!(ids, vec!["t1", "t3", "t2"]);
}

// ============================================================================
// Budgets
// ============================================================================

#[tokio::test]
async fn test_budget_months_are_applied() {
    let (dest, summary) = import(json!([
        { "_id": id("master-category", "g1"), "name": "Bills" },
        { "_id": id("category", "c1"), "name": "Rent", "masterCategory": "g1" },
        { "_id": id("m_category", "2024-03-15_c1"), "budget": 120000, "overspending": true },
        { "_id": id("m_category", "2024-04-01_c1"), "budget": 110000, "overspending": "true" },
        { "_id": id("m_category", "2024-05-01_c1") }
    ]))
    .await;

    let rent = dest.categories().into_iter().find(|c| c.name == "Rent").unwrap();
    let calls = dest.budget_calls();

    assert_eq!(calls.len(), 4);
    assert_eq!(calls[0].month, "2024-03");
    assert_eq!(calls[0].category, rent.id);
    assert_eq!(calls[0].amount, Some(120000));
    assert_eq!(calls[1].carryover, Some(true));
    assert_eq!(calls[2].month, "2024-04");
    assert_eq!(calls[3].month, "2024-05");
    assert_eq!(calls[3].amount, Some(0));

    assert_eq!(summary.budget_amounts, 3);
    assert_eq!(summary.carryovers, 1);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_budget_for_unknown_category_fails_at_budgets() {
    let dest = Arc::new(InMemoryDestination::new());
    let failure = ImportService::new(dest.clone())
        .run(
            plan(json!([
                { "_id": id("m_category", "2024-01-01_ghost"), "budget": 5000 }
            ])),
            "financier",
            &NoopObserver,
        )
        .await
        .unwrap_err();

    assert_eq!(failure.stage, ImportStage::Budgets);
    assert!(matches!(failure.source, Error::NotFound(_)));
    assert!(failure.source.to_string().contains("ghost"));
    assert!(dest.budget_calls().is_empty());
    assert!(!dest.is_finished());
}


#[tokio::test]
async fn test_missing_counterpart_stops_before_submission() {
    let dest = Arc::new(InMemoryDestination::new());
    let failure = ImportService::new(dest.clone())
        .run(
            plan(json!([
                account("x", "Checking", 0),
                {
                    "_id": id("transaction", "t1"), "value": -1, "date": "2024-01-01",
                    "account": "x", "transfer": "gone"
                }
            ])),
            "financier",
            &NoopObserver,
        )
        .await
        .unwrap_err();

    assert_eq!(failure.stage, ImportStage::References);
    assert!(matches!(failure.source, Error::Counterpart(_)));
    assert_eq!(dest.accounts().len(), 1);
    assert!(dest.transactions().is_empty());
}

#[tokio::test]
async fn test_transaction_without_account_fails_submission() {
    let dest = Arc::new(InMemoryDestination::new());
    let failure = ImportService::new(dest.clone())
        .run(
            plan(json!([
                account("x", "Checking", 0),
                { "_id": id("transaction", "t1"), "value": 10, "date": "2024-01-01" }
            ])),
            "financier",
            &NoopObserver,
        )
        .await
        .unwrap_err();

    assert_eq!(failure.stage, ImportStage::Transactions);
    assert!(matches!(failure.source, Error::Integrity(_)));
}

#[test]
fn test_unknown_account_type_fails_before_any_call() {
    let export = Export::from_json(json!([
        { "_id": id("account", "a1"), "name": "Gold", "type": "PRECIOUS_METALS" }
    ]))
    .unwrap();
    let err = ImportPlan::from_export(&export).unwrap_err();
    assert!(matches!(err, Error::Mapping(_)));
}

// ============================================================================
// Entry Points
// ============================================================================

#[tokio::test]
async fn test_dry_run_context_imports_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("financier.json");
    let docs = json!({ "docs": [
        account("x", "Checking", 0),
        { "_id": id("payee", "p1"), "name": "Cafe" },
        { "_id": format!("{}_month_2024-01-01", BUDGET), "note": "not imported" },
        {
            "_id": id("transaction", "t1"), "value": -450, "date": "2024-01-05",
            "account": "x", "payee": "p1"
        }
    ]});
    std::fs::write(&path, serde_json::to_string(&docs).unwrap()).unwrap();

    let export = Export::load(&path).unwrap();
    assert_eq!(export.ignored_count(), 1);
    let plan = ImportPlan::from_export(&export).unwrap();

    let ctx = Fin2ActualContext::with_config(Config::default(), true).unwrap();
    assert_eq!(ctx.destination.name(), "memory");

    let summary = ctx
        .import_service
        .run(plan, "dry run", &NoopObserver)
        .await
        .unwrap();
    assert_eq!(summary.destination, "memory");
    assert_eq!(summary.transactions, 1);
    assert_eq!(summary.warnings.len(), 1);
}

#[test]
fn test_live_context_requires_actual_settings() {
    assert!(Fin2ActualContext::with_config(Config::default(), false).is_err());
}
