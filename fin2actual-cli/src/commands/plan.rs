//! Plan command - preview what an import would create

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use rust_decimal::Decimal;

use fin2actual_core::config::Config;
use fin2actual_core::services::{ImportPlan, LogEvent};
use fin2actual_core::OperationResult;

use super::{ensure_dir, export_path, get_logger, load_plan, log_event};
use crate::output;

/// Integer minor units as a two-decimal amount
fn format_amount(minor: i64) -> String {
    Decimal::new(minor, 2).to_string()
}

/// Transaction count and balance per provisional account id
fn account_totals(plan: &ImportPlan) -> HashMap<&str, (usize, i64)> {
    let mut totals: HashMap<&str, (usize, i64)> = HashMap::new();
    for tx in &plan.transactions {
        if let Some(account) = tx.account.as_deref() {
            let entry = totals.entry(account).or_default();
            entry.0 += 1;
            entry.1 += tx.amount;
        }
    }
    totals
}

pub fn run(file: Option<PathBuf>, json: bool) -> Result<()> {
    let dir = ensure_dir()?;
    let logger = get_logger();
    log_event(&logger, LogEvent::new("command_executed").with_command("plan"));

    let config = Config::load(&dir)?;
    let path = export_path(file, &config)?;
    let plan = load_plan(&path)?;
    let summary = plan.summary();

    if json {
        println!("{}", serde_json::to_string_pretty(&OperationResult::ok(summary))?);
        return Ok(());
    }

    println!("{} {}", "Import plan for".bold(), path.display());
    println!();

    let totals = account_totals(&plan);
    let mut table = output::create_table();
    table.set_header(vec!["Account", "Type", "Budget", "Closed", "Transactions", "Balance"]);
    for account in &plan.accounts {
        let (count, balance) = totals.get(account.id.as_str()).copied().unwrap_or_default();
        table.add_row(vec![
            account.name.clone(),
            account.account_type.as_str().to_string(),
            if account.offbudget { "off" } else { "on" }.to_string(),
            if account.closed { "yes" } else { "" }.to_string(),
            count.to_string(),
            format_amount(balance),
        ]);
    }
    println!("{}", table);
    println!();

    println!("  Category groups: {}", summary.category_groups);
    println!("  Categories: {}", summary.categories);
    println!("  Payees: {}", summary.payees);
    println!(
        "  Transactions: {} (+{} split lines, {} transfer legs)",
        summary.transactions, summary.subtransactions, summary.transfers
    );
    let budgeted: i64 = plan.budget_months.iter().map(|b| b.amount).sum();
    println!(
        "  Budget months: {} (total budgeted {})",
        summary.budget_months,
        format_amount(budgeted)
    );

    if !summary.warnings.is_empty() {
        println!();
        for warning in &summary.warnings {
            output::warning(warning);
        }
    }

    Ok(())
}
