//! Import command - replay a Financier export into Actual

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use fin2actual_core::config::Config;
use fin2actual_core::services::{
    ImportObserver, ImportStage, ImportSummary, LogEvent, NoopObserver,
};
use fin2actual_core::{Fin2ActualContext, OperationResult};

use super::{ensure_dir, export_path, get_logger, load_plan, log_event};
use crate::output;

/// One progress bar per stage, replaced as stages advance
struct ProgressObserver {
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressObserver {
    fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner} {msg:<16} [{bar:30}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ")
    }
}

impl ImportObserver for ProgressObserver {
    fn stage_started(&self, stage: ImportStage, total: usize) {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(Self::style());
        bar.set_message(stage.to_string());
        if let Ok(mut current) = self.bar.lock() {
            *current = Some(bar);
        }
    }

    fn advanced(&self, _stage: ImportStage, count: usize) {
        if let Ok(current) = self.bar.lock() {
            if let Some(bar) = current.as_ref() {
                bar.inc(count as u64);
            }
        }
    }

    fn stage_finished(&self, stage: ImportStage) {
        if let Ok(mut current) = self.bar.lock() {
            if let Some(bar) = current.take() {
                bar.finish_and_clear();
            }
        }
        println!("  {} {}", "✓".green(), stage);
    }
}

pub async fn run(file: Option<PathBuf>, dry_run: bool, label: Option<String>, json: bool) -> Result<()> {
    let dir = ensure_dir()?;
    let logger = get_logger();
    log_event(&logger, LogEvent::new("command_executed").with_command("import"));

    let config = Config::load(&dir)?;
    let path = export_path(file, &config)?;

    let plan = match load_plan(&path) {
        Ok(plan) => plan,
        Err(e) => {
            log_event(
                &logger,
                LogEvent::new("import_failed")
                    .with_command("import")
                    .with_stage("plan")
                    .with_error(format!("{:#}", e)),
            );
            return Err(e);
        }
    };

    let label = label.unwrap_or_else(|| config.import_label.clone());
    let ctx = Fin2ActualContext::with_config(config, dry_run)?;
    let destination = ctx.import_service.destination_name().to_string();

    if !json {
        if dry_run {
            output::warning("DRY RUN - importing into an in-memory budget, Actual is not touched");
        }
        output::info(&format!("Importing {} into {}", path.display(), destination));
        for warning in &plan.warnings {
            output::warning(&format!("  {}", warning));
        }
    }

    log_event(
        &logger,
        LogEvent::new("import_started")
            .with_command("import")
            .with_destination(&destination),
    );

    let progress = ProgressObserver::new();
    let observer: &dyn ImportObserver = if json { &NoopObserver } else { &progress };

    match ctx.import_service.run(plan, &label, observer).await {
        Ok(summary) => {
            log_event(
                &logger,
                LogEvent::new("import_completed")
                    .with_command("import")
                    .with_destination(&destination)
                    .with_stage(ImportStage::Finish.as_str()),
            );
            if json {
                println!("{}", serde_json::to_string_pretty(&OperationResult::ok(summary))?);
            } else {
                print_summary(&summary, dry_run);
            }
            Ok(())
        }
        Err(failure) => {
            log_event(
                &logger,
                LogEvent::new("import_failed")
                    .with_command("import")
                    .with_destination(&destination)
                    .with_stage(failure.stage.as_str())
                    .with_error(failure.source.to_string()),
            );
            if json {
                let result = OperationResult::<ImportSummary>::fail(failure.source.to_string())
                    .with_context("stage", serde_json::json!(failure.stage.as_str()));
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                output::warning("Entities created before the failure remain in the destination.");
            }
            Err(anyhow!(failure))
        }
    }
}

fn print_summary(summary: &ImportSummary, dry_run: bool) {
    println!();
    if dry_run {
        output::success("Dry run completed");
    } else {
        output::success(&format!("Import '{}' completed", summary.label));
    }
    println!("  Accounts: {}", summary.accounts);
    println!("  Category groups: {}", summary.category_groups);
    println!("  Categories: {}", summary.categories);
    println!("  Payees: {}", summary.payees);
    println!(
        "  Transactions: {} ({} transfer legs)",
        summary.transactions, summary.transfers
    );
    println!(
        "  Budget months: {} ({} with carryover)",
        summary.budget_amounts, summary.carryovers
    );
}
