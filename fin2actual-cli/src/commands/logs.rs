//! Logs command - view and prune the import event log

use anyhow::Result;
use chrono::{Duration, TimeZone, Utc};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;

use fin2actual_core::services::LoggingService;

use super::ensure_dir;
use crate::output;

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent log entries
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Show only errors
        #[arg(long)]
        errors: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete old log entries
    Clear {
        /// Delete entries older than N days
        #[arg(long, default_value = "30")]
        older_than_days: u64,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show log statistics and database path
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn open_logs() -> Result<LoggingService> {
    let dir = ensure_dir()?;
    LoggingService::new(&dir, env!("CARGO_PKG_VERSION"))
}

fn format_timestamp(timestamp_ms: i64) -> String {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

pub fn run(command: LogsCommands) -> Result<()> {
    match command {
        LogsCommands::List { limit, errors, json } => list(limit, errors, json),
        LogsCommands::Clear {
            older_than_days,
            force,
            json,
        } => clear(older_than_days, force, json),
        LogsCommands::Stats { json } => stats(json),
    }
}

fn list(limit: usize, errors_only: bool, json: bool) -> Result<()> {
    let service = open_logs()?;
    let entries = if errors_only {
        service.get_errors(limit)?
    } else {
        service.get_recent(limit)?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No log entries found.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Time", "Event", "Command", "Destination", "Stage", "Error"]);
    for entry in &entries {
        table.add_row(vec![
            format_timestamp(entry.timestamp),
            entry.event.clone(),
            entry.command.clone().unwrap_or_default(),
            entry.destination.clone().unwrap_or_default(),
            entry.stage.clone().unwrap_or_default(),
            if entry.error_message.is_some() {
                "!".red().to_string()
            } else {
                String::new()
            },
        ]);
    }
    println!("{}", table);

    if !errors_only {
        let recent_errors: Vec<_> = entries.iter().filter(|e| e.error_message.is_some()).take(3).collect();
        if !recent_errors.is_empty() {
            println!();
            println!("{}", "Recent errors:".red().bold());
            for err in recent_errors {
                println!(
                    "  {} [{}]: {}",
                    format_timestamp(err.timestamp).dimmed(),
                    err.event,
                    err.error_message.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }
    Ok(())
}

fn clear(older_than_days: u64, force: bool, json: bool) -> Result<()> {
    let service = open_logs()?;
    let cutoff = Utc::now() - Duration::days(older_than_days as i64);

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete log entries older than {} days?", older_than_days))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let deleted = service.delete_before(cutoff.timestamp_millis())?;
    if json {
        println!("{}", serde_json::json!({ "deleted": deleted }));
    } else {
        println!("Deleted {} log entries", deleted);
    }
    Ok(())
}

fn stats(json: bool) -> Result<()> {
    let service = open_logs()?;
    let total = service.count()?;
    let errors = service.get_errors(1000)?.len();
    let by_event = service.event_counts()?;
    let db_path = service.db_path().to_path_buf();
    let size_bytes = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "total_entries": total,
                "error_count": errors,
                "events": by_event,
                "database_path": db_path.to_string_lossy(),
                "database_size_bytes": size_bytes
            }))?
        );
        return Ok(());
    }

    println!("{}", "Log statistics".bold());
    println!("  Total entries: {}", total);
    println!("  Errors: {}", errors);
    println!("  Database: {}", db_path.display());
    println!("  Size: {}", output::format_size(size_bytes));

    if !by_event.is_empty() {
        let mut table = output::create_table();
        table.set_header(vec!["Event", "Count"]);
        for count in by_event {
            table.add_row(vec![count.event, count.count.to_string()]);
        }
        println!("{}", table);
    }
    Ok(())
}
