//! fin2actual - import a Financier export into Actual Budget

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{config, import, logs, plan};

/// fin2actual - move a Financier budget into Actual Budget
#[derive(Parser)]
#[command(name = "fin2actual", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a Financier export into Actual
    Import {
        /// Path to the Financier JSON export (defaults to FINANCIER_JSON)
        file: Option<PathBuf>,
        /// Import into an in-memory budget instead of Actual
        #[arg(long)]
        dry_run: bool,
        /// Name of the import run
        #[arg(long)]
        label: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Preview what an import would create
    Plan {
        /// Path to the Financier JSON export (defaults to FINANCIER_JSON)
        file: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Import {
            file,
            dry_run,
            label,
            json,
        } => import::run(file, dry_run, label, json).await,
        Commands::Plan { file, json } => plan::run(file, json),
        Commands::Config { json } => config::run(json),
        Commands::Logs { command } => logs::run(command),
    }
}
