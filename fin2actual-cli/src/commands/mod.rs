//! CLI command implementations

pub mod config;
pub mod import;
pub mod logs;
pub mod plan;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use fin2actual_core::config::{Config, ENV_FINANCIER_JSON};
use fin2actual_core::services::{ImportPlan, LogEvent, LoggingService};
use fin2actual_core::Export;

/// Environment variable that relocates the fin2actual directory
pub const ENV_DIR: &str = "FIN2ACTUAL_DIR";

/// The fin2actual directory: `$FIN2ACTUAL_DIR`, else `~/.fin2actual`
pub fn get_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_DIR) {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".fin2actual"))
        .ok_or_else(|| anyhow!("Could not find home directory; set {}", ENV_DIR))
}

/// The fin2actual directory, created if missing
pub fn ensure_dir() -> Result<PathBuf> {
    let dir = get_dir()?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    Ok(dir)
}

/// Logging service, or None if it can't be opened (logging never blocks a command)
pub fn get_logger() -> Option<LoggingService> {
    let dir = ensure_dir().ok()?;
    LoggingService::new(&dir, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring failures
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Export file from the command line, falling back to configuration
pub fn export_path(file: Option<PathBuf>, config: &Config) -> Result<PathBuf> {
    file.or_else(|| config.financier_json.clone()).ok_or_else(|| {
        anyhow!(
            "No Financier export given. Pass a file or set {} / financier.exportPath",
            ENV_FINANCIER_JSON
        )
    })
}

/// Read an export and map it into an import plan
pub fn load_plan(path: &Path) -> Result<ImportPlan> {
    let export = Export::load(path)
        .with_context(|| format!("Failed to read Financier export {}", path.display()))?;
    let plan = ImportPlan::from_export(&export)
        .with_context(|| format!("Failed to map Financier export {}", path.display()))?;
    Ok(plan)
}
