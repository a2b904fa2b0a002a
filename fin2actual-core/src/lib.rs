//! fin2actual core - Financier to Actual Budget import
//!
//! Hexagonal layout:
//!
//! - **domain**: Financier source records and destination-shaped entities
//! - **ports**: the `Destination` trait the import runs against
//! - **services**: mapping, id resolution, transfer pairing, the import driver
//! - **adapters**: Actual over HTTP, and an in-memory destination

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use adapters::{ActualHttpDestination, InMemoryDestination};
use config::Config;
use ports::Destination;
use services::ImportService;

pub use domain::result::{Error, OperationResult};
pub use domain::{Account, Export, Transaction};
pub use services::{ImportPlan, ImportSummary};

/// Configuration plus the destination an import will write to
pub struct Fin2ActualContext {
    pub config: Config,
    pub destination: Arc<dyn Destination>,
    pub import_service: ImportService,
}

impl Fin2ActualContext {
    /// Build a context from the settings in `dir`.
    ///
    /// With `dry_run` the import goes to an in-memory budget and the Actual
    /// settings are not required.
    pub fn new(dir: &Path, dry_run: bool) -> Result<Self> {
        let config = Config::load(dir)?;
        Self::with_config(config, dry_run)
    }

    pub fn with_config(config: Config, dry_run: bool) -> Result<Self> {
        let destination: Arc<dyn Destination> = if dry_run {
            Arc::new(InMemoryDestination::new())
        } else {
            Arc::new(ActualHttpDestination::new(&config.actual)?)
        };
        let import_service = ImportService::new(Arc::clone(&destination));

        Ok(Self {
            config,
            destination,
            import_service,
        })
    }
}
