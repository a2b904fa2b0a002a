//! Service layer
//!
//! Mapping, reference resolution and the import driver. Everything here
//! talks to the destination through the `Destination` port only.

pub mod import;
pub mod logging;
pub mod mapper;
pub mod plan;
pub mod resolver;
pub mod transfer;

pub use import::{ImportFailure, ImportObserver, ImportService, ImportStage, ImportSummary, NoopObserver};
pub use logging::{EventCount, LogEntry, LogEvent, LoggingService};
pub use plan::{ImportPlan, PlanSummary};
pub use resolver::{IdMap, INCOME_KEY};
pub use transfer::{FlattenedTransactions, TransferResolver};
