//! Destination adapters
//!
//! - `actual`: an Actual Budget server reached through actual-http-api
//! - `memory`: an in-process budget for dry runs and tests

pub mod actual;
pub mod memory;

pub use actual::ActualHttpDestination;
pub use memory::InMemoryDestination;
