//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The import
//! pipeline depends only on these traits, not on concrete destinations.

mod destination;

pub use destination::Destination;
