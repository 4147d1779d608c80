//! Wire models and endpoint constants for the `DataKit` data-migration plugin.
//!
//! This crate defines the shapes exchanged with `DataKit`: database clusters and
//! their endpoints, migration tasks, execution hosts, and the task submission
//! payload. Nothing here performs I/O.

pub mod models;
pub mod schema;

pub use models::*;
