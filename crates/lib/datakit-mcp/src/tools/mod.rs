//! MCP tool modules.
//!
//! Tools are grouped by domain: database inventory lookups, migration task
//! lifecycle, and contextual help.

pub mod database;
pub mod task;
mod context;
