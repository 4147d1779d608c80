//! Core services for datakit-mcp.
//!
//! This crate logs in to `DataKit`, executes authenticated calls against the
//! data-migration plugin, and orchestrates migration tasks: inventory lookups,
//! execution host resolution, task creation, listing and start.

pub mod control;
pub mod error;
pub mod gateway;
pub mod session;

pub use control::{CreateTaskRequest, MigrationControlPlane};
pub use error::{DataKitError, DataKitResult, EndpointSide};
pub use gateway::{ApiResponse, ApiScope, Gateway};
pub use session::{Credential, SessionConfig, acquire_session, encrypt_password};
