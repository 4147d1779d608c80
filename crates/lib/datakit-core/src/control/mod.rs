use crate::error::DataKitResult;
use crate::gateway::Gateway;
use crate::session::{SessionConfig, acquire_session};

pub mod hosts;
pub mod inventory;
pub mod tasks;

pub use tasks::CreateTaskRequest;

/// Entry point for every migration operation.
///
/// Holds the authenticated gateway and nothing else; all state lives in
/// `DataKit` and is re-fetched per call.
#[derive(Clone, Debug)]
pub struct MigrationControlPlane {
    gateway: Gateway,
}

impl MigrationControlPlane {
    #[must_use]
    pub const fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Logs in and builds a control plane around the resulting session.
    ///
    /// # Errors
    /// Returns `DataKitError` if the login fails.
    pub async fn connect(config: &SessionConfig) -> DataKitResult<Self> {
        Ok(Self::new(acquire_session(config).await?))
    }
}
