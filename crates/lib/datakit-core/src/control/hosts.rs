use datakit_model::HostRecord;
use datakit_model::schema::HOSTS_PATH;
use tracing::debug;

use super::MigrationControlPlane;
use crate::error::{DataKitError, DataKitResult};
use crate::gateway::ApiScope;

impl MigrationControlPlane {
    /// Lists the run host ids of execution hosts that are installed and ready.
    ///
    /// # Errors
    /// Returns `NoEligibleHosts` when no host is ready, or any error from the
    /// host listing.
    pub async fn list_ready_host_ids(&self) -> DataKitResult<Vec<String>> {
        let response = self.gateway.get(ApiScope::Resource, HOSTS_PATH).await?;
        response.ensure_success()?;
        let hosts: Vec<HostRecord> = response.decode("/data")?;

        let ready: Vec<String> = hosts
            .iter()
            .filter_map(HostRecord::ready_host_id)
            .map(str::to_string)
            .collect();
        if ready.is_empty() {
            return Err(DataKitError::NoEligibleHosts);
        }

        debug!(total = hosts.len(), ready = ready.len(), "resolved execution hosts");
        Ok(ready)
    }
}
