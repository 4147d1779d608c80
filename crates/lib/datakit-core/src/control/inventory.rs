use datakit_model::schema::{
    SOURCE_CLUSTERS_PATH,
    SOURCE_CLUSTER_DBS_PATH,
    TARGET_CLUSTERS_PATH,
    TARGET_CLUSTER_DBS_PATH,
};
use datakit_model::{
    SourceClusterPage,
    SourceEndpoint,
    TargetClusterPage,
    TargetDatabaseName,
    TargetEndpoint,
    flatten,
};

use super::MigrationControlPlane;
use crate::error::{DataKitError, DataKitResult, EndpointSide};
use crate::gateway::ApiScope;

impl MigrationControlPlane {
    /// Lists every registered source endpoint, credentials included.
    ///
    /// # Errors
    /// Returns `DataKitError` if the cluster listing fails.
    pub async fn list_source_endpoints(&self) -> DataKitResult<Vec<SourceEndpoint>> {
        let response = self
            .gateway
            .get(ApiScope::Resource, SOURCE_CLUSTERS_PATH)
            .await?;
        response.ensure_success()?;
        let page: SourceClusterPage = response.decode("/data")?;
        Ok(flatten(page.source_clusters))
    }

    /// Lists every registered target endpoint, credentials included.
    ///
    /// # Errors
    /// Returns `DataKitError` if the cluster listing fails.
    pub async fn list_target_endpoints(&self) -> DataKitResult<Vec<TargetEndpoint>> {
        let response = self
            .gateway
            .get(ApiScope::Resource, TARGET_CLUSTERS_PATH)
            .await?;
        response.ensure_success()?;
        let page: TargetClusterPage = response.decode("/data")?;
        Ok(flatten(page.target_clusters))
    }

    /// Lists source endpoints with passwords masked.
    ///
    /// # Errors
    /// Returns `DataKitError` if the cluster listing fails.
    pub async fn list_source_databases(&self) -> DataKitResult<Vec<SourceEndpoint>> {
        let endpoints = self.list_source_endpoints().await?;
        Ok(endpoints.into_iter().map(SourceEndpoint::redacted).collect())
    }

    /// Lists target endpoints with passwords masked.
    ///
    /// # Errors
    /// Returns `DataKitError` if the cluster listing fails.
    pub async fn list_target_databases(&self) -> DataKitResult<Vec<TargetEndpoint>> {
        let endpoints = self.list_target_endpoints().await?;
        Ok(endpoints.into_iter().map(TargetEndpoint::redacted).collect())
    }

    /// Finds the first source endpoint at exactly `ip`:`port`.
    ///
    /// # Errors
    /// Returns `EndpointNotFound` when nothing matches.
    pub async fn find_source_endpoint(&self, ip: &str, port: &str) -> DataKitResult<SourceEndpoint> {
        self.list_source_endpoints()
            .await?
            .into_iter()
            .find(|endpoint| endpoint.matches(ip, port))
            .ok_or_else(|| not_found(EndpointSide::Source, ip, port))
    }

    /// Finds the first target endpoint at exactly `ip`:`port`.
    ///
    /// # Errors
    /// Returns `EndpointNotFound` when nothing matches.
    pub async fn find_target_endpoint(&self, ip: &str, port: &str) -> DataKitResult<TargetEndpoint> {
        self.list_target_endpoints()
            .await?
            .into_iter()
            .find(|endpoint| endpoint.matches(ip, port))
            .ok_or_else(|| not_found(EndpointSide::Target, ip, port))
    }

    /// Lists the databases on the source endpoint at `ip`:`port`.
    ///
    /// # Errors
    /// Returns `EndpointNotFound` for unknown coordinates and
    /// `UpstreamRejected` if `DataKit` refuses the lookup.
    pub async fn list_source_database_names(&self, ip: &str, port: &str) -> DataKitResult<Vec<String>> {
        let endpoint = self.find_source_endpoint(ip, port).await?;
        self.source_database_names(&endpoint).await
    }

    /// Lists the databases on the target endpoint at `ip`:`port`.
    ///
    /// # Errors
    /// Returns `EndpointNotFound` for unknown coordinates and
    /// `UpstreamRejected` if `DataKit` refuses the lookup.
    pub async fn list_target_database_names(&self, ip: &str, port: &str) -> DataKitResult<Vec<String>> {
        let endpoint = self.find_target_endpoint(ip, port).await?;
        self.target_database_names(&endpoint).await
    }

    pub(crate) async fn source_database_names(
        &self,
        endpoint: &SourceEndpoint,
    ) -> DataKitResult<Vec<String>> {
        let form = [
            ("url", endpoint.url.as_str()),
            ("username", endpoint.username.as_str()),
            ("password", endpoint.password.as_str()),
        ];
        let response = self
            .gateway
            .post_form(ApiScope::Resource, SOURCE_CLUSTER_DBS_PATH, &form)
            .await?;
        response.ensure_success()?;
        response.decode("/data")
    }

    pub(crate) async fn target_database_names(
        &self,
        endpoint: &TargetEndpoint,
    ) -> DataKitResult<Vec<String>> {
        let response = self
            .gateway
            .post_json(ApiScope::Resource, TARGET_CLUSTER_DBS_PATH, endpoint)
            .await?;
        response.ensure_success()?;
        let names: Vec<TargetDatabaseName> = response.decode("/data")?;
        Ok(names.into_iter().map(|name| name.db_name).collect())
    }
}

fn not_found(side: EndpointSide, ip: &str, port: &str) -> DataKitError {
    DataKitError::EndpointNotFound {
        side,
        ip: ip.to_string(),
        port: port.to_string(),
    }
}
