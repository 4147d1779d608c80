use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};

use crate::{MigrationMcp, helpers};

/// Parameters identifying one database server.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DatabaseServerParams {
    /// IP address of the host running the database.
    pub ip: String,
    /// Database port, e.g. "3306".
    pub port: String,
}

#[tool_router(router = tool_router_database, vis = "pub")]
impl MigrationMcp {
    #[tool(description = "List source (MySQL) database servers registered in DataKit. Passwords are masked.")]
    async fn list_source_databases(&self) -> Result<CallToolResult, ErrorData> {
        let endpoints = self
            .control()
            .list_source_databases()
            .await
            .map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(endpoints)?]))
    }

    #[tool(description = "List target (openGauss) database servers registered in DataKit. Passwords are masked.")]
    async fn list_target_databases(&self) -> Result<CallToolResult, ErrorData> {
        let endpoints = self
            .control()
            .list_target_databases()
            .await
            .map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(endpoints)?]))
    }

    #[tool(description = "List the databases held by a source (MySQL) server, identified by ip and port.")]
    async fn list_source_database_names(
        &self,
        Parameters(params): Parameters<DatabaseServerParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let names = self
            .control()
            .list_source_database_names(&params.ip, &params.port)
            .await
            .map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(names)?]))
    }

    #[tool(description = "List the databases held by a target (openGauss) server, identified by ip and port.")]
    async fn list_target_database_names(
        &self,
        Parameters(params): Parameters<DatabaseServerParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let names = self
            .control()
            .list_target_database_names(&params.ip, &params.port)
            .await
            .map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(names)?]))
    }
}
