use datakit_core::CreateTaskRequest;
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

/// Parameters for creating a MySQL to openGauss migration task.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CreateMigrationTaskParams {
    /// IP address of the source (MySQL) server.
    pub source_ip: String,
    /// Port of the source (MySQL) server.
    pub source_port: String,
    /// Database on the source server to migrate.
    pub source_db: String,
    /// IP address of the target (openGauss) server.
    pub target_ip: String,
    /// Port of the target (openGauss) server.
    pub target_port: String,
    /// Database on the target server to migrate into.
    pub target_db: String,
    /// Task name. Defaults to `task_<source_db>_to_<target_db>` when omitted.
    pub task_name: Option<String>,
}

impl From<CreateMigrationTaskParams> for CreateTaskRequest {
    fn from(params: CreateMigrationTaskParams) -> Self {
        Self {
            source_ip: params.source_ip,
            source_port: params.source_port,
            source_db: params.source_db,
            target_ip: params.target_ip,
            target_port: params.target_port,
            target_db: params.target_db,
            task_name: params.task_name,
        }
    }
}

/// Parameters naming an existing migration task.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StartMigrationTaskParams {
    /// Exact name of the task to start.
    pub task_name: String,
}

/// Result of a task creation.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct TaskCreated {
    pub task_name: String,
}

/// Result of a task start.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct TaskStarted {
    pub task_name: String,
    pub started: bool,
}

#[tool_router(router = tool_router_task, vis = "pub")]
impl MigrationMcp {
    #[tool(description = "Create a MySQL to openGauss data migration task. Both databases must exist. Returns the task name.")]
    async fn create_migration_task(
        &self,
        Parameters(params): Parameters<CreateMigrationTaskParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let task_name = self
            .control()
            .create_task(params.into())
            .await
            .map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(TaskCreated { task_name })?]))
    }

    #[tool(description = "List migration tasks with their status and source/target databases.")]
    async fn list_migration_tasks(&self) -> Result<CallToolResult, ErrorData> {
        let tasks = self
            .control()
            .list_tasks()
            .await
            .map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(tasks)?]))
    }

    #[tool(description = "Start a created migration task by name.")]
    async fn start_migration_task(
        &self,
        Parameters(params): Parameters<StartMigrationTaskParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.control()
            .start_task(&params.task_name)
            .await
            .map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(TaskStarted {
            task_name: params.task_name,
            started: true,
        })?]))
    }
}
