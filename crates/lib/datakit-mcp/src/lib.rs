//! MCP server implementation for datakit-mcp.
//!
//! This crate wires the migration control plane into rmcp tool handlers and
//! exposes the MCP-facing API surface for inventory lookups and migration
//! task management.

mod helpers;
mod tools;
pub mod server;

use std::sync::Arc;

use datakit_core::MigrationControlPlane;
use rmcp::{
    ErrorData,
    ServerHandler,
    handler::server::tool::ToolRouter,
    tool,
    tool_handler,
    tool_router,
};
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};

const SERVER_INSTRUCTIONS: &str = r"datakit-mcp manages MySQL to openGauss data migration tasks in DataKit.

Workflow:
1. Find the databases registered in DataKit:
   - `list_source_databases` for MySQL servers (source side).
   - `list_target_databases` for openGauss servers (target side).
   Passwords are always masked in these listings.
2. Pick a source and a target server by `ip` and `port`, then list the databases they hold with
   `list_source_database_names` and `list_target_database_names`.
3. Create a task with `create_migration_task`. Both databases must exist on the chosen servers.
   `task_name` is optional and defaults to `task_<source_db>_to_<target_db>`.
4. Check tasks with `list_migration_tasks` and start one by name with `start_migration_task`.

Notes:
- Ports are passed as strings, exactly as listed by the database listings.
- Task status is one of `not_started`, `running`, `completed`.
- Use `help` for the tool list. `health` returns `ok`.";

/// MCP server wrapper around the migration control plane.
#[derive(Clone)]
pub struct MigrationMcp {
    tool_router: ToolRouter<Self>,
    control: Arc<MigrationControlPlane>,
}

impl MigrationMcp {
    /// Creates a new server using a shared control plane handle.
    #[must_use]
    pub fn with_control(control: Arc<MigrationControlPlane>) -> Self {
        let tool_router = Self::tool_router_core()
            + Self::tool_router_database()
            + Self::tool_router_task()
            + Self::tool_router_context();
        Self {
            tool_router,
            control,
        }
    }

    pub(crate) fn control(&self) -> &MigrationControlPlane {
        &self.control
    }
}

#[tool_router(router = tool_router_core, vis = "pub")]
impl MigrationMcp {
    #[tool(description = "Health check. Returns 'ok'.")]
    async fn health(&self) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![Content::text("ok")]))
    }
}

#[tool_handler]
impl ServerHandler for MigrationMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
