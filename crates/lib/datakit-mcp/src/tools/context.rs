use rmcp::{
    ErrorData,
    model::{CallToolResult, Content},
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};

use crate::MigrationMcp;

/// Payload listing the MCP commands.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct HelpCommands {
    pub commands: Vec<String>,
}

impl Default for HelpCommands {
    fn default() -> Self {
        Self {
            commands: vec![
                "help - List the MCP commands of this server.".to_string(),
                "health - Returns 'ok'.".to_string(),
                "list_source_databases - List source (MySQL) servers registered in DataKit."
                    .to_string(),
                "list_target_databases - List target (openGauss) servers registered in DataKit."
                    .to_string(),
                "list_source_database_names - List databases on a source server (ip, port)."
                    .to_string(),
                "list_target_database_names - List databases on a target server (ip, port)."
                    .to_string(),
                "create_migration_task - Create a migration task between two existing databases."
                    .to_string(),
                "list_migration_tasks - List migration tasks with status and databases."
                    .to_string(),
                "start_migration_task - Start a migration task by name.".to_string(),
            ],
        }
    }
}

#[tool_router(router = tool_router_context, vis = "pub")]
impl MigrationMcp {
    #[tool(description = "List the MCP commands of this server.")]
    async fn help(&self) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![Content::json(HelpCommands::default())?]))
    }
}
