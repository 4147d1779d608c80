//! Daemon entry point for the `DataKit` migration MCP server.
//!
//! Loads configuration, logs in to `DataKit` once, and serves the MCP
//! protocol over stdio or streamable HTTP.

mod config;

use std::sync::Arc;

use datakit_core::MigrationControlPlane;
use datakit_mcp::server::{McpHttpServerConfig, serve_stdio, serve_streamable_http};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::McpdConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = McpdConfig::from_args()?;
    init_tracing(&config.log_filter)?;

    info!(server = %config.session.server_url, "starting datakit-mcpd");
    let control = Arc::new(MigrationControlPlane::connect(&config.session).await?);

    if config.enable_stdio {
        serve_stdio(control).await
    } else {
        let http_config =
            McpHttpServerConfig::new(config.mcp_http_addr).with_stateful_mode(config.mcp_stateful);
        serve_streamable_http(control, http_config).await
    }
}

// stdout belongs to the stdio transport.
fn init_tracing(filter: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_new(filter)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
}
