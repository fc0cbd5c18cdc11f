//! Jira/Confluence MCP server binary
//!
//! ## Usage
//!
//! ```bash
//! JIRA_BASE_URL=https://jira.example.com \
//! JIRA_PERSONAL_ACCESS_TOKEN=... \
//! CONFLUENCE_BASE_URL=https://confluence.example.com \
//! CONFLUENCE_PERSONAL_ACCESS_TOKEN=... \
//! ./target/debug/jira_confluence_mcp
//! ```
//!
//! ## Environment Variables
//!
//! - `JIRA_BASE_URL`, `JIRA_PERSONAL_ACCESS_TOKEN` (required)
//! - `CONFLUENCE_BASE_URL`, `CONFLUENCE_PERSONAL_ACCESS_TOKEN` (required)
//! - `AZURE_OPENAI_ENDPOINT`, `AZURE_OPENAI_API_KEY`,
//!   `AZURE_OPENAI_CHAT_DEPLOYMENT_NAME`, `AZURE_OPENAI_API_VERSION`
//!   (optional; enables the image-description tools)
//! - `RUST_LOG` (optional): tracing filter, defaults to `info`

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use jira_confluence_mcp::config::Config;
use jira_confluence_mcp::mcp::McpServer;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // stdout carries the MCP transport; all diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    if config.azure.is_some() {
        tracing::info!("Azure OpenAI configured, image description enabled");
    } else {
        tracing::info!("no Azure OpenAI configuration, image description disabled");
    }

    let server = McpServer::new(&config)?;
    server.run().await
}
