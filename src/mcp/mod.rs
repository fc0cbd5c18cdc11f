//! MCP (Model Context Protocol) server module
//!
//! Exposes the Jira/Confluence tools to an AI agent over JSON-RPC on
//! stdio.
//!
//! ```text
//! Agent ── JSON-RPC over stdio ──> McpServer
//!                                     │
//!                                     ├── Jira tools ──────────> JiraClient
//!                                     ├── Confluence tools ────> ConfluenceClient
//!                                     │     ├── page content ──> DocumentRewriter
//!                                     │     └── page tree ─────> PageTreeBuilder
//!                                     └── describe tools ──────> AzureOpenAiClient
//! ```

pub mod handlers;
pub mod protocol;
pub mod server;
pub mod tools;

pub use server::McpServer;
