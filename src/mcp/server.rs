//! MCP server loop
//!
//! Reads JSON-RPC messages line by line from stdin and writes responses to
//! stdout. All diagnostics go to stderr via tracing; stdout belongs to the
//! protocol.

use std::io::{BufRead, Write};

use serde_json::Value;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;

use super::handlers::ToolHandlers;
use super::protocol::*;
use super::tools::get_tools;

pub struct McpServer {
    handlers: ToolHandlers,
}

impl McpServer {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            handlers: ToolHandlers::new(config)?,
        })
    }

    /// Run the server until stdin closes.
    pub async fn run(&self) -> anyhow::Result<()> {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();

        info!("server started, waiting for messages");

        for line in stdin.lock().lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            debug!("<- {}", preview(&line));

            let response = self.handle(&line).await;
            let out = serde_json::to_string(&response)?;
            debug!("-> {}", preview(&out));

            writeln!(stdout, "{}", out)?;
            stdout.flush()?;
        }

        info!("server shutting down");
        Ok(())
    }

    /// Handle a single JSON-RPC message
    async fn handle(&self, msg: &str) -> JsonRpcResponse {
        let req: JsonRpcRequest = match serde_json::from_str(msg) {
            Ok(r) => r,
            Err(e) => return JsonRpcResponse::error(None, PARSE_ERROR, e.to_string()),
        };

        let id = req.id.clone();

        match req.method.as_str() {
            "initialize" => {
                let result = InitializeResult {
                    protocol_version: PROTOCOL_VERSION.into(),
                    capabilities: ServerCapabilities {
                        tools: ToolsCapability {
                            list_changed: false,
                        },
                    },
                    server_info: ServerInfo {
                        name: "jira-confluence-mcp".into(),
                        version: env!("CARGO_PKG_VERSION").into(),
                    },
                };
                serialized(id, result)
            }

            "notifications/initialized" => JsonRpcResponse::success(id, Value::Null),

            "tools/list" => serialized(id, ToolsListResult { tools: get_tools() }),

            "tools/call" => {
                let params: ToolCallParams = match serde_json::from_value(req.params) {
                    Ok(p) => p,
                    Err(e) => return JsonRpcResponse::error(id, INVALID_PARAMS, e.to_string()),
                };

                info!(tool = %params.name, "calling tool");
                let result = self.handlers.handle(&params.name, params.arguments).await;
                serialized(id, result)
            }

            _ => JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                format!("Unknown method: {}", req.method),
            ),
        }
    }
}

fn serialized<T: serde::Serialize>(id: Option<Value>, result: T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(v) => JsonRpcResponse::success(id, v),
        Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, format!("Serialization error: {}", e)),
    }
}

fn preview(line: &str) -> &str {
    let end = line
        .char_indices()
        .take(120)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    &line[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_server() -> McpServer {
        let config = Config {
            jira: crate::config::JiraConfig {
                base_url: "http://jira.local".into(),
                token: "t".into(),
                timeout_seconds: 5,
            },
            confluence: crate::config::ConfluenceConfig {
                base_url: "http://confluence.local".into(),
                token: "t".into(),
                timeout_seconds: 5,
            },
            azure: None,
        };
        McpServer::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_handshake() {
        let server = test_server();
        let response = server
            .handle(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#)
            .await;
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["result"]["serverInfo"]["name"], "jira-confluence-mcp");
        assert_eq!(value["result"]["protocolVersion"], PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn test_tools_list_exposes_all_tools() {
        let server = test_server();
        let response = server
            .handle(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list","params":{}}"#)
            .await;
        let value = serde_json::to_value(&response).unwrap();
        let tools = value["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), get_tools().len());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let server = test_server();
        let response = server
            .handle(r#"{"jsonrpc":"2.0","id":3,"method":"resources/list","params":{}}"#)
            .await;
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["error"]["code"], METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_parse_error() {
        let server = test_server();
        let response = server.handle("this is not json").await;
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["error"]["code"], PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_tool_call_with_bad_params_shape() {
        let server = test_server();
        let response = server
            .handle(r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"arguments":{}}}"#)
            .await;
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["error"]["code"], INVALID_PARAMS);
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let short = "abc";
        assert_eq!(preview(short), "abc");
        let long = "x".repeat(300);
        assert_eq!(preview(&long).len(), 120);
        let unicode = "é".repeat(200);
        assert_eq!(preview(&unicode).chars().count(), 120);
    }

    #[tokio::test]
    async fn test_tool_call_result_shape() {
        let server = test_server();
        let response = server
            .handle(
                r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"nope","arguments":{}}}"#,
            )
            .await;
        let value = serde_json::to_value(&response).unwrap();
        // Tool-level failures come back as successful JSON-RPC responses
        // carrying an isError tool result, so the agent can read them.
        assert!(value.get("error").is_none());
        assert_eq!(value["result"]["isError"], true);
    }
}
