//! Thin MCP client consumed by the agentic core.
//!
//! The core only needs two operations against the MCP plane: discover which
//! servers are connected, and send a free-form query to one of them. Richer
//! MCP surface (resource subscriptions, sampling, server lifecycle) is out
//! of scope here — server processes are spawned and owned by the caller.

use std::collections::HashMap;
use std::sync::Arc;

use rmcp::ServiceExt;
use rmcp::model::CallToolRequestParams;
use rmcp::service::{RoleClient, RunningService};
use rmcp::transport::{ConfigureCommandExt, TokioChildProcess};
use tokio::process::Command;
use tokio::sync::RwLock;

use crate::error::McpError;

type Session = RunningService<RoleClient, ()>;

/// A connected MCP server, keyed by a caller-chosen name.
///
/// Spawned as a child process communicating over stdio, per the MCP stdio
/// transport. The client owns the session for the lifetime of the process.
pub struct McpClient {
    servers: RwLock<HashMap<String, Arc<Session>>>,
}

impl McpClient {
    /// Create a client with no servers connected yet.
    pub fn new() -> Self {
        Self {
            servers: RwLock::new(HashMap::new()),
        }
    }

    /// Spawn `command args...` as an MCP stdio server and register it under `name`.
    ///
    /// Replaces any existing connection registered under the same name.
    pub async fn connect_stdio(
        &self,
        name: impl Into<String>,
        command: &str,
        args: &[&str],
    ) -> Result<(), McpError> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let transport = TokioChildProcess::new(Command::new(command).configure(|cmd| {
            cmd.args(&args);
        }))
        .map_err(|e| McpError::Transport(e.to_string()))?;

        let session = ()
            .serve(transport)
            .await
            .map_err(|e| McpError::Initialization(e.to_string()))?;

        self.servers
            .write()
            .await
            .insert(name.into(), Arc::new(session));
        Ok(())
    }

    /// Names of the servers currently connected.
    pub async fn list_available_servers(&self) -> Vec<String> {
        self.servers.read().await.keys().cloned().collect()
    }

    /// Send a free-form query to a connected server.
    ///
    /// The query is dispatched as a `tools/call` against the server's first
    /// advertised tool (or one literally named `query`, if present), with the
    /// text passed under the `query` argument. Returned text content blocks
    /// are concatenated with newlines.
    pub async fn query(&self, server: &str, text: &str) -> Result<String, McpError> {
        let session = {
            let servers = self.servers.read().await;
            servers
                .get(server)
                .cloned()
                .ok_or_else(|| McpError::UnknownServer(server.to_string()))?
        };

        let tools = session
            .list_all_tools()
            .await
            .map_err(|e| McpError::QueryFailed(e.to_string()))?;
        let tool_name = tools
            .iter()
            .find(|t| t.name == "query")
            .or_else(|| tools.first())
            .ok_or_else(|| McpError::QueryFailed(format!("server {server} exposes no tools")))?
            .name
            .to_string();

        let mut arguments = serde_json::Map::new();
        arguments.insert(
            "query".to_string(),
            serde_json::Value::String(text.to_string()),
        );

        let result = session
            .call_tool(CallToolRequestParams::new(tool_name).with_arguments(arguments))
            .await
            .map_err(|e| McpError::QueryFailed(e.to_string()))?;

        if result.is_error.unwrap_or(false) {
            let msg = result
                .content
                .iter()
                .filter_map(|c| c.as_text())
                .map(|t| t.text.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            return Err(McpError::QueryFailed(msg));
        }

        Ok(result
            .content
            .iter()
            .filter_map(|c| c.as_text())
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

impl Default for McpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn mcp_client_is_send_sync() {
        _assert_send_sync::<McpClient>();
    }

    #[tokio::test]
    async fn list_available_servers_starts_empty() {
        let client = McpClient::new();
        assert!(client.list_available_servers().await.is_empty());
    }

    #[tokio::test]
    async fn query_unknown_server_fails() {
        let client = McpClient::new();
        let err = client.query("nonexistent", "hi").await.unwrap_err();
        assert!(matches!(err, McpError::UnknownServer(_)));
    }
}
