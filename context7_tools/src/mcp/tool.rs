use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::client::McpClient;
use super::protocol::RemoteTool;
use crate::command_runner::CommandSpec;
use crate::{TRANSPORT_ERROR, Tool, ToolDefinition, ToolRegistry, ToolResult, ToolSource};

/// A remote tool exposed through a shared MCP connection.
pub struct McpTool {
    client: Arc<Mutex<McpClient>>,
    remote: RemoteTool,
}

impl McpTool {
    #[must_use]
    pub const fn new(client: Arc<Mutex<McpClient>>, remote: RemoteTool) -> Self {
        Self { client, remote }
    }
}

#[async_trait]
impl Tool for McpTool {
    fn name(&self) -> &str {
        &self.remote.name
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.remote.name.clone(),
            description: self.remote.description.clone().unwrap_or_default(),
            input_schema: self.remote.input_schema.clone(),
        }
    }

    async fn execute(&self, input: Value) -> ToolResult {
        let mut client = self.client.lock().await;
        match client.call_tool(&self.remote.name, input).await {
            Ok(result) if result.is_error => ToolResult::error(result.text()),
            Ok(result) => ToolResult::success(result.text()),
            Err(e) if e.is_transport() => ToolResult::error(e.to_string()).with_error_type(TRANSPORT_ERROR),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }

    async fn shutdown(&self) {
        self.client.lock().await.shutdown().await;
    }
}

/// Starts the knowledge-base server and exposes its tools.
#[derive(Debug, Clone)]
pub struct McpLauncher {
    spec: CommandSpec,
    request_timeout: Duration,
}

impl McpLauncher {
    #[must_use]
    pub const fn new(spec: CommandSpec, request_timeout: Duration) -> Self {
        Self { spec, request_timeout }
    }
}

#[async_trait]
impl ToolSource for McpLauncher {
    async fn connect(&self) -> anyhow::Result<ToolRegistry> {
        let mut client = McpClient::spawn(&self.spec, self.request_timeout).await?;
        client.initialize().await?;
        let remote_tools = client.list_tools().await?;
        register_tools(client, remote_tools)
    }
}

/// Wrap every advertised tool around one shared client. A server that
/// advertises nothing counts as a failed connection.
fn register_tools(client: McpClient, remote_tools: Vec<RemoteTool>) -> anyhow::Result<ToolRegistry> {
    let client = Arc::new(Mutex::new(client));
    let mut registry = ToolRegistry::new();
    for remote in remote_tools {
        debug!("Registering remote tool: {}", remote.name);
        registry.add_tool(Box::new(McpTool::new(client.clone(), remote)));
    }

    anyhow::ensure!(!registry.is_empty(), "Tool server advertised no tools");
    info!(
        "Knowledge base ready with {} tools: {}",
        registry.len(),
        registry.names().join(", ")
    );
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    fn connected_client(reply: Value) -> McpClient {
        let (client_end, server_end) = tokio::io::duplex(16 * 1024);
        let (client_read, client_write) = tokio::io::split(client_end);
        let (server_read, mut server_write) = tokio::io::split(server_end);

        tokio::spawn(async move {
            let mut lines = BufReader::new(server_read).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let request: Value = serde_json::from_str(&line).unwrap();
                let response = json!({ "jsonrpc": "2.0", "id": request["id"], "result": reply });
                server_write
                    .write_all(format!("{response}\n").as_bytes())
                    .await
                    .unwrap();
            }
        });

        McpClient::from_streams(client_read, client_write, Duration::from_secs(5))
    }

    fn connected_tool(reply: Value) -> McpTool {
        let remote: RemoteTool = serde_json::from_value(json!({
            "name": "get-library-docs",
            "description": "Fetch documentation",
            "inputSchema": { "type": "object", "properties": { "topic": { "type": "string" } } }
        }))
        .unwrap();
        McpTool::new(Arc::new(Mutex::new(connected_client(reply))), remote)
    }

    #[tokio::test]
    async fn definition_mirrors_remote_tool() {
        let tool = connected_tool(json!({}));
        let def = tool.definition();
        assert_eq!(def.name, "get-library-docs");
        assert_eq!(def.description, "Fetch documentation");
        assert!(def.input_schema["properties"]["topic"].is_object());
    }

    #[tokio::test]
    async fn execute_returns_text() {
        let tool = connected_tool(json!({ "content": [ { "type": "text", "text": "useEffect docs" } ] }));
        let result = tool.execute(json!({ "topic": "hooks" })).await;
        assert!(!result.is_error);
        assert_eq!(result.content, "useEffect docs");
    }

    #[tokio::test]
    async fn remote_error_flag_is_kept() {
        let tool = connected_tool(json!({
            "content": [ { "type": "text", "text": "library not found" } ],
            "isError": true
        }));
        let result = tool.execute(json!({})).await;
        assert!(result.is_error);
        assert_eq!(result.content, "library not found");
        assert_ne!(result.error_type.as_deref(), Some(TRANSPORT_ERROR));
    }

    #[tokio::test]
    async fn registry_lists_advertised_tools() {
        let remote: Vec<RemoteTool> = serde_json::from_value(json!([
            { "name": "resolve-library-id", "inputSchema": { "type": "object" } },
            { "name": "get-library-docs", "inputSchema": { "type": "object" } }
        ]))
        .unwrap();
        let registry = register_tools(connected_client(json!({})), remote).unwrap();
        assert_eq!(registry.names(), ["resolve-library-id", "get-library-docs"]);
    }

    #[tokio::test]
    async fn server_without_tools_is_rejected() {
        let err = register_tools(connected_client(json!({})), Vec::new()).unwrap_err();
        assert!(err.to_string().contains("no tools"));
    }
}
