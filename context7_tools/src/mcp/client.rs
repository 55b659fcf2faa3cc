//! Line-oriented JSON-RPC client for an MCP server running as a child process.

use std::time::Duration;

use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter, Lines};
use tokio::process::Child;
use tracing::{debug, info, trace, warn};

use super::error::{McpError, Result};
use super::protocol::{
    CallToolParams, CallToolResult, IncomingMessage, InitializeParams, InitializeResult,
    JsonRpcNotification, JsonRpcRequest, ListToolsResult, METHOD_NOT_FOUND, RemoteTool,
};
use crate::command_runner::{CommandSpec, build_command};

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// One connection to an MCP server.
///
/// Requests are strictly sequential: each call writes one request and reads
/// until the matching response arrives, answering or skipping whatever the
/// server sends in between.
pub struct McpClient {
    reader: Lines<BufReader<BoxedReader>>,
    writer: BufWriter<BoxedWriter>,
    child: Option<Child>,
    next_id: u64,
    request_timeout: Duration,
}

impl McpClient {
    /// Launch the server process and attach to its stdio.
    pub async fn spawn(spec: &CommandSpec, request_timeout: Duration) -> Result<Self> {
        info!("Starting tool server: {}", spec.display());

        let mut child = build_command(spec)
            .spawn()
            .map_err(|source| McpError::Spawn {
                command: spec.display(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or_else(|| McpError::Spawn {
            command: spec.display(),
            source: std::io::Error::other("Failed to capture stdin"),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| McpError::Spawn {
            command: spec.display(),
            source: std::io::Error::other("Failed to capture stdout"),
        })?;

        let mut client = Self::from_streams(stdout, stdin, request_timeout);
        client.child = Some(child);
        Ok(client)
    }

    /// Attach to an already-connected pair of streams.
    pub fn from_streams(
        reader: impl AsyncRead + Send + Unpin + 'static,
        writer: impl AsyncWrite + Send + Unpin + 'static,
        request_timeout: Duration,
    ) -> Self {
        let reader: BoxedReader = Box::new(reader);
        let writer: BoxedWriter = Box::new(writer);
        Self {
            reader: BufReader::new(reader).lines(),
            writer: BufWriter::new(writer),
            child: None,
            next_id: 1,
            request_timeout,
        }
    }

    /// Perform the `initialize` handshake and confirm with
    /// `notifications/initialized`.
    pub async fn initialize(&mut self) -> Result<InitializeResult> {
        let params = serde_json::to_value(InitializeParams::default())?;
        let result = self.request("initialize", Some(params)).await?;
        let init: InitializeResult = parse_result("initialize", result)?;

        self.notify("notifications/initialized", None).await?;

        match &init.server_info {
            Some(server) => info!(
                "Connected to tool server {} {} (protocol {})",
                server.name, server.version, init.protocol_version
            ),
            None => info!("Connected to tool server (protocol {})", init.protocol_version),
        }
        Ok(init)
    }

    pub async fn list_tools(&mut self) -> Result<Vec<RemoteTool>> {
        let result = self.request("tools/list", Some(json!({}))).await?;
        let list: ListToolsResult = parse_result("tools/list", result)?;
        debug!(
            "Tool server offers: {}",
            list.tools
                .iter()
                .map(|t| t.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(list.tools)
    }

    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<CallToolResult> {
        let params = serde_json::to_value(CallToolParams {
            name: name.to_string(),
            arguments,
        })?;
        let result = self.request("tools/call", Some(params)).await?;
        parse_result("tools/call", result)
    }

    /// Stop the server process, if this client owns one.
    pub async fn shutdown(&mut self) {
        let _ = self.writer.shutdown().await;
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                warn!("Failed to stop tool server: {e}");
            } else {
                debug!("Tool server stopped");
            }
        }
    }

    async fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id;
        self.next_id += 1;

        let request = JsonRpcRequest::new(id, method, params);
        let timeout = self.request_timeout;

        let exchange = async {
            self.send(&serde_json::to_value(&request)?).await?;
            self.read_response(id).await
        };

        tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| McpError::Timeout(method.to_string()))?
    }

    async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<()> {
        let notification = JsonRpcNotification::new(method, params);
        self.send(&serde_json::to_value(&notification)?).await
    }

    async fn send(&mut self, message: &Value) -> Result<()> {
        let line = serde_json::to_string(message)?;
        trace!("-> {line}");
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn read_response(&mut self, id: u64) -> Result<Value> {
        loop {
            let Some(line) = self.reader.next_line().await? else {
                return Err(McpError::TransportClosed);
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            trace!("<- {line}");

            let message: IncomingMessage = match serde_json::from_str(line) {
                Ok(message) => message,
                Err(e) => {
                    debug!("Skipping non-JSON-RPC output from tool server: {e}");
                    continue;
                }
            };

            match (&message.method, &message.id) {
                (Some(method), Some(request_id)) => {
                    self.answer_server_request(method, request_id.clone()).await?;
                }
                (Some(method), None) => {
                    debug!("Ignoring tool server notification: {method}");
                }
                (None, Some(response_id)) if response_id.as_u64() == Some(id) => {
                    if let Some(error) = message.error {
                        return Err(McpError::Rpc {
                            code: error.code,
                            message: error.message,
                        });
                    }
                    return Ok(message.result.unwrap_or(Value::Null));
                }
                (None, other) => {
                    debug!("Ignoring response for unknown request id: {other:?}");
                }
            }
        }
    }

    async fn answer_server_request(&mut self, method: &str, id: Value) -> Result<()> {
        let reply = if method == "ping" {
            json!({ "jsonrpc": "2.0", "id": id, "result": {} })
        } else {
            debug!("Rejecting unsupported server request: {method}");
            json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": METHOD_NOT_FOUND, "message": format!("Method not supported: {method}") }
            })
        };
        self.send(&reply).await
    }
}

fn parse_result<T: serde::de::DeserializeOwned>(method: &str, result: Value) -> Result<T> {
    serde_json::from_value(result).map_err(|e| McpError::UnexpectedResponse {
        method: method.to_string(),
        detail: e.to_string(),
    })
}
