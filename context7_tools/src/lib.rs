pub mod command_runner;
pub mod mcp;

pub use command_runner::{CommandSpec, build_command};
pub use context7_core::ToolDefinition;
pub use mcp::{McpClient, McpError, McpLauncher, McpTool};

use std::time::Instant;

use async_trait::async_trait;

/// `error_type` marking a result whose tool connection is no longer usable.
pub const TRANSPORT_ERROR: &str = "transport_error";

/// Result of tool execution
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
    pub bytes: usize,
    pub duration_ms: Option<u128>,
    pub error_type: Option<String>,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        let content = content.into();
        let bytes = content.len();
        Self {
            content,
            is_error: false,
            bytes,
            duration_ms: None,
            error_type: None,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        let content = content.into();
        let bytes = content.len();
        Self {
            content,
            is_error: true,
            bytes,
            duration_ms: None,
            error_type: Some("tool_error".to_string()),
        }
    }

    #[must_use]
    pub fn with_error_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = Some(error_type.into());
        self
    }

    /// Whether the underlying connection failed, as opposed to the tool
    /// itself reporting an error.
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        self.error_type.as_deref() == Some(TRANSPORT_ERROR)
    }
}

/// Tool trait
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn definition(&self) -> ToolDefinition;
    async fn execute(&self, input: serde_json::Value) -> ToolResult;

    /// Release whatever backs the tool. Called once per tool on shutdown.
    async fn shutdown(&self) {}
}

/// Something that can produce a ready set of tools, such as a freshly
/// started knowledge-base server.
#[async_trait]
pub trait ToolSource: Send + Sync {
    async fn connect(&self) -> anyhow::Result<ToolRegistry>;
}

/// Tool registry
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn add_tool(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub async fn execute(&self, name: &str, input: serde_json::Value) -> ToolResult {
        for tool in &self.tools {
            if tool.name() == name {
                let started = Instant::now();
                let mut result = tool.execute(input).await;
                result.duration_ms = Some(started.elapsed().as_millis());
                result.bytes = result.content.len();
                if result.is_error && result.error_type.is_none() {
                    result.error_type = Some("tool_error".to_string());
                }
                return result;
            }
        }
        ToolResult::error(format!("Unknown tool: {name}")).with_error_type("unknown_tool")
    }

    pub async fn shutdown(&self) {
        for tool in &self.tools {
            tool.shutdown().await;
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "echo".into(),
                description: "Echo the input".into(),
                input_schema: json!({ "type": "object" }),
            }
        }

        async fn execute(&self, input: serde_json::Value) -> ToolResult {
            ToolResult::success(input.to_string())
        }
    }

    #[test]
    fn test_tool_result_success() {
        let r = ToolResult::success("ok".to_string());
        assert_eq!(r.content, "ok");
        assert_eq!(r.bytes, 2);
        assert!(!r.is_error);
    }

    #[test]
    fn test_tool_result_error() {
        let r = ToolResult::error("fail".to_string());
        assert_eq!(r.content, "fail");
        assert!(r.is_error);
        assert!(!r.is_transport_error());
        assert!(r.with_error_type(TRANSPORT_ERROR).is_transport_error());
    }

    #[tokio::test]
    async fn test_registry_dispatch() {
        let mut registry = ToolRegistry::new();
        registry.add_tool(Box::new(EchoTool));

        assert_eq!(registry.names(), ["echo"]);
        assert_eq!(registry.definitions()[0].name, "echo");

        let result = registry.execute("echo", json!({ "q": 1 })).await;
        assert_eq!(result.content, r#"{"q":1}"#);
        assert!(result.duration_ms.is_some());
    }

    #[tokio::test]
    async fn test_registry_unknown_tool() {
        let registry = ToolRegistry::default();
        let result = registry.execute("missing", json!({})).await;
        assert!(result.is_error);
        assert_eq!(result.error_type.as_deref(), Some("unknown_tool"));
    }
}
