//! Retrieval-augmented synthesis through model tool calls.

use std::sync::Arc;

use async_trait::async_trait;
use context7_core::{ChatMessage, LLMProvider, SynthesisRequest, Synthesizer, ToolCall};
use context7_tools::{ToolRegistry, ToolResult, ToolSource};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 8;

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Knowledge base unavailable: {0}")]
    Connect(#[source] anyhow::Error),

    #[error("Completion request failed: {0}")]
    Provider(#[source] anyhow::Error),

    #[error("Model returned an empty answer")]
    EmptyResponse,

    #[error("Model kept calling tools after {0} rounds")]
    ToolRoundLimit(usize),
}

/// [`Synthesizer`] that lets the model call knowledge-base tools.
///
/// The tool connection is opened on the first request and reused. A
/// transport failure drops it so the following request reconnects.
pub struct ToolAgent<P, T> {
    provider: P,
    source: T,
    model: Option<String>,
    max_tool_rounds: usize,
    registry: Mutex<Option<Arc<ToolRegistry>>>,
}

impl<P: LLMProvider, T: ToolSource> ToolAgent<P, T> {
    pub fn new(provider: P, source: T) -> Self {
        Self {
            provider,
            source,
            model: None,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            registry: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds.max(1);
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.get_default_model())
    }

    pub async fn is_connected(&self) -> bool {
        self.registry.lock().await.is_some()
    }

    /// Stop the tool process, if one is running.
    pub async fn shutdown(&self) {
        if let Some(registry) = self.registry.lock().await.take() {
            registry.shutdown().await;
            info!("Knowledge base connection closed");
        }
    }

    async fn registry(&self) -> Result<Arc<ToolRegistry>, SynthesisError> {
        let mut slot = self.registry.lock().await;
        if let Some(registry) = slot.as_ref() {
            return Ok(Arc::clone(registry));
        }

        info!("Connecting to knowledge base");
        let registry = Arc::new(self.source.connect().await.map_err(SynthesisError::Connect)?);
        *slot = Some(Arc::clone(&registry));
        Ok(registry)
    }

    async fn discard_connection(&self) {
        if self.registry.lock().await.take().is_some() {
            warn!("Knowledge base connection lost; reconnecting on next request");
        }
    }

    async fn run_tool_call(&self, registry: &ToolRegistry, call: &ToolCall) -> ToolResult {
        let name = call.function.name.as_str();
        let arguments = match parse_arguments(&call.function.arguments) {
            Ok(arguments) => arguments,
            Err(e) => {
                warn!("Tool {name} called with invalid arguments: {e}");
                return ToolResult::error(format!("Invalid arguments for {name}: {e}"));
            }
        };

        debug!("Calling tool {name} with {arguments}");
        let result = registry.execute(name, arguments).await;
        debug!(
            "Tool {name} returned {} bytes in {}ms (error: {})",
            result.bytes,
            result.duration_ms.unwrap_or_default(),
            result.is_error
        );
        result
    }

    async fn synthesize_inner(&self, request: &SynthesisRequest) -> Result<String, SynthesisError> {
        let registry = self.registry().await?;
        let tools = registry.definitions();
        let mut messages = request.to_messages();

        for round in 1..=self.max_tool_rounds {
            let response = self
                .provider
                .chat(&messages, &tools, self.model())
                .await
                .map_err(SynthesisError::Provider)?;

            if response.tool_calls.is_empty() {
                let answer = response.content.trim();
                if answer.is_empty() {
                    return Err(SynthesisError::EmptyResponse);
                }
                debug!("Answer ready after {round} round(s)");
                return Ok(answer.to_string());
            }

            info!("Round {round}: model requested {} tool call(s)", response.tool_calls.len());
            messages.push(ChatMessage::assistant_tool_calls(
                response.content,
                response.tool_calls.clone(),
            ));

            let mut transport_failed = false;
            for call in &response.tool_calls {
                let result = self.run_tool_call(&registry, call).await;
                transport_failed |= result.is_transport_error();
                let content = if result.is_error {
                    format!("Error: {}", result.content)
                } else {
                    result.content
                };
                messages.push(ChatMessage::tool_result(call.id.clone(), content));
            }

            if transport_failed {
                self.discard_connection().await;
            }
        }

        Err(SynthesisError::ToolRoundLimit(self.max_tool_rounds))
    }
}

fn parse_arguments(raw: &str) -> serde_json::Result<Value> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_str(raw)
}

#[async_trait]
impl<P: LLMProvider, T: ToolSource> Synthesizer for ToolAgent<P, T> {
    async fn synthesize(&self, request: &SynthesisRequest) -> anyhow::Result<String> {
        Ok(self.synthesize_inner(request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use context7_core::{LLMResponse, ToolDefinition, Turn};
    use context7_tools::{TRANSPORT_ERROR, Tool};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays canned responses and records what it was sent.
    struct ScriptedProvider {
        responses: std::sync::Mutex<VecDeque<LLMResponse>>,
        seen: std::sync::Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<LLMResponse>) -> Self {
            Self {
                responses: std::sync::Mutex::new(responses.into()),
                seen: std::sync::Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        async fn chat(
            &self,
            messages: &[ChatMessage],
            tools: &[ToolDefinition],
            _model: &str,
        ) -> anyhow::Result<LLMResponse> {
            assert_eq!(tools.len(), 1);
            self.seen.lock().unwrap().push(messages.to_vec());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("script exhausted"))
        }

        fn get_default_model(&self) -> &'static str {
            "scripted"
        }
    }

    struct DocsTool {
        transport_down: bool,
    }

    #[async_trait]
    impl Tool for DocsTool {
        fn name(&self) -> &'static str {
            "get-library-docs"
        }

        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "get-library-docs".into(),
                description: "Fetch docs".into(),
                input_schema: json!({ "type": "object" }),
            }
        }

        async fn execute(&self, input: Value) -> ToolResult {
            if self.transport_down {
                return ToolResult::error("Tool server closed the connection")
                    .with_error_type(TRANSPORT_ERROR);
            }
            ToolResult::success(format!("docs for {}", input["topic"].as_str().unwrap_or("?")))
        }
    }

    #[derive(Default)]
    struct CountingSource {
        connects: AtomicUsize,
        transport_down: bool,
    }

    #[async_trait]
    impl ToolSource for CountingSource {
        async fn connect(&self) -> anyhow::Result<ToolRegistry> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            let mut registry = ToolRegistry::new();
            registry.add_tool(Box::new(DocsTool {
                transport_down: self.transport_down,
            }));
            Ok(registry)
        }
    }

    struct DownSource;

    #[async_trait]
    impl ToolSource for DownSource {
        async fn connect(&self) -> anyhow::Result<ToolRegistry> {
            anyhow::bail!("npx: command not found")
        }
    }

    fn text(content: &str) -> LLMResponse {
        LLMResponse {
            content: content.to_string(),
            ..LLMResponse::default()
        }
    }

    fn tool_call(id: &str, arguments: &str) -> LLMResponse {
        LLMResponse {
            tool_calls: vec![ToolCall::new(id, "get-library-docs", arguments)],
            ..LLMResponse::default()
        }
    }

    fn request(message: &str) -> SynthesisRequest {
        SynthesisRequest {
            system_prompt: "sys".to_string(),
            history: vec![Turn::new("earlier", "before")],
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn test_tool_results_feed_final_answer() {
        let provider = ScriptedProvider::new(vec![
            tool_call("call_1", r#"{"topic":"hooks"}"#),
            text("  Hooks are functions.  "),
        ]);
        let agent = ToolAgent::new(provider, CountingSource::default());

        let answer = agent.synthesize(&request("What are hooks?")).await.unwrap();
        assert_eq!(answer, "Hooks are functions.");

        let seen = agent.provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        // system, earlier user/assistant, new user
        assert_eq!(seen[0].len(), 4);
        let second = &seen[1];
        assert_eq!(second[4].tool_calls.len(), 1);
        assert_eq!(second[5].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(second[5].content, "docs for hooks");
    }

    #[tokio::test]
    async fn test_connection_is_reused() {
        let provider = ScriptedProvider::new(vec![text("one"), text("two")]);
        let agent = ToolAgent::new(provider, CountingSource::default());

        agent.synthesize(&request("a")).await.unwrap();
        agent.synthesize(&request("b")).await.unwrap();
        assert_eq!(agent.source.connects.load(Ordering::SeqCst), 1);
        assert!(agent.is_connected().await);

        agent.shutdown().await;
        assert!(!agent.is_connected().await);
    }

    #[tokio::test]
    async fn test_transport_failure_forces_reconnect() {
        let provider = ScriptedProvider::new(vec![
            tool_call("call_1", "{}"),
            text("I could not find it."),
            text("second"),
        ]);
        let source = CountingSource {
            transport_down: true,
            ..CountingSource::default()
        };
        let agent = ToolAgent::new(provider, source);

        agent.synthesize(&request("a")).await.unwrap();
        assert!(!agent.is_connected().await);
        {
            let seen = agent.provider.seen.lock().unwrap();
            assert!(seen[1][5].content.starts_with("Error: "));
        }

        agent.synthesize(&request("b")).await.unwrap();
        assert_eq!(agent.source.connects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalid_arguments_reported_to_model() {
        let provider = ScriptedProvider::new(vec![tool_call("call_1", "{oops"), text("done")]);
        let agent = ToolAgent::new(provider, CountingSource::default());

        assert_eq!(agent.synthesize(&request("a")).await.unwrap(), "done");
        let seen = agent.provider.seen.lock().unwrap();
        assert!(seen[1][5].content.contains("Invalid arguments"));
    }

    #[tokio::test]
    async fn test_round_limit() {
        let provider = ScriptedProvider::new(vec![
            tool_call("call_1", "{}"),
            tool_call("call_2", "{}"),
            text("never reached"),
        ]);
        let agent = ToolAgent::new(provider, CountingSource::default()).with_max_tool_rounds(2);

        let err = agent.synthesize_inner(&request("a")).await.unwrap_err();
        assert!(matches!(err, SynthesisError::ToolRoundLimit(2)));
    }

    #[tokio::test]
    async fn test_empty_answer_is_an_error() {
        let agent = ToolAgent::new(ScriptedProvider::new(vec![text("   ")]), CountingSource::default());
        let err = agent.synthesize_inner(&request("a")).await.unwrap_err();
        assert!(matches!(err, SynthesisError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let agent = ToolAgent::new(ScriptedProvider::new(vec![text("unused")]), DownSource);
        let err = agent.synthesize_inner(&request("a")).await.unwrap_err();
        assert!(matches!(err, SynthesisError::Connect(_)));
        assert!(agent.provider.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_model_defaults_to_provider() {
        let agent = ToolAgent::new(ScriptedProvider::new(vec![]), DownSource);
        assert_eq!(agent.model(), "scripted");
        assert_eq!(agent.with_model("gpt-4o").model(), "gpt-4o");
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!(parse_arguments("").unwrap(), json!({}));
        assert_eq!(parse_arguments(r#"{"a":1}"#).unwrap(), json!({ "a": 1 }));
        assert!(parse_arguments("{").is_err());
    }
}
