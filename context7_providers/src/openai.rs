use std::time::Duration;

use async_trait::async_trait;
use context7_core::{ChatMessage, LLMProvider, LLMResponse, ToolCall, ToolDefinition, Usage};
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Chat-completions client for any OpenAI-compatible endpoint.
///
/// One call is one HTTP request; there is no retry or streaming.
#[derive(Clone)]
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl OpenAIProvider {
    pub fn new(api_key: String, request_timeout: Duration) -> anyhow::Result<Self> {
        info!("Creating OpenAIProvider");
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            temperature: None,
            max_tokens: None,
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_default_model(mut self, model: String) -> Self {
        self.default_model = model;
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    fn build_request(&self, messages: &[ChatMessage], tools: &[ToolDefinition], model: &str) -> Value {
        let mut request = json!({
            "model": model,
            "messages": messages,
        });

        if !tools.is_empty() {
            request["tools"] = tools
                .iter()
                .map(|tool| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": tool.name,
                            "description": tool.description,
                            "parameters": tool.input_schema,
                        }
                    })
                })
                .collect();
        }
        if let Some(temperature) = self.temperature {
            request["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            request["max_tokens"] = json!(max_tokens);
        }
        request
    }
}

fn parse_response(response: &Value) -> anyhow::Result<LLMResponse> {
    let message = response["choices"]
        .get(0)
        .map(|choice| &choice["message"])
        .filter(|message| message.is_object())
        .ok_or_else(|| anyhow::anyhow!("Invalid response format: missing choices[0].message"))?;

    let content = message["content"].as_str().unwrap_or_default().to_string();

    let tool_calls = match message.get("tool_calls") {
        Some(calls) if !calls.is_null() => serde_json::from_value::<Vec<ToolCall>>(calls.clone())
            .map_err(|e| anyhow::anyhow!("Invalid response format: malformed tool_calls: {e}"))?,
        _ => Vec::new(),
    };

    if content.is_empty() && tool_calls.is_empty() {
        anyhow::bail!("Invalid response format: message has neither content nor tool calls");
    }

    let usage = response["usage"].as_object().map(|u| Usage {
        prompt_tokens: token_count(u.get("prompt_tokens")),
        completion_tokens: token_count(u.get("completion_tokens")),
        total_tokens: token_count(u.get("total_tokens")),
    });

    Ok(LLMResponse {
        content,
        tool_calls,
        usage,
    })
}

fn token_count(value: Option<&Value>) -> u32 {
    value
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0)
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        model: &str,
    ) -> anyhow::Result<LLMResponse> {
        let request = self.build_request(messages, tools, model);

        info!(
            "Sending request to {}: model={model}, messages={}, tools={}",
            self.base_url,
            messages.len(),
            tools.len()
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        let parsed = parse_response(&response)?;
        if let Some(usage) = &parsed.usage {
            debug!(
                "Tokens: {} prompt + {} completion = {} total",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }
        info!(
            "Received response: {} chars, {} tool calls",
            parsed.content.len(),
            parsed.tool_calls.len()
        );
        Ok(parsed)
    }

    fn get_default_model(&self) -> &str {
        &self.default_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenAIProvider {
        OpenAIProvider::new("sk-test".to_string(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn request_includes_tools_as_functions() {
        let tools = [ToolDefinition {
            name: "resolve-library-id".to_string(),
            description: "Find a library".to_string(),
            input_schema: json!({ "type": "object" }),
        }];
        let request = provider()
            .with_temperature(0.2)
            .build_request(&[ChatMessage::user("hi")], &tools, "gpt-4o-mini");

        assert_eq!(request["model"], "gpt-4o-mini");
        assert_eq!(request["messages"][0]["role"], "user");
        assert_eq!(request["tools"][0]["type"], "function");
        assert_eq!(request["tools"][0]["function"]["name"], "resolve-library-id");
        assert!(request.get("max_tokens").is_none());
        assert!(request["temperature"].is_number());
    }

    #[test]
    fn request_omits_empty_tools() {
        let request = provider().build_request(&[ChatMessage::user("hi")], &[], "m");
        assert!(request.get("tools").is_none());
    }

    #[test]
    fn parses_text_response() {
        let response = json!({
            "choices": [ { "message": { "role": "assistant", "content": "Answer" } } ],
            "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
        });
        let parsed = parse_response(&response).unwrap();
        assert_eq!(parsed.content, "Answer");
        assert!(parsed.tool_calls.is_empty());
        assert_eq!(parsed.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn parses_tool_calls_with_null_content() {
        let response = json!({
            "choices": [ { "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [ {
                    "id": "call_1",
                    "type": "function",
                    "function": { "name": "get-library-docs", "arguments": "{\"topic\":\"hooks\"}" }
                } ]
            } } ]
        });
        let parsed = parse_response(&response).unwrap();
        assert!(parsed.content.is_empty());
        assert_eq!(parsed.tool_calls.len(), 1);
        assert_eq!(parsed.tool_calls[0].function.name, "get-library-docs");
    }

    #[test]
    fn rejects_missing_choices() {
        assert!(parse_response(&json!({ "error": "nope" })).is_err());
        assert!(parse_response(&json!({ "choices": [] })).is_err());
    }

    #[test]
    fn rejects_empty_message() {
        let response = json!({ "choices": [ { "message": { "role": "assistant", "content": "" } } ] });
        assert!(parse_response(&response).is_err());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let p = provider().with_base_url("http://localhost:8080/v1/".to_string());
        assert_eq!(p.base_url, "http://localhost:8080/v1");
        assert_eq!(p.get_default_model(), DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error() {
        let p = provider().with_base_url("http://127.0.0.1:9".to_string());
        assert!(p.chat(&[ChatMessage::user("hi")], &[], "m").await.is_err());
    }
}
