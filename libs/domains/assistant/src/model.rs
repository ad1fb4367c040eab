//! Chat completion client with tool calling.

use async_trait::async_trait;
use core_config::{ConfigError, env_or_default, env_required};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::instrument;

use crate::error::{AssistantError, AssistantResult};
use crate::models::{MessageRole, ThreadMessage, ToolCall};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TEMPERATURE: f32 = 0.8;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Tool offered to the model
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// What the model said: text, tool calls, or both
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

impl ModelReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        messages: Vec<ThreadMessage>,
        tools: Vec<ToolDefinition>,
    ) -> AssistantResult<ModelReply>;
}

#[derive(Debug, Clone)]
pub struct ChatModelConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

impl ChatModelConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Reads `OPENAI_API_KEY`, `OPENAI_BASE_URL` and `OPENAI_CHAT_MODEL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: env_required("OPENAI_API_KEY")?,
            base_url: env_or_default("OPENAI_BASE_URL", DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            model: env_or_default("OPENAI_CHAT_MODEL", DEFAULT_MODEL),
            temperature: DEFAULT_TEMPERATURE,
        })
    }
}

/// OpenAI-compatible `/chat/completions` client
pub struct OpenAiChatModel {
    client: Client,
    config: ChatModelConfig,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    kind: String,
    function: WireFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

impl OpenAiChatModel {
    pub fn new(config: ChatModelConfig) -> AssistantResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AssistantError::Internal(format!("http client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(ChatModelConfig::from_env()?).map_err(|e| ConfigError::ParseError {
            key: "OPENAI_API_KEY".to_string(),
            details: e.to_string(),
        })
    }

    fn request_body(&self, messages: &[ThreadMessage], tools: &[ToolDefinition]) -> Value {
        let messages: Vec<Value> = messages.iter().map(wire_message).collect();
        let mut body = json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "messages": messages,
        });

        if !tools.is_empty() {
            let tools: Vec<Value> = tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            body["tools"] = Value::Array(tools);
        }
        body
    }
}

fn wire_message(message: &ThreadMessage) -> Value {
    let mut wire = json!({
        "role": message.role.to_string(),
        "content": message.content,
    });

    if message.role == MessageRole::Assistant && !message.tool_calls.is_empty() {
        let calls: Vec<WireToolCall> = message
            .tool_calls
            .iter()
            .map(|c| WireToolCall {
                id: c.id.clone(),
                kind: function_type(),
                function: WireFunction {
                    name: c.name.clone(),
                    arguments: c.arguments.clone(),
                },
            })
            .collect();
        wire["tool_calls"] = json!(calls);
    }
    if let Some(ref id) = message.tool_call_id {
        wire["tool_call_id"] = json!(id);
    }
    wire
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    #[instrument(skip_all, fields(model = %self.config.model, messages = messages.len()))]
    async fn complete(
        &self,
        messages: Vec<ThreadMessage>,
        tools: Vec<ToolDefinition>,
    ) -> AssistantResult<ModelReply> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&self.request_body(&messages, &tools))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::Model(format!(
                "chat API returned {status}: {body}"
            )));
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::Model(format!("unexpected response: {e}")))?;
        let message = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AssistantError::Model("No choices returned".to_string()))?
            .message;

        Ok(ModelReply {
            content: message.content.unwrap_or_default(),
            tool_calls: message
                .tool_calls
                .into_iter()
                .map(|c| ToolCall {
                    id: c.id,
                    name: c.function.name,
                    arguments: c.function.arguments,
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::post};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1")
    }

    fn lookup_tool() -> ToolDefinition {
        ToolDefinition {
            name: "event_lookup".into(),
            description: "Search events".into(),
            parameters: json!({"type": "object"}),
        }
    }

    #[tokio::test]
    async fn test_tool_calls_are_parsed() {
        async fn handler(Json(body): Json<Value>) -> Json<Value> {
            assert_eq!(body["model"], DEFAULT_MODEL);
            assert_eq!(body["tools"][0]["function"]["name"], "event_lookup");
            assert_eq!(body["messages"][0]["role"], "user");
            Json(json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": {"name": "event_lookup", "arguments": "{\"query\":\"jazz\"}"}
                        }]
                    }
                }]
            }))
        }
        let base = serve(Router::new().route("/v1/chat/completions", post(handler))).await;
        let model = OpenAiChatModel::new(ChatModelConfig::new("sk").with_base_url(base)).unwrap();

        let reply = model
            .complete(vec![ThreadMessage::user("jazz?")], vec![lookup_tool()])
            .await
            .unwrap();
        assert_eq!(reply.content, "");
        assert_eq!(reply.tool_calls.len(), 1);
        assert_eq!(reply.tool_calls[0].arguments, r#"{"query":"jazz"}"#);
    }

    #[tokio::test]
    async fn test_upstream_error() {
        let base = serve(Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        ))
        .await;
        let model = OpenAiChatModel::new(ChatModelConfig::new("sk").with_base_url(base)).unwrap();

        let err = model
            .complete(vec![ThreadMessage::user("hi")], vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, AssistantError::Model(m) if m.contains("429")));
    }

    #[test]
    fn test_wire_messages_carry_tool_fields() {
        let call = ToolCall {
            id: "call_1".into(),
            name: "internet_search".into(),
            arguments: "{}".into(),
        };
        let request = wire_message(&ThreadMessage::tool_request("", vec![call]));
        assert_eq!(request["tool_calls"][0]["type"], "function");
        assert_eq!(request["tool_calls"][0]["function"]["name"], "internet_search");

        let result = wire_message(&ThreadMessage::tool_result("call_1", "[]"));
        assert_eq!(result["role"], "tool");
        assert_eq!(result["tool_call_id"], "call_1");
    }

    #[test]
    fn test_config_from_env() {
        temp_env::with_vars(
            [
                ("OPENAI_API_KEY", Some("sk-env")),
                ("OPENAI_BASE_URL", None),
                ("OPENAI_CHAT_MODEL", Some("llama-3.1-70b")),
            ],
            || {
                let config = ChatModelConfig::from_env().unwrap();
                assert_eq!(config.base_url, DEFAULT_BASE_URL);
                assert_eq!(config.model, "llama-3.1-70b");
            },
        );
    }
}
