use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use engine::protocol::nullable;

use crate::error::check_status;

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded argument object, exactly as the model produced it.
    #[serde(default)]
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: FunctionCall,
}

fn function_kind() -> String {
    "function".to_string()
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        ToolCall {
            id: id.into(),
            kind: function_kind(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// One entry of an OpenAI-style chat transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl LlmMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        LlmMessage {
            role: role.into(),
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }

    pub fn with_tool_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        LlmMessage {
            role: "assistant".to_string(),
            content,
            tool_calls,
            tool_call_id: None,
        }
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        LlmMessage {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::new("tool", content)
        }
    }
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Sends the transcript with the tool catalogue and returns the model's
    /// reply message.
    async fn complete(&self, messages: &[LlmMessage], tools: &Value) -> Result<LlmMessage>;
}

pub struct OpenRouterClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
}

impl OpenRouterClient {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        OpenRouterClient {
            http: reqwest::Client::new(),
            api_key,
            model: model.into(),
        }
    }
}

#[async_trait]
impl ChatModel for OpenRouterClient {
    async fn complete(&self, messages: &[LlmMessage], tools: &Value) -> Result<LlmMessage> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("OPENROUTER_API_KEY environment variable not set"))?;

        let payload = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "tools": tools,
            "tool_choice": "auto",
        });
        debug!(model = %self.model, messages = messages.len(), "calling OpenRouter");

        let response = self
            .http
            .post(OPENROUTER_URL)
            .bearer_auth(api_key)
            .header("HTTP-Referer", "http://localhost:3000")
            .header("X-Title", "AI Video Editor")
            .timeout(REQUEST_TIMEOUT)
            .json(&payload)
            .send()
            .await?;
        let body: Value = check_status("OpenRouter", response).await?.json().await?;
        parse_reply(body)
    }
}

fn parse_reply(body: Value) -> Result<LlmMessage> {
    let message = body
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .cloned()
        .ok_or_else(|| anyhow!("Invalid response format from OpenRouter: no choices"))?;
    Ok(serde_json::from_value(message)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reply_with_tool_calls_parses() {
        let message = parse_reply(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "trim_video", "arguments": "{\"video_id\":\"m-1\",\"start\":0,\"end\":5}"}
                    }]
                }
            }]
        }))
        .unwrap();
        assert_eq!(message.content, None);
        assert_eq!(message.tool_calls[0].function.name, "trim_video");
    }

    #[test]
    fn null_tool_calls_is_a_plain_reply() {
        let message = parse_reply(json!({
            "choices": [{
                "message": {"role": "assistant", "content": "Hi", "tool_calls": null}
            }]
        }))
        .unwrap();
        assert_eq!(message.content.as_deref(), Some("Hi"));
        assert!(message.tool_calls.is_empty());
    }

    #[test]
    fn empty_choices_is_an_error() {
        assert!(parse_reply(json!({"choices": []})).is_err());
    }

    #[test]
    fn tool_message_serializes_call_id() {
        let value = serde_json::to_value(LlmMessage::tool("call_1", "{}")).unwrap();
        assert_eq!(value, json!({"role": "tool", "content": "{}", "tool_call_id": "call_1"}));
        let value = serde_json::to_value(LlmMessage::new("user", "hi")).unwrap();
        assert_eq!(value, json!({"role": "user", "content": "hi"}));
    }
}
