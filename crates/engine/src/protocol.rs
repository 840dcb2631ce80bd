//! JSON bodies exchanged between the front end and the daemon.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::timeline::Video;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipTrim {
    #[serde(default)]
    pub start: f64,
    #[serde(default)]
    pub end: Option<f64>,
    #[serde(default)]
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoContext {
    #[serde(default)]
    pub current_video: Option<VideoRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip_trim: Option<ClipTrim>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_context: Option<VideoContext>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallSummary {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Outcome of one agent-invoked editing tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool: String,
    #[serde(default)]
    pub arguments: Value,
    #[serde(default)]
    pub result: Value,
}

/// Accepts `null` wherever a plain default would do. VideoDB sends
/// `"length": null` for assets that are still processing, and chat APIs
/// send `"tool_calls": null`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reads a number that may arrive as a JSON string (`"12.5"`).
pub fn lenient_f64(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

impl ToolResult {
    pub fn new(tool: impl Into<String>, arguments: Value, result: Value) -> Self {
        ToolResult {
            tool: tool.into(),
            arguments,
            result,
        }
    }

    pub fn arg_f64(&self, key: &str) -> Option<f64> {
        self.arguments.get(key).and_then(lenient_f64)
    }

    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.arguments
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }

    pub fn result_f64(&self, key: &str) -> Option<f64> {
        self.result.get(key).and_then(lenient_f64)
    }

    pub fn result_str(&self, key: &str) -> Option<&str> {
        self.result
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }

    pub fn error(&self) -> Option<&str> {
        self.result_str("error")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallSummary>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_results: Option<Vec<ToolResult>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRequest {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

pub type UploadResponse = Video;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
    #[serde(default)]
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_results: Option<Vec<ToolResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl VoiceResponse {
    pub fn error(message: impl Into<String>) -> Self {
        VoiceResponse {
            status: "error".to_string(),
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == "error"
    }
}

/// Body of every non-2xx daemon response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_result_reads_numbers_leniently() {
        let result: ToolResult = serde_json::from_value(json!({
            "tool": "trim_video",
            "arguments": {"video_id": "m-1", "start": "2", "end": 7},
            "result": {"stream_url": "", "length": null}
        }))
        .unwrap();
        assert_eq!(result.arg_f64("start"), Some(2.0));
        assert_eq!(result.arg_f64("end"), Some(7.0));
        assert_eq!(result.result_f64("length"), None);
        assert_eq!(result.result_str("stream_url"), None);
        assert_eq!(result.arg_str("video_id"), Some("m-1"));
    }

    #[test]
    fn missing_arguments_default_to_null() {
        let result: ToolResult =
            serde_json::from_value(json!({"tool": "list_videos", "result": {"videos": []}})).unwrap();
        assert!(result.arguments.is_null());
        assert_eq!(result.arg_f64("start"), None);
    }

    #[test]
    fn chat_request_omits_empty_context() {
        let request = ChatRequest {
            messages: vec![ChatMessage {
                role: "user".into(),
                content: "hello".into(),
            }],
            video_context: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"messages": [{"role": "user", "content": "hello"}]})
        );
    }

    #[test]
    fn voice_error_body_parses() {
        let response: VoiceResponse = serde_json::from_value(json!({
            "status": "error",
            "message": "Recording too short. Hold the button longer."
        }))
        .unwrap();
        assert!(response.is_error());
        assert!(response.tool_results.is_none());
    }
}
