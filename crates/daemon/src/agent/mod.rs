//! The editing agent: one model round-trip to pick tools, tool execution
//! against VideoDB, and a second round-trip for the closing reply.

use anyhow::Result;
use serde_json::{json, Value};
use tracing::info;

use engine::protocol::{ChatRequest, ChatResponse, ToolCallSummary, ToolResult, VideoContext};

use crate::llm::{ChatModel, LlmMessage};
use crate::videodb::MediaService;

pub mod tools;

pub const SYSTEM_PROMPT: &str = r#"You are a video editing assistant. Users describe edits in plain language and you carry them out with tools.

Tools:
- upload_video: bring in a video from a URL
- trim_video: keep only the part between start and end (seconds)
- add_text_overlay: put text on top of the video
- list_videos: show the videos in the project
- render_video: export the finished video

When a message carries "[Working on video_id: ...]" or the context names a current video_id, use that id.

Command patterns:
- "trim first 10 seconds" -> trim_video(start=10, end=<video length>)
- "keep only the first 10 seconds" -> trim_video(start=0, end=10)
- "cut from X to Y" -> trim_video(start=X, end=Y)
- "add text saying hello" -> add_text_overlay(text="hello", start=0, duration=5)
- "add text hello at 5 seconds" -> add_text_overlay(text="hello", start=5, duration=5)
- "add title X" or "overlay text X" -> add_text_overlay(text="X", start=0, duration=5)

Rules:
1. When the user gives a command, call the tool. Do not just describe what you would do.
2. Text duration defaults to 5 seconds and start defaults to 0.
3. Keep replies short; the user may be listening to them."#;

/// Builds the system note describing what the user is looking at, so the
/// model targets the right video and keeps any trim in place.
pub fn context_message(context: &VideoContext) -> String {
    let video_id = context
        .current_video
        .as_ref()
        .and_then(|v| v.id.as_deref())
        .unwrap_or("unknown");
    let mut parts = vec![format!("Current video_id: {}", video_id)];
    if let Some(trim) = &context.clip_trim {
        let show = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_else(|| "unknown".to_string());
        parts.push(format!(
            "Video is TRIMMED: start={}s, end={}s, duration={}s",
            trim.start,
            show(trim.end),
            show(trim.duration)
        ));
        parts.push(
            "IMPORTANT: When calling add_text_overlay, you MUST pass video_start and video_end to preserve the trim!"
                .to_string(),
        );
    }
    parts.join(" | ")
}

fn parse_arguments(raw: &str) -> Result<Value, String> {
    if raw.trim().is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_str(raw).map_err(|e| format!("invalid tool arguments: {}", e))
}

pub async fn run_chat(
    media: &dyn MediaService,
    model: &dyn ChatModel,
    request: ChatRequest,
) -> Result<ChatResponse> {
    let catalogue = tools::definitions();

    let mut messages = vec![LlmMessage::system(SYSTEM_PROMPT)];
    if let Some(context) = &request.video_context {
        messages.push(LlmMessage::system(context_message(context)));
    }
    messages.extend(
        request
            .messages
            .iter()
            .map(|m| LlmMessage::new(m.role.as_str(), m.content.as_str())),
    );

    let reply = model.complete(&messages, &catalogue).await?;
    if reply.tool_calls.is_empty() {
        return Ok(ChatResponse {
            response: reply.content.unwrap_or_default(),
            tool_calls: None,
            tool_results: None,
        });
    }

    let mut summaries = Vec::with_capacity(reply.tool_calls.len());
    let mut results = Vec::with_capacity(reply.tool_calls.len());
    let mut tool_messages = Vec::with_capacity(reply.tool_calls.len());
    for call in &reply.tool_calls {
        let name = call.function.name.as_str();
        let (arguments, result) = match parse_arguments(&call.function.arguments) {
            Ok(arguments) => {
                let result = tools::execute(media, name, &arguments).await;
                (arguments, result)
            }
            Err(message) => (Value::Null, json!({ "error": message })),
        };
        tool_messages.push(LlmMessage::tool(call.id.clone(), result.to_string()));
        summaries.push(ToolCallSummary {
            name: name.to_string(),
            arguments: arguments.clone(),
        });
        results.push(ToolResult::new(name, arguments, result));
    }
    info!(tools = results.len(), "executed tool calls");

    messages.push(LlmMessage::with_tool_calls(reply.content.clone(), reply.tool_calls.clone()));
    messages.extend(tool_messages);
    let closing = model.complete(&messages, &catalogue).await?;

    Ok(ChatResponse {
        response: closing.content.unwrap_or_default(),
        tool_calls: Some(summaries),
        tool_results: Some(results),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ToolCall;
    use crate::testing::{FakeMedia, ScriptedModel};
    use engine::protocol::{ChatMessage, ClipTrim, VideoRef};

    fn ask(text: &str, context: Option<VideoContext>) -> ChatRequest {
        ChatRequest {
            messages: vec![ChatMessage {
                role: "user".into(),
                content: text.into(),
            }],
            video_context: context,
        }
    }

    fn context(id: &str, trim: Option<ClipTrim>) -> VideoContext {
        VideoContext {
            current_video: Some(VideoRef {
                id: Some(id.into()),
                name: None,
                length: Some(30.0),
            }),
            clip_trim: trim,
        }
    }

    #[test]
    fn context_mentions_trim_window() {
        let note = context_message(&context(
            "m-1",
            Some(ClipTrim {
                start: 2.5,
                end: Some(8.0),
                duration: Some(5.5),
            }),
        ));
        assert_eq!(
            note,
            "Current video_id: m-1 | Video is TRIMMED: start=2.5s, end=8s, duration=5.5s | \
             IMPORTANT: When calling add_text_overlay, you MUST pass video_start and video_end to preserve the trim!"
        );
    }

    #[test]
    fn context_without_video_says_unknown() {
        assert_eq!(
            context_message(&VideoContext::default()),
            "Current video_id: unknown"
        );
    }

    #[tokio::test]
    async fn plain_reply_skips_tools() {
        let media = FakeMedia::default();
        let model = ScriptedModel::new(vec![LlmMessage::assistant("Hi there")]);
        let response = run_chat(&media, &model, ask("hello", None)).await.unwrap();
        assert_eq!(response.response, "Hi there");
        assert!(response.tool_calls.is_none());
        assert!(response.tool_results.is_none());
        assert_eq!(model.calls().len(), 1);
    }

    #[tokio::test]
    async fn tool_calls_run_then_model_summarises() {
        let media = FakeMedia::with_video("m-1", 30.0);
        let model = ScriptedModel::new(vec![
            LlmMessage::with_tool_calls(
                None,
                vec![ToolCall::new(
                    "call_1",
                    "trim_video",
                    r#"{"video_id":"m-1","start":0,"end":10}"#,
                )],
            ),
            LlmMessage::assistant("Trimmed to the first 10 seconds."),
        ]);

        let response = run_chat(&media, &model, ask("keep the first 10 seconds", Some(context("m-1", None))))
            .await
            .unwrap();

        assert_eq!(response.response, "Trimmed to the first 10 seconds.");
        let results = response.tool_results.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].tool, "trim_video");
        assert_eq!(results[0].result_f64("duration"), Some(10.0));
        assert_eq!(response.tool_calls.unwrap()[0].arguments["end"], 10);

        let calls = model.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0][0].content.as_deref(), Some(SYSTEM_PROMPT));
        assert_eq!(calls[0][1].content.as_deref(), Some("Current video_id: m-1"));
        let second = &calls[1];
        let tool_msg = second.last().unwrap();
        assert_eq!(tool_msg.role, "tool");
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(second[second.len() - 2].tool_calls.len(), 1);
    }

    #[tokio::test]
    async fn bad_arguments_surface_as_tool_error() {
        let media = FakeMedia::with_video("m-1", 30.0);
        let model = ScriptedModel::new(vec![
            LlmMessage::with_tool_calls(None, vec![ToolCall::new("call_1", "trim_video", "{not json")]),
            LlmMessage::assistant("Sorry, that failed."),
        ]);
        let response = run_chat(&media, &model, ask("trim", None)).await.unwrap();
        let results = response.tool_results.unwrap();
        assert!(results[0].error().unwrap().starts_with("invalid tool arguments"));
        assert!(media.compiled().is_empty());
    }

    #[tokio::test]
    async fn model_failure_propagates() {
        let media = FakeMedia::default();
        let model = ScriptedModel::new(vec![]);
        assert!(run_chat(&media, &model, ask("hello", None)).await.is_err());
    }
}
