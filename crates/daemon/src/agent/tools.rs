use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use tracing::{info, warn};

use engine::interpreter::Tool;
use engine::protocol::lenient_f64;

use crate::videodb::edits::{self, TextOverlay};
use crate::videodb::{MediaService, MediaType};

/// Function-calling catalogue advertised to the model.
pub fn definitions() -> Value {
    json!([
        {
            "type": "function",
            "function": {
                "name": "upload_video",
                "description": "Upload a video from a URL into the editor",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "url": {"type": "string", "description": "Public URL of the video (YouTube or a direct link)"},
                        "name": {"type": "string", "description": "Optional display name"}
                    },
                    "required": ["url"]
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "trim_video",
                "description": "Cut a video down to the window between start and end",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "video_id": {"type": "string", "description": "ID of the video to trim"},
                        "start": {"type": "number", "description": "Start of the kept window in seconds"},
                        "end": {"type": "number", "description": "End of the kept window in seconds"}
                    },
                    "required": ["video_id", "start", "end"]
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "add_text_overlay",
                "description": "Show text on top of a video. Pass video_start and video_end to keep an existing trim.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "video_id": {"type": "string", "description": "ID of the video"},
                        "text": {"type": "string", "description": "Text to display"},
                        "start": {"type": "number", "description": "When the text appears, in seconds"},
                        "duration": {"type": "number", "description": "How long the text stays, in seconds"},
                        "video_start": {"type": "number", "description": "Trim start in seconds, if the video is trimmed"},
                        "video_end": {"type": "number", "description": "Trim end in seconds, if the video is trimmed"}
                    },
                    "required": ["video_id", "text"]
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "list_videos",
                "description": "List every video in the project",
                "parameters": {"type": "object", "properties": {}}
            }
        },
        {
            "type": "function",
            "function": {
                "name": "render_video",
                "description": "Render a video for export",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "video_id": {"type": "string", "description": "ID of the video to render"},
                        "resolution": {
                            "type": "string",
                            "description": "Output resolution",
                            "enum": ["720p", "1080p", "4k"]
                        }
                    },
                    "required": ["video_id"]
                }
            }
        }
    ])
}

fn required_str<'a>(arguments: &'a Value, key: &str) -> Result<&'a str> {
    arguments
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("missing required argument: {}", key))
}

fn optional_f64(arguments: &Value, key: &str) -> Option<f64> {
    arguments.get(key).and_then(lenient_f64)
}

fn required_f64(arguments: &Value, key: &str) -> Result<f64> {
    optional_f64(arguments, key).ok_or_else(|| anyhow!("missing required argument: {}", key))
}

async fn dispatch(media: &dyn MediaService, tool: Tool, arguments: &Value) -> Result<Value> {
    match tool {
        Tool::UploadVideo => {
            let url = required_str(arguments, "url")?;
            let name = arguments.get("name").and_then(|v| v.as_str());
            let video = media.upload(url, name, MediaType::Video).await?;
            Ok(serde_json::to_value(video)?)
        }
        Tool::TrimVideo => {
            edits::trim_video(
                media,
                required_str(arguments, "video_id")?,
                required_f64(arguments, "start")?,
                required_f64(arguments, "end")?,
            )
            .await
        }
        Tool::AddTextOverlay => {
            let overlay = TextOverlay {
                video_id: required_str(arguments, "video_id")?.to_string(),
                text: required_str(arguments, "text")?.to_string(),
                start: optional_f64(arguments, "start"),
                duration: optional_f64(arguments, "duration"),
                video_start: optional_f64(arguments, "video_start"),
                video_end: optional_f64(arguments, "video_end"),
            };
            edits::add_text_overlay(media, &overlay).await
        }
        Tool::ListVideos => Ok(json!({ "videos": media.list_videos().await? })),
        Tool::RenderVideo => {
            let resolution = arguments
                .get("resolution")
                .and_then(|v| v.as_str())
                .unwrap_or("1080p");
            edits::render_video(media, required_str(arguments, "video_id")?, resolution).await
        }
    }
}

/// Runs one tool call. Failures never escape: they come back as
/// `{"error": "..."}` so the model and the front end both see them.
pub async fn execute(media: &dyn MediaService, name: &str, arguments: &Value) -> Value {
    let Some(tool) = Tool::from_name(name) else {
        warn!(tool = name, "model asked for an unknown tool");
        return json!({ "error": format!("Unknown tool: {}", name) });
    };
    match dispatch(media, tool, arguments).await {
        Ok(result) => {
            info!(tool = name, "tool executed");
            result
        }
        Err(e) => {
            warn!(tool = name, error = %e, "tool failed");
            json!({ "error": format!("{e:#}") })
        }
    }
}
