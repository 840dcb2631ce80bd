//! Applies backend tool results to the video library and the timeline.

use crate::library::VideoLibrary;
use crate::protocol::ToolResult;
use crate::timeline::{Timeline, Video};

/// Duration assumed for a trim whose result carries no usable length.
pub const DEFAULT_TRIM_DURATION: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    UploadVideo,
    TrimVideo,
    AddTextOverlay,
    ListVideos,
    RenderVideo,
}

impl Tool {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "upload_video" => Some(Tool::UploadVideo),
            "trim_video" => Some(Tool::TrimVideo),
            "add_text_overlay" => Some(Tool::AddTextOverlay),
            "list_videos" => Some(Tool::ListVideos),
            "render_video" => Some(Tool::RenderVideo),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tool::UploadVideo => "upload_video",
            Tool::TrimVideo => "trim_video",
            Tool::AddTextOverlay => "add_text_overlay",
            Tool::ListVideos => "list_videos",
            Tool::RenderVideo => "render_video",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterpretReport {
    pub applied: Vec<Tool>,
    pub skipped: Vec<String>,
    pub errors: Vec<String>,
    pub rendered_url: Option<String>,
}

/// `length`, then `duration`, then `end - start`, then the default.
pub fn trim_duration(result: &ToolResult) -> f64 {
    result
        .result_f64("length")
        .or_else(|| result.result_f64("duration"))
        .or_else(|| match (result.arg_f64("start"), result.arg_f64("end")) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        })
        .unwrap_or(DEFAULT_TRIM_DURATION)
}

/// Index of the video clip a tool result should patch: the clip cut from
/// the video the tool named, else from the current video, else the first.
fn target_clip(timeline: &Timeline, result: &ToolResult, current: Option<&Video>) -> Option<usize> {
    let clips = &timeline.video.clips;
    let by_source = |id: &str| clips.iter().position(|c| c.source_id == id);
    result
        .arg_str("video_id")
        .and_then(by_source)
        .or_else(|| current.and_then(|v| by_source(&v.id)))
        .or_else(|| (!clips.is_empty()).then_some(0))
}

fn video_from_result(tool: Tool, result: &ToolResult, current: Option<&Video>) -> Video {
    let inherited = match tool {
        Tool::AddTextOverlay => current,
        _ => None,
    };
    let id = result
        .result_str("id")
        .map(String::from)
        .or_else(|| inherited.map(|v| v.id.clone()))
        .unwrap_or_else(|| format!("video-{}", uuid::Uuid::new_v4()));
    let name = result
        .result_str("name")
        .map(String::from)
        .or_else(|| inherited.map(|v| v.name.clone()))
        .unwrap_or_else(|| match tool {
            Tool::AddTextOverlay => "Edited video".to_string(),
            _ => "Uploaded video".to_string(),
        });
    // An overlay rendered from the current video reports the span it
    // covered; the source keeps its full length.
    let same_source = inherited
        .filter(|v| result.result_str("id").map_or(true, |id| id == v.id))
        .map(|v| v.length)
        .filter(|length| *length > 0.0);
    let length = same_source
        .or_else(|| result.result_f64("length"))
        .or_else(|| result.result_f64("duration"))
        .or_else(|| inherited.map(|v| v.length))
        .unwrap_or(0.0);
    Video {
        id,
        name,
        length,
        stream_url: result.result_str("stream_url").unwrap_or_default().to_string(),
    }
}

pub fn interpret(
    results: &[ToolResult],
    library: &mut VideoLibrary,
    timeline: &mut Timeline,
) -> InterpretReport {
    let mut report = InterpretReport::default();

    for result in results {
        let Some(tool) = Tool::from_name(&result.tool) else {
            report.skipped.push(result.tool.clone());
            continue;
        };
        if let Some(error) = result.error() {
            report.errors.push(format!("❌ {} failed: {}", tool.name(), error));
            continue;
        }

        match tool {
            Tool::ListVideos => {
                let Some(videos) = result.result.get("videos") else {
                    report.skipped.push(tool.name().to_string());
                    continue;
                };
                match serde_json::from_value::<Vec<Video>>(videos.clone()) {
                    Ok(videos) => library.replace_all(videos),
                    Err(e) => {
                        report.errors.push(format!("❌ list_videos returned bad data: {e}"));
                        continue;
                    }
                }
            }
            Tool::UploadVideo | Tool::AddTextOverlay => {
                let video = video_from_result(tool, result, library.current());
                if tool == Tool::AddTextOverlay && !video.stream_url.is_empty() {
                    if let Some(index) = target_clip(timeline, result, library.current()) {
                        timeline.video.clips[index].stream_url = Some(video.stream_url.clone());
                    }
                }
                library.set_current(video);
            }
            Tool::TrimVideo => {
                let Some(index) = target_clip(timeline, result, library.current()) else {
                    report.skipped.push(tool.name().to_string());
                    continue;
                };
                let duration = trim_duration(result);
                let start = result.arg_f64("start").unwrap_or(0.0).max(0.0);
                let clip = &mut timeline.video.clips[index];
                clip.source_start = start;
                clip.source_end = start + duration;
                clip.duration = duration;
                if let Some(url) = result.result_str("stream_url") {
                    clip.stream_url = Some(url.to_string());
                }
            }
            Tool::RenderVideo => {
                report.rendered_url = result.result_str("stream_url").map(String::from);
            }
        }
        report.applied.push(tool);
    }

    report
}
