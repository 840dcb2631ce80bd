//! Editing operations composed on top of [`MediaService`]. Each returns the
//! JSON object the agent hands back to the front end as a tool result.

use anyhow::{bail, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use engine::render::RenderTimelineRequest;

use super::{MediaService, TimelineEntry};

pub const DEFAULT_OVERLAY_DURATION: f64 = 5.0;

pub async fn trim_video(media: &dyn MediaService, video_id: &str, start: f64, end: f64) -> Result<Value> {
    if start < 0.0 {
        bail!("start must not be negative");
    }
    if end <= start {
        bail!("end ({}) must be after start ({})", end, start);
    }
    let stream_url = media
        .generate_stream(&[TimelineEntry::video(video_id, start, Some(end))])
        .await?;
    info!(video_id, start, end, "trimmed video");
    Ok(json!({
        "stream_url": stream_url,
        "start": start,
        "end": end,
        "duration": end - start,
    }))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextOverlay {
    pub video_id: String,
    pub text: String,
    #[serde(default)]
    pub start: Option<f64>,
    #[serde(default)]
    pub duration: Option<f64>,
    /// Trim window of the underlying video; both must be present to apply.
    #[serde(default)]
    pub video_start: Option<f64>,
    #[serde(default)]
    pub video_end: Option<f64>,
}

/// Lays the text over the video, keeping any trim window the caller passes
/// in. The overlay never outlasts the (possibly trimmed) video.
pub async fn add_text_overlay(media: &dyn MediaService, overlay: &TextOverlay) -> Result<Value> {
    if overlay.text.trim().is_empty() {
        bail!("text must not be empty");
    }
    let video = media.get_video(&overlay.video_id).await?;

    let (base, length) = match (overlay.video_start, overlay.video_end) {
        (Some(start), Some(end)) if end > start => (
            TimelineEntry::video(video.id.clone(), start, Some(end)),
            end - start,
        ),
        _ => (TimelineEntry::video(video.id.clone(), 0.0, None), video.length),
    };
    let start = overlay.start.unwrap_or(0.0).max(0.0);
    let requested = overlay.duration.unwrap_or(DEFAULT_OVERLAY_DURATION);
    let duration = if length > 0.0 { requested.min(length) } else { requested };

    let stream_url = media
        .generate_stream(&[base, TimelineEntry::text(start, overlay.text.clone(), duration)])
        .await?;
    info!(video_id = %video.id, duration, "added text overlay");
    Ok(json!({
        "stream_url": stream_url,
        "text": overlay.text,
        "duration": duration,
        "length": length,
    }))
}

pub async fn render_video(media: &dyn MediaService, video_id: &str, resolution: &str) -> Result<Value> {
    let video = media.get_video(video_id).await?;
    Ok(json!({
        "stream_url": video.stream_url,
        "resolution": resolution,
        "status": "rendered",
    }))
}

/// Compiles the front end's clip layout into one stream. Video clips are
/// concatenated in the order given; audio clips become overlays.
pub async fn render_timeline(media: &dyn MediaService, request: &RenderTimelineRequest) -> Result<String> {
    if request.clips.is_empty() {
        bail!("timeline has no video clips");
    }
    let mut entries: Vec<TimelineEntry> = request
        .clips
        .iter()
        .map(|clip| TimelineEntry::video(clip.asset_id(), clip.start.max(0.0), clip.end_point()))
        .collect();
    entries.extend(request.audio_clips.iter().map(|clip| {
        TimelineEntry::audio(
            clip.timeline_start.max(0.0),
            clip.asset_id(),
            clip.start.max(0.0),
            clip.end.filter(|end| *end > clip.start),
        )
    }));
    let stream_url = media.generate_stream(&entries).await?;
    info!(
        video_clips = request.clips.len(),
        audio_clips = request.audio_clips.len(),
        "rendered timeline"
    );
    Ok(stream_url)
}
