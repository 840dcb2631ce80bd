use serde::{Deserialize, Serialize};

use crate::timeline::{Clip, Timeline};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderVideoClip {
    pub id: String,
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub start: f64,
    #[serde(default)]
    pub end: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
}

impl RenderVideoClip {
    pub fn asset_id(&self) -> &str {
        self.source_id.as_deref().unwrap_or(&self.id)
    }

    /// Out-point to send upstream; `None` means "to the end of the source".
    pub fn end_point(&self) -> Option<f64> {
        (self.end > self.start).then_some(self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderAudioClip {
    pub id: String,
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub start: f64,
    #[serde(default)]
    pub end: Option<f64>,
    #[serde(default)]
    pub timeline_start: f64,
}

impl RenderAudioClip {
    pub fn asset_id(&self) -> &str {
        self.source_id.as_deref().unwrap_or(&self.id)
    }
}

/// Body of `POST /api/video/render-timeline`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderTimelineRequest {
    pub clips: Vec<RenderVideoClip>,
    #[serde(default)]
    pub audio_clips: Vec<RenderAudioClip>,
}

/// Video clips are played back to back in timeline order (gaps collapse,
/// hard cuts only); audio clips are laid over at their own positions.
pub fn render_request(timeline: &Timeline) -> RenderTimelineRequest {
    let mut video: Vec<&Clip> = timeline.video.clips.iter().collect();
    video.sort_by(|a, b| a.timeline_start.total_cmp(&b.timeline_start));

    let clips = video
        .into_iter()
        .map(|clip| RenderVideoClip {
            id: clip.id.clone(),
            source_id: Some(clip.source_id.clone()),
            start: clip.source_start,
            end: clip.source_end,
            stream_url: clip.stream_url.clone(),
            name: Some(clip.name.clone()),
            length: Some(clip.duration),
        })
        .collect();

    let audio_clips = timeline
        .audio
        .clips
        .iter()
        .map(|clip| RenderAudioClip {
            id: clip.id.clone(),
            source_id: Some(clip.source_id.clone()),
            start: clip.source_start,
            end: Some(clip.source_end),
            timeline_start: clip.timeline_start,
        })
        .collect();

    RenderTimelineRequest { clips, audio_clips }
}
