use serde::{Deserialize, Serialize};

use crate::protocol::nullable;
use thiserror::Error;

/// Width of the track-label gutter to the left of time zero.
pub const LABEL_OFFSET_PX: f64 = 80.0;
/// Shortest clip a trim handle can produce.
pub const MIN_CLIP_DURATION: f64 = 0.5;

pub const DEFAULT_PIXELS_PER_SECOND: f64 = 50.0;
pub const MIN_PIXELS_PER_SECOND: f64 = 10.0;
pub const MAX_PIXELS_PER_SECOND: f64 = 200.0;
pub const ZOOM_STEP: f64 = 1.25;

#[derive(Debug, Error, PartialEq)]
pub enum TimelineError {
    #[error("clip not found: {0}")]
    ClipNotFound(String),
    #[error("invalid operation: {0}")]
    InvalidOp(String),
}

/// A playable asset hosted by the video service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub length: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub stream_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipKind {
    Video,
    Audio,
}

/// A trimmed, positioned reference to a source video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub id: String,
    pub name: String,
    pub source_id: String,
    pub source_start: f64,
    pub source_end: f64,
    pub timeline_start: f64,
    pub duration: f64,
    pub kind: ClipKind,
    pub stream_url: Option<String>,
}

impl Clip {
    pub fn from_video(video: &Video, kind: ClipKind, timeline_start: f64) -> Self {
        let stream_url = if video.stream_url.is_empty() {
            None
        } else {
            Some(video.stream_url.clone())
        };
        Clip {
            id: uuid::Uuid::new_v4().to_string(),
            name: video.name.clone(),
            source_id: video.id.clone(),
            source_start: 0.0,
            source_end: video.length,
            timeline_start: timeline_start.max(0.0),
            duration: video.length,
            kind,
            stream_url,
        }
    }

    pub fn timeline_end(&self) -> f64 {
        self.timeline_start + self.duration
    }

    pub fn contains(&self, time: f64) -> bool {
        time >= self.timeline_start && time < self.timeline_end()
    }

    /// Maps a timeline position onto the clip's source media.
    pub fn source_time_at(&self, time: f64) -> Option<f64> {
        self.contains(time)
            .then(|| self.source_start + (time - self.timeline_start))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub kind: ClipKind,
    pub clips: Vec<Clip>,
}

impl Track {
    pub fn new(kind: ClipKind) -> Self {
        Track {
            kind,
            clips: Vec::new(),
        }
    }

    /// Where the next appended clip starts.
    pub fn end(&self) -> f64 {
        self.clips
            .iter()
            .map(Clip::timeline_end)
            .fold(0.0, f64::max)
    }
}

/// Horizontal scale of the timeline view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zoom {
    pixels_per_second: f64,
}

impl Default for Zoom {
    fn default() -> Self {
        Zoom {
            pixels_per_second: DEFAULT_PIXELS_PER_SECOND,
        }
    }
}

impl Zoom {
    pub fn new(pixels_per_second: f64) -> Self {
        Zoom {
            pixels_per_second: pixels_per_second.clamp(MIN_PIXELS_PER_SECOND, MAX_PIXELS_PER_SECOND),
        }
    }

    pub fn pixels_per_second(&self) -> f64 {
        self.pixels_per_second
    }

    pub fn zoom_in(&mut self) {
        *self = Zoom::new(self.pixels_per_second * ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        *self = Zoom::new(self.pixels_per_second / ZOOM_STEP);
    }

    /// Converts a pointer delta in pixels to seconds.
    pub fn seconds(&self, dx: f64) -> f64 {
        dx / self.pixels_per_second
    }

    /// Timeline time under an x coordinate measured from the ruler's left edge.
    pub fn time_at(&self, x: f64) -> f64 {
        ((x - LABEL_OFFSET_PX) / self.pixels_per_second).max(0.0)
    }

    pub fn x_at(&self, time: f64) -> f64 {
        LABEL_OFFSET_PX + time * self.pixels_per_second
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub video: Track,
    pub audio: Track,
    pub zoom: Zoom,
}

impl Default for Timeline {
    fn default() -> Self {
        Timeline::new()
    }
}

impl Timeline {
    pub fn new() -> Self {
        Timeline {
            video: Track::new(ClipKind::Video),
            audio: Track::new(ClipKind::Audio),
            zoom: Zoom::default(),
        }
    }

    pub fn track(&self, kind: ClipKind) -> &Track {
        match kind {
            ClipKind::Video => &self.video,
            ClipKind::Audio => &self.audio,
        }
    }

    pub fn track_mut(&mut self, kind: ClipKind) -> &mut Track {
        match kind {
            ClipKind::Video => &mut self.video,
            ClipKind::Audio => &mut self.audio,
        }
    }

    /// Appends a clip for `video` at the end of the matching track.
    pub fn import(&mut self, video: &Video, kind: ClipKind) -> &Clip {
        let track = self.track_mut(kind);
        let start = track.end();
        track.clips.push(Clip::from_video(video, kind, start));
        &track.clips[track.clips.len() - 1]
    }

    pub fn total_duration(&self) -> f64 {
        self.video.end().max(self.audio.end())
    }

    pub fn is_empty(&self) -> bool {
        self.video.clips.is_empty() && self.audio.clips.is_empty()
    }

    pub fn clips(&self) -> impl Iterator<Item = &Clip> {
        self.video.clips.iter().chain(self.audio.clips.iter())
    }

    pub fn clip(&self, clip_id: &str) -> Option<&Clip> {
        self.clips().find(|c| c.id == clip_id)
    }

    pub fn clip_mut(&mut self, clip_id: &str) -> Option<&mut Clip> {
        self.video
            .clips
            .iter_mut()
            .chain(self.audio.clips.iter_mut())
            .find(|c| c.id == clip_id)
    }

    /// The clip on `kind`'s track that covers `time`.
    pub fn clip_at(&self, kind: ClipKind, time: f64) -> Option<&Clip> {
        self.track(kind).clips.iter().find(|c| c.contains(time))
    }
}
