use serde::Serialize;

use crate::timeline::Zoom;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
}

/// Instructions for the media element that owns actual playback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaCommand {
    Seek(f64),
}

/// Playhead position and play state. Play state follows the media
/// element's own events; the transport never starts or stops playback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transport {
    state: PlaybackState,
    current_time: f64,
    duration: f64,
    dragging_playhead: bool,
}

impl Transport {
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn is_dragging_playhead(&self) -> bool {
        self.dragging_playhead
    }

    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration.max(0.0);
        self.current_time = self.clamp(self.current_time);
    }

    fn clamp(&self, time: f64) -> f64 {
        if self.duration > 0.0 {
            time.clamp(0.0, self.duration)
        } else {
            time.max(0.0)
        }
    }

    pub fn played(&mut self) {
        self.state = PlaybackState::Playing;
    }

    pub fn paused(&mut self) {
        self.state = PlaybackState::Stopped;
    }

    pub fn ended(&mut self) {
        self.state = PlaybackState::Stopped;
    }

    /// Passive sync from the media element. Ignored while the playhead is
    /// held so the pointer stays authoritative.
    pub fn time_update(&mut self, time: f64) {
        if !self.dragging_playhead {
            self.current_time = self.clamp(time);
        }
    }

    pub fn begin_playhead_drag(&mut self, x: f64, zoom: &Zoom) {
        self.dragging_playhead = true;
        self.current_time = self.clamp(zoom.time_at(x));
    }

    pub fn drag_playhead(&mut self, x: f64, zoom: &Zoom) {
        if self.dragging_playhead {
            self.current_time = self.clamp(zoom.time_at(x));
        }
    }

    /// Drops the playhead; the media element is seeked to where it landed.
    pub fn release_playhead(&mut self) -> Option<MediaCommand> {
        if !self.dragging_playhead {
            return None;
        }
        self.dragging_playhead = false;
        Some(MediaCommand::Seek(self.current_time))
    }

    pub fn click_ruler(&mut self, x: f64, zoom: &Zoom) -> MediaCommand {
        self.current_time = self.clamp(zoom.time_at(x));
        MediaCommand::Seek(self.current_time)
    }
}
