//! Pointer drags on timeline clips.
//!
//! A gesture snapshots the clip when the pointer goes down and recomputes
//! the clip from that snapshot on every move, so the result depends only
//! on the total pointer delta. Only one gesture can be live at a time.

use thiserror::Error;

use crate::timeline::{Clip, Timeline, MIN_CLIP_DURATION};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    TrimLeft,
    TrimRight,
    Move,
}

#[derive(Debug, Error, PartialEq)]
pub enum GestureError {
    #[error("a drag is already in progress")]
    Busy,
    #[error("no drag in progress")]
    NotDragging,
    #[error("clip not found: {0}")]
    ClipNotFound(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveDrag {
    pub kind: DragKind,
    pub origin_x: f64,
    pub snapshot: Clip,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragGesture {
    #[default]
    Idle,
    Dragging(ActiveDrag),
}

/// Left handle: moves the in-point and the timeline position together.
/// `delta` is clamped so the clip keeps at least `MIN_CLIP_DURATION` and
/// neither the source in-point nor the timeline start goes negative.
pub fn trim_left(clip: &Clip, delta: f64) -> Clip {
    let lower = -clip.source_start.min(clip.timeline_start);
    let upper = clip.duration - MIN_CLIP_DURATION;
    let delta = if upper < lower { 0.0 } else { delta.clamp(lower, upper) };
    Clip {
        source_start: clip.source_start + delta,
        timeline_start: clip.timeline_start + delta,
        duration: clip.duration - delta,
        ..clip.clone()
    }
}

/// Right handle: moves the out-point, never below `MIN_CLIP_DURATION`.
pub fn trim_right(clip: &Clip, delta: f64) -> Clip {
    let duration = (clip.duration + delta).max(MIN_CLIP_DURATION);
    Clip {
        source_end: clip.source_start + duration,
        duration,
        ..clip.clone()
    }
}

pub fn move_clip(clip: &Clip, delta: f64) -> Clip {
    Clip {
        timeline_start: (clip.timeline_start + delta).max(0.0),
        ..clip.clone()
    }
}

impl DragGesture {
    pub fn is_dragging(&self) -> bool {
        matches!(self, DragGesture::Dragging(_))
    }

    pub fn clip_id(&self) -> Option<&str> {
        match self {
            DragGesture::Idle => None,
            DragGesture::Dragging(drag) => Some(&drag.snapshot.id),
        }
    }

    pub fn begin(
        &mut self,
        kind: DragKind,
        clip_id: &str,
        pointer_x: f64,
        timeline: &Timeline,
    ) -> Result<(), GestureError> {
        if self.is_dragging() {
            return Err(GestureError::Busy);
        }
        let snapshot = timeline
            .clip(clip_id)
            .cloned()
            .ok_or_else(|| GestureError::ClipNotFound(clip_id.to_string()))?;
        *self = DragGesture::Dragging(ActiveDrag {
            kind,
            origin_x: pointer_x,
            snapshot,
        });
        Ok(())
    }

    pub fn pointer_move(&self, pointer_x: f64, timeline: &mut Timeline) -> Result<(), GestureError> {
        let DragGesture::Dragging(drag) = self else {
            return Err(GestureError::NotDragging);
        };
        let delta = timeline.zoom.seconds(pointer_x - drag.origin_x);
        let updated = match drag.kind {
            DragKind::TrimLeft => trim_left(&drag.snapshot, delta),
            DragKind::TrimRight => trim_right(&drag.snapshot, delta),
            DragKind::Move => move_clip(&drag.snapshot, delta),
        };
        let clip = timeline
            .clip_mut(&drag.snapshot.id)
            .ok_or_else(|| GestureError::ClipNotFound(drag.snapshot.id.clone()))?;
        *clip = updated;
        Ok(())
    }

    /// Ends the gesture, keeping whatever the last move produced.
    pub fn release(&mut self) -> Option<String> {
        match std::mem::take(self) {
            DragGesture::Idle => None,
            DragGesture::Dragging(drag) => Some(drag.snapshot.id),
        }
    }

    /// Ends the gesture and puts the clip back the way it was.
    pub fn cancel(&mut self, timeline: &mut Timeline) {
        if let DragGesture::Dragging(drag) = std::mem::take(self) {
            if let Some(clip) = timeline.clip_mut(&drag.snapshot.id) {
                *clip = drag.snapshot;
            }
        }
    }
}
