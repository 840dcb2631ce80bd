use crate::timeline::*;
use serde::{Deserialize, Serialize};

/// A direct edit to clip placement, as opposed to a drag in progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TimelineOperation {
    TrimClip {
        clip_id: String,
        source_start: f64,
        source_end: f64,
    },
    MoveClip {
        clip_id: String,
        timeline_start: f64,
    },
    SplitClip {
        clip_id: String,
        at: f64,
    },
    DeleteClip {
        clip_id: String,
    },
    Clear,
}

impl Timeline {
    pub fn apply_operation(&mut self, op: TimelineOperation) -> Result<(), TimelineError> {
        match op {
            TimelineOperation::TrimClip {
                clip_id,
                source_start,
                source_end,
            } => {
                if source_start < 0.0 || source_end - source_start < MIN_CLIP_DURATION {
                    return Err(TimelineError::InvalidOp(format!(
                        "trim {source_start}..{source_end} is shorter than {MIN_CLIP_DURATION}s"
                    )));
                }
                let clip = self
                    .clip_mut(&clip_id)
                    .ok_or(TimelineError::ClipNotFound(clip_id))?;
                clip.source_start = source_start;
                clip.source_end = source_end;
                clip.duration = source_end - source_start;
                Ok(())
            }
            TimelineOperation::MoveClip {
                clip_id,
                timeline_start,
            } => {
                let clip = self
                    .clip_mut(&clip_id)
                    .ok_or(TimelineError::ClipNotFound(clip_id))?;
                clip.timeline_start = timeline_start.max(0.0);
                Ok(())
            }
            TimelineOperation::SplitClip { clip_id, at } => {
                for track in [&mut self.video, &mut self.audio] {
                    if let Some(index) = track.clips.iter().position(|c| c.id == clip_id) {
                        let clip = &mut track.clips[index];
                        if at <= clip.timeline_start || at >= clip.timeline_end() {
                            return Err(TimelineError::InvalidOp(format!(
                                "split point {at} is outside clip {clip_id}"
                            )));
                        }
                        let offset = at - clip.timeline_start;
                        let split_source = clip.source_start + offset;

                        let mut right = clip.clone();
                        right.id = uuid::Uuid::new_v4().to_string();
                        right.source_start = split_source;
                        right.timeline_start = at;
                        right.duration = clip.source_end - split_source;

                        clip.source_end = split_source;
                        clip.duration = offset;
                        track.clips.insert(index + 1, right);
                        return Ok(());
                    }
                }
                Err(TimelineError::ClipNotFound(clip_id))
            }
            TimelineOperation::DeleteClip { clip_id } => {
                for track in [&mut self.video, &mut self.audio] {
                    if let Some(index) = track.clips.iter().position(|c| c.id == clip_id) {
                        track.clips.remove(index);
                        return Ok(());
                    }
                }
                Err(TimelineError::ClipNotFound(clip_id))
            }
            TimelineOperation::Clear => {
                self.video.clips.clear();
                self.audio.clips.clear();
                Ok(())
            }
        }
    }
}
