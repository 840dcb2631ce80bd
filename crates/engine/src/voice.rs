use std::time::Duration;

use thiserror::Error;

/// Captures smaller than this are treated as accidental taps.
pub const MIN_AUDIO_BYTES: usize = 1000;
/// How often the recorder hands over a chunk.
pub const CHUNK_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Error, PartialEq)]
pub enum VoiceError {
    #[error("a voice command is already in flight")]
    Busy,
    #[error("not recording")]
    NotRecording,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum VoiceState {
    #[default]
    Idle,
    Recording {
        chunks: Vec<Vec<u8>>,
    },
    Sending,
}

/// Audio ready to post to the voice-command endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceUpload {
    pub audio: Vec<u8>,
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Capture {
    TooShort { bytes: usize },
    Ready(VoiceUpload),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceCapture {
    state: VoiceState,
}

impl VoiceCapture {
    pub fn state(&self) -> &VoiceState {
        &self.state
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, VoiceState::Recording { .. })
    }

    pub fn is_sending(&self) -> bool {
        matches!(self.state, VoiceState::Sending)
    }

    pub fn recorded_bytes(&self) -> usize {
        match &self.state {
            VoiceState::Recording { chunks } => chunks.iter().map(Vec::len).sum(),
            _ => 0,
        }
    }

    /// Pointer-down / touch-start on the mic control.
    pub fn press(&mut self) -> Result<(), VoiceError> {
        match self.state {
            VoiceState::Idle => {
                self.state = VoiceState::Recording { chunks: Vec::new() };
                Ok(())
            }
            _ => Err(VoiceError::Busy),
        }
    }

    /// Returns false when the chunk arrived outside a recording.
    pub fn push_chunk(&mut self, chunk: Vec<u8>) -> bool {
        match &mut self.state {
            VoiceState::Recording { chunks } => {
                if !chunk.is_empty() {
                    chunks.push(chunk);
                }
                true
            }
            _ => false,
        }
    }

    /// Pointer-up / leave / touch-end. Short captures go straight back to
    /// Idle; anything else moves to Sending until `settle`.
    pub fn release(&mut self, video_id: Option<String>) -> Result<Capture, VoiceError> {
        let VoiceState::Recording { chunks } = std::mem::take(&mut self.state) else {
            return Err(VoiceError::NotRecording);
        };
        let audio = chunks.concat();
        if audio.len() < MIN_AUDIO_BYTES {
            return Ok(Capture::TooShort { bytes: audio.len() });
        }
        self.state = VoiceState::Sending;
        Ok(Capture::Ready(VoiceUpload { audio, video_id }))
    }

    pub fn settle(&mut self) {
        if self.is_sending() {
            self.state = VoiceState::Idle;
        }
    }
}
