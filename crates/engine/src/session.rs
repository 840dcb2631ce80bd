//! One editing session: every piece of front-end state, each in its own
//! cell, plus the flows that move between them (chat, import, voice,
//! drag, playhead, export).

use crate::gesture::{DragGesture, DragKind, GestureError};
use crate::interpreter::{interpret, InterpretReport};
use crate::library::VideoLibrary;
use crate::messages::{MessageStore, Role, LISTENING_PLACEHOLDER};
use crate::ops::TimelineOperation;
use crate::protocol::{
    ChatMessage, ChatRequest, ChatResponse, ClipTrim, ToolResult, VideoContext, VideoRef,
    VoiceResponse,
};
use crate::render::{render_request, RenderTimelineRequest};
use crate::timeline::{Clip, ClipKind, Timeline, TimelineError, Video};
use crate::transport::{MediaCommand, Transport};
use crate::voice::{Capture, VoiceCapture, VoiceError, VoiceUpload};

pub const IMPORT_FAILED: &str = "❌ Failed to import video. Check the URL.";
pub const RECORDING_TOO_SHORT: &str = "Recording too short.";
pub const MICROPHONE_DENIED: &str = "❌ Microphone access denied.";
pub const NOTHING_TO_EXPORT: &str = "❌ No video to export. Import a video first.";

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub messages: MessageStore,
    pub library: VideoLibrary,
    pub timeline: Timeline,
    pub transport: Transport,
    pub gesture: DragGesture,
    pub voice: VoiceCapture,
    is_loading: bool,
    is_importing: bool,
    export_url: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Session::default()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_importing(&self) -> bool {
        self.is_importing
    }

    pub fn export_url(&self) -> Option<&str> {
        self.export_url.as_deref()
    }

    fn sync_duration(&mut self) {
        self.transport.set_duration(self.timeline.total_duration());
    }

    /// The clip showing the current video, if it is on the timeline.
    pub fn current_clip(&self) -> Option<&Clip> {
        let current = self.library.current()?;
        self.timeline
            .video
            .clips
            .iter()
            .find(|c| c.source_id == current.id)
    }

    pub fn video_context(&self) -> Option<VideoContext> {
        let current = self.library.current()?;
        let clip_trim = self.current_clip().and_then(|clip| {
            let trimmed = clip.source_start > 0.0 || clip.source_end < current.length;
            trimmed.then(|| ClipTrim {
                start: clip.source_start,
                end: Some(clip.source_end),
                duration: Some(clip.duration),
            })
        });
        Some(VideoContext {
            current_video: Some(VideoRef {
                id: Some(current.id.clone()),
                name: Some(current.name.clone()),
                length: Some(current.length),
            }),
            clip_trim,
        })
    }

    /// Conversation as sent to the agent. Tool notes and the voice
    /// placeholder stay local.
    pub fn history(&self) -> Vec<ChatMessage> {
        self.messages
            .all()
            .iter()
            .filter(|m| m.role != Role::Tool && m.content != LISTENING_PLACEHOLDER)
            .map(|m| ChatMessage {
                role: m.role.to_string(),
                content: m.content.clone(),
            })
            .collect()
    }

    /// Starts a chat turn. Returns `None` for blank input or while a
    /// previous turn is still in flight.
    pub fn begin_chat(&mut self, text: &str) -> Option<ChatRequest> {
        let text = text.trim();
        if text.is_empty() || self.is_loading {
            return None;
        }
        self.messages.push(Role::User, text);
        self.is_loading = true;
        Some(ChatRequest {
            messages: self.history(),
            video_context: self.video_context(),
        })
    }

    pub fn finish_chat(&mut self, outcome: Result<ChatResponse, String>) -> InterpretReport {
        self.is_loading = false;
        match outcome {
            Ok(response) => {
                self.messages.push(Role::Assistant, response.response);
                self.apply_tool_results(&response.tool_results.unwrap_or_default())
            }
            Err(error) => {
                self.messages.push(Role::Assistant, format!("❌ Error: {error}"));
                InterpretReport::default()
            }
        }
    }

    pub fn apply_tool_results(&mut self, results: &[ToolResult]) -> InterpretReport {
        let report = interpret(results, &mut self.library, &mut self.timeline);
        for tool in &report.applied {
            self.messages.push(Role::Tool, format!("✓ {}", tool.name()));
        }
        for error in &report.errors {
            self.messages.push(Role::Assistant, error.clone());
        }
        if let Some(url) = &report.rendered_url {
            self.export_url = Some(url.clone());
        }
        self.sync_duration();
        report
    }

    /// Returns false if an import is already running.
    pub fn begin_import(&mut self) -> bool {
        if self.is_importing {
            return false;
        }
        self.is_importing = true;
        true
    }

    pub fn finish_import(&mut self, outcome: Result<Video, String>) -> Option<String> {
        self.is_importing = false;
        match outcome {
            Ok(video) => {
                let name = video.name.clone();
                let clip_id = self.import_video(video);
                self.messages
                    .push(Role::Assistant, format!("✅ Imported \"{name}\""));
                Some(clip_id)
            }
            Err(_) => {
                self.messages.push(Role::Assistant, IMPORT_FAILED);
                None
            }
        }
    }

    /// Adds `video` to the library, makes it current and appends a clip
    /// for it to the video track. Returns the new clip id.
    pub fn import_video(&mut self, video: Video) -> String {
        let clip_id = self.timeline.import(&video, ClipKind::Video).id.clone();
        self.library.set_current(video);
        self.sync_duration();
        clip_id
    }

    pub fn import_audio(&mut self, audio: Video) -> String {
        let clip_id = self.timeline.import(&audio, ClipKind::Audio).id.clone();
        self.sync_duration();
        clip_id
    }

    /// Applies a split, cut, placement or removal and refreshes the
    /// playhead bounds.
    pub fn edit(&mut self, op: TimelineOperation) -> Result<(), TimelineError> {
        if self.gesture.is_dragging() {
            return Err(TimelineError::InvalidOp("a drag is in progress".to_string()));
        }
        self.timeline.apply_operation(op)?;
        self.sync_duration();
        Ok(())
    }

    pub fn zoom_in(&mut self) {
        self.timeline.zoom.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.timeline.zoom.zoom_out();
    }

    pub fn begin_drag(&mut self, kind: DragKind, clip_id: &str, x: f64) -> Result<(), GestureError> {
        self.gesture.begin(kind, clip_id, x, &self.timeline)
    }

    pub fn drag_to(&mut self, x: f64) -> Result<(), GestureError> {
        self.gesture.pointer_move(x, &mut self.timeline)?;
        self.sync_duration();
        Ok(())
    }

    pub fn end_drag(&mut self) -> Option<String> {
        let clip_id = self.gesture.release();
        self.sync_duration();
        clip_id
    }

    pub fn cancel_drag(&mut self) {
        self.gesture.cancel(&mut self.timeline);
        self.sync_duration();
    }

    pub fn click_ruler(&mut self, x: f64) -> MediaCommand {
        self.transport.click_ruler(x, &self.timeline.zoom)
    }

    pub fn begin_playhead_drag(&mut self, x: f64) {
        self.transport.begin_playhead_drag(x, &self.timeline.zoom);
    }

    pub fn drag_playhead(&mut self, x: f64) {
        self.transport.drag_playhead(x, &self.timeline.zoom);
    }

    pub fn release_playhead(&mut self) -> Option<MediaCommand> {
        self.transport.release_playhead()
    }

    pub fn start_recording(&mut self) -> Result<(), VoiceError> {
        self.voice.press()
    }

    pub fn record_chunk(&mut self, chunk: Vec<u8>) -> bool {
        self.voice.push_chunk(chunk)
    }

    pub fn microphone_denied(&mut self) {
        self.messages.push(Role::Assistant, MICROPHONE_DENIED);
    }

    /// Stops recording. Returns the upload to send, or `None` when there
    /// is nothing worth sending.
    pub fn stop_recording(&mut self) -> Option<VoiceUpload> {
        let video_id = self.library.current().map(|v| v.id.clone());
        match self.voice.release(video_id) {
            Ok(Capture::Ready(upload)) => {
                self.messages.push(Role::User, LISTENING_PLACEHOLDER);
                Some(upload)
            }
            Ok(Capture::TooShort { .. }) => {
                self.messages.push(Role::Assistant, RECORDING_TOO_SHORT);
                None
            }
            Err(_) => None,
        }
    }

    /// Applies the voice-command reply. Returns the synthesized reply URL
    /// to auto-play, if any.
    pub fn finish_voice(&mut self, outcome: Result<VoiceResponse, String>) -> Option<String> {
        self.voice.settle();
        let response = match outcome {
            Ok(response) if !response.is_error() => response,
            Ok(response) => {
                let message = response
                    .message
                    .unwrap_or_else(|| "Voice command failed.".to_string());
                self.messages
                    .replace_last_matching(Role::User, LISTENING_PLACEHOLDER, format!("❌ {message}"));
                return None;
            }
            Err(error) => {
                self.messages.replace_last_matching(
                    Role::User,
                    LISTENING_PLACEHOLDER,
                    format!("❌ Voice command failed: {error}"),
                );
                return None;
            }
        };

        let transcript = response
            .transcription
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "🎤 (voice command)".to_string());
        self.messages
            .replace_last_matching(Role::User, LISTENING_PLACEHOLDER, transcript);
        self.messages.push(Role::Assistant, response.response);
        self.apply_tool_results(&response.tool_results.unwrap_or_default());
        response.voice_url
    }

    pub fn render_request(&self) -> RenderTimelineRequest {
        render_request(&self.timeline)
    }

    pub fn finish_render(&mut self, outcome: Result<String, String>) {
        match outcome {
            Ok(url) => {
                self.messages
                    .push(Role::Assistant, format!("🎬 Timeline rendered: {url}"));
                self.export_url = Some(url);
            }
            Err(error) => {
                self.messages
                    .push(Role::Assistant, format!("❌ Render failed: {error}"));
            }
        }
    }

    /// URL to hand to the user for download: the last render if there is
    /// one, else the current video's stream.
    pub fn export(&mut self) -> Option<String> {
        let url = self
            .export_url
            .clone()
            .or_else(|| self.library.current().map(|v| v.stream_url.clone()))
            .filter(|url| !url.is_empty());
        match &url {
            Some(url) => self
                .messages
                .push(Role::Assistant, format!("📦 Export ready: {url}")),
            None => self.messages.push(Role::Assistant, NOTHING_TO_EXPORT),
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::video;
    use serde_json::json;

    #[test]
    fn import_scenario() {
        let mut session = Session::new();
        assert!(session.begin_import());
        assert!(!session.begin_import());
        session.finish_import(Ok(video("a", 20.0)));
        assert!(session.begin_import());
        session.finish_import(Ok(video("b", 15.0)));

        let clips = &session.timeline.video.clips;
        assert_eq!((clips[0].timeline_start, clips[0].duration), (0.0, 20.0));
        assert_eq!((clips[1].timeline_start, clips[1].duration), (20.0, 15.0));
        assert_eq!(session.timeline.total_duration(), 35.0);
        assert_eq!(session.library.current().unwrap().id, "b");
        assert!(!session.is_importing());
    }

    #[test]
    fn failed_import_reports_in_transcript() {
        let mut session = Session::new();
        session.begin_import();
        assert_eq!(session.finish_import(Err("HTTP 500".into())), None);
        assert_eq!(session.messages.last().unwrap().content, IMPORT_FAILED);
        assert!(session.timeline.is_empty());
    }

    #[test]
    fn chat_is_not_reentrant() {
        let mut session = Session::new();
        assert!(session.begin_chat("   ").is_none());
        let request = session.begin_chat("trim to five seconds").unwrap();
        assert_eq!(request.messages.len(), 1);
        assert!(request.video_context.is_none());
        assert!(session.begin_chat("again").is_none());

        session.finish_chat(Err("connection refused".into()));
        assert!(!session.is_loading());
        assert_eq!(
            session.messages.last().unwrap().content,
            "❌ Error: connection refused"
        );
        assert!(session.begin_chat("again").is_some());
    }

    #[test]
    fn trim_tool_result_without_length_uses_argument_span() {
        let mut session = Session::new();
        session.import_video(video("a", 20.0));
        session.begin_chat("keep 2 to 7").unwrap();
        let report = session.finish_chat(Ok(ChatResponse {
            response: "Trimmed.".into(),
            tool_calls: None,
            tool_results: Some(vec![ToolResult::new(
                "trim_video",
                json!({"start": 2, "end": 7}),
                json!({}),
            )]),
        }));
        assert!(report.errors.is_empty());
        assert_eq!(session.timeline.video.clips[0].duration, 5.0);
        assert_eq!(session.timeline.total_duration(), 5.0);

        let context = session.video_context().unwrap();
        assert_eq!(
            context.clip_trim,
            Some(ClipTrim {
                start: 2.0,
                end: Some(7.0),
                duration: Some(5.0)
            })
        );
    }

    #[test]
    fn trim_context_survives_a_text_overlay() {
        let mut session = Session::new();
        session.import_video(video("a", 30.0));
        session.begin_chat("keep the first ten seconds").unwrap();
        session.finish_chat(Ok(ChatResponse {
            response: "Trimmed.".into(),
            tool_calls: None,
            tool_results: Some(vec![ToolResult::new(
                "trim_video",
                json!({"video_id": "a", "start": 0, "end": 10}),
                json!({"stream_url": "https://s/a-trim", "start": 0, "end": 10, "duration": 10.0}),
            )]),
        }));

        session.begin_chat("add a title").unwrap();
        session.finish_chat(Ok(ChatResponse {
            response: "Added.".into(),
            tool_calls: None,
            tool_results: Some(vec![ToolResult::new(
                "add_text_overlay",
                json!({"video_id": "a", "text": "Intro", "video_start": 0, "video_end": 10}),
                json!({"stream_url": "https://s/a-text", "text": "Intro", "duration": 5, "length": 10.0}),
            )]),
        }));

        let request = session.begin_chat("make it bigger").unwrap();
        let context = request.video_context.unwrap();
        assert_eq!(context.current_video.unwrap().length, Some(30.0));
        assert_eq!(
            context.clip_trim,
            Some(ClipTrim {
                start: 0.0,
                end: Some(10.0),
                duration: Some(10.0)
            })
        );
    }

    #[test]
    fn untrimmed_clip_sends_no_trim_context() {
        let mut session = Session::new();
        session.import_video(video("a", 20.0));
        let request = session.begin_chat("hello").unwrap();
        let context = request.video_context.unwrap();
        assert_eq!(context.current_video.unwrap().id.as_deref(), Some("a"));
        assert!(context.clip_trim.is_none());
    }

    #[test]
    fn short_recording_never_produces_upload() {
        let mut session = Session::new();
        session.start_recording().unwrap();
        session.record_chunk(vec![0; 512]);
        assert!(session.stop_recording().is_none());
        assert_eq!(session.messages.last().unwrap().content, RECORDING_TOO_SHORT);
        assert!(!session.voice.is_sending());
    }

    #[test]
    fn voice_reply_replaces_placeholder_and_applies_tools() {
        let mut session = Session::new();
        session.import_video(video("a", 20.0));
        session.start_recording().unwrap();
        session.record_chunk(vec![7; 4096]);
        let upload = session.stop_recording().unwrap();
        assert_eq!(upload.video_id.as_deref(), Some("a"));
        assert_eq!(session.messages.last().unwrap().content, LISTENING_PLACEHOLDER);

        let voice_url = session.finish_voice(Ok(VoiceResponse {
            status: "success".into(),
            transcription: Some("keep the first ten seconds".into()),
            response: "Done, trimmed to 10 seconds.".into(),
            voice_url: Some("http://localhost:8000/files/voice_reply_1.mp3".into()),
            tool_results: Some(vec![ToolResult::new(
                "trim_video",
                json!({"video_id": "a", "start": 0, "end": 10}),
                json!({"duration": 10.0, "stream_url": "https://s/a-trim"}),
            )]),
            message: None,
        }));

        assert_eq!(voice_url.as_deref(), Some("http://localhost:8000/files/voice_reply_1.mp3"));
        let contents: Vec<_> = session.messages.all().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            [
                "keep the first ten seconds",
                "Done, trimmed to 10 seconds.",
                "✓ trim_video"
            ]
        );
        assert_eq!(session.timeline.total_duration(), 10.0);
        assert!(!session.voice.is_sending());
    }

    #[test]
    fn voice_error_status_is_surfaced() {
        let mut session = Session::new();
        session.start_recording().unwrap();
        session.record_chunk(vec![1; 2048]);
        session.stop_recording().unwrap();
        let url = session.finish_voice(Ok(VoiceResponse::error(
            "Could not understand audio. Please speak clearly.",
        )));
        assert!(url.is_none());
        assert_eq!(session.messages.len(), 1);
        assert_eq!(
            session.messages.last().unwrap().content,
            "❌ Could not understand audio. Please speak clearly."
        );
    }

    #[test]
    fn export_requires_a_video() {
        let mut session = Session::new();
        assert_eq!(session.export(), None);
        assert_eq!(session.messages.last().unwrap().content, NOTHING_TO_EXPORT);

        session.import_video(video("a", 20.0));
        assert_eq!(
            session.export().as_deref(),
            Some("https://stream.example/a.m3u8")
        );
        session.finish_render(Ok("https://s/final".into()));
        assert_eq!(session.export().as_deref(), Some("https://s/final"));
    }

    #[test]
    fn edits_refresh_playhead_bounds() {
        let mut session = Session::new();
        let a = session.import_video(video("a", 20.0));
        session.import_video(video("b", 10.0));
        session.transport.time_update(28.0);

        session
            .edit(TimelineOperation::SplitClip {
                clip_id: a.clone(),
                at: 5.0,
            })
            .unwrap();
        assert_eq!(session.timeline.video.clips.len(), 3);

        session
            .edit(TimelineOperation::DeleteClip { clip_id: a.clone() })
            .unwrap();
        session.transport.time_update(40.0);
        assert_eq!(session.transport.current_time(), 30.0);

        assert_eq!(
            session.edit(TimelineOperation::DeleteClip { clip_id: a.clone() }),
            Err(TimelineError::ClipNotFound(a))
        );
        session.edit(TimelineOperation::Clear).unwrap();
        assert!(session.timeline.is_empty());
    }

    #[test]
    fn edit_waits_for_drag_to_finish() {
        let mut session = Session::new();
        let id = session.import_video(video("a", 20.0));
        session.begin_drag(DragKind::Move, &id, 80.0).unwrap();
        assert!(matches!(
            session.edit(TimelineOperation::Clear),
            Err(TimelineError::InvalidOp(_))
        ));
        session.end_drag();
        assert!(session.edit(TimelineOperation::Clear).is_ok());
    }

    #[test]
    fn drag_updates_playhead_bounds() {
        let mut session = Session::new();
        let id = session.import_video(video("a", 20.0));
        session.begin_drag(DragKind::TrimRight, &id, 1080.0).unwrap();
        session.drag_to(580.0).unwrap();
        assert_eq!(session.end_drag(), Some(id));
        assert_eq!(session.timeline.total_duration(), 10.0);
        assert_eq!(session.click_ruler(80.0 + 50.0 * 15.0), MediaCommand::Seek(10.0));
    }
}
