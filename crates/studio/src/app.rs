//! Drives an `engine::Session` from parsed commands, one network call at a
//! time, and prints whatever the session appended to its transcript.

use std::io::ErrorKind;
use std::path::Path;

use tracing::{info, warn};

use engine::gesture::DragKind;
use engine::messages::Role;
use engine::ops::TimelineOperation;
use engine::protocol::UploadRequest;
use engine::transport::MediaCommand;
use engine::voice::CHUNK_INTERVAL;
use engine::{Session, Timeline};

use crate::client::BackendClient;
use crate::command::{Command, HELP};
use crate::view;

/// Roughly what a 128 kbps recorder emits; a replayed file is cut into
/// one chunk per recorder interval at this rate.
const RECORDER_BYTES_PER_SECOND: u128 = 16_000;
const VOICE_CHUNK_BYTES: usize = (RECORDER_BYTES_PER_SECOND * CHUNK_INTERVAL.as_millis() / 1000) as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Finds the clip whose id starts with `prefix`. Ambiguous prefixes are
/// rejected.
pub fn resolve_clip(timeline: &Timeline, prefix: &str) -> Result<String, String> {
    let matches: Vec<&str> = timeline
        .clips()
        .filter(|c| c.id.starts_with(prefix))
        .map(|c| c.id.as_str())
        .collect();
    match matches.as_slice() {
        [id] => Ok(id.to_string()),
        [] => Err(format!("no clip matches '{prefix}'")),
        _ => Err(format!("'{prefix}' matches {} clips", matches.len())),
    }
}

/// Pointer positions for dragging `clip_id`'s handle by `seconds`.
pub fn drag_positions(timeline: &Timeline, kind: DragKind, clip_id: &str, seconds: f64) -> Option<(f64, f64)> {
    let clip = timeline.clip(clip_id)?;
    let anchor = match kind {
        DragKind::TrimRight => clip.timeline_end(),
        DragKind::TrimLeft | DragKind::Move => clip.timeline_start,
    };
    let from = timeline.zoom.x_at(anchor);
    Some((from, from + seconds * timeline.zoom.pixels_per_second()))
}

pub struct Studio {
    session: Session,
    client: BackendClient,
    shown: usize,
}

impl Studio {
    pub fn new(client: BackendClient) -> Self {
        Studio {
            session: Session::new(),
            client,
            shown: 0,
        }
    }

    /// Prints transcript entries added since the last flush.
    fn flush(&mut self) {
        for message in &self.session.messages.all()[self.shown..] {
            println!("{}", view::message_line(message));
        }
        self.shown = self.session.messages.len();
    }

    fn note(&mut self, text: impl Into<String>) {
        self.session.messages.push(Role::Assistant, text);
    }

    pub async fn run(&mut self, command: Command) -> Flow {
        match command {
            Command::Say(text) => self.chat(&text).await,
            Command::Import { url, name } => self.import(url, name).await,
            Command::ImportAudio { url, name } => self.import_audio(url, name).await,
            Command::Videos => self.refresh_videos().await,
            Command::Select(id) => match self.session.library.select(&id) {
                Some(video) => println!("current video: {} ({})", video.name, video.id),
                None => println!("unknown video: {id}"),
            },
            Command::Voice(path) => self.voice(&path).await,
            Command::ZoomIn => {
                self.session.zoom_in();
                println!("zoom {:.0} px/s", self.session.timeline.zoom.pixels_per_second());
            }
            Command::ZoomOut => {
                self.session.zoom_out();
                println!("zoom {:.0} px/s", self.session.timeline.zoom.pixels_per_second());
            }
            Command::Drag { kind, clip_id, seconds } => self.drag(kind, &clip_id, seconds),
            Command::Split { clip_id, at } => {
                self.edit_clip(&clip_id, |clip_id| TimelineOperation::SplitClip { clip_id, at })
            }
            Command::Cut { clip_id, start, end } => self.edit_clip(&clip_id, |clip_id| {
                TimelineOperation::TrimClip {
                    clip_id,
                    source_start: start,
                    source_end: end,
                }
            }),
            Command::Place { clip_id, at } => self.edit_clip(&clip_id, |clip_id| {
                TimelineOperation::MoveClip {
                    clip_id,
                    timeline_start: at,
                }
            }),
            Command::Delete(clip_id) => {
                self.edit_clip(&clip_id, |clip_id| TimelineOperation::DeleteClip { clip_id })
            }
            Command::Clear => self.edit(TimelineOperation::Clear),
            Command::Seek(seconds) => {
                let x = self.session.timeline.zoom.x_at(seconds);
                let MediaCommand::Seek(t) = self.session.click_ruler(x);
                println!("{}", view::playhead_line(&self.session.timeline, t));
            }
            Command::Play => {
                self.session.transport.played();
                println!("▶ {}", view::clock(self.session.transport.current_time()));
            }
            Command::Pause => {
                self.session.transport.paused();
                println!("■ {}", view::clock(self.session.transport.current_time()));
            }
            Command::Render => self.render().await,
            Command::Export => {
                self.session.export();
            }
            Command::Timeline => {
                for line in view::timeline_lines(&self.session.timeline, &self.session.transport) {
                    println!("{line}");
                }
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => return Flow::Quit,
        }
        self.flush();
        Flow::Continue
    }

    fn edit_clip(&mut self, prefix: &str, op: impl FnOnce(String) -> TimelineOperation) {
        match resolve_clip(&self.session.timeline, prefix) {
            Ok(clip_id) => self.edit(op(clip_id)),
            Err(e) => println!("{e}"),
        }
    }

    fn edit(&mut self, op: TimelineOperation) {
        if let Err(e) = self.session.edit(op) {
            println!("{e}");
            return;
        }
        for line in view::timeline_lines(&self.session.timeline, &self.session.transport) {
            println!("{line}");
        }
    }

    async fn chat(&mut self, text: &str) {
        let Some(request) = self.session.begin_chat(text) else {
            return;
        };
        self.flush();
        let outcome = self
            .client
            .chat(&request)
            .await
            .map_err(|e| format!("{e:#}"));
        let report = self.session.finish_chat(outcome);
        for skipped in &report.skipped {
            warn!(tool = %skipped, "tool result not applied");
        }
    }

    async fn import(&mut self, url: String, name: Option<String>) {
        if !self.session.begin_import() {
            return;
        }
        let outcome = self
            .client
            .upload(&UploadRequest { url, name }, false)
            .await
            .map_err(|e| {
                warn!(error = %e, "import failed");
                e.to_string()
            });
        if let Some(clip_id) = self.session.finish_import(outcome) {
            info!(clip = view::short_id(&clip_id), "clip added");
        }
    }

    async fn import_audio(&mut self, url: String, name: Option<String>) {
        match self.client.upload(&UploadRequest { url, name }, true).await {
            Ok(audio) => {
                let label = audio.name.clone();
                let clip_id = self.session.import_audio(audio);
                self.note(format!("✅ Added audio \"{label}\" [{}]", view::short_id(&clip_id)));
            }
            Err(e) => self.note(format!("❌ Failed to import audio: {e:#}")),
        }
    }

    async fn refresh_videos(&mut self) {
        match self.client.videos().await {
            Ok(videos) => {
                for video in &videos {
                    println!("  {}  {:<24} {:.1}s", video.id, video.name, video.length);
                }
                self.session.library.replace_all(videos);
            }
            Err(e) => self.note(format!("❌ Could not list videos: {e:#}")),
        }
    }

    async fn voice(&mut self, path: &Path) {
        let audio = match tokio::fs::read(path).await {
            Ok(audio) => audio,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                warn!(error = %e, path = ?path, "recording is not readable");
                self.session.microphone_denied();
                return;
            }
            Err(e) => {
                warn!(error = %e, path = ?path, "cannot read recording");
                self.note(format!("❌ Could not read recording {}: {e}", path.display()));
                return;
            }
        };
        if self.session.start_recording().is_err() {
            return;
        }
        for chunk in audio.chunks(VOICE_CHUNK_BYTES) {
            self.session.record_chunk(chunk.to_vec());
        }

        let placeholder = self.session.messages.len();
        let Some(upload) = self.session.stop_recording() else {
            return;
        };
        self.flush();

        let outcome = self
            .client
            .voice_command(upload)
            .await
            .map_err(|e| format!("{e:#}"));
        let voice_url = self.session.finish_voice(outcome);
        // The placeholder line was rewritten in place; print it again.
        self.shown = placeholder;
        if let Some(url) = voice_url {
            self.flush();
            println!("🔊 {url}");
        }
    }

    fn drag(&mut self, kind: DragKind, prefix: &str, seconds: f64) {
        let clip_id = match resolve_clip(&self.session.timeline, prefix) {
            Ok(id) => id,
            Err(e) => {
                println!("{e}");
                return;
            }
        };
        let Some((from, to)) = drag_positions(&self.session.timeline, kind, &clip_id, seconds) else {
            return;
        };
        if let Err(e) = self.session.begin_drag(kind, &clip_id, from) {
            println!("{e}");
            return;
        }
        if let Err(e) = self.session.drag_to(to) {
            println!("{e}");
            self.session.cancel_drag();
            return;
        }
        self.session.end_drag();
        if let Some(clip) = self.session.timeline.clip(&clip_id) {
            println!(
                "[{}] {} → {}  (source {:.1}s–{:.1}s)",
                view::short_id(&clip.id),
                view::clock(clip.timeline_start),
                view::clock(clip.timeline_end()),
                clip.source_start,
                clip.source_end
            );
        }
    }

    async fn render(&mut self) {
        let request = self.session.render_request();
        if request.clips.is_empty() {
            self.session
                .finish_render(Err("the timeline has no video clips".to_string()));
            return;
        }
        println!("rendering {} clip(s)…", request.clips.len());
        let outcome = self
            .client
            .render_timeline(&request)
            .await
            .map_err(|e| format!("{e:#}"));
        self.session.finish_render(outcome);
    }
}
