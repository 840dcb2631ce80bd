//! In-memory stand-ins for the upstream services, used by unit and route
//! tests.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use axum::{body::Body, http::Request, http::StatusCode, Router};
use bytes::Bytes;
use serde_json::Value;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use engine::Video;

use crate::api::AppState;
use crate::config::Config;
use crate::error::VideoNotFound;
use crate::llm::{ChatModel, LlmMessage};
use crate::speech::SpeechService;
use crate::videodb::{Caption, MediaService, MediaType, TimelineEntry};

#[derive(Default)]
pub struct FakeMedia {
    videos: Mutex<Vec<Video>>,
    compiled: Mutex<Vec<Vec<TimelineEntry>>>,
}

impl FakeMedia {
    pub fn with_video(id: &str, length: f64) -> Self {
        let media = FakeMedia::default();
        media.videos.lock().unwrap().push(Video {
            id: id.to_string(),
            name: format!("{id}.mp4"),
            length,
            stream_url: format!("https://stream.test/{id}.m3u8"),
        });
        media
    }

    /// Every timeline passed to `generate_stream`, oldest first.
    pub fn compiled(&self) -> Vec<Vec<TimelineEntry>> {
        self.compiled.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaService for FakeMedia {
    async fn upload(&self, url: &str, name: Option<&str>, media_type: MediaType) -> Result<Video> {
        if !url.starts_with("http") {
            bail!("Invalid URL: {}", url);
        }
        let mut videos = self.videos.lock().unwrap();
        let id = format!("{}-{}", media_type.as_str(), videos.len() + 1);
        let video = Video {
            id: id.clone(),
            name: name.unwrap_or("upload").to_string(),
            length: 30.0,
            stream_url: format!("https://stream.test/{id}.m3u8"),
        };
        videos.push(video.clone());
        Ok(video)
    }

    async fn get_video(&self, video_id: &str) -> Result<Video> {
        self.videos
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.id == video_id)
            .cloned()
            .ok_or_else(|| VideoNotFound(video_id.to_string()).into())
    }

    async fn list_videos(&self) -> Result<Vec<Video>> {
        Ok(self.videos.lock().unwrap().clone())
    }

    async fn generate_stream(&self, entries: &[TimelineEntry]) -> Result<String> {
        let mut compiled = self.compiled.lock().unwrap();
        compiled.push(entries.to_vec());
        Ok(format!("https://stream.test/compiled-{}.m3u8", compiled.len()))
    }

    async fn index_spoken_words(&self, video_id: &str) -> Result<()> {
        self.get_video(video_id).await.map(|_| ())
    }

    async fn transcript(&self, video_id: &str) -> Result<Vec<Caption>> {
        self.get_video(video_id).await?;
        Ok(vec![
            Caption {
                start: 0.0,
                end: 0.5,
                text: "hello".into(),
            },
            Caption {
                start: 0.5,
                end: 1.0,
                text: "world".into(),
            },
        ])
    }
}

/// Replays canned replies in order and records every transcript it saw.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<LlmMessage>>,
    calls: Mutex<Vec<Vec<LlmMessage>>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<LlmMessage>) -> Self {
        ScriptedModel {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<LlmMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, messages: &[LlmMessage], _tools: &Value) -> Result<LlmMessage> {
        self.calls.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow!("OpenRouter API error: 503 - no scripted reply"))
    }
}

pub enum Transcript {
    Text(&'static str),
    Silence,
    Unavailable,
}

pub struct FakeSpeech {
    transcript: Transcript,
    voice: bool,
}

impl FakeSpeech {
    pub fn new(transcript: Transcript, voice: bool) -> Self {
        FakeSpeech { transcript, voice }
    }
}

#[async_trait]
impl SpeechService for FakeSpeech {
    async fn transcribe(&self, _audio: Bytes, _file_name: &str, _content_type: &str) -> Result<Option<String>> {
        match self.transcript {
            Transcript::Text(text) => Ok(Some(text.to_string())),
            Transcript::Silence => Ok(None),
            Transcript::Unavailable => bail!("ElevenLabs API error: 503 - unavailable"),
        }
    }

    async fn synthesize(&self, _text: &str, dest: &Path) -> Result<bool> {
        if !self.voice {
            return Ok(false);
        }
        tokio::fs::write(dest, b"ID3fake").await?;
        Ok(true)
    }
}

pub fn state(media: FakeMedia, model: ScriptedModel, speech: FakeSpeech) -> Arc<AppState> {
    let files_dir = std::env::temp_dir().join(format!("daemon-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&files_dir).unwrap();
    Arc::new(AppState {
        config: Config::for_tests(files_dir),
        media: Arc::new(media),
        model: Arc::new(model),
        speech: Arc::new(speech),
    })
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new().nest("/api", crate::api::router(state))
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}
