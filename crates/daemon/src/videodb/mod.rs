//! VideoDB access: uploads, lookups, timeline compilation and spoken-word
//! indexing. Handlers and agent tools go through [`MediaService`] so tests
//! can swap in a fake.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use engine::protocol::lenient_f64;
use engine::Video;

use crate::error::{check_status, video_not_found};

pub mod edits;
pub mod timeline;

pub use timeline::TimelineEntry;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const POLL_INTERVAL: Duration = Duration::from_secs(2);
const MAX_POLLS: u32 = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Video,
    Audio,
}

impl MediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Video => "video",
            MediaType::Audio => "audio",
        }
    }
}

/// One word or phrase of a spoken-word transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

#[async_trait]
pub trait MediaService: Send + Sync {
    async fn upload(&self, url: &str, name: Option<&str>, media_type: MediaType) -> Result<Video>;
    async fn get_video(&self, video_id: &str) -> Result<Video>;
    async fn list_videos(&self) -> Result<Vec<Video>>;
    /// Compiles a timeline and returns its stream URL.
    async fn generate_stream(&self, entries: &[TimelineEntry]) -> Result<String>;
    async fn index_spoken_words(&self, video_id: &str) -> Result<()>;
    async fn transcript(&self, video_id: &str) -> Result<Vec<Caption>>;
}

pub struct VideoDbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    collection_id: OnceCell<String>,
}

impl VideoDbClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        VideoDbClient {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            collection_id: OnceCell::new(),
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| anyhow!("VIDEODB_API_KEY environment variable not set"))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value> {
        let response = request
            .header("x-access-token", self.api_key()?)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        let body: Value = check_status("VideoDB", response).await?.json().await?;
        self.unwrap_envelope(body).await
    }

    /// Strips the `{success, data}` envelope. Long-running calls answer with
    /// `status: "processing"` and an `output_url` that is polled until done.
    async fn unwrap_envelope(&self, body: Value) -> Result<Value> {
        let mut body = body;
        let mut polls = 0;
        while body.get("status").and_then(|v| v.as_str()) == Some("processing") {
            let output_url = body
                .get("data")
                .and_then(|d| d.get("output_url"))
                .and_then(|v| v.as_str())
                .ok_or_else(|| anyhow!("Invalid response format: processing without output_url"))?
                .to_string();
            polls += 1;
            if polls > MAX_POLLS {
                bail!("VideoDB job did not finish: {}", output_url);
            }
            debug!(%output_url, polls, "waiting on VideoDB job");
            tokio::time::sleep(POLL_INTERVAL).await;
            let response = self
                .http
                .get(&output_url)
                .header("x-access-token", self.api_key()?)
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await?;
            body = check_status("VideoDB", response).await?.json().await?;
        }

        if body.get("success").and_then(|v| v.as_bool()) == Some(false) {
            let message = body
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("request failed");
            bail!("VideoDB error: {}", message);
        }
        Ok(body.get("data").cloned().unwrap_or(Value::Null))
    }

    async fn collection_id(&self) -> Result<&str> {
        let id = self
            .collection_id
            .get_or_try_init(|| async {
                let data = self
                    .send(self.http.get(format!("{}/collection/default", self.base_url)))
                    .await
                    .context("connecting to VideoDB")?;
                let id = data
                    .get("id")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| anyhow!("Invalid response format: missing collection id"))?;
                info!(collection_id = id, "connected to VideoDB");
                Ok::<_, anyhow::Error>(id.to_string())
            })
            .await?;
        Ok(id.as_str())
    }

    async fn stream_for(&self, video: &mut Video) -> Result<()> {
        if !video.stream_url.is_empty() || video.length <= 0.0 {
            return Ok(());
        }
        let url = self
            .generate_stream(&[TimelineEntry::video(video.id.clone(), 0.0, None)])
            .await?;
        video.stream_url = url;
        Ok(())
    }
}

/// VideoDB reports `length` as a string on some endpoints.
pub(crate) fn video_from_json(data: &Value) -> Result<Video> {
    let id = data
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow!("Invalid response format: missing video id"))?;
    Ok(Video {
        id: id.to_string(),
        name: data
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        length: data.get("length").and_then(lenient_f64).unwrap_or(0.0),
        stream_url: data
            .get("stream_url")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
    })
}

fn captions_from_json(data: &Value) -> Vec<Caption> {
    let words = data
        .get("word_timestamps")
        .or_else(|| data.get("segments"))
        .unwrap_or(data);
    words
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let text = item.get("text").and_then(|v| v.as_str())?.trim();
                    if text.is_empty() || text == "-" {
                        return None;
                    }
                    Some(Caption {
                        start: item.get("start").and_then(lenient_f64)?,
                        end: item.get("end").and_then(lenient_f64)?,
                        text: text.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl MediaService for VideoDbClient {
    async fn upload(&self, url: &str, name: Option<&str>, media_type: MediaType) -> Result<Video> {
        let collection_id = self.collection_id().await?;
        let data = self
            .send(
                self.http
                    .post(format!("{}/collection/{}/upload", self.base_url, collection_id))
                    .json(&json!({
                        "url": url,
                        "name": name,
                        "media_type": media_type.as_str(),
                    })),
            )
            .await?;
        let mut video = video_from_json(&data)?;
        if media_type == MediaType::Video {
            self.stream_for(&mut video).await?;
        }
        info!(video_id = %video.id, media_type = media_type.as_str(), "uploaded to VideoDB");
        Ok(video)
    }

    async fn get_video(&self, video_id: &str) -> Result<Video> {
        let collection_id = self.collection_id().await?;
        let data = self
            .send(
                self.http
                    .get(format!("{}/video/{}", self.base_url, video_id))
                    .query(&[("collection_id", collection_id)]),
            )
            .await
            .map_err(|e| video_not_found(e, video_id))
            .with_context(|| format!("loading video {}", video_id))?;
        let mut video = video_from_json(&data)?;
        self.stream_for(&mut video).await?;
        Ok(video)
    }

    async fn list_videos(&self) -> Result<Vec<Video>> {
        let collection_id = self.collection_id().await?;
        let data = self
            .send(
                self.http
                    .get(format!("{}/video", self.base_url))
                    .query(&[("collection_id", collection_id)]),
            )
            .await?;
        let items = data
            .get("videos")
            .and_then(|v| v.as_array())
            .or_else(|| data.as_array())
            .cloned()
            .unwrap_or_default();
        items.iter().map(video_from_json).collect()
    }

    async fn generate_stream(&self, entries: &[TimelineEntry]) -> Result<String> {
        if entries.is_empty() {
            bail!("timeline has no entries");
        }
        let collection_id = self.collection_id().await?;
        let timeline: Vec<Value> = entries.iter().map(TimelineEntry::to_json).collect();
        let data = self
            .send(
                self.http
                    .post(format!("{}/timeline", self.base_url))
                    .json(&json!({
                        "request_type": "compile",
                        "collection_id": collection_id,
                        "timeline": timeline,
                    })),
            )
            .await?;
        data.get("stream_url")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Invalid response format: missing stream_url"))
    }

    async fn index_spoken_words(&self, video_id: &str) -> Result<()> {
        let collection_id = self.collection_id().await?;
        self.send(
            self.http
                .post(format!("{}/video/{}/index", self.base_url, video_id))
                .json(&json!({
                    "index_type": "spoken_word",
                    "collection_id": collection_id,
                })),
        )
        .await
        .map_err(|e| video_not_found(e, video_id))?;
        info!(video_id, "spoken words indexed");
        Ok(())
    }

    async fn transcript(&self, video_id: &str) -> Result<Vec<Caption>> {
        let collection_id = self.collection_id().await?;
        let data = self
            .send(
                self.http
                    .get(format!("{}/video/{}/transcription", self.base_url, video_id))
                    .query(&[("collection_id", collection_id)]),
            )
            .await
            .map_err(|e| video_not_found(e, video_id))?;
        Ok(captions_from_json(&data))
    }
}
