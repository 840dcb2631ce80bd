use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use engine::protocol::{ChatRequest, ChatResponse, ErrorBody, UploadRequest, VoiceResponse};
use engine::render::RenderTimelineRequest;
use engine::voice::VoiceUpload;
use engine::Video;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// HTTP client for the daemon's `/api` routes.
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        BackendClient {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let detail = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.detail)
            .unwrap_or(text);
        Err(anyhow!("{} - {}", status, detail))
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        debug!(messages = request.messages.len(), "sending chat");
        let response = self
            .http
            .post(self.url("/chat"))
            .timeout(REQUEST_TIMEOUT)
            .json(request)
            .send()
            .await?;
        Self::read(response).await
    }

    pub async fn upload(&self, request: &UploadRequest, audio: bool) -> Result<Video> {
        let path = if audio { "/upload/audio" } else { "/upload/video" };
        let response = self
            .http
            .post(self.url(path))
            .timeout(REQUEST_TIMEOUT)
            .json(request)
            .send()
            .await?;
        Self::read(response).await
    }

    pub async fn videos(&self) -> Result<Vec<Video>> {
        let response = self.http.get(self.url("/videos")).send().await?;
        Self::read(response).await
    }

    pub async fn voice_command(&self, upload: VoiceUpload) -> Result<VoiceResponse> {
        let part = reqwest::multipart::Part::bytes(upload.audio)
            .file_name("voice.webm")
            .mime_str("audio/webm")?;
        let mut form = reqwest::multipart::Form::new().part("audio", part);
        if let Some(video_id) = upload.video_id {
            form = form.text("video_id", video_id);
        }
        let response = self
            .http
            .post(self.url("/voice-command"))
            .timeout(REQUEST_TIMEOUT)
            .multipart(form)
            .send()
            .await?;
        Self::read(response).await
    }

    /// Returns the stream URL of the rendered timeline.
    pub async fn render_timeline(&self, request: &RenderTimelineRequest) -> Result<String> {
        let response = self
            .http
            .post(self.url("/video/render-timeline"))
            .timeout(REQUEST_TIMEOUT)
            .json(request)
            .send()
            .await?;
        let body: serde_json::Value = Self::read(response).await?;
        body.get("stream_url")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("render response has no stream_url"))
    }
}
