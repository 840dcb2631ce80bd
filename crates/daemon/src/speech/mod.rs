//! ElevenLabs speech-to-text for voice commands and text-to-speech for
//! spoken replies.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::error::check_status;

const ELEVENLABS_API_BASE: &str = "https://api.elevenlabs.io/v1";
const STT_MODEL: &str = "scribe_v1";
const TTS_MODEL: &str = "eleven_turbo_v2";
const TTS_FORMAT: &str = "mp3_44100_128";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait SpeechService: Send + Sync {
    /// `Ok(None)` means the audio held no recognisable speech.
    async fn transcribe(&self, audio: Bytes, file_name: &str, content_type: &str) -> Result<Option<String>>;

    /// Writes an MP3 of `text` to `dest`. Returns `false` when speech output
    /// is not configured.
    async fn synthesize(&self, text: &str, dest: &Path) -> Result<bool>;
}

pub struct ElevenLabsClient {
    http: reqwest::Client,
    api_key: Option<String>,
    voice_id: String,
}

impl ElevenLabsClient {
    pub fn new(api_key: Option<String>, voice_id: impl Into<String>) -> Self {
        ElevenLabsClient {
            http: reqwest::Client::new(),
            api_key,
            voice_id: voice_id.into(),
        }
    }
}

#[async_trait]
impl SpeechService for ElevenLabsClient {
    async fn transcribe(&self, audio: Bytes, file_name: &str, content_type: &str) -> Result<Option<String>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("ELEVENLABS_API_KEY environment variable not set"))?;

        let part = reqwest::multipart::Part::bytes(audio.to_vec())
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new()
            .text("model_id", STT_MODEL)
            .part("file", part);

        let response = self
            .http
            .post(format!("{}/speech-to-text", ELEVENLABS_API_BASE))
            .header("xi-api-key", api_key)
            .timeout(REQUEST_TIMEOUT)
            .multipart(form)
            .send()
            .await?;
        let body: Value = check_status("ElevenLabs", response).await?.json().await?;
        Ok(body
            .get("text")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string))
    }

    async fn synthesize(&self, text: &str, dest: &Path) -> Result<bool> {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("ELEVENLABS_API_KEY not set, skipping voice reply");
            return Ok(false);
        };
        if text.trim().is_empty() {
            return Ok(false);
        }

        let response = self
            .http
            .post(format!("{}/text-to-speech/{}", ELEVENLABS_API_BASE, self.voice_id))
            .query(&[("output_format", TTS_FORMAT)])
            .header("xi-api-key", api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&serde_json::json!({
                "text": text,
                "model_id": TTS_MODEL,
            }))
            .send()
            .await?;
        let response = check_status("ElevenLabs", response).await?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0usize;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            written += chunk.len();
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        info!(bytes = written, path = ?dest, "voice reply written");
        Ok(true)
    }
}
