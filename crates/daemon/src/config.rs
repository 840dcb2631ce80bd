use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

const DEFAULT_VIDEODB_BASE_URL: &str = "https://api.videodb.io";
const DEFAULT_OPENROUTER_MODEL: &str = "openai/gpt-4o-mini";
const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";

/// Daemon settings, read once from the environment at startup.
///
/// API keys are optional here: a missing key only fails the calls that
/// need it, so the server still starts and answers `/health`.
#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub public_base_url: String,
    pub files_dir: PathBuf,
    pub cors_origin: String,
    pub videodb_api_key: Option<String>,
    pub videodb_base_url: String,
    pub openrouter_api_key: Option<String>,
    pub openrouter_model: String,
    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_voice_id: String,
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let addr = var("DAEMON_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8000".to_string())
            .parse()
            .context("DAEMON_ADDR is not a socket address")?;

        Ok(Config {
            addr,
            public_base_url: var("PUBLIC_BASE_URL")
                .unwrap_or_else(|| "http://localhost:8000".to_string())
                .trim_end_matches('/')
                .to_string(),
            files_dir: PathBuf::from(var("FILES_DIR").unwrap_or_else(|| "temp_storage".to_string())),
            cors_origin: var("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string()),
            videodb_api_key: var("VIDEODB_API_KEY"),
            videodb_base_url: var("VIDEODB_BASE_URL")
                .unwrap_or_else(|| DEFAULT_VIDEODB_BASE_URL.to_string()),
            openrouter_api_key: var("OPENROUTER_API_KEY"),
            openrouter_model: var("OPENROUTER_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENROUTER_MODEL.to_string()),
            elevenlabs_api_key: var("ELEVENLABS_API_KEY"),
            elevenlabs_voice_id: var("ELEVENLABS_VOICE_ID")
                .unwrap_or_else(|| DEFAULT_VOICE_ID.to_string()),
        })
    }

    /// Public URL of a file written to `files_dir`.
    pub fn file_url(&self, file_name: &str) -> String {
        format!("{}/files/{}", self.public_base_url, file_name)
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests(files_dir: PathBuf) -> Self {
        Config {
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            public_base_url: "http://localhost:8000".to_string(),
            files_dir,
            cors_origin: "http://localhost:3000".to_string(),
            videodb_api_key: None,
            videodb_base_url: DEFAULT_VIDEODB_BASE_URL.to_string(),
            openrouter_api_key: None,
            openrouter_model: DEFAULT_OPENROUTER_MODEL.to_string(),
            elevenlabs_api_key: None,
            elevenlabs_voice_id: DEFAULT_VOICE_ID.to_string(),
        }
    }
}
