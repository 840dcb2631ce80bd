use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    response::Json,
    routing::post,
    Router,
};
use bytes::Bytes;
use std::sync::Arc;
use tracing::{error, info, warn};

use engine::protocol::{ChatMessage, ChatRequest, VideoContext, VideoRef, VoiceResponse};
use engine::voice::MIN_AUDIO_BYTES;

use crate::agent;
use crate::api::AppState;
use crate::error::ApiError;

const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;
const DEFAULT_REPLY: &str = "I processed your request.";

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/voice-command", post(voice_command))
        .layer(DefaultBodyLimit::max(MAX_AUDIO_BYTES))
        .with_state(state)
}

struct VoiceUpload {
    audio: Bytes,
    file_name: String,
    content_type: String,
    video_id: Option<String>,
}

async fn read_upload(mut multipart: Multipart) -> Result<VoiceUpload, ApiError> {
    let mut audio = None;
    let mut video_id = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("audio") => {
                let file_name = field.file_name().unwrap_or("voice.webm").to_string();
                let content_type = field.content_type().unwrap_or("audio/webm").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("could not read audio: {}", e)))?;
                audio = Some((bytes, file_name, content_type));
            }
            Some("video_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("could not read video_id: {}", e)))?;
                video_id = Some(text.trim().to_string()).filter(|s| !s.is_empty());
            }
            _ => {}
        }
    }
    let (audio, file_name, content_type) =
        audio.ok_or_else(|| ApiError::BadRequest("audio field is required".to_string()))?;
    Ok(VoiceUpload {
        audio,
        file_name,
        content_type,
        video_id,
    })
}

/// Speech in, edit applied, speech out. Failures past the upload stage are
/// reported in the body with `status: "error"` rather than as HTTP errors.
async fn voice_command(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<VoiceResponse>, ApiError> {
    let upload = read_upload(multipart).await?;
    info!(bytes = upload.audio.len(), video_id = ?upload.video_id, "voice command received");

    if upload.audio.len() < MIN_AUDIO_BYTES {
        return Ok(Json(VoiceResponse::error(
            "Recording too short. Hold the button longer.",
        )));
    }

    let transcription = match state
        .speech
        .transcribe(upload.audio, &upload.file_name, &upload.content_type)
        .await
    {
        Ok(Some(text)) => text,
        Ok(None) => {
            return Ok(Json(VoiceResponse::error(
                "Could not understand audio. Please speak clearly.",
            )))
        }
        Err(e) => {
            warn!(error = %e, "transcription failed");
            return Ok(Json(VoiceResponse::error("Speech recognition service unavailable.")));
        }
    };
    info!(%transcription, "transcribed voice command");

    let content = match &upload.video_id {
        Some(id) => format!("[Working on video_id: {}] {}", id, transcription),
        None => transcription.clone(),
    };
    let request = ChatRequest {
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content,
        }],
        video_context: upload.video_id.as_ref().map(|id| VideoContext {
            current_video: Some(VideoRef {
                id: Some(id.clone()),
                ..Default::default()
            }),
            clip_trim: None,
        }),
    };

    let chat = match agent::run_chat(state.media.as_ref(), state.model.as_ref(), request).await {
        Ok(chat) => chat,
        Err(e) => {
            error!(error = %e, "voice chat failed");
            return Ok(Json(VoiceResponse::error(format!("{e:#}"))));
        }
    };
    let response = if chat.response.trim().is_empty() {
        DEFAULT_REPLY.to_string()
    } else {
        chat.response
    };

    let voice_url = speak(&state, &response).await;

    Ok(Json(VoiceResponse {
        status: "success".to_string(),
        transcription: Some(transcription),
        response,
        voice_url,
        tool_results: Some(chat.tool_results.unwrap_or_default()),
        message: None,
    }))
}

/// A missing spoken reply never fails the command.
async fn speak(state: &AppState, text: &str) -> Option<String> {
    let simple = uuid::Uuid::new_v4().simple().to_string();
    let file_name = format!("voice_reply_{}.mp3", &simple[..8]);
    let dest = state.config.files_dir.join(&file_name);
    match state.speech.synthesize(text, &dest).await {
        Ok(true) => Some(state.config.file_url(&file_name)),
        Ok(false) => None,
        Err(e) => {
            warn!(error = %e, "voice reply failed");
            let _ = tokio::fs::remove_file(&dest).await;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmMessage, ToolCall};
    use crate::testing::{app, send, state, FakeMedia, FakeSpeech, ScriptedModel, Transcript};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};

    const BOUNDARY: &str = "voiceboundary";

    fn voice_request(audio_len: usize, video_id: Option<&str>) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"audio\"; filename=\"voice.webm\"\r\nContent-Type: audio/webm\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend(std::iter::repeat(7u8).take(audio_len));
        body.extend_from_slice(b"\r\n");
        if let Some(id) = video_id {
            body.extend_from_slice(
                format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"video_id\"\r\n\r\n{id}\r\n")
                    .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Request::post("/api/voice-command")
            .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn short_recording_is_reported_in_body() {
        let state = state(
            FakeMedia::default(),
            ScriptedModel::new(vec![]),
            FakeSpeech::new(Transcript::Text("hello"), true),
        );
        let (status, body) = send(app(state), voice_request(500, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Recording too short. Hold the button longer.");
    }

    #[tokio::test]
    async fn unintelligible_audio_is_reported() {
        let state = state(
            FakeMedia::default(),
            ScriptedModel::new(vec![]),
            FakeSpeech::new(Transcript::Silence, true),
        );
        let (_, body) = send(app(state), voice_request(2000, None)).await;
        assert_eq!(body["message"], "Could not understand audio. Please speak clearly.");
    }

    #[tokio::test]
    async fn stt_outage_is_reported() {
        let state = state(
            FakeMedia::default(),
            ScriptedModel::new(vec![]),
            FakeSpeech::new(Transcript::Unavailable, true),
        );
        let (_, body) = send(app(state), voice_request(2000, None)).await;
        assert_eq!(body["message"], "Speech recognition service unavailable.");
    }

    #[tokio::test]
    async fn command_runs_agent_and_speaks_reply() {
        let state = state(
            FakeMedia::with_video("m-1", 30.0),
            ScriptedModel::new(vec![
                LlmMessage::with_tool_calls(
                    None,
                    vec![ToolCall::new(
                        "call_1",
                        "trim_video",
                        r#"{"video_id":"m-1","start":0,"end":10}"#,
                    )],
                ),
                LlmMessage::assistant("Done."),
            ]),
            FakeSpeech::new(Transcript::Text("keep the first ten seconds"), true),
        );
        let (status, body) = send(app(state.clone()), voice_request(4000, Some("m-1"))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["transcription"], "keep the first ten seconds");
        assert_eq!(body["response"], "Done.");
        assert_eq!(body["tool_results"][0]["tool"], "trim_video");

        let voice_url = body["voice_url"].as_str().unwrap();
        assert!(voice_url.starts_with("http://localhost:8000/files/voice_reply_"));
        let file_name = voice_url.rsplit('/').next().unwrap();
        assert!(state.config.files_dir.join(file_name).exists());
    }

    #[tokio::test]
    async fn empty_reply_falls_back_and_voice_is_optional() {
        let state = state(
            FakeMedia::default(),
            ScriptedModel::new(vec![LlmMessage::assistant("")]),
            FakeSpeech::new(Transcript::Text("hello"), false),
        );
        let (_, body) = send(app(state), voice_request(4000, None)).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["response"], DEFAULT_REPLY);
        assert!(body.get("voice_url").is_none());
        assert_eq!(body["tool_results"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn missing_audio_field_is_bad_request() {
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"video_id\"\r\n\r\nm-1\r\n--{BOUNDARY}--\r\n"
        );
        let request = Request::post("/api/voice-command")
            .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap();
        let state = state(
            FakeMedia::default(),
            ScriptedModel::new(vec![]),
            FakeSpeech::new(Transcript::Silence, false),
        );
        let (status, _) = send(app(state), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
