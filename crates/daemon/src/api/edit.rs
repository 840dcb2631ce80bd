use axum::{extract::State, response::Json, routing::post, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::api::AppState;
use crate::error::ApiError;
use crate::videodb::edits::{self, TextOverlay};

#[derive(Deserialize)]
pub struct TrimRequest {
    pub video_id: String,
    pub start: f64,
    pub end: f64,
}

#[derive(Serialize)]
pub struct EditResponse {
    stream_url: String,
    status: &'static str,
}

impl EditResponse {
    fn from_result(result: &Value) -> Result<Self, ApiError> {
        let stream_url = result
            .get("stream_url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("edit produced no stream_url")))?;
        Ok(EditResponse {
            stream_url: stream_url.to_string(),
            status: "success",
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/edit/trim", post(trim))
        .route("/edit/text-overlay", post(text_overlay))
        .with_state(state)
}

async fn trim(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TrimRequest>,
) -> Result<Json<EditResponse>, ApiError> {
    if request.start < 0.0 || request.end <= request.start {
        return Err(ApiError::BadRequest(format!(
            "invalid trim window {}..{}",
            request.start, request.end
        )));
    }
    let result = edits::trim_video(state.media.as_ref(), &request.video_id, request.start, request.end).await?;
    Ok(Json(EditResponse::from_result(&result)?))
}

async fn text_overlay(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TextOverlay>,
) -> Result<Json<EditResponse>, ApiError> {
    if request.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text must not be empty".to_string()));
    }
    let result = edits::add_text_overlay(state.media.as_ref(), &request).await?;
    Ok(Json(EditResponse::from_result(&result)?))
}
