use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::api::AppState;
use crate::error::ApiError;
use crate::videodb::Caption;

#[derive(Deserialize)]
pub struct CaptionRequest {
    pub video_id: String,
}

#[derive(Serialize)]
pub struct CaptionResponse {
    video_id: String,
    captions: Vec<Caption>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/captions/generate", post(generate))
        .route("/captions/:video_id", get(fetch))
        .with_state(state)
}

/// Indexes the video's spoken words, then returns the transcript.
async fn generate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CaptionRequest>,
) -> Result<Json<CaptionResponse>, ApiError> {
    state.media.index_spoken_words(&request.video_id).await?;
    let captions = state.media.transcript(&request.video_id).await?;
    info!(video_id = %request.video_id, captions = captions.len(), "captions generated");
    Ok(Json(CaptionResponse {
        video_id: request.video_id,
        captions,
    }))
}

async fn fetch(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> Result<Json<CaptionResponse>, ApiError> {
    let captions = state.media.transcript(&video_id).await?;
    Ok(Json(CaptionResponse { video_id, captions }))
}
