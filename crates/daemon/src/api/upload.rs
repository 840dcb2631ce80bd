use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tracing::info;

use engine::protocol::{UploadRequest, UploadResponse};
use engine::Video;

use crate::api::AppState;
use crate::error::ApiError;
use crate::videodb::MediaType;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/upload/video", post(upload_video))
        .route("/upload/audio", post(upload_audio))
        .route("/videos", get(list_videos))
        .with_state(state)
}

async fn upload(
    state: &AppState,
    request: UploadRequest,
    media_type: MediaType,
) -> Result<Json<UploadResponse>, ApiError> {
    let url = request.url.trim();
    if url.is_empty() {
        return Err(ApiError::BadRequest("url is required".to_string()));
    }
    info!(url, media_type = media_type.as_str(), "upload requested");
    let video = state
        .media
        .upload(url, request.name.as_deref(), media_type)
        .await?;
    Ok(Json(video))
}

async fn upload_video(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UploadRequest>,
) -> Result<Json<UploadResponse>, ApiError> {
    upload(&state, request, MediaType::Video).await
}

async fn upload_audio(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UploadRequest>,
) -> Result<Json<UploadResponse>, ApiError> {
    upload(&state, request, MediaType::Audio).await
}

async fn list_videos(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Video>>, ApiError> {
    Ok(Json(state.media.list_videos().await?))
}
