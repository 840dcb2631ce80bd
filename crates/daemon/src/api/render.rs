use axum::{extract::State, response::Json, routing::post, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use engine::render::RenderTimelineRequest;

use crate::api::AppState;
use crate::error::ApiError;
use crate::videodb::edits;

fn default_resolution() -> String {
    "1080p".to_string()
}

#[derive(Deserialize)]
pub struct RenderRequest {
    pub video_id: String,
    #[serde(default = "default_resolution")]
    pub resolution: String,
}

#[derive(Serialize)]
pub struct RenderResponse {
    stream_url: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/render", post(render))
        .route("/video/render-timeline", post(render_timeline))
        .with_state(state)
}

async fn render(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RenderRequest>,
) -> Result<Json<RenderResponse>, ApiError> {
    let video = state.media.get_video(&request.video_id).await?;
    info!(video_id = %video.id, resolution = %request.resolution, "render requested");
    Ok(Json(RenderResponse {
        stream_url: video.stream_url,
        status: "rendered",
        message: None,
    }))
}

async fn render_timeline(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RenderTimelineRequest>,
) -> Result<Json<RenderResponse>, ApiError> {
    if request.clips.is_empty() {
        return Err(ApiError::BadRequest("timeline has no video clips".to_string()));
    }
    let stream_url = edits::render_timeline(state.media.as_ref(), &request).await?;
    Ok(Json(RenderResponse {
        stream_url,
        status: "rendered",
        message: Some(format!(
            "Rendered {} video clip(s) and {} audio clip(s)",
            request.clips.len(),
            request.audio_clips.len()
        )),
    }))
}
