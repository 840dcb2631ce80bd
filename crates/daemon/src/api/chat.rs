use axum::{extract::State, response::Json, routing::post, Router};
use std::sync::Arc;
use tracing::info;

use engine::protocol::{ChatRequest, ChatResponse};

use crate::agent;
use crate::api::AppState;
use crate::error::ApiError;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new().route("/chat", post(chat)).with_state(state)
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if request.messages.is_empty() {
        return Err(ApiError::BadRequest("messages must not be empty".to_string()));
    }
    info!(messages = request.messages.len(), "chat request");
    let response = agent::run_chat(state.media.as_ref(), state.model.as_ref(), request).await?;
    Ok(Json(response))
}
