use axum::Router;
use std::sync::Arc;

use crate::config::Config;
use crate::llm::ChatModel;
use crate::speech::SpeechService;
use crate::videodb::MediaService;

pub mod captions;
pub mod chat;
pub mod edit;
pub mod render;
pub mod upload;
pub mod voice;

pub struct AppState {
    pub config: Config,
    pub media: Arc<dyn MediaService>,
    pub model: Arc<dyn ChatModel>,
    pub speech: Arc<dyn SpeechService>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(chat::router(state.clone()))
        .merge(upload::router(state.clone()))
        .merge(edit::router(state.clone()))
        .merge(render::router(state.clone()))
        .merge(captions::router(state.clone()))
        .merge(voice::router(state))
}
