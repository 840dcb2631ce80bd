use axum::{http::HeaderValue, response::Json, routing::get, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, level_filters::LevelFilter, warn};

mod agent;
mod api;
mod config;
mod error;
mod llm;
mod speech;
#[cfg(test)]
mod testing;
mod videodb;

use api::AppState;
use config::Config;
use llm::OpenRouterClient;
use speech::ElevenLabsClient;
use videodb::VideoDbClient;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn app(state: Arc<AppState>) -> anyhow::Result<Router> {
    let origin: HeaderValue = state.config.cors_origin.parse()?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_credentials(false);

    Ok(Router::new()
        .route("/health", get(health))
        .nest("/api", api::router(state.clone()))
        .nest_service("/files", ServeDir::new(&state.config.files_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::INFO)
        .init();

    let config = Config::from_env()?;
    std::fs::create_dir_all(&config.files_dir)?;
    info!("Serving generated files from {:?}", config.files_dir);

    if config.videodb_api_key.is_none() {
        warn!("VIDEODB_API_KEY not set; editing endpoints will fail");
    }
    if config.openrouter_api_key.is_none() {
        warn!("OPENROUTER_API_KEY not set; chat will fail");
    }
    if config.elevenlabs_api_key.is_none() {
        warn!("ELEVENLABS_API_KEY not set; voice commands will fail");
    }

    let state = Arc::new(AppState {
        media: Arc::new(VideoDbClient::new(
            &config.videodb_base_url,
            config.videodb_api_key.clone(),
        )),
        model: Arc::new(OpenRouterClient::new(
            config.openrouter_api_key.clone(),
            config.openrouter_model.clone(),
        )),
        speech: Arc::new(ElevenLabsClient::new(
            config.elevenlabs_api_key.clone(),
            config.elevenlabs_voice_id.clone(),
        )),
        config,
    });

    let addr = state.config.addr;
    let app = app(state)?;

    info!("Starting daemon server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
