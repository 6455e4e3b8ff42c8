use axum::routing::{delete, get, post, put};
use axum::Router;
use tracing_subscriber::EnvFilter;

use resume_search::api;
use resume_search::config::Config;
use resume_search::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Resume snapshot: {}", config.snapshot_path().display());
    tracing::info!("LLM provider: {} ({})", config.llm.provider, config.llm.base_url);

    // A missing store leaves the pipeline uninitialized; the server still
    // starts so health and conversation endpoints keep working.
    let state = AppState::new(config.clone())?;

    let app = Router::new()
        .route("/api/search", post(api::search::search))
        .route("/api/chat", post(api::chat::chat))
        .route(
            "/api/conversations/{id}/history",
            get(api::conversations::history),
        )
        .route(
            "/api/conversations/{id}",
            delete(api::conversations::delete),
        )
        .route("/api/config", get(api::config::get_config))
        .route("/api/config", put(api::config::update_config))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
