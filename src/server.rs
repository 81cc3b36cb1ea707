use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;

use tower_http::trace::TraceLayer;

use tracing::info;

use crate::AppState;
use crate::agent::HttpAgentDriver;
use crate::config::AppConfig;
use crate::{relay, ui};

/// Request bodies are a single short prompt; anything near this is abuse.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Build the application router over an already-assembled state.
///
/// Kept separate from [`start_server`] so tests can mount the same routes
/// over a stub agent driver.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ui::index_handler))
        .route("/health", get(health))
        .route("/api/chat", post(relay::chat))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let driver = HttpAgentDriver::new(&config.agent)?;
    info!(
        name: "agent.config.loaded",
        url = %driver.url(),
        dev_playground = config.agent.dev_playground,
        "Upstream agent configured"
    );

    let state = AppState::new(Arc::clone(&config), Arc::new(driver));
    let app = router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        channel_capacity = config.relay.channel_capacity,
        "Server started"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(name: "server.stopped", "Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!(name: "server.shutdown", "Shutdown signal received");
}

// ─────────────────────────────────────────────────────────────────────────────
// Health
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
}

/// GET /health - Liveness probe.
async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}
