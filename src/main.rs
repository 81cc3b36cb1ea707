//! Weather chat relay server
//!
//! Serves the chat page and relays prompts to the hosted weather agent.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use dotenvy::dotenv;

use weather_chat::config::AppConfig;
use weather_chat::{server, telemetry};

#[tokio::main]
async fn main() {
    // Load .env (if present) before config reads the environment
    let _ = dotenv();

    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    telemetry::init(telemetry::SERVER_FILTER, config.logging.json);

    if let Err(e) = server::start_server(Arc::new(config)).await {
        tracing::error!(name: "server.failed", error = %e, "Server exited with error");
        std::process::exit(1);
    }
}
