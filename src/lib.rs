//! Weather Chat
//!
//! A streaming chat relay for a hosted weather agent, plus the clients that
//! talk to it.
//!
//! # Architecture
//!
//! - **Relay**: Axum endpoint that forwards a prompt upstream and re-emits the
//!   agent's `text-delta` events as a plain chunked text stream
//! - **Agent Driver**: reqwest-based upstream connection behind a trait seam
//! - **Client Transport**: timeout-bounded streaming client with incremental
//!   UTF-8 decoding
//! - **Presentation**: in-memory chat thread state plus the browser page
//!
//! # Modules
//!
//! - [`agent`]: Upstream agent driver and event model
//! - [`client`]: Client transport for `POST /api/chat`
//! - [`config`]: Layered configuration (defaults, file, env, CLI)
//! - [`error`]: Relay error taxonomy and its HTTP mapping
//! - [`relay`]: Prompt validation and the SSE-to-text relay
//! - [`server`]: Router construction and server startup
//! - [`session`]: Chat thread state machine
//! - [`telemetry`]: Tracing subscriber setup
//! - [`ui`]: Browser chat page

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod agent;
pub mod client;
pub mod config;
pub mod error;
pub mod relay;
pub mod server;
pub mod session;
pub mod telemetry;
pub mod ui;

use std::sync::Arc;

use crate::agent::AgentDriver;
use crate::config::AppConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Upstream agent connection.
    pub driver: Arc<dyn AgentDriver>,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Build state from a configuration and an upstream driver.
    pub fn new(config: Arc<AppConfig>, driver: Arc<dyn AgentDriver>) -> Self {
        Self { driver, config }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("driver", &self.driver)
            .field("config", &self.config)
            .finish()
    }
}
