//! Upstream agent driver traits and implementations.
//!
//! The relay never talks to the weather agent directly; it goes through the
//! [`AgentDriver`] trait so the transport can be swapped for an in-process stub.
//!
//! # Drivers
//!
//! - [`HttpAgentDriver`]: `POST <agent-url>` with `{ prompt, stream: true }`
//!
//! # Events
//!
//! The agent answers with an SSE-like body made of `data: <json>` lines. The
//! [`event`] module decodes one such line into an [`UpstreamEvent`].

pub mod event;
pub mod http;

pub use event::{EventPayload, UpstreamEvent};
pub use http::HttpAgentDriver;

use axum::body::Bytes;
use axum::http::StatusCode;
use futures::stream::BoxStream;
use serde::Serialize;

/// Boxed error used for transport failures from any driver.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Raw upstream body, chunked the way the network delivered it.
pub type ByteStream = BoxStream<'static, Result<Bytes, AgentError>>;

/// Request body sent to the upstream agent.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AgentRequest {
    /// User prompt, forwarded verbatim.
    pub prompt: String,
    /// Always `true`: the relay only speaks the streaming dialect.
    pub stream: bool,
}

impl AgentRequest {
    /// Build a streaming request for `prompt`.
    pub fn streaming(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            stream: true,
        }
    }
}

/// Errors raised while talking to the upstream agent.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// No response at all (connect, DNS, TLS, request write).
    #[error("upstream request failed: {0}")]
    Transport(#[source] BoxError),

    /// The agent answered with a non-success status.
    #[error("upstream returned status {status}")]
    Status {
        /// Status code returned by the agent.
        status: StatusCode,
        /// Error body, kept for logging.
        body: String,
    },

    /// The body failed after the response head arrived.
    #[error("upstream stream failed: {0}")]
    Stream(#[source] BoxError),
}

/// Trait for upstream agent connections.
///
/// Implementations open one streaming exchange per call and hand back the
/// response body as raw bytes. Status handling happens here; line framing and
/// event filtering are left to the relay.
#[async_trait::async_trait]
pub trait AgentDriver: Send + Sync + std::fmt::Debug {
    /// Send `prompt` upstream with streaming enabled.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Transport`] if no response arrives and
    /// [`AgentError::Status`] if the agent answers with a non-success status.
    async fn open(&self, prompt: &str) -> Result<ByteStream, AgentError>;
}
