//! Error types for the client transport.

use thiserror::Error;

use crate::error::ErrorBody;

/// Substrings that mark a transport error as a connectivity failure.
const NETWORK_PHRASES: &[&str] = &[
    "failed to fetch",
    "connection refused",
    "dns error",
    "failed to lookup address",
    "network is unreachable",
];

/// Client transport error. `Display` is the message shown to the user.
#[derive(Error, Debug)]
pub enum ClientError {
    /// No complete reply within the configured timeout.
    #[error("Request timeout. The server took too long to respond.")]
    Timeout,

    /// The relay could not be reached.
    #[error("Network error. Please check your internet connection.")]
    Network(#[source] reqwest::Error),

    /// Relay answered 500.
    #[error("Server error. Please try again later.")]
    ServerError,

    /// Relay answered 429.
    #[error("Too many requests. Please wait a moment and try again.")]
    RateLimited,

    /// Relay answered 404.
    #[error("Service not found. Please contact support.")]
    NotFound,

    /// Relay answered another non-success status.
    #[error("{message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// The relay's `error` field, or `Error: <status>`.
        message: String,
    },

    /// The body ended without any non-whitespace text.
    #[error("Received empty response from server.")]
    EmptyResponse,

    /// Base URL could not be parsed or joined.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Any other transport failure, unchanged.
    #[error("{0}")]
    Transport(#[source] reqwest::Error),
}

impl ClientError {
    /// Map a non-success relay status and its body.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            500 => Self::ServerError,
            429 => Self::RateLimited,
            404 => Self::NotFound,
            _ => {
                let message = serde_json::from_str::<ErrorBody>(body)
                    .ok()
                    .map(|b| b.error)
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| format!("Error: {status}"));
                Self::Status { status, message }
            }
        }
    }

    /// Classify a reqwest failure.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() || mentions_network_failure(&err) {
            Self::Network(err)
        } else {
            Self::Transport(err)
        }
    }

    /// Whether retrying the same prompt could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidUrl(_) | Self::NotFound)
    }
}

fn mentions_network_failure(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        let text = e.to_string().to_lowercase();
        if NETWORK_PHRASES.iter().any(|p| text.contains(p)) {
            return true;
        }
        current = e.source();
    }
    false
}
