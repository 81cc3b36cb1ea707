//! Relay error taxonomy and its HTTP mapping.
//!
//! Every failure the relay reports before streaming starts is a
//! [`RelayError`]. Each variant carries the user-presentable message as its
//! `Display` text and maps to a fixed status code; the response body is always
//! JSON `{ "error": "<message>" }`.
//!
//! Failures after the response head has been committed cannot change the
//! status any more. Those abort the body instead (see [`crate::relay`]).

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::relay::MAX_PROMPT_CHARS;

/// Errors returned by `POST /api/chat` before any body bytes are sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    /// Body missing, unparsable, or without a usable `prompt`.
    #[error("Invalid request. Missing prompt.")]
    MissingPrompt,

    /// `prompt` is not a string, or only whitespace.
    #[error("Prompt must be a non-empty string.")]
    InvalidPrompt,

    /// `prompt` exceeds [`MAX_PROMPT_CHARS`].
    #[error("Prompt is too long. Maximum {} characters.", MAX_PROMPT_CHARS)]
    PromptTooLong,

    /// The upstream agent could not be reached at all.
    #[error("Internal server error. Please try again.")]
    UpstreamUnavailable,

    /// The upstream agent answered 429.
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    /// The upstream agent answered with another non-success status.
    #[error("API returned error: {}", .0.as_u16())]
    UpstreamStatus(StatusCode),
}

impl RelayError {
    /// Map an upstream non-success status onto the relay taxonomy.
    pub fn from_upstream_status(status: StatusCode) -> Self {
        if status == StatusCode::TOO_MANY_REQUESTS {
            Self::RateLimited
        } else {
            Self::UpstreamStatus(status)
        }
    }

    /// HTTP status sent to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingPrompt | Self::InvalidPrompt | Self::PromptTooLong => {
                StatusCode::BAD_REQUEST
            }
            Self::UpstreamUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            // Pass the upstream code through unless it would read as success.
            Self::UpstreamStatus(status) => {
                if status.is_client_error() || status.is_server_error() {
                    *status
                } else {
                    StatusCode::BAD_GATEWAY
                }
            }
        }
    }
}

/// JSON error body shared by the relay and its clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    /// User-presentable message.
    pub error: String,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_bad_request() {
        for err in [
            RelayError::MissingPrompt,
            RelayError::InvalidPrompt,
            RelayError::PromptTooLong,
        ] {
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn too_long_message_names_the_limit() {
        assert_eq!(
            RelayError::PromptTooLong.to_string(),
            "Prompt is too long. Maximum 500 characters."
        );
    }

    #[test]
    fn rate_limit_is_distinct_from_other_statuses() {
        let limited = RelayError::from_upstream_status(StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(limited, RelayError::RateLimited);
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);

        let unavailable = RelayError::from_upstream_status(StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(unavailable.to_string(), "API returned error: 503");
    }

    #[test]
    fn non_error_upstream_status_becomes_bad_gateway() {
        let err = RelayError::from_upstream_status(StatusCode::NOT_MODIFIED);
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.to_string(), "API returned error: 304");
    }
}
