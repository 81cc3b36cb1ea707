//! Upstream event model.
//!
//! The agent's stream is a sequence of lines. Lines of the form
//! `data: <json>` carry one event each:
//!
//! ```text
//! data: {"type":"text-delta","payload":{"text":"It is "}}
//! data: {"type":"step-finish","payload":{}}
//! ```
//!
//! Only `text-delta` events with non-empty text matter to the relay; every
//! other event type is decoded and then ignored.
//!
//! # Example
//!
//! ```rust
//! use weather_chat::agent::UpstreamEvent;
//!
//! let line = r#"data: {"type":"text-delta","payload":{"text":"sunny."}}"#;
//! let event = UpstreamEvent::from_line(line).unwrap().unwrap();
//! assert_eq!(event.into_text_delta().as_deref(), Some("sunny."));
//! ```

use serde::{Deserialize, Serialize};

/// Prefix marking an event line.
pub const DATA_PREFIX: &str = "data: ";

/// Event tag for incremental reply text.
pub const TEXT_DELTA: &str = "text-delta";

/// One decoded upstream event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamEvent {
    /// Event tag, e.g. `text-delta`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Event body; absent on some lifecycle events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<EventPayload>,
}

/// Body of an upstream event. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    /// Text fragment carried by `text-delta` events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl UpstreamEvent {
    /// Decode one complete line.
    ///
    /// Returns `None` when the line is not an event line at all, and
    /// `Some(Err(_))` when it is but its JSON body does not decode.
    pub fn from_line(line: &str) -> Option<Result<Self, serde_json::Error>> {
        line.strip_prefix(DATA_PREFIX).map(serde_json::from_str)
    }

    /// Build a `text-delta` event.
    pub fn text_delta(text: impl Into<String>) -> Self {
        Self {
            kind: TEXT_DELTA.to_string(),
            payload: Some(EventPayload {
                text: Some(text.into()),
            }),
        }
    }

    /// Render as a `data: ...` line, without the trailing newline.
    pub fn to_line(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        format!("{DATA_PREFIX}{json}")
    }

    /// Extract the reply fragment if this is a non-empty `text-delta`.
    pub fn into_text_delta(self) -> Option<String> {
        if self.kind != TEXT_DELTA {
            return None;
        }
        self.payload
            .and_then(|p| p.text)
            .filter(|text| !text.is_empty())
    }
}
