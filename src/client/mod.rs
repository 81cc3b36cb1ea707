//! Client transport for the relay's `POST /api/chat`.
//!
//! # Example
//!
//! ```rust,no_run
//! use weather_chat::client::WeatherClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = WeatherClient::new("http://localhost:3000")?;
//!
//! let reply = client
//!     .send_message("Weather in Paris?", |chunk| print!("{chunk}"))
//!     .await?;
//! println!();
//! assert!(!reply.is_empty());
//! # Ok(())
//! # }
//! ```

mod decode;
mod error;

pub use decode::Utf8Decoder;
pub use error::ClientError;

use std::time::Duration;

use futures::StreamExt;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

/// Path of the relay endpoint, relative to the base URL.
pub const CHAT_ENDPOINT: &str = "/api/chat";

/// Whole-request timeout used unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    prompt: &'a str,
}

/// Streaming client for the weather chat relay.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    base_url: Url,
    http: reqwest::Client,
    timeout: Duration,
}

impl WeatherClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the relay (e.g., "http://localhost:3000")
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, ClientError> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a new client with a custom reqwest client.
    pub fn with_client(
        base_url: impl AsRef<str>,
        http: reqwest::Client,
    ) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url.as_ref())?;
        Ok(Self {
            base_url,
            http,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Replace the whole-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send `prompt` and stream the reply.
    ///
    /// `on_chunk` runs once per non-empty decoded fragment, in arrival order.
    /// The returned string is the concatenation of every fragment.
    ///
    /// # Errors
    ///
    /// Fails with [`ClientError::Timeout`] when the whole exchange, body
    /// included, does not finish within the timeout. Non-success statuses,
    /// connectivity failures and whitespace-only replies map to their own
    /// variants.
    pub async fn send_message<F>(&self, prompt: &str, mut on_chunk: F) -> Result<String, ClientError>
    where
        F: FnMut(&str),
    {
        let url = self.base_url.join(CHAT_ENDPOINT)?;

        // Dropping the exchange future on expiry cancels the request.
        match tokio::time::timeout(self.timeout, self.exchange(url, prompt, &mut on_chunk)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    name: "client.request.timeout",
                    timeout_ms = millis(self.timeout),
                    "Request timed out"
                );
                Err(ClientError::Timeout)
            }
        }
    }

    async fn exchange<F>(
        &self,
        url: Url,
        prompt: &str,
        on_chunk: &mut F,
    ) -> Result<String, ClientError>
    where
        F: FnMut(&str),
    {
        let response = self
            .http
            .post(url)
            .json(&ChatRequest { prompt })
            .send()
            .await
            .map_err(ClientError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), body = %body, "Relay returned error status");
            return Err(ClientError::from_status(status.as_u16(), &body));
        }

        let mut decoder = Utf8Decoder::new();
        let mut text = String::new();
        let mut emit = |fragment: String| {
            if !fragment.is_empty() {
                on_chunk(&fragment);
                text.push_str(&fragment);
            }
        };

        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(ClientError::from_transport)?;
            emit(decoder.decode(&chunk));
        }
        emit(decoder.finish());

        if text.trim().is_empty() {
            return Err(ClientError::EmptyResponse);
        }
        Ok(text)
    }
}

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
