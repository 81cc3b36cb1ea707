//! HTTP driver for the hosted weather agent.
//!
//! This module implements the [`AgentDriver`] trait over reqwest, posting
//! `{ prompt, stream: true }` and exposing the response body as a byte stream.

use futures::StreamExt;
use reqwest::header::{ACCEPT, HeaderValue};
use url::Url;

use crate::config::AgentConfig;

use super::{AgentDriver, AgentError, AgentRequest, ByteStream};

const PLAYGROUND_HEADER: &str = "x-mastra-dev-playground";

/// Driver for the upstream agent's streaming endpoint.
#[derive(Clone)]
pub struct HttpAgentDriver {
    http: reqwest::Client,
    url: Url,
    dev_playground: bool,
}

impl std::fmt::Debug for HttpAgentDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAgentDriver")
            .field("url", &self.url.as_str())
            .field("dev_playground", &self.dev_playground)
            .finish()
    }
}

impl HttpAgentDriver {
    /// Create a driver for the configured agent endpoint.
    pub fn new(settings: &AgentConfig) -> Result<Self, url::ParseError> {
        Self::with_client(settings, reqwest::Client::new())
    }

    /// Create a driver that reuses an existing reqwest client.
    pub fn with_client(
        settings: &AgentConfig,
        http: reqwest::Client,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            http,
            url: Url::parse(&settings.url)?,
            dev_playground: settings.dev_playground,
        })
    }

    /// Endpoint every request is posted to.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait::async_trait]
impl AgentDriver for HttpAgentDriver {
    async fn open(&self, prompt: &str) -> Result<ByteStream, AgentError> {
        let mut rb = self
            .http
            .post(self.url.clone())
            .header(ACCEPT, HeaderValue::from_static("*/*"))
            .json(&AgentRequest::streaming(prompt));
        if self.dev_playground {
            rb = rb.header(PLAYGROUND_HEADER, HeaderValue::from_static("true"));
        }

        let resp = rb
            .send()
            .await
            .map_err(|e| AgentError::Transport(Box::new(e)))?;

        let status = resp.status();
        tracing::info!(
            name: "relay.upstream.status",
            status = %status,
            url = %self.url,
            "Upstream responded"
        );

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AgentError::Status { status, body });
        }

        Ok(resp
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| AgentError::Stream(Box::new(e))))
            .boxed())
    }
}
