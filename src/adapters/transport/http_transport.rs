//! HTTP Chat Transport - Implementation of ChatTransport over reqwest.
//!
//! Posts the chat request as JSON to the proxy endpoint and hands back the
//! response body as a raw byte stream.
//!
//! # Configuration
//!
//! ```ignore
//! let config = HttpTransportConfig::new("https://example.com/api/chat")
//!     .with_connect_timeout(Duration::from_secs(5));
//!
//! let transport = HttpChatTransport::new(config);
//! ```
//!
//! The turn deadline is enforced by the relay, not by the client, so a long
//! answer is never cut off by a client-wide read timeout.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::time::Duration;

use crate::ports::{ByteStream, ChatRequest, ChatTransport, RelayError};

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Proxy endpoint URL (e.g. `http://127.0.0.1:8080/api/chat`).
    pub endpoint: String,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
}

impl HttpTransportConfig {
    /// Creates a configuration for the given endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Sets the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Chat transport that talks to the proxy over HTTP.
pub struct HttpChatTransport {
    config: HttpTransportConfig,
    client: Client,
}

impl HttpChatTransport {
    /// Creates a new transport with the given configuration.
    pub fn new(config: HttpTransportConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        Self { config, client }
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn open(&self, request: &ChatRequest) -> Result<ByteStream, RelayError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Accept", "text/event-stream")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    RelayError::network(format!("Connection failed: {}", e))
                } else {
                    RelayError::network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), "Chat proxy rejected request: {}", body);
            return Err(RelayError::status(status.as_u16(), body));
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| RelayError::network(format!("Stream error: {}", e))));

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder_works() {
        let config = HttpTransportConfig::new("http://localhost:8080/api/chat")
            .with_connect_timeout(Duration::from_secs(3));

        assert_eq!(config.endpoint, "http://localhost:8080/api/chat");
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_network_error() {
        // Port 9 (discard) on localhost is not listening in test environments.
        let transport = HttpChatTransport::new(
            HttpTransportConfig::new("http://127.0.0.1:9/api/chat")
                .with_connect_timeout(Duration::from_secs(2)),
        );
        let request = ChatRequest::new("hi", crate::domain::foundation::VisitorId::new());

        let err = match transport.open(&request).await {
            Ok(_) => panic!("expected a connection failure"),
            Err(err) => err,
        };
        assert!(matches!(err, RelayError::Network(_)));
    }
}
