//! Dify Client - Implementation of ChatUpstream for Dify's chat-messages API.
//!
//! Sends the visitor's turn with `response_mode: "streaming"` and returns the
//! SSE body untouched for the proxy to forward.
//!
//! # Configuration
//!
//! ```ignore
//! let config = DifyConfig::new()
//!     .with_api_key("app-xxx")
//!     .with_business_api_key("app-yyy")
//!     .with_base_url("https://api.dify.ai/v1");
//!
//! let client = DifyClient::new(config);
//! ```
//!
//! # Persona routing
//!
//! Each Dify "app" has its own key. The business context uses the business
//! key when one is configured and falls back to the default key otherwise.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use std::time::Duration;

use crate::domain::chat::ChatContext;
use crate::ports::{ChatUpstream, UpstreamChatRequest, UpstreamError, UpstreamStream};

/// Configuration for the Dify client.
#[derive(Debug, Clone)]
pub struct DifyConfig {
    /// App key for the general assistant.
    api_key: Option<Secret<String>>,
    /// App key for the business assistant.
    business_api_key: Option<Secret<String>>,
    /// Base URL for the API (default: https://api.dify.ai/v1).
    pub base_url: String,
    /// `user` sent when the visitor did not supply one.
    pub default_user: String,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
}

impl Default for DifyConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DifyConfig {
    /// Creates a configuration with no keys and the public Dify endpoint.
    pub fn new() -> Self {
        Self {
            api_key: None,
            business_api_key: None,
            base_url: "https://api.dify.ai/v1".to_string(),
            default_user: "default-user".to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Sets the default app key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = non_empty_secret(key.into());
        self
    }

    /// Sets the business app key.
    pub fn with_business_api_key(mut self, key: impl Into<String>) -> Self {
        self.business_api_key = non_empty_secret(key.into());
        self
    }

    /// Sets the base URL. A trailing slash is ignored.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the fallback user.
    pub fn with_default_user(mut self, user: impl Into<String>) -> Self {
        self.default_user = user.into();
        self
    }

    /// Sets the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Key to use for a context, if any is configured.
    pub fn api_key_for(&self, context: ChatContext) -> Option<&str> {
        let preferred = match context {
            ChatContext::Business => self.business_api_key.as_ref().or(self.api_key.as_ref()),
            ChatContext::General => self.api_key.as_ref(),
        };
        preferred.map(|key| key.expose_secret().as_str())
    }
}

fn non_empty_secret(key: String) -> Option<Secret<String>> {
    if key.trim().is_empty() {
        None
    } else {
        Some(Secret::new(key))
    }
}

/// Dify chat-messages client.
pub struct DifyClient {
    config: DifyConfig,
    client: Client,
}

impl DifyClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: DifyConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        Self { config, client }
    }

    /// Builds the chat-messages endpoint URL.
    fn chat_messages_url(&self) -> String {
        format!("{}/chat-messages", self.config.base_url)
    }

    /// Converts the proxy request to Dify's format.
    fn to_dify_request(&self, request: UpstreamChatRequest) -> DifyChatRequest {
        DifyChatRequest {
            inputs: request.inputs,
            query: request.query,
            response_mode: "streaming",
            conversation_id: request.conversation_id.unwrap_or_default(),
            user: request
                .user
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| self.config.default_user.clone()),
            files: Vec::new(),
        }
    }
}

#[async_trait]
impl ChatUpstream for DifyClient {
    async fn stream_chat(&self, request: UpstreamChatRequest) -> Result<UpstreamStream, UpstreamError> {
        let context = request.context;
        let api_key = self
            .config
            .api_key_for(context)
            .ok_or(UpstreamError::MissingApiKey(context))?;

        let payload = self.to_dify_request(request);
        tracing::debug!(
            context = %context,
            user = %payload.user,
            conversation_id = %payload.conversation_id,
            "Forwarding chat turn upstream"
        );

        let response = self
            .client
            .post(self.chat_messages_url())
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    UpstreamError::Network(format!("Connection failed: {}", e))
                } else {
                    UpstreamError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| UpstreamError::Network(format!("Stream error: {}", e))));

        Ok(Box::pin(stream))
    }
}

// ----- Dify API Types -----

#[derive(Debug, Serialize)]
struct DifyChatRequest {
    inputs: serde_json::Map<String, serde_json::Value>,
    query: String,
    response_mode: &'static str,
    conversation_id: String,
    user: String,
    files: Vec<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(context: ChatContext) -> UpstreamChatRequest {
        UpstreamChatRequest {
            query: "Hello".to_string(),
            inputs: serde_json::Map::new(),
            conversation_id: None,
            user: None,
            context,
        }
    }

    #[test]
    fn config_builder_works() {
        let config = DifyConfig::new()
            .with_api_key("app-general")
            .with_base_url("https://dify.internal/v1/")
            .with_default_user("guest")
            .with_connect_timeout(Duration::from_secs(3));

        assert_eq!(config.base_url, "https://dify.internal/v1");
        assert_eq!(config.default_user, "guest");
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        assert_eq!(config.api_key_for(ChatContext::General), Some("app-general"));
    }

    #[test]
    fn business_context_prefers_business_key() {
        let config = DifyConfig::new()
            .with_api_key("app-general")
            .with_business_api_key("app-business");
        assert_eq!(config.api_key_for(ChatContext::Business), Some("app-business"));
        assert_eq!(config.api_key_for(ChatContext::General), Some("app-general"));
    }

    #[test]
    fn business_context_falls_back_to_default_key() {
        let config = DifyConfig::new().with_api_key("app-general");
        assert_eq!(config.api_key_for(ChatContext::Business), Some("app-general"));
    }

    #[test]
    fn blank_keys_count_as_missing() {
        let config = DifyConfig::new().with_api_key("  ");
        assert_eq!(config.api_key_for(ChatContext::General), None);
    }

    #[test]
    fn dify_request_fills_defaults() {
        let client = DifyClient::new(DifyConfig::new());
        let payload = client.to_dify_request(request(ChatContext::General));
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["query"], "Hello");
        assert_eq!(json["inputs"], serde_json::json!({}));
        assert_eq!(json["response_mode"], "streaming");
        assert_eq!(json["conversation_id"], "");
        assert_eq!(json["user"], "default-user");
        assert_eq!(json["files"], serde_json::json!([]));
    }

    #[test]
    fn dify_request_keeps_visitor_fields() {
        let client = DifyClient::new(DifyConfig::new());
        let mut req = request(ChatContext::General);
        req.conversation_id = Some("abc".to_string());
        req.user = Some("visitor-1".to_string());

        let payload = client.to_dify_request(req);
        assert_eq!(payload.conversation_id, "abc");
        assert_eq!(payload.user, "visitor-1");
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let client = DifyClient::new(DifyConfig::new());
        let result = client.stream_chat(request(ChatContext::Business)).await;
        assert_eq!(
            result.err(),
            Some(UpstreamError::MissingApiKey(ChatContext::Business))
        );
    }
}
