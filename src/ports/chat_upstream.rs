//! Chat Upstream Port - The conversational-AI backend behind the proxy.
//!
//! The proxy endpoint forwards one visitor turn to the backend and passes the
//! backend's event stream through untouched. Implementations own the
//! credential and the backend's request format.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

use crate::domain::chat::ChatContext;

/// Backend event stream, forwarded byte for byte.
pub type UpstreamStream = Pin<Box<dyn Stream<Item = Result<Bytes, UpstreamError>> + Send>>;

/// Port for the streaming chat backend.
#[async_trait]
pub trait ChatUpstream: Send + Sync {
    /// Starts a streaming turn and returns the backend's response body.
    async fn stream_chat(&self, request: UpstreamChatRequest) -> Result<UpstreamStream, UpstreamError>;
}

/// One visitor turn as received by the proxy.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamChatRequest {
    pub query: String,
    pub inputs: serde_json::Map<String, serde_json::Value>,
    /// Empty or absent starts a new conversation.
    pub conversation_id: Option<String>,
    /// Falls back to the configured default user when absent.
    pub user: Option<String>,
    pub context: ChatContext,
}

/// Upstream failures, as the proxy needs to tell them apart.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    /// No credential configured for the requested context.
    #[error("missing upstream API key for {0} context")]
    MissingApiKey(ChatContext),

    /// Backend answered with a non-success status.
    #[error("upstream returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error body as text.
        body: String,
    },

    /// Backend could not be reached or the stream broke.
    #[error("upstream network error: {0}")]
    Network(String),
}
