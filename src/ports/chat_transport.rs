//! Chat Transport Port - How the relay reaches the chat proxy.
//!
//! The relay only needs "send this request body, hand me the response bytes
//! as they arrive". Keeping that behind a port lets the relay run against the
//! real HTTP proxy or a scripted in-memory stream.
//!
//! # Contract
//!
//! - `open` resolves once response headers are in; a non-success status is
//!   reported as [`RelayError::Status`] with the error body already read.
//! - The returned stream yields body chunks exactly as received. Dropping it
//!   releases the underlying connection.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::domain::chat::ChatContext;
use crate::domain::foundation::{ConversationId, VisitorId};

/// Response body as a stream of raw chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, RelayError>> + Send>>;

/// Port for opening a streaming chat turn.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends the request and returns the response body stream.
    async fn open(&self, request: &ChatRequest) -> Result<ByteStream, RelayError>;
}

/// Request body for `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The visitor's message.
    pub query: String,
    /// Reserved for structured parameters; always empty today.
    pub inputs: serde_json::Map<String, serde_json::Value>,
    /// Active conversation, or "" to start a new one.
    pub conversation_id: String,
    /// Visitor id.
    pub user: String,
    /// Persona routing hint for the proxy.
    pub context: ChatContext,
}

impl ChatRequest {
    /// Creates a request that starts a new conversation in the general context.
    pub fn new(query: impl Into<String>, visitor_id: VisitorId) -> Self {
        Self {
            query: query.into(),
            inputs: serde_json::Map::new(),
            conversation_id: String::new(),
            user: visitor_id.to_string(),
            context: ChatContext::General,
        }
    }

    /// Continues an existing conversation when one is given.
    pub fn with_conversation_id(mut self, conversation_id: Option<&ConversationId>) -> Self {
        self.conversation_id = conversation_id
            .map(|id| id.as_str().to_string())
            .unwrap_or_default();
        self
    }

    /// Sets the persona routing hint.
    pub fn with_context(mut self, context: ChatContext) -> Self {
        self.context = context;
        self
    }
}

/// Failures of a single relay turn.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    /// Proxy answered with a non-success status.
    #[error("proxy returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error body as text.
        body: String,
    },

    /// Connection or body read failure.
    #[error("network error: {0}")]
    Network(String),

    /// The turn did not complete in time.
    #[error("turn timed out after {timeout_secs}s")]
    Timeout {
        /// Configured deadline.
        timeout_secs: u64,
    },

    /// Backend sent an `error` event mid-stream.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Stopped on purpose (explicit stop or superseded by a newer turn).
    #[error("turn cancelled")]
    Cancelled,
}

impl RelayError {
    /// Creates a status error.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Returns true if this is an intentional stop rather than a failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, RelayError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_request_has_wire_shape() {
        let visitor = VisitorId::new();
        let request = ChatRequest::new("Hello", visitor);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["query"], "Hello");
        assert_eq!(json["inputs"], serde_json::json!({}));
        assert_eq!(json["conversation_id"], "");
        assert_eq!(json["user"], visitor.to_string());
        assert_eq!(json["context"], "general");
    }

    #[test]
    fn conversation_id_is_echoed() {
        let id = ConversationId::new("abc").unwrap();
        let request = ChatRequest::new("q", VisitorId::new())
            .with_conversation_id(Some(&id))
            .with_context(ChatContext::Business);
        assert_eq!(request.conversation_id, "abc");
        assert_eq!(request.context, ChatContext::Business);

        let cleared = request.with_conversation_id(None);
        assert_eq!(cleared.conversation_id, "");
    }

    #[test]
    fn only_cancelled_counts_as_cancellation() {
        assert!(RelayError::Cancelled.is_cancellation());
        assert!(!RelayError::Timeout { timeout_secs: 60 }.is_cancellation());
        assert!(!RelayError::status(500, "server error").is_cancellation());
    }
}
