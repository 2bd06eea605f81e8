//! Request and response DTOs for the chat proxy endpoint.

use serde::{Deserialize, Serialize};

use crate::domain::chat::ChatContext;
use crate::ports::UpstreamChatRequest;

/// Maximum allowed query length (10,000 characters).
pub const MAX_QUERY_LENGTH: usize = 10_000;

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatProxyRequest {
    /// The visitor's message.
    pub query: String,
    /// Structured parameters; `{}` when absent.
    #[serde(default)]
    pub inputs: Option<serde_json::Map<String, serde_json::Value>>,
    /// Active conversation, empty or absent for a new one.
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Visitor id.
    #[serde(default)]
    pub user: Option<String>,
    /// Persona routing hint; general when absent.
    #[serde(default)]
    pub context: Option<ChatContext>,
}

impl ChatProxyRequest {
    /// Validates the query.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.query.trim().is_empty() {
            return Err("Query cannot be empty");
        }
        if self.query.chars().count() > MAX_QUERY_LENGTH {
            return Err("Query exceeds maximum length");
        }
        Ok(())
    }

    /// Converts to the upstream port's request.
    pub fn into_upstream(self) -> UpstreamChatRequest {
        UpstreamChatRequest {
            query: self.query,
            inputs: self.inputs.unwrap_or_default(),
            conversation_id: self.conversation_id,
            user: self.user,
            context: self.context.unwrap_or_default(),
        }
    }
}

/// Error body returned by the proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}
