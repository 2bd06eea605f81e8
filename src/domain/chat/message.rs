//! Transcript message types.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{MessageId, Timestamp};

/// Reserved chunk value meaning "this turn failed to reach the assistant".
///
/// Delivered through the chunk callback in place of answer text. Renderers
/// compare by exact equality and show a contact card instead of a bubble.
pub const CONNECTION_ERROR_SENTINEL: &str = "__CONNECTION_ERROR__";

/// The role of a chat message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One turn in the visible transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: ChatRole,
    /// For `Model` messages, replaced wholesale while the answer streams.
    pub text: String,
    pub timestamp: Timestamp,
}

impl ChatMessage {
    /// Creates a visitor-authored message.
    pub fn user(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            role: ChatRole::User,
            text: text.into(),
            timestamp: Timestamp::now(),
        }
    }

    /// Creates an assistant message.
    pub fn model(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            role: ChatRole::Model,
            text: text.into(),
            timestamp: Timestamp::now(),
        }
    }

    /// True when this is a model message carrying the connection error sentinel.
    pub fn is_connection_error(&self) -> bool {
        self.role == ChatRole::Model && self.text == CONNECTION_ERROR_SENTINEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_on_model_message_is_connection_error() {
        let msg = ChatMessage::model(MessageId::from_sequence(2), CONNECTION_ERROR_SENTINEL);
        assert!(msg.is_connection_error());
    }

    #[test]
    fn sentinel_typed_by_user_is_not_connection_error() {
        let msg = ChatMessage::user(MessageId::from_sequence(1), CONNECTION_ERROR_SENTINEL);
        assert!(!msg.is_connection_error());
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ChatRole::Model).unwrap(), "\"model\"");
        assert_eq!(serde_json::to_string(&ChatRole::User).unwrap(), "\"user\"");
    }
}
