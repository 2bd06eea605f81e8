//! Upstream event payloads carried inside frames.

use serde::Deserialize;
use thiserror::Error;

use crate::domain::foundation::ConversationId;

/// Payload marking the end of the stream.
pub const DONE_MARKER: &str = "[DONE]";

/// A decoded upstream event, reduced to what the relay acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamEvent {
    /// `[DONE]` marker.
    Done,
    /// `message` / `agent_message`: the next fragment of the answer.
    Answer {
        fragment: String,
        conversation_id: Option<ConversationId>,
    },
    /// `error`: the backend gave up on this turn.
    Error {
        message: String,
        conversation_id: Option<ConversationId>,
    },
    /// Any other event kind (`message_end`, `ping`, workflow events, ...).
    Other {
        kind: String,
        conversation_id: Option<ConversationId>,
    },
}

/// Why a frame payload could not be turned into an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventParseError {
    #[error("payload is not a JSON event: {0}")]
    InvalidJson(String),
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    event: String,
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    conversation_id: Option<String>,
    // Error details are free-form; their types vary between backend versions.
    #[serde(default)]
    message: Option<serde_json::Value>,
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    status: Option<serde_json::Value>,
}

impl UpstreamEvent {
    /// Parses one frame payload.
    pub fn parse(payload: &str) -> Result<Self, EventParseError> {
        let payload = payload.trim();
        if payload == DONE_MARKER {
            return Ok(UpstreamEvent::Done);
        }

        let raw: RawEvent = serde_json::from_str(payload)
            .map_err(|e| EventParseError::InvalidJson(e.to_string()))?;

        // Blank ids are treated as absent.
        let conversation_id = raw.conversation_id.and_then(|id| ConversationId::new(id).ok());

        Ok(match raw.event.as_str() {
            "message" | "agent_message" => UpstreamEvent::Answer {
                fragment: raw.answer.unwrap_or_default(),
                conversation_id,
            },
            "error" => UpstreamEvent::Error {
                message: describe_error(raw.message, raw.code, raw.status),
                conversation_id,
            },
            _ => UpstreamEvent::Other {
                kind: raw.event,
                conversation_id,
            },
        })
    }

    /// Conversation id carried by this event, if any.
    pub fn conversation_id(&self) -> Option<&ConversationId> {
        match self {
            UpstreamEvent::Done => None,
            UpstreamEvent::Answer { conversation_id, .. }
            | UpstreamEvent::Error { conversation_id, .. }
            | UpstreamEvent::Other { conversation_id, .. } => conversation_id.as_ref(),
        }
    }
}

fn describe_error(
    message: Option<serde_json::Value>,
    code: Option<serde_json::Value>,
    status: Option<serde_json::Value>,
) -> String {
    let message = detail_text(message).unwrap_or_else(|| "upstream reported an error".to_string());
    match (detail_text(code), detail_text(status)) {
        (Some(code), Some(status)) => format!("{} ({}, status {})", message, code, status),
        (Some(code), None) => format!("{} ({})", message, code),
        (None, Some(status)) => format!("{} (status {})", message, status),
        (None, None) => message,
    }
}

/// Renders a detail field as text; strings lose their quotes, null is absent.
fn detail_text(value: Option<serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.trim().is_empty() => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
