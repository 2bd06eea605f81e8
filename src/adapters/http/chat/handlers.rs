//! HTTP handlers for the chat proxy endpoint.
//!
//! The proxy keeps the upstream credential server side and forwards the
//! backend's event stream without buffering or rewriting it.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Json, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::ports::{ChatUpstream, UpstreamError};

use super::dto::{ChatProxyRequest, ErrorResponse};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state for chat handlers.
#[derive(Clone)]
pub struct ChatAppState {
    pub upstream: Arc<dyn ChatUpstream>,
}

impl ChatAppState {
    /// Creates a new ChatAppState.
    pub fn new(upstream: Arc<dyn ChatUpstream>) -> Self {
        Self { upstream }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// POST /api/chat
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/chat - Stream one chat turn from the backend.
///
/// On success the response is `text/event-stream` carrying the backend's
/// frames byte for byte.
///
/// # Errors
/// - 400 Bad Request: Empty or oversized query
/// - 500 Internal Server Error: Upstream key not configured, or backend unreachable
/// - Backend status: Backend rejected the turn (body carries its error text)
pub async fn post_chat(
    State(state): State<ChatAppState>,
    Json(request): Json<ChatProxyRequest>,
) -> Result<Response, ChatApiError> {
    request
        .validate()
        .map_err(|msg| ChatApiError::BadRequest(msg.to_string()))?;

    let upstream_request = request.into_upstream();
    let context = upstream_request.context;

    let stream = state.upstream.stream_chat(upstream_request).await?;
    tracing::info!(context = %context, "Relaying upstream event stream");

    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type for chat endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatApiError {
    BadRequest(String),
    /// Server-side configuration is incomplete (missing credential).
    Configuration(String),
    /// Backend answered with this status.
    Upstream { status: u16, details: String },
    Internal(String),
}

impl From<UpstreamError> for ChatApiError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::MissingApiKey(context) => {
                ChatApiError::Configuration(format!("no API key for {} context", context))
            }
            UpstreamError::Status { status, body } => ChatApiError::Upstream {
                status,
                details: body,
            },
            UpstreamError::Network(msg) => ChatApiError::Internal(msg),
        }
    }
}

impl IntoResponse for ChatApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ChatApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::new(msg)),
            ChatApiError::Configuration(msg) => {
                tracing::warn!("Chat proxy misconfigured: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Missing upstream API key"),
                )
            }
            ChatApiError::Upstream { status, details } => {
                tracing::warn!(status, "Upstream rejected chat turn: {}", details);
                (
                    StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                    ErrorResponse::new("Upstream API Error").with_details(details),
                )
            }
            ChatApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Internal Server Error"),
                )
            }
        };

        (status, Json(error)).into_response()
    }
}
