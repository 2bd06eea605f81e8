//! Axum routes for the chat proxy.

use axum::routing::post;
use axum::Router;

use super::handlers::{post_chat, ChatAppState};

/// Creates the chat router.
///
/// Routes:
/// - `POST /api/chat` - Stream one chat turn from the backend
pub fn chat_router() -> Router<ChatAppState> {
    Router::new().route("/api/chat", post(post_chat))
}
