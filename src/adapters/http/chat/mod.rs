//! HTTP adapter for the chat proxy endpoint.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{ChatProxyRequest, ErrorResponse};
pub use handlers::{ChatApiError, ChatAppState};
pub use routes::chat_router;
