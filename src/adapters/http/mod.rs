//! HTTP adapters - REST API implementations.

pub mod chat;
pub mod server;

pub use chat::chat_router;
pub use chat::ChatAppState;
pub use server::{app_router, cors_layer};
