//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the application and the outside world. Adapters implement these ports.
//!
//! ## Client side
//!
//! - `ChatTransport` - Opens a streaming chat turn against the proxy endpoint
//!
//! ## Server side
//!
//! - `ChatUpstream` - Streams a turn from the conversational-AI backend

mod chat_transport;
mod chat_upstream;

pub use chat_transport::{ByteStream, ChatRequest, ChatTransport, RelayError};
pub use chat_upstream::{ChatUpstream, UpstreamChatRequest, UpstreamError, UpstreamStream};
