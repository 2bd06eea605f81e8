//! Chat transport adapters.
//!
//! Implementations of the ChatTransport port.
//!
//! ## Available Adapters
//!
//! - `HttpChatTransport` - POSTs to the `/api/chat` proxy over reqwest
//! - `ScriptedTransport` - Configurable in-memory transport for testing

mod http_transport;
mod scripted_transport;

pub use http_transport::{HttpChatTransport, HttpTransportConfig};
pub use scripted_transport::{ScriptedChunk, ScriptedResponse, ScriptedTransport, StreamEnd};
