//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the application to external systems:
//! - `transport` - How the relay reaches the proxy (HTTP, scripted)
//! - `upstream` - The conversational-AI backend behind the proxy (Dify)
//! - `http` - The proxy endpoint itself (axum)

pub mod http;
pub mod transport;
pub mod upstream;

pub use transport::{HttpChatTransport, HttpTransportConfig, ScriptedTransport};
pub use upstream::{DifyClient, DifyConfig};
