//! Upstream backend adapters.
//!
//! Implementations of the ChatUpstream port.

mod dify_client;

pub use dify_client::{DifyClient, DifyConfig};
