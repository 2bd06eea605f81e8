//! Portfolio Chat - streaming chat relay for a portfolio site's AI assistant.
//!
//! The crate has two halves that meet at `POST /api/chat`:
//! - a server-side proxy that holds the backend credential and forwards the
//!   backend's event stream untouched
//! - a client-side relay that sends visitor turns to the proxy, decodes the
//!   stream into a growing answer, and keeps the conversation id

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
