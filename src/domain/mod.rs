//! Domain layer containing the chat vocabulary and pure protocol logic.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (identifiers, timestamps, errors)
//! - `chat` - Transcript, conversation session, frame decoding, upstream events

pub mod chat;
pub mod foundation;
