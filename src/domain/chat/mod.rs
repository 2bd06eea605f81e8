//! Chat domain: transcript, conversation state, and the upstream wire contract.

mod context;
mod event;
mod frame;
mod message;
mod session;
mod transcript;

pub use context::ChatContext;
pub use event::{EventParseError, UpstreamEvent, DONE_MARKER};
pub use frame::{Frame, FrameDecoder};
pub use message::{ChatMessage, ChatRole, CONNECTION_ERROR_SENTINEL};
pub use session::ConversationSession;
pub use transcript::Transcript;
