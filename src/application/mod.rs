//! Application layer - the chat relay and the surface built on it.
//!
//! This layer orchestrates domain types and coordinates through ports.

pub mod cancellation;
pub mod relay;
pub mod surface;

pub use cancellation::{CancellationController, RelayPhase, TurnHandle};
pub use relay::{StreamRelay, DEFAULT_TURN_TIMEOUT};
pub use surface::{ChatSurface, SubmitError, DEFAULT_GREETING};
