//! Conversation state store.
//!
//! Holds the upstream conversation id and the visitor id for one chat
//! session. The conversation id follows first-write-wins: once the backend
//! has issued one, later ids are ignored until [`ConversationSession::reset_conversation`].
//!
//! Every reset starts a new epoch. A turn remembers the epoch it started in
//! and can only adopt an id while that epoch is current, so a turn still
//! streaming across a reset cannot restore the old conversation.

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use crate::domain::foundation::{ConversationId, VisitorId};

#[derive(Debug, Default)]
struct ConversationState {
    conversation_id: Option<ConversationId>,
    epoch: u64,
}

/// Per-session conversation state.
#[derive(Debug, Default)]
pub struct ConversationSession {
    state: Mutex<ConversationState>,
    visitor_id: OnceLock<VisitorId>,
}

impl ConversationSession {
    /// Creates an empty session. The visitor id is generated on first use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session with a known visitor id.
    pub fn with_visitor(visitor_id: VisitorId) -> Self {
        let session = Self::default();
        let _ = session.visitor_id.set(visitor_id);
        session
    }

    /// Returns the visitor id, generating it once on first call.
    pub fn visitor_id(&self) -> VisitorId {
        *self.visitor_id.get_or_init(VisitorId::new)
    }

    /// Snapshot of the active conversation id, if the backend issued one.
    pub fn conversation_id(&self) -> Option<ConversationId> {
        self.lock().conversation_id.clone()
    }

    /// Conversation id and epoch, read together.
    pub fn snapshot(&self) -> (Option<ConversationId>, u64) {
        let state = self.lock();
        (state.conversation_id.clone(), state.epoch)
    }

    /// Records the backend's conversation id if none is set yet.
    ///
    /// Returns true if the id was adopted.
    pub fn adopt_conversation_id(&self, id: ConversationId) -> bool {
        let epoch = self.lock().epoch;
        self.adopt_conversation_id_in(epoch, id)
    }

    /// Like [`ConversationSession::adopt_conversation_id`], but only while
    /// `epoch` is still current.
    pub fn adopt_conversation_id_in(&self, epoch: u64, id: ConversationId) -> bool {
        let mut state = self.lock();
        if state.epoch != epoch || state.conversation_id.is_some() {
            return false;
        }
        state.conversation_id = Some(id);
        true
    }

    /// Forgets the conversation id so the next turn starts a new conversation.
    ///
    /// The visitor id is kept.
    pub fn reset_conversation(&self) {
        let mut state = self.lock();
        state.conversation_id = None;
        state.epoch += 1;
    }

    fn lock(&self) -> MutexGuard<'_, ConversationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ConversationId {
        ConversationId::new(s).unwrap()
    }

    #[test]
    fn starts_without_conversation() {
        assert!(ConversationSession::new().conversation_id().is_none());
    }

    #[test]
    fn first_conversation_id_wins() {
        let session = ConversationSession::new();
        assert!(session.adopt_conversation_id(id("abc")));
        assert!(!session.adopt_conversation_id(id("xyz")));
        assert_eq!(session.conversation_id(), Some(id("abc")));
    }

    #[test]
    fn reset_clears_conversation_but_keeps_visitor() {
        let session = ConversationSession::new();
        let visitor = session.visitor_id();
        session.adopt_conversation_id(id("abc"));

        session.reset_conversation();

        assert!(session.conversation_id().is_none());
        assert_eq!(session.visitor_id(), visitor);
        assert!(session.adopt_conversation_id(id("def")));
    }

    #[test]
    fn stale_epoch_cannot_adopt_after_reset() {
        let session = ConversationSession::new();
        let (_, epoch) = session.snapshot();
        assert!(session.adopt_conversation_id_in(epoch, id("old")));

        session.reset_conversation();

        assert!(!session.adopt_conversation_id_in(epoch, id("old")));
        assert!(session.conversation_id().is_none());

        let (current, next_epoch) = session.snapshot();
        assert!(current.is_none());
        assert!(session.adopt_conversation_id_in(next_epoch, id("new")));
    }

    #[test]
    fn visitor_id_is_stable() {
        let session = ConversationSession::new();
        assert_eq!(session.visitor_id(), session.visitor_id());
    }

    #[test]
    fn with_visitor_uses_given_id() {
        let visitor = VisitorId::new();
        assert_eq!(ConversationSession::with_visitor(visitor).visitor_id(), visitor);
    }
}
