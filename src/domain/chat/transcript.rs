//! Visible chat transcript.

use crate::domain::foundation::MessageId;

use super::message::ChatMessage;

/// Ordered list of messages shown to the visitor.
///
/// At most one model message is open (still streaming) at a time; every
/// other message is frozen.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    next_seq: u64,
    open: Option<MessageId>,
}

impl Transcript {
    /// Creates a transcript opened by a model greeting.
    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        let mut transcript = Self {
            messages: Vec::new(),
            next_seq: 1,
            open: None,
        };
        let id = transcript.next_id();
        transcript.messages.push(ChatMessage::model(id, greeting));
        transcript
    }

    /// Drops every message and starts over from a greeting.
    ///
    /// Ids keep counting up, so a placeholder from before the restart can
    /// never match one created after it.
    pub fn restart(&mut self, greeting: impl Into<String>) {
        self.messages.clear();
        self.open = None;
        let id = self.next_id();
        self.messages.push(ChatMessage::model(id, greeting));
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Appends the visitor's message and an empty model placeholder.
    ///
    /// Returns the placeholder id. Any previously open placeholder is frozen.
    pub fn begin_turn(&mut self, text: impl Into<String>) -> MessageId {
        self.open = None;
        let user_id = self.next_id();
        self.messages.push(ChatMessage::user(user_id, text));
        let model_id = self.next_id();
        self.messages.push(ChatMessage::model(model_id, String::new()));
        self.open = Some(model_id);
        model_id
    }

    /// Replaces the text of the open placeholder.
    ///
    /// Returns false if `id` is not the open placeholder (already frozen).
    pub fn replace_text(&mut self, id: MessageId, text: &str) -> bool {
        if self.open != Some(id) {
            return false;
        }
        match self.messages.iter_mut().rev().find(|m| m.id == id) {
            Some(message) => {
                message.text.clear();
                message.text.push_str(text);
                true
            }
            None => false,
        }
    }

    /// Freezes the placeholder; later chunks for it are ignored.
    pub fn freeze(&mut self, id: MessageId) {
        if self.open == Some(id) {
            self.open = None;
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.open.is_some()
    }

    fn next_id(&mut self) -> MessageId {
        let id = MessageId::from_sequence(self.next_seq);
        self.next_seq += 1;
        id
    }
}
