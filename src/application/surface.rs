//! Headless chat surface.
//!
//! Owns the visible transcript and turns visitor input into relay calls.
//! Rendering is left to the caller: a terminal, a test, or a web widget can
//! all read [`ChatSurface::messages`] and react to the text callback.

use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

use crate::domain::chat::{ChatContext, ChatMessage, Transcript};

use super::relay::StreamRelay;

/// Greeting shown at the top of every new conversation.
pub const DEFAULT_GREETING: &str =
    "Hi! I'm the assistant for this portfolio. Ask me about projects, skills, or working together.";

/// Why an input was not sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("message is empty")]
    EmptyMessage,
}

/// One chat widget's state and behaviour.
pub struct ChatSurface {
    relay: Arc<StreamRelay>,
    transcript: Arc<Mutex<Transcript>>,
    greeting: String,
}

impl ChatSurface {
    /// Creates a surface whose transcript opens with `greeting`.
    pub fn new(relay: Arc<StreamRelay>, greeting: impl Into<String>) -> Self {
        let greeting = greeting.into();
        Self {
            relay,
            transcript: Arc::new(Mutex::new(Transcript::with_greeting(greeting.clone()))),
            greeting,
        }
    }

    pub fn relay(&self) -> &Arc<StreamRelay> {
        &self.relay
    }

    /// Sends `input` and waits for the answer to settle.
    pub async fn submit(&self, input: &str, context: ChatContext) -> Result<(), SubmitError> {
        self.submit_with(input, context, |_| {}).await
    }

    /// Like [`ChatSurface::submit`], also calling `on_text` with the
    /// placeholder's text after each update.
    pub async fn submit_with<F>(
        &self,
        input: &str,
        context: ChatContext,
        mut on_text: F,
    ) -> Result<(), SubmitError>
    where
        F: FnMut(&str) + Send,
    {
        if input.trim().is_empty() {
            return Err(SubmitError::EmptyMessage);
        }

        let (prior, placeholder) = {
            let mut transcript = self.lock();
            let prior = transcript.messages().to_vec();
            (prior, transcript.begin_turn(input))
        };

        let transcript = Arc::clone(&self.transcript);
        self.relay
            .send(
                &prior,
                input,
                |chunk| {
                    let replaced = transcript
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .replace_text(placeholder, chunk);
                    if replaced {
                        on_text(chunk);
                    }
                },
                context,
            )
            .await;

        self.lock().freeze(placeholder);
        Ok(())
    }

    /// Stops the in-flight answer, keeping whatever arrived.
    pub fn stop(&self) {
        self.relay.stop();
    }

    /// Stops any answer, forgets the conversation, and shows only the greeting.
    pub fn new_conversation(&self) {
        self.relay.stop();
        self.relay.reset_conversation();
        self.lock().restart(self.greeting.clone());
    }

    /// Snapshot of the transcript.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock().messages().to_vec()
    }

    pub fn is_streaming(&self) -> bool {
        self.relay.is_streaming()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Transcript> {
        self.transcript.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
