//! Stream relay - drives one chat turn from request to settled answer.
//!
//! `send` never fails. Every outcome reaches the caller through the chunk
//! callback: cumulative answer text while streaming, and a single
//! [`CONNECTION_ERROR_SENTINEL`] if the turn failed for any reason other
//! than an intentional stop.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::time::{sleep_until, Instant};

use crate::domain::chat::{
    ChatContext, ChatMessage, ConversationSession, Frame, FrameDecoder, UpstreamEvent,
    CONNECTION_ERROR_SENTINEL,
};
use crate::ports::{ChatRequest, ChatTransport, RelayError};

use super::cancellation::{CancellationController, TurnHandle};

/// Whole-turn deadline used unless configured otherwise.
pub const DEFAULT_TURN_TIMEOUT: Duration = Duration::from_secs(60);

/// Relays visitor turns to the chat proxy and streams answers back.
pub struct StreamRelay {
    transport: Arc<dyn ChatTransport>,
    session: Arc<ConversationSession>,
    controller: CancellationController,
    /// Held for the whole of a turn so two turns never interleave.
    turn_gate: tokio::sync::Mutex<()>,
    timeout: Duration,
}

impl StreamRelay {
    /// Creates a relay with a fresh session and the default timeout.
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            transport,
            session: Arc::new(ConversationSession::new()),
            controller: CancellationController::new(),
            turn_gate: tokio::sync::Mutex::new(()),
            timeout: DEFAULT_TURN_TIMEOUT,
        }
    }

    pub fn with_session(mut self, session: Arc<ConversationSession>) -> Self {
        self.session = session;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn session(&self) -> &Arc<ConversationSession> {
        &self.session
    }

    pub fn is_streaming(&self) -> bool {
        self.controller.is_streaming()
    }

    /// Stops the in-flight turn. Its partial answer stays as it is and no
    /// sentinel is emitted. Does nothing if no turn is running.
    pub fn stop(&self) {
        if self.controller.stop() {
            tracing::info!("Chat turn stopped");
        }
    }

    /// Forgets the conversation id; the next turn starts a new conversation.
    pub fn reset_conversation(&self) {
        self.session.reset_conversation();
        tracing::info!(visitor_id = %self.session.visitor_id(), "Conversation reset");
    }

    /// Sends one visitor message and streams the answer into `on_chunk`.
    ///
    /// Resolves once the turn has settled. `prior` is only used for
    /// diagnostics; continuity lives server side in the conversation id.
    pub async fn send<F>(
        &self,
        prior: &[ChatMessage],
        text: &str,
        mut on_chunk: F,
        context: ChatContext,
    ) where
        F: FnMut(&str) + Send,
    {
        // Cancel whatever is running before waiting for it to settle.
        let turn = self.controller.begin();

        let _gate = tokio::select! {
            biased;
            _ = turn.token().cancelled() => {
                tracing::debug!(generation = turn.generation(), "Turn superseded before it started");
                self.controller.finish(&turn);
                return;
            }
            gate = self.turn_gate.lock() => gate,
        };

        let visitor_id = self.session.visitor_id();
        let (conversation_id, epoch) = self.session.snapshot();
        let request = ChatRequest::new(text, visitor_id)
            .with_conversation_id(conversation_id.as_ref())
            .with_context(context);

        tracing::info!(
            visitor_id = %visitor_id,
            conversation_id = %request.conversation_id,
            context = %context,
            history_len = prior.len(),
            "Starting chat turn"
        );

        match self.run_turn(&turn, epoch, &request, &mut on_chunk).await {
            Ok(answer_len) => {
                tracing::info!(answer_len, "Chat turn settled");
            }
            Err(e) if e.is_cancellation() || turn.is_cancelled() => {
                tracing::debug!(generation = turn.generation(), "Chat turn cancelled");
            }
            Err(e) => {
                tracing::error!(error = %e, "Chat turn failed");
                on_chunk(CONNECTION_ERROR_SENTINEL);
            }
        }

        self.controller.finish(&turn);
    }

    /// Runs the request and body loop, returning the final answer length.
    async fn run_turn<F>(
        &self,
        turn: &TurnHandle,
        epoch: u64,
        request: &ChatRequest,
        on_chunk: &mut F,
    ) -> Result<usize, RelayError>
    where
        F: FnMut(&str) + Send,
    {
        let deadline = Instant::now() + self.timeout;
        let token = turn.token();

        let mut body = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(RelayError::Cancelled),
            _ = sleep_until(deadline) => return Err(self.timeout_error()),
            opened = self.transport.open(request) => opened?,
        };

        let mut decoder = FrameDecoder::new();
        let mut answer = String::new();

        loop {
            let read = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(RelayError::Cancelled),
                _ = sleep_until(deadline) => return Err(self.timeout_error()),
                read = body.next() => read,
            };

            match read {
                Some(Ok(bytes)) => {
                    for frame in decoder.push(&bytes) {
                        self.apply_frame(turn, epoch, &frame, &mut answer, on_chunk)?;
                    }
                }
                Some(Err(e)) => return Err(e),
                None => break,
            }
        }

        if let Some(frame) = decoder.finish() {
            self.apply_frame(turn, epoch, &frame, &mut answer, on_chunk)?;
        }

        Ok(answer.len())
    }

    fn apply_frame<F>(
        &self,
        turn: &TurnHandle,
        epoch: u64,
        frame: &Frame,
        answer: &mut String,
        on_chunk: &mut F,
    ) -> Result<(), RelayError>
    where
        F: FnMut(&str) + Send,
    {
        if turn.is_cancelled() {
            return Err(RelayError::Cancelled);
        }

        let event = match UpstreamEvent::parse(&frame.data) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed frame");
                return Ok(());
            }
        };

        if let Some(id) = event.conversation_id() {
            // Ids from a turn that started before a reset are ignored.
            if self.session.adopt_conversation_id_in(epoch, id.clone()) {
                tracing::info!(conversation_id = %id, "Conversation started");
            }
        }

        match event {
            UpstreamEvent::Done => {
                tracing::debug!("Stream done marker");
            }
            UpstreamEvent::Answer { fragment, .. } => {
                if !fragment.is_empty() {
                    answer.push_str(&fragment);
                    on_chunk(answer.as_str());
                }
            }
            UpstreamEvent::Error { message, .. } => {
                return Err(RelayError::Upstream(message));
            }
            UpstreamEvent::Other { kind, .. } => {
                tracing::debug!(kind = %kind, "Ignoring event");
            }
        }
        Ok(())
    }

    fn timeout_error(&self) -> RelayError {
        RelayError::Timeout {
            timeout_secs: self.timeout.as_secs(),
        }
    }
}
