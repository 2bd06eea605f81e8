//! Scripted Chat Transport for testing.
//!
//! Provides a configurable in-memory implementation of the ChatTransport
//! port, allowing the relay to run without a proxy.
//!
//! # Features
//!
//! - Pre-configured response bodies, split into arbitrary read chunks
//! - Delays between chunks and streams that never finish
//! - Error injection at open time or mid-stream
//! - Request tracking and stream release counting for verification
//!
//! # Example
//!
//! ```ignore
//! let transport = ScriptedTransport::new()
//!     .with_stream(["data: {\"event\":\"message\",\"answer\":\"Hi\"}\n\n"]);
//!
//! relay.send(&[], "Hello", |text| println!("{text}"), ChatContext::General).await;
//! assert_eq!(transport.requests().len(), 1);
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{ByteStream, ChatRequest, ChatTransport, RelayError};

/// Scripted transport for tests and demos.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    /// Responses consumed in order, one per `open`.
    responses: Arc<Mutex<VecDeque<ScriptedResponse>>>,
    /// Every request passed to `open`.
    requests: Arc<Mutex<Vec<ChatRequest>>>,
    /// Streams that have been dropped (finished or cancelled).
    released: Arc<AtomicUsize>,
}

/// A configured response to one `open` call.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// Successful response with a scripted body.
    Stream {
        chunks: Vec<ScriptedChunk>,
        end: StreamEnd,
    },
    /// `open` fails with this error.
    Fail(RelayError),
    /// `open` never resolves (no response headers ever arrive).
    NeverResponds,
}

/// One step of a scripted body.
#[derive(Debug, Clone)]
pub enum ScriptedChunk {
    /// Yield these bytes as one read.
    Bytes(Bytes),
    /// Wait before the next step.
    Delay(Duration),
    /// Yield a read error.
    Fail(RelayError),
}

/// What happens after the last scripted chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The body ends normally.
    Close,
    /// The body stays open without sending anything else.
    Hang,
}

impl ScriptedTransport {
    /// Creates a transport with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a body delivered as the given reads, then closed.
    pub fn with_stream<I, S>(self, reads: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let chunks = reads
            .into_iter()
            .map(|s| ScriptedChunk::Bytes(Bytes::from(s.into())))
            .collect();
        self.with_response(ScriptedResponse::Stream {
            chunks,
            end: StreamEnd::Close,
        })
    }

    /// Adds a body built from explicit steps.
    pub fn with_chunks(self, chunks: Vec<ScriptedChunk>, end: StreamEnd) -> Self {
        self.with_response(ScriptedResponse::Stream { chunks, end })
    }

    /// Adds an `open` failure.
    pub fn with_failure(self, error: RelayError) -> Self {
        self.with_response(ScriptedResponse::Fail(error))
    }

    /// Adds an `open` that never gets response headers.
    pub fn with_unresponsive(self) -> Self {
        self.with_response(ScriptedResponse::NeverResponds)
    }

    /// Adds any response.
    pub fn with_response(self, response: ScriptedResponse) -> Self {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of response streams dropped so far.
    pub fn released_streams(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

/// Counts a stream as released when its state is dropped.
#[derive(Debug)]
struct ReleaseGuard(Arc<AtomicUsize>);

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

struct BodyState {
    chunks: VecDeque<ScriptedChunk>,
    end: StreamEnd,
    _guard: ReleaseGuard,
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn open(&self, request: &ChatRequest) -> Result<ByteStream, RelayError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let next = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        let (chunks, end) = match next {
            Some(ScriptedResponse::Stream { chunks, end }) => (chunks, end),
            Some(ScriptedResponse::Fail(error)) => return Err(error),
            Some(ScriptedResponse::NeverResponds) => return futures::future::pending().await,
            None => return Err(RelayError::network("no scripted response left")),
        };

        let state = BodyState {
            chunks: chunks.into(),
            end,
            _guard: ReleaseGuard(self.released.clone()),
        };

        let body = stream::unfold(state, |mut state| async move {
            loop {
                match state.chunks.pop_front() {
                    Some(ScriptedChunk::Bytes(bytes)) => return Some((Ok(bytes), state)),
                    Some(ScriptedChunk::Fail(error)) => return Some((Err(error), state)),
                    Some(ScriptedChunk::Delay(delay)) => sleep(delay).await,
                    None => match state.end {
                        StreamEnd::Close => return None,
                        StreamEnd::Hang => futures::future::pending::<()>().await,
                    },
                }
            }
        });

        Ok(Box::pin(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::VisitorId;
    use futures::StreamExt;

    fn request() -> ChatRequest {
        ChatRequest::new("hi", VisitorId::new())
    }

    #[tokio::test]
    async fn yields_scripted_reads_in_order() {
        let transport = ScriptedTransport::new().with_stream(["a", "b"]);

        let body: Vec<_> = transport.open(&request()).await.unwrap().collect().await;

        let reads: Vec<Bytes> = body.into_iter().map(Result::unwrap).collect();
        assert_eq!(reads, vec![Bytes::from("a"), Bytes::from("b")]);
        assert_eq!(transport.released_streams(), 1);
    }

    #[tokio::test]
    async fn records_requests() {
        let transport = ScriptedTransport::new().with_stream(Vec::<String>::new());
        let _ = transport.open(&request()).await;
        assert_eq!(transport.requests().len(), 1);
        assert_eq!(transport.requests()[0].query, "hi");
    }

    #[tokio::test]
    async fn injected_failure_is_returned() {
        let transport = ScriptedTransport::new().with_failure(RelayError::status(500, "boom"));
        let result = transport.open(&request()).await;
        assert_eq!(result.err(), Some(RelayError::status(500, "boom")));
    }

    #[tokio::test]
    async fn exhausted_script_is_a_network_error() {
        let transport = ScriptedTransport::new();
        assert!(matches!(
            transport.open(&request()).await.err(),
            Some(RelayError::Network(_))
        ));
    }

    #[tokio::test]
    async fn dropping_a_hanging_stream_releases_it() {
        let transport = ScriptedTransport::new()
            .with_chunks(vec![ScriptedChunk::Bytes(Bytes::from("x"))], StreamEnd::Hang);

        let mut body = transport.open(&request()).await.unwrap();
        assert!(body.next().await.is_some());
        assert_eq!(transport.released_streams(), 0);

        drop(body);
        assert_eq!(transport.released_streams(), 1);
    }
}
