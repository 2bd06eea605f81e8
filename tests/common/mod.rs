//! Shared test infrastructure: a fake chat backend and a proxy in front of it.

#![allow(dead_code)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use serde_json::Value;

use portfolio_chat::adapters::http::{app_router, ChatAppState};
use portfolio_chat::adapters::upstream::{DifyClient, DifyConfig};
use portfolio_chat::config::ServerConfig;

// =============================================================================
// Fake backend
// =============================================================================

/// How the fake backend answers every request.
#[derive(Clone)]
pub enum Reply {
    /// Stream these writes, then close.
    Stream(Vec<&'static str>),
    /// Stream these writes, then keep the connection open.
    StreamThenHang(Vec<&'static str>),
    /// Answer with this status and text body.
    Status(u16, &'static str),
}

/// One request as the fake backend saw it.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
pub struct FakeUpstream {
    reply: Reply,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl FakeUpstream {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    /// Serves the fake on an ephemeral port and returns its base URL.
    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/v1/chat-messages", post(chat_messages))
            .with_state(self.clone());
        format!("http://{}/v1", serve(app).await)
    }
}

async fn chat_messages(
    State(fake): State<FakeUpstream>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    fake.seen.lock().unwrap().push(SeenRequest {
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        body,
    });

    match fake.reply {
        Reply::Stream(writes) => event_stream(writes, false),
        Reply::StreamThenHang(writes) => event_stream(writes, true),
        Reply::Status(status, text) => {
            (StatusCode::from_u16(status).unwrap(), text).into_response()
        }
    }
}

fn event_stream(writes: Vec<&'static str>, hang: bool) -> Response {
    let body = stream::iter(
        writes
            .into_iter()
            .map(|w| Ok::<_, Infallible>(Bytes::from_static(w.as_bytes()))),
    );
    let body = if hang {
        Body::from_stream(body.chain(stream::pending()))
    } else {
        Body::from_stream(body)
    };
    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

// =============================================================================
// Proxy
// =============================================================================

/// Serves the proxy against `upstream_base` and returns its `/api/chat` URL.
pub async fn spawn_proxy(config: DifyConfig) -> String {
    let upstream = Arc::new(DifyClient::new(config));
    let app = app_router(ChatAppState::new(upstream), &ServerConfig::default());
    format!("http://{}/api/chat", serve(app).await)
}

/// An address nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}
