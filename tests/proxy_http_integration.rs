//! Integration tests for the `POST /api/chat` proxy over real HTTP.

mod common;

use serde_json::{json, Value};

use common::{closed_port_url, spawn_proxy, FakeUpstream, Reply};
use portfolio_chat::adapters::upstream::DifyConfig;

const FRAMES: [&str; 2] = [
    "data: {\"event\":\"message\",\"answer\":\"Hi\",\"conversation_id\":\"abc\"}\n\n",
    "data: {\"event\":\"message_end\",\"conversation_id\":\"abc\"}\n\n",
];

async fn proxy_for(upstream: &FakeUpstream) -> String {
    let base_url = upstream.spawn().await;
    spawn_proxy(DifyConfig::new().with_api_key("app-test").with_base_url(base_url)).await
}

#[tokio::test]
async fn success_passes_event_stream_through() {
    let upstream = FakeUpstream::new(Reply::Stream(FRAMES.to_vec()));
    let endpoint = proxy_for(&upstream).await;

    let response = reqwest::Client::new()
        .post(&endpoint)
        .json(&json!({"query": "Hello", "inputs": {}, "conversation_id": "", "user": "visitor-1"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.headers()["content-type"], "text/event-stream");
    assert_eq!(response.headers()["cache-control"], "no-cache");
    assert_eq!(response.text().await.unwrap(), FRAMES.concat());

    let seen = upstream.seen();
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer app-test"));
    assert_eq!(
        seen[0].body,
        json!({
            "inputs": {},
            "query": "Hello",
            "response_mode": "streaming",
            "conversation_id": "",
            "user": "visitor-1",
            "files": []
        })
    );
}

#[tokio::test]
async fn missing_user_and_inputs_get_defaults() {
    let upstream = FakeUpstream::new(Reply::Stream(FRAMES.to_vec()));
    let endpoint = proxy_for(&upstream).await;

    reqwest::Client::new()
        .post(&endpoint)
        .json(&json!({"query": "Hello"}))
        .send()
        .await
        .unwrap();

    let body = &upstream.seen()[0].body;
    assert_eq!(body["user"], "default-user");
    assert_eq!(body["inputs"], json!({}));
    assert_eq!(body["conversation_id"], "");
}

#[tokio::test]
async fn backend_status_and_details_are_relayed() {
    let upstream = FakeUpstream::new(Reply::Status(404, "{\"code\":\"not_found\"}"));
    let endpoint = proxy_for(&upstream).await;

    let response = reqwest::Client::new()
        .post(&endpoint)
        .json(&json!({"query": "Hello", "conversation_id": "gone"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Upstream API Error");
    assert_eq!(body["details"], "{\"code\":\"not_found\"}");
}

#[tokio::test]
async fn missing_key_is_a_500_without_calling_backend() {
    let upstream = FakeUpstream::new(Reply::Stream(FRAMES.to_vec()));
    let base_url = upstream.spawn().await;
    let endpoint = spawn_proxy(DifyConfig::new().with_base_url(base_url)).await;

    let response = reqwest::Client::new()
        .post(&endpoint)
        .json(&json!({"query": "Hello"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"error": "Missing upstream API key"}));
    assert!(upstream.seen().is_empty());
}

#[tokio::test]
async fn unreachable_backend_is_internal_server_error() {
    let endpoint = spawn_proxy(
        DifyConfig::new()
            .with_api_key("app-test")
            .with_base_url(closed_port_url().await),
    )
    .await;

    let response = reqwest::Client::new()
        .post(&endpoint)
        .json(&json!({"query": "Hello"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Internal Server Error");
}
