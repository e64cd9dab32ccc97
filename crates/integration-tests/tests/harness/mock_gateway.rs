//! Mock LM gateway for integration tests
//!
//! Implements the `OpenAI` chat completions endpoint and answers each call
//! with the next canned reply.

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::{Json, Router, routing};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

/// Mock gateway that returns predictable replies
pub struct MockGateway {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    completion_count: AtomicU32,
    /// Replies in call order; the last one repeats
    replies: Mutex<VecDeque<String>>,
    /// Reasoning text streamed ahead of the content
    reasoning: Option<String>,
    /// Answer every call with a 500
    failing: bool,
    /// Every completion request, in arrival order
    requests: Mutex<Vec<RecordedRequest>>,
}

/// What the mock saw of one completion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub model: String,
    pub authorization: Option<String>,
}

impl MockGateway {
    /// Start a mock answering with `replies` in order
    pub async fn start(replies: &[&str]) -> anyhow::Result<Self> {
        Self::start_inner(replies, None, false).await
    }

    /// Start a mock that also streams `reasoning` as `reasoning_content`
    pub async fn start_with_reasoning(reply: &str, reasoning: &str) -> anyhow::Result<Self> {
        Self::start_inner(&[reply], Some(reasoning.to_owned()), false).await
    }

    /// Start a mock that fails every request with 500
    pub async fn start_failing() -> anyhow::Result<Self> {
        Self::start_inner(&[], None, true).await
    }

    async fn start_inner(replies: &[&str], reasoning: Option<String>, failing: bool) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            completion_count: AtomicU32::new(0),
            replies: Mutex::new(replies.iter().map(|r| (*r).to_owned()).collect()),
            reasoning,
            failing,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle_chat_completions))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for configuring the bridge's gateway
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Number of completion requests received
    pub fn completion_count(&self) -> u32 {
        self.state.completion_count.load(Ordering::Relaxed)
    }

    /// All completion requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// `Authorization` header of the latest request
    pub fn last_authorization(&self) -> Option<String> {
        self.requests().pop().and_then(|r| r.authorization)
    }

    /// Model named by the latest request
    pub fn last_model(&self) -> Option<String> {
        self.requests().pop().map(|r| r.model)
    }
}

impl Drop for MockGateway {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionRequest {
    model: String,
    #[serde(default)]
    stream: Option<bool>,
}

fn next_reply(state: &MockState) -> String {
    let mut replies = state.replies.lock().unwrap();
    if replies.len() > 1 {
        replies.pop_front().unwrap_or_default()
    } else {
        replies.front().cloned().unwrap_or_default()
    }
}

async fn handle_chat_completions(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(req): Json<ChatCompletionRequest>,
) -> axum::response::Response {
    state.completion_count.fetch_add(1, Ordering::Relaxed);
    state.requests.lock().unwrap().push(RecordedRequest {
        model: req.model.clone(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
    });

    if state.failing {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": {"message": "mock gateway intentional failure"}})),
        )
            .into_response();
    }

    let reply = next_reply(&state);

    if !req.stream.unwrap_or(false) {
        return Json(serde_json::json!({
            "id": "chatcmpl-test-123",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": req.model,
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": reply},
                "finish_reason": "stop"
            }]
        }))
        .into_response();
    }

    let chunk = |delta: serde_json::Value| {
        serde_json::json!({
            "id": "chatcmpl-test-stream",
            "object": "chat.completion.chunk",
            "created": 1_700_000_000,
            "model": req.model,
            "choices": [{"index": 0, "delta": delta, "finish_reason": null}]
        })
    };

    let mut body = String::new();
    if let Some(reasoning) = &state.reasoning {
        let _ = write!(body, "data: {}\n\n", chunk(serde_json::json!({"reasoning_content": reasoning})));
    }
    for piece in reply.split_inclusive(' ') {
        let _ = write!(body, "data: {}\n\n", chunk(serde_json::json!({"content": piece})));
    }
    body.push_str("data: [DONE]\n\n");

    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}
