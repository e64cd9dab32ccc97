//! Mock gateway shared by the engine's unit tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use loom_gateway::GatewayClient;
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;

use crate::lm::LanguageModel;

type Replies = Arc<Mutex<VecDeque<String>>>;

/// Serve `app` on an ephemeral port and return its base URL
pub async fn serve(app: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.ok() });
    format!("http://{addr}/").parse().unwrap()
}

/// Gateway answering each completion with the next canned reply
///
/// The last reply is repeated once the queue runs dry. Streaming requests
/// receive the reply split into word-sized chunks.
pub async fn gateway(replies: Vec<&str>) -> Url {
    let replies: Replies = Arc::new(Mutex::new(replies.into_iter().map(str::to_owned).collect()));
    let app = Router::new()
        .route("/chat/completions", routing::post(chat))
        .with_state(replies);
    serve(app).await
}

pub fn lm(base_url: Url) -> LanguageModel {
    LanguageModel::new(GatewayClient::new(base_url), "mock-model", SecretString::from("test-key"))
}

fn next_reply(replies: &Replies) -> String {
    let mut queue = replies.lock().unwrap();
    if queue.len() > 1 {
        queue.pop_front().unwrap_or_default()
    } else {
        queue.front().cloned().unwrap_or_default()
    }
}

async fn chat(State(replies): State<Replies>, Json(body): Json<Value>) -> Response {
    let reply = next_reply(&replies);

    if body["stream"].as_bool() != Some(true) {
        return Json(json!({
            "id": "chatcmpl-test",
            "model": body["model"],
            "choices": [{"index": 0, "message": {"role": "assistant", "content": reply}, "finish_reason": "stop"}],
        }))
        .into_response();
    }

    let mut sse = String::new();
    for piece in reply.split_inclusive(' ') {
        let chunk = json!({
            "id": "chatcmpl-test",
            "model": body["model"],
            "choices": [{"index": 0, "delta": {"content": piece}}],
        });
        sse.push_str(&format!("data: {chunk}\n\n"));
    }
    sse.push_str("data: [DONE]\n\n");

    ([(header::CONTENT_TYPE, "text/event-stream")], sse).into_response()
}
