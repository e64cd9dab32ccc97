mod harness;

use harness::config::ConfigBuilder;
use harness::mock_gateway::MockGateway;
use harness::server::TestServer;
use harness::{parse_sse_data, sse_events};
use serde_json::json;

async fn stream_frames(server: &TestServer, body: serde_json::Value) -> Vec<String> {
    let resp = server.invoke(&body).await;
    assert_eq!(resp.status(), 200);
    parse_sse_data(&resp.text().await.unwrap())
}

fn field_text(events: &[serde_json::Value], field: &str) -> String {
    events
        .iter()
        .filter(|e| e["type"] == "chunk" && e["field"] == field)
        .filter_map(|e| e["text"].as_str())
        .collect()
}

#[tokio::test]
async fn streaming_headers() {
    let mock = MockGateway::start(&["[[ ## answer ## ]]\n4\n\n[[ ## completed ## ]]"]).await.unwrap();
    let config = ConfigBuilder::new().with_gateway(&mock.base_url()).build();
    let server = TestServer::start(config).await.unwrap();

    let resp = server
        .invoke(&json!({"kind": "predict", "inputs": {"question": "2+2?"}, "stream": true}))
        .await;

    let header = |name: &str| {
        resp.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned()
    };
    assert!(header("content-type").contains("text/event-stream"));
    assert_eq!(header("cache-control"), "no-cache, no-transform");
    assert_eq!(header("x-accel-buffering"), "no");
}

#[tokio::test]
async fn chunks_then_prediction_then_done() {
    let mock = MockGateway::start(&["[[ ## answer ## ]]\nfour\n\n[[ ## completed ## ]]"]).await.unwrap();
    let config = ConfigBuilder::new().with_gateway(&mock.base_url()).build();
    let server = TestServer::start(config).await.unwrap();

    let frames = stream_frames(
        &server,
        json!({"kind": "predict", "signature": "question -> answer", "inputs": {"question": "2+2?"}, "stream": true}),
    )
    .await;

    assert_eq!(frames.last().map(String::as_str), Some("[DONE]"));
    assert_eq!(frames.iter().filter(|f| *f == "[DONE]").count(), 1);

    let events = sse_events(&frames);
    assert!(events.iter().all(|e| e["type"] != "status"), "unexpected status in {events:?}");
    assert_eq!(field_text(&events, "answer"), "four");

    let prediction = events.last().unwrap();
    assert_eq!(prediction["type"], "prediction");
    assert_eq!(prediction["outputs"], json!({"answer": "four"}));

    let first_prediction = events.iter().position(|e| e["type"] == "prediction").unwrap();
    let last_chunk = events.iter().rposition(|e| e["type"] == "chunk").unwrap();
    assert!(last_chunk < first_prediction);
}

#[tokio::test]
async fn chain_of_thought_streams_reasoning_field() {
    let mock = MockGateway::start(&[
        "[[ ## reasoning ## ]]\nTwo plus two is four.\n\n[[ ## answer ## ]]\n4\n\n[[ ## completed ## ]]",
    ])
    .await
    .unwrap();
    let config = ConfigBuilder::new().with_gateway(&mock.base_url()).build();
    let server = TestServer::start(config).await.unwrap();

    let frames = stream_frames(&server, json!({"kind": "cot", "inputs": {"question": "2+2?"}, "stream": true})).await;
    let events = sse_events(&frames);

    assert_eq!(field_text(&events, "reasoning"), "Two plus two is four.");
    assert_eq!(field_text(&events, "answer"), "4");
}

#[tokio::test]
async fn reasoning_content_becomes_reasoning_chunks() {
    let mock = MockGateway::start_with_reasoning("[[ ## answer ## ]]\n4\n\n[[ ## completed ## ]]", "thinking hard")
        .await
        .unwrap();
    let config = ConfigBuilder::new().with_gateway(&mock.base_url()).build();
    let server = TestServer::start(config).await.unwrap();

    let frames = stream_frames(&server, json!({"kind": "predict", "inputs": {"question": "2+2?"}, "stream": true})).await;
    let events = sse_events(&frames);

    assert_eq!(field_text(&events, "reasoning"), "thinking hard");
    assert_eq!(field_text(&events, "answer"), "4");
}

#[tokio::test]
async fn gateway_failure_ends_with_status_and_done() {
    let mock = MockGateway::start_failing().await.unwrap();
    let config = ConfigBuilder::new().with_gateway(&mock.base_url()).build();
    let server = TestServer::start(config).await.unwrap();

    let frames = stream_frames(&server, json!({"kind": "predict", "inputs": {"question": "q"}, "stream": true})).await;

    assert_eq!(frames.last().map(String::as_str), Some("[DONE]"));
    let events = sse_events(&frames);
    let last = events.last().unwrap();
    assert_eq!(last["type"], "status");
    assert!(last["message"].as_str().unwrap().starts_with("error: "));
}

#[tokio::test]
async fn tool_call_has_dedicated_frame() {
    let mock = MockGateway::start(&[
        "[[ ## next_thought ## ]]\nLook it up.\n\n[[ ## next_tool_name ## ]]\nsearch\n\n\
         [[ ## next_tool_args ## ]]\n{\"query\": \"rust\"}\n\n[[ ## completed ## ]]",
    ])
    .await
    .unwrap();
    let config = ConfigBuilder::new().with_gateway(&mock.base_url()).build();
    let server = TestServer::start(config).await.unwrap();

    let frames = stream_frames(
        &server,
        json!({
            "kind": "tool_using",
            "inputs": {"question": "What is Rust?"},
            "tools": [{"name": "search", "description": "Web search", "schema": {"type": "object"}}],
            "stream": true
        }),
    )
    .await;
    let events = sse_events(&frames);

    let call = events.iter().find(|e| e["type"] == "tool_call").expect("tool_call frame");
    assert_eq!(call["name"], "search");
    assert_eq!(call["args"], json!({"query": "rust"}));
    assert!(events.iter().any(|e| e["type"] == "status" && e["message"] == "Calling tool search..."));
    assert_eq!(events.last().unwrap()["type"], "prediction");
    assert_eq!(frames.last().map(String::as_str), Some("[DONE]"));
}

#[tokio::test]
async fn reflective_fallback_is_announced() {
    let mock = MockGateway::start(&["[[ ## reasoning ## ]]\nr\n\n[[ ## answer ## ]]\n4\n\n[[ ## completed ## ]]"])
        .await
        .unwrap();
    let config = ConfigBuilder::new()
        .with_gateway(&mock.base_url())
        .without_reflective()
        .build();
    let server = TestServer::start(config).await.unwrap();

    let frames = stream_frames(&server, json!({"kind": "rlm", "inputs": {"question": "2+2?"}, "stream": true})).await;
    let events = sse_events(&frames);

    assert_eq!(events[0]["type"], "status");
    assert!(events[0]["message"].as_str().unwrap().contains("falling back"));
    assert_eq!(events.last().unwrap()["outputs"]["answer"], "4");
    assert_eq!(mock.completion_count(), 1);
}
