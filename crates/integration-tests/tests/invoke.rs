mod harness;

use harness::config::ConfigBuilder;
use harness::mock_gateway::MockGateway;
use harness::server::TestServer;
use serde_json::json;

const ANSWER_FOUR: &str = "[[ ## answer ## ]]\n4\n\n[[ ## completed ## ]]";
const REASONED_FOUR: &str = "[[ ## reasoning ## ]]\nTwo plus two.\n\n[[ ## answer ## ]]\n4\n\n[[ ## completed ## ]]";

async fn setup(replies: &[&str]) -> (MockGateway, TestServer) {
    let mock = MockGateway::start(replies).await.unwrap();
    let config = ConfigBuilder::new().with_gateway(&mock.base_url()).build();
    let server = TestServer::start(config).await.unwrap();
    (mock, server)
}

#[tokio::test]
async fn predict_returns_outputs() {
    let (mock, server) = setup(&[ANSWER_FOUR]).await;

    let resp = server
        .invoke(&json!({
            "kind": "predict",
            "signature": "question -> answer",
            "inputs": {"question": "2+2?"},
            "stream": false
        }))
        .await;

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"outputs": {"answer": "4"}}));
    assert_eq!(mock.completion_count(), 1);
}

#[tokio::test]
async fn chain_of_thought_adds_reasoning() {
    let (_mock, server) = setup(&[REASONED_FOUR]).await;

    let resp = server
        .invoke(&json!({"kind": "cot", "inputs": {"question": "2+2?"}}))
        .await;

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["outputs"]["reasoning"], "Two plus two.");
    assert_eq!(body["outputs"]["answer"], "4");
}

#[tokio::test]
async fn defaults_to_chain_of_thought_and_default_model() {
    let (mock, server) = setup(&[REASONED_FOUR]).await;

    let resp = server.invoke(&json!({"inputs": {"question": "2+2?"}})).await;

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["outputs"]["reasoning"], "Two plus two.");
    assert_eq!(mock.last_model().as_deref(), Some("gpt-4o-mini"));
}

#[tokio::test]
async fn credential_precedence() {
    let (mock, server) = setup(&[ANSWER_FOUR]).await;
    let body = json!({"kind": "predict", "inputs": {"question": "q"}, "model": "gpt-4o"});

    // No credential: internal default
    server.invoke(&body).await;
    assert_eq!(mock.last_authorization().as_deref(), Some("Bearer bridge-internal"));
    assert_eq!(mock.last_model().as_deref(), Some("gpt-4o"));

    // Upstream header
    server
        .client()
        .post(server.url("/invoke"))
        .header("x-upstream-authorization", "Bearer from-header")
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(mock.last_authorization().as_deref(), Some("Bearer from-header"));

    // Body wins over header
    let mut with_token = body.clone();
    with_token["auth_token"] = json!("from-body");
    server
        .client()
        .post(server.url("/invoke"))
        .header("x-upstream-authorization", "Bearer from-header")
        .json(&with_token)
        .send()
        .await
        .unwrap();
    assert_eq!(mock.last_authorization().as_deref(), Some("Bearer from-body"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_keep_their_own_model_and_credential() {
    let (mock, server) = setup(&[ANSWER_FOUR]).await;
    let request = |tenant: &str| {
        json!({
            "kind": "predict",
            "inputs": {"question": "2+2?"},
            "model": format!("model-{tenant}"),
            "auth_token": format!("token-{tenant}"),
        })
    };
    let (a, b) = (request("a"), request("b"));

    let responses = tokio::join!(
        server.invoke(&a),
        server.invoke(&b),
        server.invoke(&a),
        server.invoke(&b),
        server.invoke(&a),
        server.invoke(&b),
    );
    for resp in [responses.0, responses.1, responses.2, responses.3, responses.4, responses.5] {
        assert_eq!(resp.status(), 200);
    }

    let requests = mock.requests();
    assert_eq!(requests.len(), 6);
    for tenant in ["a", "b"] {
        let seen: Vec<_> = requests
            .iter()
            .filter(|r| r.model == format!("model-{tenant}"))
            .collect();
        assert_eq!(seen.len(), 3);
        for r in seen {
            assert_eq!(r.authorization, Some(format!("Bearer token-{tenant}")));
        }
    }
}

#[tokio::test]
async fn tool_using_returns_tool_calls() {
    let (_mock, server) = setup(&[
        "[[ ## next_thought ## ]]\nI need the weather.\n\n[[ ## next_tool_name ## ]]\nget_weather\n\n\
         [[ ## next_tool_args ## ]]\n{\"city\": \"Oslo\"}\n\n[[ ## completed ## ]]",
    ])
    .await;

    let resp = server
        .invoke(&json!({
            "kind": "react",
            "signature": "question -> answer",
            "inputs": {"question": "Weather in Oslo?"},
            "tools": [{
                "name": "get_weather",
                "description": "Current weather for a city",
                "schema": {"type": "object", "properties": {"city": {"type": "string"}}}
            }]
        }))
        .await;

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["outputs"]["reasoning"], "I need the weather.");

    let calls = body["tool_calls"].as_array().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0]["name"], "get_weather");
    assert_eq!(calls[0]["args"], json!({"city": "Oslo"}));
    assert!(calls[0]["id"].as_str().unwrap().starts_with("call_"));
}

#[tokio::test]
async fn history_is_accepted_as_json_string() {
    let (_mock, server) = setup(&[ANSWER_FOUR]).await;

    let resp = server
        .invoke(&json!({
            "kind": "predict",
            "signature": "history, question -> answer",
            "inputs": {
                "history": "[{\"role\":\"user\",\"content\":\"hi\"},{\"content\":\"\"}]",
                "question": "2+2?"
            }
        }))
        .await;

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["outputs"]["answer"], "4");
}

#[tokio::test]
async fn reflective_runs_draft_and_revision() {
    let (mock, server) = setup(&[
        "[[ ## reasoning ## ]]\nguess\n\n[[ ## answer ## ]]\n5\n\n[[ ## completed ## ]]",
        REASONED_FOUR,
    ])
    .await;

    let resp = server
        .invoke(&json!({"kind": "reflective", "inputs": {"question": "2+2?"}}))
        .await;

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["outputs"]["answer"], "4");
    assert_eq!(mock.completion_count(), 2);
}
