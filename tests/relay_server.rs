use pathway_ai::conversation::{Conversation, TurnState};
use pathway_ai::http::client::HttpClient;
use pathway_ai::http::debug::HttpDebugConfig;
use pathway_ai::llm::openai::OpenAiBackend;
use pathway_ai::llm::provider::ChatMessage;
use pathway_ai::relay::prompts::system_prompt;
use pathway_ai::relay::{HttpRelay, Mode, PromptRelay, TurnError};
use pathway_ai::server;
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "gpt-test";

fn http() -> HttpClient {
    HttpClient::new(reqwest::Client::new(), HttpDebugConfig::disabled())
}

fn relay_for(backend: Option<&MockServer>) -> PromptRelay<OpenAiBackend> {
    let backend = backend.map(|server| {
        OpenAiBackend::new(http(), Some("test-key".to_string()), server.uri())
            .expect("backend with key")
    });
    PromptRelay::new(backend, MODEL)
}

async fn spawn_relay_server(relay: PromptRelay<OpenAiBackend>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(server::serve(listener, relay));
    addr
}

fn chat_url(addr: SocketAddr) -> String {
    format!("http://{addr}{}", server::CHAT_PATH)
}

fn completion(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": text}}]
    }))
}

async fn post(addr: SocketAddr, body: Value) -> (StatusCode, Value) {
    let resp = reqwest::Client::new()
        .post(chat_url(addr))
        .json(&body)
        .send()
        .await
        .expect("send");
    let status = resp.status();
    let body = resp.json::<Value>().await.expect("json body");
    (status, body)
}

#[tokio::test]
async fn preflight_is_answered_with_cors_headers_and_empty_body() {
    let addr = spawn_relay_server(relay_for(None)).await;

    let resp = reqwest::Client::new()
        .request(Method::OPTIONS, chat_url(addr))
        .header("Origin", "https://app.example.com")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type, apikey")
        .body("not json at all")
        .send()
        .await
        .expect("send preflight");

    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers().clone();
    assert_eq!(
        headers
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    let allowed = headers
        .get("access-control-allow-headers")
        .and_then(|v| v.to_str().ok())
        .expect("allow-headers")
        .to_ascii_lowercase();
    let allowed: Vec<&str> = allowed.split(',').map(str::trim).collect();
    for name in ["authorization", "x-client-info", "apikey", "content-type"] {
        assert!(allowed.contains(&name), "missing {name} in {allowed:?}");
    }
    assert_eq!(resp.text().await.expect("body"), "");
}

#[tokio::test]
async fn homework_turn_is_relayed_to_backend() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_json(json!({
            "model": MODEL,
            "messages": [
                {"role": "system", "content": system_prompt(Mode::Homework)},
                {"role": "user", "content": "What is 2+2?"}
            ],
            "max_completion_tokens": 2000
        })))
        .respond_with(completion("4"))
        .expect(1)
        .mount(&backend)
        .await;
    let addr = spawn_relay_server(relay_for(Some(&backend))).await;

    let (status, body) = post(
        addr,
        json!({"message": "What is 2+2?", "mode": "homework", "conversationHistory": []}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"response": "4"}));
}

#[tokio::test]
async fn responses_carry_allow_origin() {
    let addr = spawn_relay_server(relay_for(None)).await;

    let resp = reqwest::Client::new()
        .post(chat_url(addr))
        .header("Origin", "https://app.example.com")
        .json(&json!({"message": ""}))
        .send()
        .await
        .expect("send");

    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn missing_message_is_a_bad_request() {
    let addr = spawn_relay_server(relay_for(None)).await;

    let (status, body) = post(addr, json!({"mode": "homework"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": "No message provided", "kind": "invalid_input"})
    );
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let addr = spawn_relay_server(relay_for(None)).await;

    let resp = reqwest::Client::new()
        .post(chat_url(addr))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("send");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = resp.json::<Value>().await.expect("json");
    assert_eq!(body["kind"], "invalid_input");
    assert!(
        body["error"]
            .as_str()
            .is_some_and(|error| error.starts_with("Invalid request body")),
        "got {body}"
    );
}

#[tokio::test]
async fn missing_credential_is_a_server_error() {
    let addr = spawn_relay_server(relay_for(None)).await;

    let (status, body) = post(addr, json!({"message": "hello"})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"error": "OPENAI_API_KEY not configured", "kind": "configuration_error"})
    );
}

#[tokio::test]
async fn backend_rejection_is_a_bad_gateway_with_upstream_status() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&backend)
        .await;
    let addr = spawn_relay_server(relay_for(Some(&backend))).await;

    let (status, body) = post(addr, json!({"message": "hello", "mode": "artist"})).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        body,
        json!({
            "error": "OpenAI API error: 401",
            "detail": "invalid api key",
            "kind": "backend_error",
            "upstreamStatus": 401
        })
    );
}

#[tokio::test]
async fn empty_completion_is_a_bad_gateway() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&backend)
        .await;
    let addr = spawn_relay_server(relay_for(Some(&backend))).await;

    let (status, body) = post(addr, json!({"message": "hello"})).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        body,
        json!({"error": "No response from AI", "kind": "empty_response"})
    );
}

#[tokio::test]
async fn health_check_answers_ok() {
    let addr = spawn_relay_server(relay_for(None)).await;

    let body = reqwest::get(format!("http://{addr}/health"))
        .await
        .expect("send")
        .text()
        .await
        .expect("body");
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn conversation_over_http_relay_forwards_history() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion("A heist at dawn"))
        .up_to_n_times(1)
        .mount(&backend)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion("The vault was empty"))
        .mount(&backend)
        .await;
    let addr = spawn_relay_server(relay_for(Some(&backend))).await;
    let relay = HttpRelay::new(http(), chat_url(addr));
    let mut conversation = Conversation::new(Mode::Creative, "gpt-5-nano-2025-08-07");

    let first = conversation.submit(&relay, "Draft a logline").await;
    let second = conversation.submit(&relay, "Add a twist").await;

    assert_eq!(first, Some(Ok("A heist at dawn".to_string())));
    assert_eq!(second, Some(Ok("The vault was empty".to_string())));
    assert_eq!(
        conversation.transcript(),
        &[
            ChatMessage::user("Draft a logline"),
            ChatMessage::assistant("A heist at dawn"),
            ChatMessage::user("Add a twist"),
            ChatMessage::assistant("The vault was empty"),
        ]
    );

    let requests = backend.received_requests().await.expect("recorded requests");
    assert_eq!(requests.len(), 2);
    let second_call: Value = serde_json::from_slice(&requests[1].body).expect("json body");
    assert_eq!(second_call["model"], "gpt-5-nano-2025-08-07");
    assert_eq!(
        second_call["messages"],
        json!([
            {"role": "system", "content": system_prompt(Mode::Creative)},
            {"role": "user", "content": "Draft a logline"},
            {"role": "assistant", "content": "A heist at dawn"},
            {"role": "user", "content": "Add a twist"}
        ])
    );
}

#[tokio::test]
async fn unauthorized_backend_leaves_client_failed_with_empty_transcript() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&backend)
        .await;
    let addr = spawn_relay_server(relay_for(Some(&backend))).await;
    let relay = HttpRelay::new(http(), chat_url(addr));
    let mut conversation = Conversation::new(Mode::Business, MODEL);

    let result = conversation.submit(&relay, "Plan my launch").await;

    let expected = TurnError::BackendError {
        status: 401,
        body: "invalid api key".to_string(),
    };
    assert_eq!(result, Some(Err(expected.clone())));
    assert!(conversation.transcript().is_empty());
    assert_eq!(
        conversation.state(),
        &TurnState::Failed {
            error: expected,
            unsent: "Plan my launch".to_string()
        }
    );
}

#[tokio::test]
async fn in_process_relay_matches_server_behavior() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion("Comparable sales suggest 410k"))
        .expect(1)
        .mount(&backend)
        .await;
    let relay = relay_for(Some(&backend));
    let mut conversation = Conversation::new(Mode::RealEstate, MODEL);

    assert_eq!(conversation.submit(&relay, "   ").await, None);
    let reply = conversation.submit(&relay, "Value my flat").await;

    assert_eq!(
        reply,
        Some(Ok("Comparable sales suggest 410k".to_string()))
    );
    assert_eq!(conversation.transcript().len(), 2);
}
