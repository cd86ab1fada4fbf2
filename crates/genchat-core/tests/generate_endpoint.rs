//! End-to-end checks of the generation client and the session controller
//! against a mock `/api/generate` endpoint.

use std::sync::Arc;

use genchat_core::{
    ChatSession, Exchange, GenerateClient, Persona, SubmitOutcome, FAILURE_RESPONSE,
};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper: an address nothing is listening on.
///
/// Dropped `MockServer`s go back to wiremock's pool and keep listening, so a
/// plain listener is bound and released instead.
fn closed_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

#[tokio::test]
async fn posts_question_and_role_and_returns_reply() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_json(json!({ "question": "Hello", "role": "friend" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "Hi there!" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GenerateClient::new(&server.uri());
    let reply = client.query("Hello", Persona::Friend).await.unwrap();

    assert_eq!(reply, "Hi there!");
}

#[tokio::test]
async fn error_status_is_a_failure_carrying_the_service_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "quota exceeded" })))
        .mount(&server)
        .await;

    let client = GenerateClient::new(&server.uri());
    let failure = client.query("anything", Persona::Assistant).await.unwrap_err();

    assert!(failure.reason().contains("500"), "got: {failure}");
    assert!(failure.reason().contains("quota exceeded"), "got: {failure}");
}

#[tokio::test]
async fn body_without_response_field_is_a_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": "wrong key" })))
        .mount(&server)
        .await;

    let client = GenerateClient::new(&server.uri());
    let result = client.query("q", Persona::Expert).await;

    assert!(result.is_err(), "expected malformed body to fail, got: {result:?}");
}

#[tokio::test]
async fn unreachable_endpoint_is_a_failure() {
    let client = GenerateClient::new(&closed_endpoint());
    assert!(client.query("q", Persona::Assistant).await.is_err());
}

#[tokio::test]
async fn session_records_successful_exchange() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_json(json!({ "question": "Hello", "role": "friend" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "Hi there!" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = ChatSession::new(Arc::new(GenerateClient::new(&server.uri())));
    session.select_persona(Persona::Friend);
    session.set_draft("Hello");

    assert_eq!(session.submit(), SubmitOutcome::Dispatched);
    // A second submit while waiting must not produce another request.
    assert_eq!(session.submit(), SubmitOutcome::AlreadyPending);
    session.settle().await;

    assert_eq!(session.transcript().as_slice(), &[Exchange::new("Hello", "Hi there!")]);
    assert_eq!(session.draft(), "");
    assert!(!session.is_pending());
}

#[tokio::test]
async fn session_records_placeholder_when_endpoint_is_down() {
    let endpoint = closed_endpoint();
    let mut session = ChatSession::new(Arc::new(GenerateClient::new(&endpoint)));
    session.set_draft("2+2?");
    session.submit();
    session.settle().await;

    assert_eq!(
        session.transcript().as_slice(),
        &[Exchange::new("2+2?", FAILURE_RESPONSE)]
    );
    assert!(!session.is_pending());
}

#[tokio::test]
async fn session_records_placeholder_on_bad_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "No input provided" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = ChatSession::new(Arc::new(GenerateClient::new(&server.uri())));
    session.set_draft("hi");
    session.submit();
    let exchange = session.settle().await.unwrap();

    assert_eq!(exchange, Exchange::new("hi", FAILURE_RESPONSE));
}
