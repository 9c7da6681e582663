//! End-to-end turn flow against a mocked model host and a file-backed session

use mockito::Matcher;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use triage_chat_agent::{TurnHandler, APOLOGY_TEXT};
use triage_chat_core::session::{FileMedium, Role, SessionStore};
use triage_chat_providers::OllamaClient;

fn structured_content() -> String {
    json!({
        "possibilities": [
            {"title": "Viral infection", "description": "Common cold or flu", "risk": "low"},
            {"title": "Strep throat", "description": "Bacterial", "risk": "medium"}
        ],
        "nextSteps": ["Rest", "Fluids", "See a doctor if fever persists"],
        "clarifyingQuestions": ["Do you have a fever?"],
        "severity": 140,
        "chips": ["Fever", "No fever"]
    })
    .to_string()
}

#[tokio::test]
async fn test_turns_persist_and_reload() {
    let mut server = mockito::Server::new_async().await;
    let first = server
        .mock("POST", "/api/chat")
        .match_body(Matcher::PartialJson(json!({"format": "json", "stream": false})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"message": {"role": "assistant", "content": structured_content()}}).to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(OllamaClient::new(
        server.url(),
        "llama3",
        0.2,
        0.9,
        Duration::from_secs(5),
    ));
    let handler = TurnHandler::new(provider, None);

    let mut store = SessionStore::open(FileMedium::new(dir.path(), "symptom_chat_v1"));
    assert!(store.is_empty());

    let reply = handler
        .run_turn(&mut store, "sore throat and chills")
        .await
        .unwrap();
    let data = reply.structured_data().unwrap();
    assert_eq!(data.possibilities.len(), 2);
    assert_eq!(data.severity_level(), 100);
    first.assert_async().await;

    // a fresh store over the same file sees the same conversation
    let reloaded = SessionStore::open(FileMedium::new(dir.path(), "symptom_chat_v1"));
    assert_eq!(reloaded.session(), store.session());
    assert_eq!(reloaded.messages()[0].role, Role::User);
    assert!(reloaded.messages()[1].is_structured());
}

#[tokio::test]
async fn test_unreachable_host_yields_apology() {
    let dir = tempfile::tempdir().unwrap();
    // nothing listens on port 9 locally
    let provider = Arc::new(OllamaClient::new(
        "http://127.0.0.1:9",
        "llama3",
        0.2,
        0.9,
        Duration::from_secs(2),
    ));
    let handler = TurnHandler::new(provider, None);
    let mut store = SessionStore::open(FileMedium::new(dir.path(), "chat"));

    let reply = handler.run_turn(&mut store, "headache").await.unwrap();
    assert_eq!(reply.text(), Some(APOLOGY_TEXT));

    let reloaded = SessionStore::open(FileMedium::new(dir.path(), "chat"));
    assert_eq!(reloaded.len(), 2);
}

#[tokio::test]
async fn test_reset_starts_a_new_chat() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/chat")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":{"role":"assistant","content":"Please rest."}}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(OllamaClient::new(
        server.url(),
        "llama3",
        0.2,
        0.9,
        Duration::from_secs(5),
    ));
    let handler = TurnHandler::new(provider, None);
    let medium = FileMedium::new(dir.path(), "chat");
    let path = medium.path().to_path_buf();
    let mut store = SessionStore::open(medium);

    handler.run_turn(&mut store, "tired").await.unwrap();
    assert!(path.exists());

    store.reset().unwrap();
    assert!(store.is_empty());
    assert!(!path.exists());
}
