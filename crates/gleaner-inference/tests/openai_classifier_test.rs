//! HTTP-level tests for the OpenAI-compatible classifier against a mock server.

use chrono::NaiveDate;
use gleaner_core::{ClassificationBackend, Error, GenerationBackend, Priority, RetryPolicy};
use gleaner_inference::{LlmClassifier, OpenAIBackend, OpenAIConfig, ResilientClassifier};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer) -> OpenAIBackend {
    OpenAIBackend::new(OpenAIConfig {
        base_url: server.uri(),
        api_key: Some("sk-test".to_string()),
        gen_model: "test-model".to_string(),
        ..Default::default()
    })
    .expect("Failed to create backend")
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    })
}

#[tokio::test]
async fn test_generate_sends_model_auth_and_json_mode() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "temperature": 0.0,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": "sys"},
                {"role": "user", "content": "hello"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("{}")))
        .expect(1)
        .mount(&server)
        .await;

    let reply = backend(&server)
        .generate_with_system("sys", "hello")
        .await
        .unwrap();
    assert_eq!(reply, "{}");
}

#[tokio::test]
async fn test_categorize_through_chat_completions() {
    let server = MockServer::start().await;
    let content = json!({
        "credentials": ["HubSpot: api key pk-123"],
        "contacts": [],
        "links": ["https://app.hubspot.com"],
        "decisions": [],
        "other": []
    })
    .to_string();
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(&content)))
        .mount(&server)
        .await;

    let classifier = LlmClassifier::new(backend(&server));
    let bundle = classifier
        .categorize(&[
            "hubspot api key pk-123".to_string(),
            "https://app.hubspot.com".to_string(),
        ])
        .await
        .unwrap();

    assert_eq!(bundle.credentials, vec!["HubSpot: api key pk-123"]);
    assert_eq!(bundle.links, vec!["https://app.hubspot.com"]);
    assert!(bundle.other.is_empty());
    assert_eq!(classifier.name(), "llm:test-model");
}

#[tokio::test]
async fn test_parse_tasks_fenced_output() {
    let server = MockServer::start().await;
    let content = "```json\n{\"tasks\": [{\"title\": \"Renew SSL\", \"priority\": \"high\", \"due\": \"2026-10-23\"}]}\n```";
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(content)))
        .mount(&server)
        .await;

    let classifier = LlmClassifier::new(backend(&server))
        .with_today(NaiveDate::from_ymd_opt(2026, 10, 17).unwrap());
    let tasks = classifier.parse_tasks("renew ssl by friday").await.unwrap();

    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Renew SSL");
    assert_eq!(tasks[0].priority, Some(Priority::High));
    assert_eq!(tasks[0].due, NaiveDate::from_ymd_opt(2026, 10, 23));
}

#[tokio::test]
async fn test_rate_limit_is_retried_by_resilient_classifier() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"message": "slow down", "type": "rate_limit_exceeded"}
        })))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion(r#"{"tasks": [{"title": "x"}]}"#)),
        )
        .mount(&server)
        .await;

    let classifier = ResilientClassifier::new(
        LlmClassifier::new(backend(&server)),
        RetryPolicy::immediate(),
    );
    let tasks = classifier.parse_tasks("x").await.unwrap();
    assert_eq!(tasks[0].title, "x");
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_auth_failure_is_config_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "bad key", "type": "invalid_api_key"}
        })))
        .mount(&server)
        .await;

    let err = LlmClassifier::new(backend(&server))
        .categorize(&["x".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[tokio::test]
async fn test_server_error_body_without_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .mount(&server)
        .await;

    let err = backend(&server).generate("x").await.unwrap_err();
    assert!(matches!(err, Error::Remote { status: 500, .. }));
    assert!(!err.is_transient());
}
