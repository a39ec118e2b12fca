//! End-to-end cascade over HTTP: Groq and Gemini both served by wiremock,
//! generator built from configuration.

use explain_levels::prelude::*;
use futures::StreamExt;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FIRST: &str = "gemini-2.0-flash-exp";
const SECOND: &str = "gemini-2.5-flash";

fn config(server: &MockServer) -> GenerationConfig {
    GenerationConfig::new(
        GroqConfig::new("groq-key").with_base_url(format!("{}/openai/v1", server.uri())),
        GeminiConfig::new("gemini-key").with_base_url(format!("{}/v1beta", server.uri())),
    )
    .with_request_timeout(Duration::from_secs(5))
}

async fn mount_groq_failure(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": {"message": "Service Unavailable"}
        })))
        .mount(server)
        .await;
}

async fn mount_gemini_rate_limit(server: &MockServer, model: &str) {
    let body = json!({
        "error": {
            "code": 429,
            "message": "Resource has been exhausted (e.g. check quota).",
            "status": "RESOURCE_EXHAUSTED",
            "details": [{"@type": "type.googleapis.com/google.rpc.RetryInfo", "retryDelay": "30s"}]
        }
    });
    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{model}:streamGenerateContent")))
        .respond_with(ResponseTemplate::new(429).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_gemini_success(server: &MockServer, model: &str) {
    let events: String = ["Black holes ", "bend spacetime."]
        .iter()
        .map(|t| {
            format!(
                "data: {}\n\n",
                json!({"candidates": [{"content": {"parts": [{"text": t}], "role": "model"}}]})
            )
        })
        .collect();
    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{model}:streamGenerateContent")))
        .respond_with(ResponseTemplate::new(200).set_body_raw(events, "text/event-stream"))
        .mount(server)
        .await;
}

async fn mount_groq_stream(server: &MockServer, deltas: &[&str]) {
    let events: String = deltas
        .iter()
        .map(|d| {
            format!(
                "data: {}\n\n",
                json!({"object": "chat.completion.chunk", "choices": [{"index": 0, "delta": {"content": d}}]})
            )
        })
        .chain(std::iter::once("data: [DONE]\n\n".to_string()))
        .collect();
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(events, "text/event-stream"))
        .mount(server)
        .await;
}

#[test]
fn missing_credentials_are_a_configuration_error() {
    let err = GenerationConfig::from_lookup(|_: &str| None).unwrap_err();
    assert!(matches!(err, LlmError::ConfigurationError(_)));
}

#[tokio::test]
async fn falls_back_across_providers_and_remembers_rate_limits() {
    let server = MockServer::start().await;
    mount_groq_failure(&server).await;
    mount_gemini_rate_limit(&server, FIRST).await;
    mount_gemini_success(&server, SECOND).await;

    let generator = ExplanationGenerator::from_config(&config(&server)).unwrap();
    let request = GenerationRequest::new("Black Holes", ComplexityLevel::Advanced).unwrap();

    let events: Vec<TextEvent> = generator
        .generate_stream(&request)
        .map(Result::unwrap)
        .collect()
        .await;
    assert_eq!(
        events,
        vec![
            TextEvent::Fragment("Black holes ".to_string()),
            TextEvent::Fragment("bend spacetime.".to_string()),
        ]
    );

    assert!(!generator.availability().is_available(FIRST));
    assert!(generator.availability().is_available(SECOND));

    let requests_before = server.received_requests().await.unwrap().len();
    let text = generator.generate_complete(&request).await.unwrap();
    assert_eq!(text, "Black holes bend spacetime.");

    // groq once, then straight to the second model
    let received = server.received_requests().await.unwrap();
    let paths: Vec<String> = received[requests_before..]
        .iter()
        .map(|r| r.url.path().to_string())
        .collect();
    assert_eq!(
        paths,
        vec![
            "/openai/v1/chat/completions".to_string(),
            format!("/v1beta/models/{SECOND}:streamGenerateContent"),
        ]
    );
}

#[tokio::test]
async fn exhaustion_reports_the_last_model_error() {
    let server = MockServer::start().await;
    mount_groq_failure(&server).await;
    mount_gemini_rate_limit(&server, FIRST).await;
    mount_gemini_rate_limit(&server, SECOND).await;

    let generator = ExplanationGenerator::from_config(&config(&server)).unwrap();
    let request = GenerationRequest::new("Black Holes", ComplexityLevel::Expert).unwrap();

    let err = generator.generate_complete(&request).await.unwrap_err();
    assert!(err.is_rate_limited());
    assert_eq!(err.message(), "Resource has been exhausted (e.g. check quota).");
    assert_eq!(
        err.provider_error().and_then(|e| e.model_id.clone()).as_deref(),
        Some(SECOND)
    );
    assert_eq!(
        generator
            .availability()
            .disabled_until(SECOND)
            .map(|until| until > tokio::time::Instant::now() + Duration::from_secs(29)),
        Some(true)
    );
}

#[tokio::test]
async fn both_modes_return_the_same_text_from_one_provider() {
    let server = MockServer::start().await;
    mount_groq_stream(&server, &["\n\nHello", " world\n"]).await;

    let generator = ExplanationGenerator::from_config(&config(&server)).unwrap();
    let request = GenerationRequest::new("Greetings", ComplexityLevel::Beginner).unwrap();

    let streamed = collect_text(generator.generate_stream(&request)).await.unwrap();
    let buffered = generator.generate_complete(&request).await.unwrap();
    assert_eq!(streamed, "\n\nHello world\n");
    assert_eq!(buffered, streamed);
}

#[tokio::test]
async fn empty_answer_is_a_success_in_both_modes() {
    let server = MockServer::start().await;
    mount_groq_stream(&server, &[]).await;
    mount_gemini_success(&server, FIRST).await;

    let generator = ExplanationGenerator::from_config(&config(&server)).unwrap();
    let request = GenerationRequest::new("Silence", ComplexityLevel::Beginner).unwrap();

    assert_eq!(collect_text(generator.generate_stream(&request)).await.unwrap(), "");
    assert_eq!(generator.generate_complete(&request).await.unwrap(), "");

    let received = server.received_requests().await.unwrap();
    assert!(received.iter().all(|r| r.url.path() == "/openai/v1/chat/completions"));
}
