//! Wire-format tests for the concrete providers, against a local mock server.

use httpmock::prelude::*;
use llm_augmenter::provider::{
    AnthropicProvider, CompletionRequest, GoogleProvider, OpenAiProvider, Provider,
};
use llm_augmenter::AugmentError;
use serde_json::json;

fn request(model: &str) -> CompletionRequest {
    CompletionRequest {
        prompt: "Summarize this.".into(),
        model: model.into(),
        temperature: 0.1,
        max_tokens: 300,
    }
}

#[tokio::test]
async fn openai_call_sends_chat_body_and_unwraps_first_choice() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer test-key")
                .json_body_partial(
                    r#"{
                        "model": "gpt-4o-mini",
                        "messages": [{"role": "user", "content": "Summarize this."}]
                    }"#,
                );
            then.status(200).json_body(json!({
                "choices": [{"message": {"role": "assistant", "content": "a summary"}}],
                "usage": {"total_tokens": 12}
            }));
        })
        .await;

    let provider = OpenAiProvider::new("test-key").with_base_url(server.base_url());
    let client = reqwest::Client::new();
    let text = provider
        .call(&client, &request("gpt-4o-mini"))
        .await
        .unwrap();

    assert_eq!(text, "a summary");
    mock.assert_async().await;
}

#[tokio::test]
async fn openai_missing_content_normalizes_to_empty_text() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(json!({"choices": []}));
        })
        .await;

    let provider = OpenAiProvider::new("test-key").with_base_url(server.base_url());
    let client = reqwest::Client::new();
    let text = provider
        .call(&client, &request("gpt-4o-mini"))
        .await
        .unwrap();

    assert_eq!(text, "");
}

#[tokio::test]
async fn openai_error_envelope_becomes_structured_provider_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(404).json_body(json!({
                "error": {
                    "message": "The model does not exist",
                    "type": "invalid_request_error",
                    "code": "model_not_found",
                    "param": "model"
                }
            }));
        })
        .await;

    let provider = OpenAiProvider::new("test-key").with_base_url(server.base_url());
    let client = reqwest::Client::new();
    let err = provider
        .call(&client, &request("gpt-nonexistent"))
        .await
        .unwrap_err();

    match err {
        AugmentError::Provider {
            message,
            kind,
            code,
            param,
        } => {
            assert_eq!(message, "The model does not exist");
            assert_eq!(kind.as_deref(), Some("invalid_request_error"));
            assert_eq!(code.as_deref(), Some("model_not_found"));
            assert_eq!(param.as_deref(), Some("model"));
        }
        other => panic!("expected Provider error, got {:?}", other),
    }
}

#[tokio::test]
async fn anthropic_call_sends_versioned_headers_and_unwraps_text_block() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/messages")
                .header("x-api-key", "test-key")
                .header("anthropic-version", "2023-06-01")
                .json_body_partial(
                    r#"{
                        "model": "claude-3-5-haiku-latest",
                        "max_tokens": 300
                    }"#,
                );
            then.status(200).json_body(json!({
                "content": [{"type": "text", "text": "a claude summary"}],
                "stop_reason": "end_turn"
            }));
        })
        .await;

    let provider = AnthropicProvider::new("test-key").with_base_url(server.base_url());
    let client = reqwest::Client::new();
    let text = provider
        .call(&client, &request("claude-3-5-haiku-latest"))
        .await
        .unwrap();

    assert_eq!(text, "a claude summary");
    mock.assert_async().await;
}

#[tokio::test]
async fn anthropic_error_envelope_carries_classification() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/messages");
            then.status(529).json_body(json!({
                "type": "error",
                "error": {"type": "overloaded_error", "message": "Overloaded"}
            }));
        })
        .await;

    let provider = AnthropicProvider::new("test-key").with_base_url(server.base_url());
    let client = reqwest::Client::new();
    let err = provider
        .call(&client, &request("claude-3-5-haiku-latest"))
        .await
        .unwrap_err();

    match err {
        AugmentError::Provider { message, kind, .. } => {
            assert_eq!(message, "Overloaded");
            assert_eq!(kind.as_deref(), Some("overloaded_error"));
        }
        other => panic!("expected Provider error, got {:?}", other),
    }
}

#[tokio::test]
async fn google_call_addresses_model_path_with_key_and_renders_candidate() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1beta/models/gemini-1.5-flash:generateContent")
                .query_param("key", "test-key")
                .json_body_partial(
                    r#"{
                        "generationConfig": {"temperature": 0.1, "maxOutputTokens": 300}
                    }"#,
                );
            then.status(200).json_body(json!({
                "candidates": [{
                    "content": {"parts": [{"text": "a gemini "}, {"text": "summary"}]}
                }]
            }));
        })
        .await;

    let provider = GoogleProvider::new("test-key").with_base_url(server.base_url());
    let client = reqwest::Client::new();
    let text = provider
        .call(&client, &request("gemini-1.5-flash"))
        .await
        .unwrap();

    assert_eq!(text, "a gemini summary");
    mock.assert_async().await;
}

#[tokio::test]
async fn google_error_envelope_maps_status_and_code() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1beta/models/gemini-1.5-flash:generateContent");
            then.status(429).json_body(json!({
                "error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}
            }));
        })
        .await;

    let provider = GoogleProvider::new("test-key").with_base_url(server.base_url());
    let client = reqwest::Client::new();
    let err = provider
        .call(&client, &request("gemini-1.5-flash"))
        .await
        .unwrap_err();

    match err {
        AugmentError::Provider {
            message,
            kind,
            code,
            ..
        } => {
            assert_eq!(message, "Quota exceeded");
            assert_eq!(kind.as_deref(), Some("RESOURCE_EXHAUSTED"));
            assert_eq!(code.as_deref(), Some("429"));
        }
        other => panic!("expected Provider error, got {:?}", other),
    }
}
