//! Provider for the Google generative language API.
//!
//! Endpoint: `POST {base}/v1beta/models/{model}:generateContent` with the
//! API key passed as a query parameter. The reply is normalized to the
//! rendered text of the first candidate (its text parts concatenated).

use super::{envelope_string, redact_key, CompletionRequest, Provider};
use crate::error::{AugmentError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Provider for Google's Gemini models.
#[derive(Clone)]
pub struct GoogleProvider {
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for GoogleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleProvider")
            .field("api_key", &redact_key(&self.api_key))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GoogleProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the provider at a different base URL (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_body(request: &CompletionRequest) -> Value {
        json!({
            "contents": [{"role": "user", "parts": [{"text": request.prompt}]}],
            "generationConfig": {
                "temperature": request.temperature,
                "maxOutputTokens": request.max_tokens,
            },
        })
    }

    /// The envelope is `{"error": {"code", "message", "status"}}`.
    fn error_from_body(status: u16, body: &str) -> AugmentError {
        if let Ok(envelope) = serde_json::from_str::<Value>(body) {
            if let Some(error) = envelope.get("error") {
                return AugmentError::Provider {
                    message: error
                        .get("message")
                        .and_then(|v| v.as_str())
                        .unwrap_or(body)
                        .to_string(),
                    kind: error
                        .get("status")
                        .and_then(|v| v.as_str())
                        .map(String::from),
                    code: error.get("code").and_then(envelope_string),
                    param: None,
                };
            }
        }
        AugmentError::provider(format!("HTTP {}: {}", status, body))
    }

    /// Concatenated text parts of the first candidate; empty when absent.
    fn extract_text(envelope: &Value) -> String {
        envelope
            .get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl Provider for GoogleProvider {
    async fn call(&self, client: &Client, request: &CompletionRequest) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            request.model
        );
        let body = Self::build_body(request);

        let resp = client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Self::error_from_body(status.as_u16(), &text));
        }

        let envelope: Value = resp.json().await?;
        Ok(Self::extract_text(&envelope))
    }

    fn name(&self) -> &'static str {
        "google"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> CompletionRequest {
        CompletionRequest {
            prompt: "Classify this.".into(),
            model: "gemini-1.5-flash".into(),
            temperature: 0.4,
            max_tokens: 200,
        }
    }

    #[test]
    fn test_build_body_shape() {
        let body = GoogleProvider::build_body(&request());
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Classify this.");
        assert_eq!(body["generationConfig"]["temperature"], 0.4);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 200);
    }

    #[test]
    fn test_extract_text_concatenates_parts() {
        let envelope = json!({
            "candidates": [{
                "content": {"parts": [{"text": "Hello, "}, {"text": "world"}]}
            }]
        });
        assert_eq!(GoogleProvider::extract_text(&envelope), "Hello, world");
    }

    #[test]
    fn test_extract_text_no_candidates() {
        assert_eq!(GoogleProvider::extract_text(&json!({"candidates": []})), "");
        assert_eq!(GoogleProvider::extract_text(&json!({})), "");
    }

    #[test]
    fn test_error_from_body_envelope() {
        let body = r#"{"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}"#;
        match GoogleProvider::error_from_body(429, body) {
            AugmentError::Provider {
                message,
                kind,
                code,
                param,
            } => {
                assert_eq!(message, "Quota exceeded");
                assert_eq!(kind.as_deref(), Some("RESOURCE_EXHAUSTED"));
                assert_eq!(code.as_deref(), Some("429"));
                assert!(param.is_none());
            }
            other => panic!("expected Provider error, got {:?}", other),
        }
    }
}
