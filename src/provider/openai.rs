//! Provider for OpenAI-compatible chat completion APIs.
//!
//! Endpoint: `POST {base}/v1/chat/completions` with bearer authentication.
//! The reply is normalized to the first choice's message content. This is
//! also the default route for model identifiers no other provider claims.

use super::{envelope_string, redact_key, CompletionRequest, Provider};
use crate::error::{AugmentError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Provider for any OpenAI-compatible API.
#[derive(Clone)]
pub struct OpenAiProvider {
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &redact_key(&self.api_key))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OpenAiProvider {
    /// Create a provider talking to the public OpenAI endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the provider at a different base URL (compatible gateways, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_body(request: &CompletionRequest) -> Value {
        json!({
            "model": request.model,
            "messages": [{"role": "user", "content": request.prompt}],
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        })
    }

    /// Map a non-success response body to a structured provider error.
    ///
    /// The envelope is `{"error": {"message", "type", "code", "param"}}`;
    /// anything else degrades to the raw body text.
    fn error_from_body(status: u16, body: &str) -> AugmentError {
        if let Ok(envelope) = serde_json::from_str::<Value>(body) {
            if let Some(error) = envelope.get("error") {
                return AugmentError::Provider {
                    message: error
                        .get("message")
                        .and_then(|v| v.as_str())
                        .unwrap_or(body)
                        .to_string(),
                    kind: error.get("type").and_then(envelope_string),
                    code: error.get("code").and_then(envelope_string),
                    param: error.get("param").and_then(envelope_string),
                };
            }
        }
        AugmentError::provider(format!("HTTP {}: {}", status, body))
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn call(&self, client: &Client, request: &CompletionRequest) -> Result<String> {
        let url = format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        );
        let body = Self::build_body(request);

        let resp = client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Self::error_from_body(status.as_u16(), &text));
        }

        let envelope: Value = resp.json().await?;
        let text = envelope
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
