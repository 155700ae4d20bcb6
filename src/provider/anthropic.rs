//! Provider for the Anthropic messages API.
//!
//! Endpoint: `POST {base}/v1/messages` with `x-api-key` authentication and a
//! pinned `anthropic-version` header. The reply is normalized to the first
//! `text` content block.

use super::{redact_key, CompletionRequest, Provider};
use crate::error::{AugmentError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// Provider for Anthropic's native messages API.
#[derive(Clone)]
pub struct AnthropicProvider {
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("api_key", &redact_key(&self.api_key))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl AnthropicProvider {
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
            "model": request.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "messages": [{"role": "user", "content": request.prompt}],
        })
    }

    /// The envelope is `{"type": "error", "error": {"type", "message"}}`.
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
                        .get("type")
                        .and_then(|v| v.as_str())
                        .map(String::from),
                    code: None,
                    param: None,
                };
            }
        }
        AugmentError::provider(format!("HTTP {}: {}", status, body))
    }

    /// First `text` content block, or empty text when none exists.
    fn extract_text(envelope: &Value) -> String {
        envelope
            .get("content")
            .and_then(|c| c.as_array())
            .and_then(|blocks| {
                blocks
                    .iter()
                    .find(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
            })
            .and_then(|b| b.get("text"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string()
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    async fn call(&self, client: &Client, request: &CompletionRequest) -> Result<String> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let body = Self::build_body(request);

        let resp = client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
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
        "anthropic"
    }
}
