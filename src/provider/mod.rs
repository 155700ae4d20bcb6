//! Provider trait, normalized request type, and backend selection.
//!
//! The [`Provider`] trait abstracts over external text-generation services,
//! translating a normalized [`CompletionRequest`] into each provider's HTTP
//! API and unwrapping the reply to a single text string. Built-in
//! implementations: [`OpenAiProvider`], [`AnthropicProvider`],
//! [`GoogleProvider`], plus [`MockProvider`] for tests.
//!
//! ## Architecture
//!
//! ```text
//! Augmenter ──► CompletionRequest ──► ProviderGateway::call() ──► text
//!                                             │
//!                          ┌──────────────────┼──────────────────┐
//!                    OpenAiProvider    AnthropicProvider   GoogleProvider
//!                  /v1/chat/completions   /v1/messages    :generateContent
//! ```

pub mod anthropic;
pub mod google;
pub mod mock;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use google::GoogleProvider;
pub use mock::MockProvider;
pub use openai::OpenAiProvider;

use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A normalized completion request — provider-agnostic.
///
/// The orchestrator builds this once per item; the retry loops re-issue it
/// with an amended prompt but identical sampling parameters.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// The fully rendered prompt text.
    pub prompt: String,
    /// Model identifier, passed through to the backend verbatim.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Maximum tokens the backend may generate.
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Copy of this request with a different prompt, same parameters.
    pub fn with_prompt(&self, prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..self.clone()
        }
    }
}

/// Abstraction over external text-generation services.
///
/// Implementors translate the normalized [`CompletionRequest`] into the
/// provider's HTTP API and normalize the reply to plain text: the first
/// textual content block / first completion choice / rendered candidate
/// text, or empty text when the reply carries no content. A missing content
/// field is never an error; a rejected call is.
///
/// # Object Safety
///
/// This trait is object-safe and designed to be used as `Arc<dyn Provider>`.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Execute one completion call and return the response text.
    async fn call(&self, client: &Client, request: &CompletionRequest) -> Result<String>;

    /// Stable identifier for logging and diagnostics.
    fn name(&self) -> &'static str;
}

/// The closed set of supported backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI-compatible chat completions. Also the default route.
    OpenAi,
    /// Anthropic messages API.
    Anthropic,
    /// Google generative language API.
    Google,
}

impl ProviderKind {
    /// Select the backend for a model identifier.
    ///
    /// An explicit override always wins. Otherwise routing goes by naming
    /// convention: identifiers containing `claude-` belong to Anthropic,
    /// identifiers starting with `gemini-` to Google, and everything else
    /// routes to the OpenAI-compatible default. Pure and side-effect-free.
    ///
    /// # Example
    ///
    /// ```
    /// use llm_augmenter::provider::ProviderKind;
    ///
    /// assert_eq!(ProviderKind::for_model("claude-sonnet-4-20250514", None), ProviderKind::Anthropic);
    /// assert_eq!(ProviderKind::for_model("gemini-1.5-flash", None), ProviderKind::Google);
    /// assert_eq!(ProviderKind::for_model("gpt-4o-mini", None), ProviderKind::OpenAi);
    /// assert_eq!(
    ///     ProviderKind::for_model("gpt-4o-mini", Some(ProviderKind::Google)),
    ///     ProviderKind::Google
    /// );
    /// ```
    pub fn for_model(model: &str, explicit: Option<ProviderKind>) -> ProviderKind {
        if let Some(kind) = explicit {
            return kind;
        }
        if model.contains("claude-") {
            ProviderKind::Anthropic
        } else if model.starts_with("gemini-") {
            ProviderKind::Google
        } else {
            ProviderKind::OpenAi
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let id = match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Google => "google",
        };
        f.write_str(id)
    }
}

/// String form of an envelope field that may be a string or a number.
pub(crate) fn envelope_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Redact an API key for Debug output, keeping a short prefix.
pub(crate) fn redact_key(key: &str) -> String {
    if key.len() > 6 {
        format!("{}***", &key[..6])
    } else {
        "***".to_string()
    }
}
