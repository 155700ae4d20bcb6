//! Uniform dispatch over the concrete provider backends.
//!
//! [`ProviderGateway`] owns the shared HTTP client, one instance of each
//! backend variant, and the optional explicit provider override from the run
//! configuration. It is constructed once at startup and threaded through the
//! pipeline — no component reaches for process-wide state.

use crate::error::Result;
use crate::provider::{
    AnthropicProvider, CompletionRequest, GoogleProvider, OpenAiProvider, Provider, ProviderKind,
};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// One gateway per run: shared client, one backend per [`ProviderKind`].
///
/// # Example
///
/// ```
/// use llm_augmenter::gateway::ProviderGateway;
/// use llm_augmenter::provider::ProviderKind;
///
/// let gateway = ProviderGateway::new("api-key");
/// assert_eq!(gateway.resolve("claude-3-5-haiku-latest"), ProviderKind::Anthropic);
/// ```
pub struct ProviderGateway {
    client: Client,
    openai: Arc<dyn Provider>,
    anthropic: Arc<dyn Provider>,
    google: Arc<dyn Provider>,
    explicit: Option<ProviderKind>,
}

impl std::fmt::Debug for ProviderGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderGateway")
            .field("openai", &self.openai.name())
            .field("anthropic", &self.anthropic.name())
            .field("google", &self.google.name())
            .field("explicit", &self.explicit)
            .finish()
    }
}

impl ProviderGateway {
    /// Build a gateway with all three real backends sharing one credential.
    pub fn new(api_key: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            openai: Arc::new(OpenAiProvider::new(api_key)),
            anthropic: Arc::new(AnthropicProvider::new(api_key)),
            google: Arc::new(GoogleProvider::new(api_key)),
            explicit: None,
        }
    }

    /// Set the HTTP client. If not set, a default client with a 60 second
    /// timeout is used.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Force every call to a specific backend, ignoring the model prefix.
    pub fn with_explicit_provider(mut self, kind: Option<ProviderKind>) -> Self {
        self.explicit = kind;
        self
    }

    /// Replace one backend (mock injection, alternative endpoints).
    pub fn with_provider(mut self, kind: ProviderKind, provider: Arc<dyn Provider>) -> Self {
        match kind {
            ProviderKind::OpenAi => self.openai = provider,
            ProviderKind::Anthropic => self.anthropic = provider,
            ProviderKind::Google => self.google = provider,
        }
        self
    }

    /// Which backend a model identifier routes to, honoring the override.
    pub fn resolve(&self, model: &str) -> ProviderKind {
        ProviderKind::for_model(model, self.explicit)
    }

    fn provider_for(&self, kind: ProviderKind) -> &Arc<dyn Provider> {
        match kind {
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Anthropic => &self.anthropic,
            ProviderKind::Google => &self.google,
        }
    }

    /// Dispatch one completion call to the resolved backend.
    pub async fn call(&self, request: &CompletionRequest) -> Result<String> {
        let kind = self.resolve(&request.model);
        let provider = self.provider_for(kind);
        tracing::debug!(
            provider = provider.name(),
            model = %request.model,
            "dispatching completion request"
        );
        provider.call(&self.client, request).await
    }
}
