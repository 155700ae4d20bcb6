use thiserror::Error;

/// Errors produced by the augmentation run and its components.
///
/// Every variant here is fatal at the point it surfaces: configuration,
/// source, and compilation errors abort before any item is processed;
/// provider and transport errors abort the run where they occur. Recoverable
/// conditions (a response that fails to parse as columns, a preprocessing
/// statement that fails on one item) are plain values consumed by their
/// owning module and never appear in this enum.
#[derive(Error, Debug)]
pub enum AugmentError {
    /// A required run setting is missing or unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The input collection is missing or unreadable.
    #[error("cannot access input collection: {0}")]
    Source(String),

    /// The output sink rejected a record.
    #[error("cannot write to output collection: {0}")]
    Output(String),

    /// The preprocessing expression failed to compile at startup.
    #[error("cannot compile preprocessing expression: {0}")]
    Compile(String),

    /// The backend rejected a completion call.
    ///
    /// Carries the fields providers report in their error envelopes. The
    /// `kind` is the provider's own classification (e.g.
    /// `"invalid_request_error"`), `code` and `param` are present when the
    /// provider names them.
    #[error("provider call failed: {message}")]
    Provider {
        /// Human-readable failure description from the provider.
        message: String,
        /// Provider-side error classification.
        kind: Option<String>,
        /// Machine-readable error code, if the provider supplied one.
        code: Option<String>,
        /// Name of the offending request parameter, if the provider named one.
        param: Option<String>,
    },

    /// Low-level HTTP transport failure (connection refused, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// A backend returned an envelope that is not valid JSON.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The provider returned no text during pre-flight validation.
    #[error("empty response received from the provider")]
    EmptyResponse,

    /// Pre-flight validation exhausted its attempts.
    #[error("structured output validation failed: {0}")]
    Validation(String),
}

impl AugmentError {
    /// Build a [`AugmentError::Provider`] carrying only a message.
    pub fn provider(message: impl Into<String>) -> Self {
        AugmentError::Provider {
            message: message.into(),
            kind: None,
            code: None,
            param: None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AugmentError>;
