//! Per-run configuration.
//!
//! [`RunConfig`] is deserialized once from the host's JSON input (camelCase
//! keys) and read-only afterwards. Validation of required settings and
//! temperature parsing happen before the first item is touched.

use crate::error::{AugmentError, Result};
use crate::provider::ProviderKind;
use serde::Deserialize;
use std::path::Path;

fn default_temperature() -> String {
    "0.1".to_string()
}

fn default_max_output_tokens() -> u32 {
    300
}

fn default_test_items_count() -> usize {
    3
}

/// Immutable per-run settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunConfig {
    /// Identifier of the input collection (a file path for the file-backed
    /// source). Required.
    #[serde(default)]
    pub input_collection_id: String,

    /// Credential forwarded to whichever backend is selected. Required.
    #[serde(default)]
    pub provider_api_key: String,

    /// Prompt template with `${field}` placeholders. Required.
    #[serde(default)]
    pub prompt: String,

    /// Model identifier; drives provider selection and is passed through
    /// verbatim. Required.
    #[serde(default)]
    pub model: String,

    /// Sampling temperature as text, parsed to a float at startup.
    #[serde(default = "default_temperature")]
    pub temperature: String,

    /// Cap on generated tokens per call.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Skip an item (no call, no output) when any referenced placeholder
    /// resolves empty.
    #[serde(default)]
    pub skip_if_empty_fields: bool,

    /// Ask the model for a JSON object and merge its fields as columns.
    #[serde(default)]
    pub structured_output: bool,

    /// Force a specific backend regardless of the model prefix.
    #[serde(default)]
    pub explicit_provider: Option<ProviderKind>,

    /// Process only a bounded prefix of the fetched items.
    #[serde(default)]
    pub test_mode: bool,

    /// How many items test mode keeps (capped by the fetched size).
    #[serde(default = "default_test_items_count")]
    pub test_items_count: usize,

    /// Optional preprocessing program, compiled at startup.
    #[serde(default)]
    pub preprocessing_expression: Option<String>,
}

impl RunConfig {
    /// Deserialize a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| AugmentError::Config(e.to_string()))
    }

    /// Read and deserialize a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| AugmentError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    /// Check the required settings. Fatal before any item is processed.
    pub fn validate(&self) -> Result<()> {
        if self.input_collection_id.trim().is_empty() {
            return Err(AugmentError::Config("no inputCollectionId provided".into()));
        }
        if self.provider_api_key.trim().is_empty() {
            return Err(AugmentError::Config("no providerApiKey provided".into()));
        }
        if self.prompt.trim().is_empty() {
            return Err(AugmentError::Config("no prompt provided".into()));
        }
        if self.model.trim().is_empty() {
            return Err(AugmentError::Config("no model provided".into()));
        }
        Ok(())
    }

    /// The temperature parsed to a float.
    pub fn parsed_temperature(&self) -> Result<f64> {
        self.temperature.trim().parse::<f64>().map_err(|_| {
            AugmentError::Config(format!(
                "temperature '{}' is not a number",
                self.temperature
            ))
        })
    }
}
