//! The item pipeline orchestrator.
//!
//! [`Augmenter`] drives the whole run: fetch items, optionally restrict to a
//! test prefix, pre-flight the prompt in structured mode, then walk the
//! items strictly in order — preprocess, skip-check, template, dispatch,
//! attach or merge, emit, delay. There is no parallelism and no mid-run
//! cancellation; each provider call and the inter-item delay are the only
//! suspension points.
//!
//! Errors from a per-item step abort the run (fail-fast). Records already
//! handed to the sink stay committed.

use crate::columns;
use crate::config::RunConfig;
use crate::dataset::{Item, ItemSink, ItemSource};
use crate::error::Result;
use crate::gateway::ProviderGateway;
use crate::preprocess::Preprocessor;
use crate::provider::CompletionRequest;
use crate::retry::{self, ColumnsOutcome};
use crate::template;
use serde_json::Value;
use std::time::Duration;

/// Call issuance ceiling the inter-item delay is sized against.
pub const RATE_LIMIT_PER_MINUTE: u64 = 500;

/// Fixed spacing between items, rounded up from the rate ceiling (~120 ms).
pub const REQUEST_INTERVAL: Duration =
    Duration::from_millis(60_000u64.div_ceil(RATE_LIMIT_PER_MINUTE));

/// Field that carries the raw response text in unstructured mode and in the
/// structured-mode fallback.
pub const LLM_RESPONSE_FIELD: &str = "llmresponse";

/// Counters reported after a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Items the run actually iterated (after the test-mode restriction).
    pub fetched: usize,
    /// Items emitted to the sink.
    pub processed: usize,
    /// Items skipped by the empty-field rule.
    pub skipped: usize,
}

/// One configured augmentation run.
///
/// Construction performs everything that must fail before the first item:
/// required-setting validation, temperature parsing, preprocessing
/// compilation, and gateway setup.
///
/// # Example
///
/// ```no_run
/// use llm_augmenter::{Augmenter, RunConfig};
/// use llm_augmenter::dataset::{JsonFileSource, MemorySink};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = RunConfig::from_file("run.json")?;
/// let source = JsonFileSource::new(&config.input_collection_id);
/// let mut sink = MemorySink::new();
///
/// let summary = Augmenter::new(config)?.run(&source, &mut sink).await?;
/// println!("processed {} / skipped {}", summary.processed, summary.skipped);
/// # Ok(())
/// # }
/// ```
pub struct Augmenter {
    config: RunConfig,
    temperature: f64,
    preprocessor: Preprocessor,
    gateway: ProviderGateway,
    request_interval: Duration,
}

impl Augmenter {
    /// Build a run from its configuration. Fatal-before-run failures
    /// (missing settings, bad temperature, uncompilable preprocessing
    /// expression) surface here.
    pub fn new(config: RunConfig) -> Result<Self> {
        config.validate()?;
        let temperature = config.parsed_temperature()?;
        let preprocessor = Preprocessor::compile(config.preprocessing_expression.as_deref())?;
        let gateway = ProviderGateway::new(&config.provider_api_key)
            .with_explicit_provider(config.explicit_provider);

        Ok(Self {
            config,
            temperature,
            preprocessor,
            gateway,
            request_interval: REQUEST_INTERVAL,
        })
    }

    /// Replace the gateway wholesale (mock backends, custom endpoints).
    pub fn with_gateway(mut self, gateway: ProviderGateway) -> Self {
        self.gateway = gateway;
        self
    }

    /// Override the inter-item delay. Tests use `Duration::ZERO`.
    pub fn with_request_interval(mut self, interval: Duration) -> Self {
        self.request_interval = interval;
        self
    }

    /// The run configuration.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Process every item from `source` into `sink`.
    pub async fn run(
        &self,
        source: &dyn ItemSource,
        sink: &mut dyn ItemSink,
    ) -> Result<RunSummary> {
        let mut items = source.fetch().await?;
        let fetched_total = items.len();

        tracing::info!(
            collection = %self.config.input_collection_id,
            model = %self.config.model,
            structured = self.config.structured_output,
            "starting augmentation run"
        );

        if self.config.test_mode {
            let keep = self.config.test_items_count.min(items.len());
            items.truncate(keep);
            tracing::info!(
                "test mode enabled - processing {} items out of {}",
                keep,
                fetched_total
            );
        } else {
            tracing::info!("fetched {} items from the input collection", items.len());
        }

        if self.config.structured_output {
            if let Some(first) = items.first() {
                let processed = self.preprocessor.apply(first);
                let request = self.completion_request(self.build_prompt(&processed));
                retry::preflight(&self.gateway, &request).await?;
                tracing::info!("structured output validated against the first item");
            }
        }

        let total = items.len();
        let mut summary = RunSummary {
            fetched: total,
            processed: 0,
            skipped: 0,
        };

        for (index, item) in items.into_iter().enumerate() {
            let item = self.preprocessor.apply(&item);

            if self.config.skip_if_empty_fields
                && template::has_empty_fields(&self.config.prompt, &item)
            {
                tracing::info!("skipping item {}/{} due to empty fields", index + 1, total);
                summary.skipped += 1;
                tokio::time::sleep(self.request_interval).await;
                continue;
            }

            let request = self.completion_request(self.build_prompt(&item));
            tracing::debug!(prompt = %request.prompt, "processing item {}/{}", index + 1, total);

            let output = if self.config.structured_output {
                match retry::request_columns(&self.gateway, &request).await? {
                    ColumnsOutcome::Columns(cols) => columns::merge(&item, &cols),
                    ColumnsOutcome::Fallback(raw) => attach_response(item, raw),
                }
            } else {
                let text = self.gateway.call(&request).await?;
                attach_response(item, text)
            };

            sink.push(output).await?;
            summary.processed += 1;
            tracing::info!("processed item {}/{}", index + 1, total);

            tokio::time::sleep(self.request_interval).await;
        }

        tracing::info!(
            processed = summary.processed,
            skipped = summary.skipped,
            "run finished"
        );
        Ok(summary)
    }

    /// Render the prompt for one item, with the structured suffix when
    /// multiple columns are requested.
    fn build_prompt(&self, item: &Item) -> String {
        let rendered = template::substitute(&self.config.prompt, item);
        template::build_final_prompt(rendered, self.config.structured_output)
    }

    fn completion_request(&self, prompt: String) -> CompletionRequest {
        CompletionRequest {
            prompt,
            model: self.config.model.clone(),
            temperature: self.temperature,
            max_tokens: self.config.max_output_tokens,
        }
    }
}

/// Attach raw response text under the single response field.
fn attach_response(mut item: Item, text: String) -> Item {
    item.insert(LLM_RESPONSE_FIELD.to_string(), Value::String(text));
    item
}
