//! # LLM Augmenter
//!
//! Per-record LLM augmentation for datasets: each input item is rendered
//! into a templated prompt, sent once to an external text-generation
//! backend, and re-emitted with the response attached — either as a single
//! text field or, in structured-output mode, as parsed JSON columns merged
//! into the record.
//!
//! ## Core Concepts
//!
//! - **[`Augmenter`]** — the sequential per-item pipeline: preprocess,
//!   skip-check, template, dispatch, attach/merge, emit, delay.
//! - **[`ProviderGateway`]** — uniform dispatch over the OpenAI-compatible,
//!   Anthropic, and Google backends, selected from the model identifier.
//! - **[`template`]** — `${dotted.path}` placeholder substitution and the
//!   empty-field skip rule.
//! - **[`retry`]** — the bounded loops that coerce free-form model output
//!   into JSON columns, with pre-flight validation and per-item fallback.
//! - **[`Preprocessor`]** — optional restricted per-item transform applied
//!   before templating; a per-item failure degrades to a no-op.
//! - **[`dataset`]** — the [`ItemSource`]/[`ItemSink`] seams around storage.
//!
//! ## Quick Start
//!
//! ```no_run
//! use llm_augmenter::{Augmenter, RunConfig};
//! use llm_augmenter::dataset::{JsonFileSource, JsonFileSink};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RunConfig::from_json(r#"{
//!         "inputCollectionId": "items.json",
//!         "providerApiKey": "sk-...",
//!         "prompt": "Summarize ${title}: ${body}",
//!         "model": "gpt-4o-mini",
//!         "structuredOutput": false
//!     }"#)?;
//!
//!     let source = JsonFileSource::new(&config.input_collection_id);
//!     let mut sink = JsonFileSink::create("augmented.jsonl")?;
//!
//!     let summary = Augmenter::new(config)?.run(&source, &mut sink).await?;
//!     println!("processed {} items, skipped {}", summary.processed, summary.skipped);
//!     Ok(())
//! }
//! ```
//!
//! ## Testing without a live backend
//!
//! [`provider::MockProvider`] returns canned responses and records prompts;
//! inject it through [`ProviderGateway::with_provider`].

pub mod columns;
pub mod config;
pub mod dataset;
pub mod error;
pub mod gateway;
pub mod pipeline;
pub mod preprocess;
pub mod provider;
pub mod retry;
pub mod template;

pub use columns::{parse_columns, ColumnsParseError, ParsedColumns};
pub use config::RunConfig;
pub use dataset::{Item, ItemSink, ItemSource};
pub use error::{AugmentError, Result};
pub use gateway::ProviderGateway;
pub use pipeline::{Augmenter, RunSummary, LLM_RESPONSE_FIELD};
pub use preprocess::Preprocessor;
pub use provider::{CompletionRequest, Provider, ProviderKind};
pub use retry::ColumnsOutcome;
