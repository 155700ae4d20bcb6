//! Mock provider for testing without a live backend.
//!
//! [`MockProvider`] returns pre-configured responses in order and records
//! every prompt it receives, allowing downstream consumers to write
//! deterministic tests against this crate.
//!
//! # Example
//!
//! ```
//! use llm_augmenter::provider::MockProvider;
//!
//! let mock = MockProvider::new(vec!["Hello, world!".to_string()]);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Client;

use super::{CompletionRequest, Provider};
use crate::error::Result;

/// A test provider that returns canned responses in order.
///
/// Cycles back to the beginning when all responses have been consumed.
/// Prompts are recorded so tests can assert what was sent and how often.
#[derive(Debug)]
pub struct MockProvider {
    responses: Vec<String>,
    index: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockProvider {
    /// Create a mock with the given canned responses.
    ///
    /// Responses are returned in order. When exhausted, cycles from the beginning.
    pub fn new(responses: Vec<String>) -> Self {
        assert!(
            !responses.is_empty(),
            "MockProvider requires at least one response"
        );
        Self {
            responses,
            index: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that always returns the same response.
    pub fn fixed(response: impl Into<String>) -> Self {
        Self::new(vec![response.into()])
    }

    /// Number of calls received so far.
    pub fn calls(&self) -> usize {
        self.index.load(Ordering::Relaxed)
    }

    /// Every prompt received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("mock prompts lock").clone()
    }

    fn next_response(&self) -> String {
        let idx = self.index.fetch_add(1, Ordering::Relaxed) % self.responses.len();
        self.responses[idx].clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn call(&self, _client: &Client, request: &CompletionRequest) -> Result<String> {
        self.prompts
            .lock()
            .expect("mock prompts lock")
            .push(request.prompt.clone());
        Ok(self.next_response())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
