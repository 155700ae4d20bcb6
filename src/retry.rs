//! Bounded retry loops that coerce free-form model output into columns.
//!
//! Two related but distinct loops share the same corrective instruction and
//! attempt budget:
//!
//! 1. [`preflight`] — run once before the items, against the first item's
//!    prompt, to prove the prompt can produce parseable JSON at all. Failing
//!    here aborts the run so the operator can fix the prompt instead of
//!    paying for a full pass of garbage.
//! 2. [`request_columns`] — the per-item loop. Exhausting the budget here
//!    degrades to [`ColumnsOutcome::Fallback`] with the last raw response;
//!    an item is never dropped.
//!
//! Parse failures are the only retried condition. A rejected provider call
//! or transport failure propagates immediately from both loops — malformed
//! output is transient, a broken backend within the same run is not.

use crate::columns::{parse_columns, ParsedColumns};
use crate::error::{AugmentError, Result};
use crate::gateway::ProviderGateway;
use crate::provider::CompletionRequest;

/// Total provider calls either loop may make for one prompt.
pub const MAX_ATTEMPTS: u32 = 3;

/// Instruction appended to a prompt after a failed parse.
///
/// Fixed text so retried prompts stay deterministic for a given attempt.
pub const CORRECTIVE_SUFFIX: &str =
    "\n\nThe last response was not valid JSON. Please return valid JSON this time.";

/// Outcome of the per-item structured loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnsOutcome {
    /// A response parsed as a JSON object; its fields become columns.
    Columns(ParsedColumns),
    /// Every attempt failed to parse; carry the last raw response instead.
    Fallback(String),
}

/// Validate that the configured prompt can produce parseable JSON.
///
/// Calls the provider up to [`MAX_ATTEMPTS`] times with the first item's
/// prompt. Corrections accumulate onto the prompt between attempts. A blank
/// response is [`AugmentError::EmptyResponse`] (fatal); exhausting the
/// attempts is [`AugmentError::Validation`] (fatal) — the operator should
/// disable structured output or revise the prompt.
pub async fn preflight(gateway: &ProviderGateway, request: &CompletionRequest) -> Result<()> {
    let mut prompt = request.prompt.clone();

    for attempt in 1..=MAX_ATTEMPTS {
        let response = gateway.call(&request.with_prompt(prompt.clone())).await?;

        if response.trim().is_empty() {
            tracing::error!("empty response received during structured output validation");
            return Err(AugmentError::EmptyResponse);
        }

        match parse_columns(&response) {
            Ok(_) => return Ok(()),
            Err(err) if attempt < MAX_ATTEMPTS => {
                tracing::warn!(attempt, "JSON validation attempt failed, retrying: {}", err);
                prompt.push_str(CORRECTIVE_SUFFIX);
            }
            Err(err) => {
                tracing::error!("JSON validation attempts exhausted: {}", err);
                return Err(AugmentError::Validation(format!(
                    "failed to produce valid JSON after {} attempts; \
                     adjust the prompt or disable structured output",
                    MAX_ATTEMPTS
                )));
            }
        }
    }

    Err(AugmentError::Validation(
        "validation loop exited unexpectedly".into(),
    ))
}

/// Drive the provider until a response parses as columns, or fall back.
///
/// The initial call uses the request as given. Each retry re-issues the
/// *original* prompt plus one corrective suffix — corrections are not
/// chained onto prior failed responses. After [`MAX_ATTEMPTS`] total calls
/// the last raw response is returned as [`ColumnsOutcome::Fallback`].
pub async fn request_columns(
    gateway: &ProviderGateway,
    request: &CompletionRequest,
) -> Result<ColumnsOutcome> {
    let mut last_response = gateway.call(request).await?;

    match parse_columns(&last_response) {
        Ok(columns) => return Ok(ColumnsOutcome::Columns(columns)),
        Err(err) => tracing::warn!("failed to parse columns, retrying: {}", err),
    }

    let retry_request = request.with_prompt(format!("{}{}", request.prompt, CORRECTIVE_SUFFIX));

    for attempt in 2..=MAX_ATTEMPTS {
        last_response = gateway.call(&retry_request).await?;

        match parse_columns(&last_response) {
            Ok(columns) => return Ok(ColumnsOutcome::Columns(columns)),
            Err(err) if attempt < MAX_ATTEMPTS => {
                tracing::warn!(attempt, "failed to parse columns, retrying: {}", err);
            }
            Err(err) => {
                tracing::error!(
                    "failed to parse columns after {} attempts, keeping raw response: {}",
                    MAX_ATTEMPTS,
                    err
                );
            }
        }
    }

    Ok(ColumnsOutcome::Fallback(last_response))
}
