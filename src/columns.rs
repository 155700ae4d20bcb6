//! Structured-column parsing for provider responses.
//!
//! In structured-output mode the model is asked for a single JSON object
//! whose keys become output columns. [`parse_columns`] is the strict gate:
//! the response must be valid JSON *and* a top-level object. Failures are
//! plain values consumed by the retry loops in [`crate::retry`] — they never
//! abort the run on their own.

use serde_json::{Map, Value};
use thiserror::Error;

/// Column set parsed from a structured response.
pub type ParsedColumns = Map<String, Value>;

/// Why a response could not be interpreted as columns.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ColumnsParseError {
    /// The response is not valid JSON at all.
    #[error("response is not valid JSON: {reason} (response: {snippet})")]
    InvalidJson {
        /// The serde error message.
        reason: String,
        /// A truncated copy of the offending response.
        snippet: String,
    },

    /// The response is valid JSON but not an object (e.g. a bare number or
    /// array), so there are no fields to merge.
    #[error("response is valid JSON but not an object (response: {snippet})")]
    NotAnObject {
        /// A truncated copy of the offending response.
        snippet: String,
    },
}

/// Parse a provider response as a set of structured columns.
///
/// # Example
///
/// ```
/// use llm_augmenter::columns::parse_columns;
///
/// let cols = parse_columns(r#"{"sentiment": "positive", "score": 4}"#).unwrap();
/// assert_eq!(cols["score"], 4);
/// assert!(parse_columns("not json").is_err());
/// assert!(parse_columns("[1, 2]").is_err());
/// ```
pub fn parse_columns(response: &str) -> Result<ParsedColumns, ColumnsParseError> {
    match serde_json::from_str::<Value>(response) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ColumnsParseError::NotAnObject {
            snippet: truncate(response, 200),
        }),
        Err(e) => Err(ColumnsParseError::InvalidJson {
            reason: e.to_string(),
            snippet: truncate(response, 200),
        }),
    }
}

/// Merge parsed columns into an item.
///
/// Every input field survives unless a column shares its name, in which
/// case the column wins.
pub fn merge(item: &Map<String, Value>, columns: &ParsedColumns) -> Map<String, Value> {
    let mut merged = item.clone();
    for (key, value) in columns {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Truncate a string to at most `max_len` characters, appending "..." if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_columns_object() {
        let cols = parse_columns(r#"{"a": 1, "b": "x"}"#).unwrap();
        assert_eq!(cols["a"], 1);
        assert_eq!(cols["b"], "x");
    }

    #[test]
    fn test_parse_columns_invalid_json() {
        let err = parse_columns("Sure! Here is the JSON you asked for").unwrap_err();
        assert!(matches!(err, ColumnsParseError::InvalidJson { .. }));
    }

    #[test]
    fn test_parse_columns_bare_number_rejected() {
        let err = parse_columns("42").unwrap_err();
        assert!(matches!(err, ColumnsParseError::NotAnObject { .. }));
    }

    #[test]
    fn test_parse_columns_array_rejected() {
        let err = parse_columns(r#"[{"a": 1}]"#).unwrap_err();
        assert!(matches!(err, ColumnsParseError::NotAnObject { .. }));
    }

    #[test]
    fn test_merge_keeps_originals_and_overwrites_dupes() {
        let item = json!({"id": 7, "title": "old"}).as_object().unwrap().clone();
        let cols = json!({"title": "new", "score": 0.9})
            .as_object()
            .unwrap()
            .clone();
        let merged = merge(&item, &cols);
        assert_eq!(merged["id"], 7);
        assert_eq!(merged["title"], "new");
        assert_eq!(merged["score"], 0.9);
    }

    #[test]
    fn test_truncate_snippet() {
        let long = "x".repeat(500);
        let err = parse_columns(&long).unwrap_err();
        if let ColumnsParseError::InvalidJson { snippet, .. } = err {
            assert!(snippet.len() <= 203);
            assert!(snippet.ends_with("..."));
        } else {
            panic!("expected InvalidJson");
        }
    }
}
