//! Prompt templating over dataset items.
//!
//! Templates reference item fields with `${dotted.path}` placeholders
//! (the `${...}` convention; nested fields are reached with dots, e.g.
//! `${product.title}`). [`substitute`] renders a template against an item,
//! [`has_empty_fields`] drives the skip-if-empty rule, and
//! [`build_final_prompt`] appends the fixed structured-output instruction
//! when the run asks for multiple columns.

use crate::dataset::Item;
use serde_json::Value;

/// Instruction appended to every prompt in structured-output mode.
///
/// Kept as a single constant so pre-flight validation and per-item retries
/// build byte-identical prompts for the same template and item.
pub const JSON_MODE_SUFFIX: &str = "\n\nImportant: Return only a strict JSON object with the requested fields as keys. No extra text or explanations, no markdown, just JSON.";

/// Extract every `${...}` field path referenced by a template, in order.
///
/// Paths are trimmed; an unterminated `${` is ignored.
///
/// # Example
///
/// ```
/// use llm_augmenter::template::placeholders;
///
/// let paths = placeholders("Rate ${product.title} sold for ${ price }");
/// assert_eq!(paths, vec!["product.title", "price"]);
/// ```
pub fn placeholders(template: &str) -> Vec<String> {
    let mut paths = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                paths.push(after[..end].trim().to_string());
                rest = &after[end + 1..];
            }
            None => break,
        }
    }
    paths
}

/// Resolve a dotted field path against an item.
///
/// Traverses nested objects left to right and short-circuits to `None` when
/// a segment is missing or the current value is not an object.
pub fn resolve<'a>(item: &'a Item, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = item.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Emptiness test for resolved field values.
///
/// Null, blank-after-trim strings, empty arrays, and empty objects are
/// empty. Everything else — including `0` and `false` — is not.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// True when any placeholder referenced by the template resolves to an
/// empty value on the item. Missing paths count as empty.
pub fn has_empty_fields(template: &str, item: &Item) -> bool {
    placeholders(template)
        .iter()
        .any(|path| resolve(item, path).map_or(true, is_empty))
}

/// Render a template against an item.
///
/// Every placeholder is replaced with the display form of its resolved
/// value: strings verbatim, anything else in its JSON form. Unresolved
/// paths render as empty text.
///
/// # Example
///
/// ```
/// use llm_augmenter::template::substitute;
/// use serde_json::json;
///
/// let item = json!({"title": "Widget", "specs": {"weight": 3}})
///     .as_object().unwrap().clone();
/// let prompt = substitute("Describe ${title} (${specs.weight} kg)", &item);
/// assert_eq!(prompt, "Describe Widget (3 kg)");
/// ```
pub fn substitute(template: &str, item: &Item) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        rendered.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let path = after[..end].trim();
                if let Some(value) = resolve(item, path) {
                    rendered.push_str(&display_value(value));
                }
                rest = &after[end + 1..];
            }
            None => {
                // Unterminated placeholder: emit the tail verbatim.
                rendered.push_str(&rest[start..]);
                return rendered;
            }
        }
    }
    rendered.push_str(rest);
    rendered
}

/// Append the structured-output instruction when multiple columns are
/// requested; pass the rendered prompt through unchanged otherwise.
pub fn build_final_prompt(rendered: String, structured_output: bool) -> String {
    if !structured_output {
        return rendered;
    }
    let mut prompt = rendered;
    prompt.push_str(JSON_MODE_SUFFIX);
    prompt
}

/// String form of a resolved value for substitution.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
