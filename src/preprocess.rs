//! Optional per-item preprocessing before templating.
//!
//! The hook is a restricted, side-effect-free statement evaluator: its only
//! input is the item and its only output is a replacement item. There is no
//! access to configuration, network, or filesystem from inside a program.
//!
//! One statement per line (or separated with `;`); `#` starts a comment:
//!
//! ```text
//! # normalize the title before it reaches the prompt
//! trim title
//! lowercase title
//! set label = ${category.name} / ${title}
//! copy seller.name -> seller_name
//! rename desc -> description
//! default language = en
//! drop internal_notes
//! ```
//!
//! Compilation happens once at startup and a bad program is fatal. A
//! statement that fails on a single item (say, `trim` on a number) is not:
//! the failure is logged and that item passes through unmodified.

use crate::dataset::Item;
use crate::error::{AugmentError, Result};
use crate::template;
use serde_json::Value;

/// A compiled preprocessing statement.
#[derive(Debug, Clone, PartialEq)]
enum Op {
    /// `set <field> = <template>` — render a template against the item and
    /// assign the string to a top-level field.
    Set { field: String, template: String },
    /// `copy <path> -> <field>` — copy a resolved value verbatim.
    Copy { path: String, field: String },
    /// `rename <field> -> <field>`
    Rename { from: String, to: String },
    /// `drop <field>`
    Drop { field: String },
    /// `default <field> = <text>` — assign only when the field is empty.
    Default { field: String, value: String },
    /// `trim <field>`
    Trim { field: String },
    /// `lowercase <field>`
    Lowercase { field: String },
    /// `uppercase <field>`
    Uppercase { field: String },
}

/// A per-item evaluation failure. Recovered by [`Preprocessor::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
struct EvalError(String);

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The compiled preprocessing hook. Default is the identity.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    ops: Vec<Op>,
}

impl Preprocessor {
    /// The identity hook: every item passes through untouched.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Compile a preprocessing program.
    ///
    /// `None` and blank sources compile to the identity. Any malformed
    /// statement is an [`AugmentError::Compile`] — fatal before the run
    /// starts processing items.
    pub fn compile(source: Option<&str>) -> Result<Self> {
        let source = match source {
            Some(s) if !s.trim().is_empty() => s,
            _ => return Ok(Self::identity()),
        };

        let mut ops = Vec::new();
        for statement in source.lines().flat_map(|line| line.split(';')) {
            let statement = statement.trim();
            if statement.is_empty() || statement.starts_with('#') {
                continue;
            }
            ops.push(parse_statement(statement)?);
        }
        Ok(Self { ops })
    }

    /// True when the hook does nothing.
    pub fn is_identity(&self) -> bool {
        self.ops.is_empty()
    }

    /// Run the program over an item.
    ///
    /// A failing statement is reported as a warning and the original item
    /// is returned unmodified — one bad record never aborts the run.
    pub fn apply(&self, item: &Item) -> Item {
        match self.try_apply(item) {
            Ok(processed) => processed,
            Err(e) => {
                tracing::warn!("preprocessing failed, passing item through unchanged: {}", e);
                item.clone()
            }
        }
    }

    fn try_apply(&self, item: &Item) -> std::result::Result<Item, EvalError> {
        let mut work = item.clone();
        for op in &self.ops {
            match op {
                Op::Set { field, template } => {
                    let rendered = template::substitute(template, &work);
                    work.insert(field.clone(), Value::String(rendered));
                }
                Op::Copy { path, field } => {
                    let value = template::resolve(&work, path).cloned().ok_or_else(|| {
                        EvalError(format!("copy source '{}' not found", path))
                    })?;
                    work.insert(field.clone(), value);
                }
                Op::Rename { from, to } => {
                    if let Some(value) = work.remove(from) {
                        work.insert(to.clone(), value);
                    }
                }
                Op::Drop { field } => {
                    work.remove(field);
                }
                Op::Default { field, value } => {
                    let missing = work.get(field).map_or(true, template::is_empty);
                    if missing {
                        work.insert(field.clone(), Value::String(value.clone()));
                    }
                }
                Op::Trim { field } => transform_string(&mut work, field, |s| s.trim().to_string())?,
                Op::Lowercase { field } => transform_string(&mut work, field, |s| s.to_lowercase())?,
                Op::Uppercase { field } => transform_string(&mut work, field, |s| s.to_uppercase())?,
            }
        }
        Ok(work)
    }
}

/// Apply a string transform in place; a non-string value is an evaluation
/// error, a missing field is a no-op.
fn transform_string(
    item: &mut Item,
    field: &str,
    f: impl Fn(&str) -> String,
) -> std::result::Result<(), EvalError> {
    match item.get_mut(field) {
        None => Ok(()),
        Some(Value::String(s)) => {
            *s = f(s);
            Ok(())
        }
        Some(other) => Err(EvalError(format!(
            "'{}' is not a string ({} given)",
            field,
            value_type(other)
        ))),
    }
}

fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn parse_statement(statement: &str) -> Result<Op> {
    let (directive, rest) = statement
        .split_once(char::is_whitespace)
        .ok_or_else(|| compile_error(statement, "missing argument"))?;

    match directive {
        "set" | "default" => {
            let (field, value) = rest
                .split_once('=')
                .ok_or_else(|| compile_error(statement, "expected '<field> = <value>'"))?;
            let field = field_name(field, statement)?;
            let value = value.trim().to_string();
            Ok(if directive == "set" {
                Op::Set {
                    field,
                    template: value,
                }
            } else {
                Op::Default { field, value }
            })
        }
        "copy" | "rename" => {
            let (from, to) = rest
                .split_once("->")
                .ok_or_else(|| compile_error(statement, "expected '<from> -> <to>'"))?;
            let to = field_name(to, statement)?;
            Ok(if directive == "copy" {
                Op::Copy {
                    path: field_name(from, statement)?,
                    field: to,
                }
            } else {
                Op::Rename {
                    from: field_name(from, statement)?,
                    to,
                }
            })
        }
        "drop" => Ok(Op::Drop {
            field: field_name(rest, statement)?,
        }),
        "trim" => Ok(Op::Trim {
            field: field_name(rest, statement)?,
        }),
        "lowercase" => Ok(Op::Lowercase {
            field: field_name(rest, statement)?,
        }),
        "uppercase" => Ok(Op::Uppercase {
            field: field_name(rest, statement)?,
        }),
        other => Err(compile_error(
            statement,
            &format!("unknown directive '{}'", other),
        )),
    }
}

fn field_name(raw: &str, statement: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(compile_error(statement, "expected a single field name"));
    }
    Ok(name.to_string())
}

fn compile_error(statement: &str, reason: &str) -> AugmentError {
    AugmentError::Compile(format!("{} in statement '{}'", reason, statement))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(value: serde_json::Value) -> Item {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_compile_blank_is_identity() {
        assert!(Preprocessor::compile(None).unwrap().is_identity());
        assert!(Preprocessor::compile(Some("  \n ")).unwrap().is_identity());
    }

    #[test]
    fn test_compile_comments_and_semicolons() {
        let p = Preprocessor::compile(Some("# a comment\ntrim a; drop b")).unwrap();
        assert_eq!(p.ops.len(), 2);
    }

    #[test]
    fn test_compile_unknown_directive_fails() {
        let err = Preprocessor::compile(Some("explode title")).unwrap_err();
        assert!(matches!(err, AugmentError::Compile(_)));
        assert!(err.to_string().contains("explode"));
    }

    #[test]
    fn test_compile_malformed_set_fails() {
        let err = Preprocessor::compile(Some("set title")).unwrap_err();
        assert!(matches!(err, AugmentError::Compile(_)));
    }

    #[test]
    fn test_compile_bad_field_name_fails() {
        let err = Preprocessor::compile(Some("drop two words")).unwrap_err();
        assert!(matches!(err, AugmentError::Compile(_)));
    }

    #[test]
    fn test_set_renders_template() {
        let p = Preprocessor::compile(Some("set label = ${kind}: ${name}")).unwrap();
        let out = p.apply(&item(json!({"kind": "book", "name": "Dune"})));
        assert_eq!(out["label"], "book: Dune");
    }

    #[test]
    fn test_copy_pulls_nested_value() {
        let p = Preprocessor::compile(Some("copy seller.name -> seller_name")).unwrap();
        let out = p.apply(&item(json!({"seller": {"name": "ACME", "id": 4}})));
        assert_eq!(out["seller_name"], "ACME");
        assert_eq!(out["seller"]["id"], 4);
    }

    #[test]
    fn test_rename_and_drop() {
        let p = Preprocessor::compile(Some("rename desc -> description\ndrop noise")).unwrap();
        let out = p.apply(&item(json!({"desc": "text", "noise": true})));
        assert_eq!(out["description"], "text");
        assert!(!out.contains_key("desc"));
        assert!(!out.contains_key("noise"));
    }

    #[test]
    fn test_default_only_fills_empty() {
        let p = Preprocessor::compile(Some("default lang = en")).unwrap();
        let filled = p.apply(&item(json!({"lang": ""})));
        assert_eq!(filled["lang"], "en");
        let kept = p.apply(&item(json!({"lang": "de"})));
        assert_eq!(kept["lang"], "de");
    }

    #[test]
    fn test_string_transforms() {
        let p = Preprocessor::compile(Some("trim title; lowercase title")).unwrap();
        let out = p.apply(&item(json!({"title": "  MiXeD  "})));
        assert_eq!(out["title"], "mixed");
    }

    #[test]
    fn test_transform_missing_field_is_noop() {
        let p = Preprocessor::compile(Some("trim title")).unwrap();
        let out = p.apply(&item(json!({"other": 1})));
        assert_eq!(out["other"], 1);
    }

    #[test]
    fn test_runtime_failure_returns_original() {
        let p = Preprocessor::compile(Some("drop extra; trim count")).unwrap();
        let input = item(json!({"count": 7, "extra": "x"}));
        let out = p.apply(&input);
        // trim on a number fails, so even the earlier drop is discarded
        assert_eq!(out, input);
    }

    #[test]
    fn test_copy_missing_source_returns_original() {
        let p = Preprocessor::compile(Some("copy a.b -> c")).unwrap();
        let input = item(json!({"a": 1}));
        assert_eq!(p.apply(&input), input);
    }
}
