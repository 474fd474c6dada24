//! Template substitution
//!
//! Placeholders are `{{ name }}` or dotted `{{ a.b.c }}` lookups into a JSON
//! context. Array elements are addressed by index (`{{ routes.0.path }}`).
//! Unresolved names render as the empty string.

use crate::error::TemplateError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fmt::Debug;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z0-9_]+)*)\s*\}\}")
        .expect("placeholder pattern is valid")
});

static NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z0-9_]+)*$")
        .expect("name pattern is valid")
});

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Template substitution contract
pub trait TemplateEngine: Send + Sync + Debug {
    /// Render `text` against `context`
    ///
    /// # Errors
    /// Returns [`TemplateError::Invalid`] when `text` fails [`validate`](Self::validate).
    fn render(&self, text: &str, context: &Value) -> Result<String, TemplateError>;

    /// Problems with the template text; empty when valid
    fn validate(&self, text: &str) -> Vec<String>;

    /// Distinct placeholder names in order of first appearance
    fn extract_variable_names(&self, text: &str) -> Vec<String>;
}

/// `{{ }}` placeholder engine
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderEngine;

impl PlaceholderEngine {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TemplateEngine for PlaceholderEngine {
    fn render(&self, text: &str, context: &Value) -> Result<String, TemplateError> {
        let problems = self.validate(text);
        if !problems.is_empty() {
            return Err(TemplateError::Invalid(problems));
        }

        let rendered = PLACEHOLDER.replace_all(text, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            match lookup(context, name) {
                Some(value) => display(value),
                None => {
                    tracing::debug!(name, "unresolved template variable");
                    String::new()
                }
            }
        });
        Ok(rendered.into_owned())
    }

    fn validate(&self, text: &str) -> Vec<String> {
        let mut problems = Vec::new();
        let mut cursor = 0;

        while cursor < text.len() {
            let rest = &text[cursor..];
            let next_open = rest.find(OPEN);
            let next_close = rest.find(CLOSE);

            match (next_open, next_close) {
                (None, None) => break,
                (None, Some(close)) => {
                    problems.push(format!("Unmatched closing delimiter at offset {}", cursor + close));
                    cursor += close + CLOSE.len();
                }
                (Some(open), Some(close)) if close < open => {
                    problems.push(format!("Unmatched closing delimiter at offset {}", cursor + close));
                    cursor += close + CLOSE.len();
                }
                (Some(open), _) => {
                    let start = cursor + open;
                    let body_start = start + OPEN.len();
                    let Some(len) = text[body_start..].find(CLOSE) else {
                        problems.push(format!("Unclosed placeholder at offset {start}"));
                        break;
                    };
                    let body = &text[body_start..body_start + len];
                    if body.contains(OPEN) {
                        problems.push(format!("Nested placeholder at offset {start}"));
                    } else if body.trim().is_empty() {
                        problems.push(format!("Empty placeholder at offset {start}"));
                    } else if !NAME.is_match(body.trim()) {
                        problems.push(format!("Invalid placeholder \"{}\" at offset {start}", body.trim()));
                    }
                    cursor = body_start + len + CLOSE.len();
                }
            }
        }
        problems
    }

    fn extract_variable_names(&self, text: &str) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for caps in PLACEHOLDER.captures_iter(text) {
            let name = &caps[1];
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }
}

fn lookup<'a>(context: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(context, |value, key| match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
