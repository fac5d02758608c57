//! Token accounting for canned responses.
//!
//! The mock never tokenizes for real: a "token" is a whitespace-delimited
//! word. That keeps usage numbers deterministic and trivially predictable
//! from the request, which is the whole point for client tests.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Count whitespace-delimited tokens in `text`.
///
/// Leading, trailing, and repeated whitespace contribute nothing; the empty
/// string counts as zero.
pub fn count_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Usage summary attached to completion-style responses.
///
/// `completion_tokens` is absent for endpoints that only consume input
/// (embeddings), in which case `total_tokens == prompt_tokens`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<usize>,
    pub total_tokens: usize,
}

impl Usage {
    /// Usage for a prompt/completion pair.
    pub fn compute(prompt: &str, completion: &str) -> Self {
        let prompt_tokens = count_tokens(prompt);
        let completion_tokens = count_tokens(completion);
        Self {
            prompt_tokens,
            completion_tokens: Some(completion_tokens),
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    /// Usage for input-only endpoints: no completion side at all.
    pub fn prompt_only(prompt: &str) -> Self {
        let prompt_tokens = count_tokens(prompt);
        Self {
            prompt_tokens,
            completion_tokens: None,
            total_tokens: prompt_tokens,
        }
    }
}

/// A request text field that clients send as a string, a list, or garbage.
///
/// The OpenAI API accepts `prompt` and `input` as either a single string or
/// an array; real clients also omit fields or send the wrong type. Rather
/// than ad hoc type sniffing in each handler, the shapes are one untagged
/// enum with total conversions — malformed input degrades to the empty
/// string instead of an error, so client tests are never blocked.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TextField {
    Text(String),
    Items(Vec<Value>),
    Other(Value),
}

impl Default for TextField {
    fn default() -> Self {
        TextField::Text(String::new())
    }
}

impl TextField {
    /// Join string elements with a single space, dropping non-strings.
    ///
    /// Used for `prompt` and chat message `content`.
    pub fn joined_strings(&self) -> String {
        match self {
            TextField::Text(s) => s.clone(),
            TextField::Items(items) => items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(" "),
            TextField::Other(_) => String::new(),
        }
    }

    /// The text itself for string fields, `default` for anything else.
    ///
    /// Used for fields that must end up as one plain string, like `model`.
    pub fn text_or(&self, default: &str) -> String {
        match self {
            TextField::Text(s) => s.clone(),
            _ => default.to_string(),
        }
    }

    /// Join all elements with a single space, stringifying non-strings.
    ///
    /// Used for embeddings `input`, where numeric token arrays are legal.
    pub fn joined_lossy(&self) -> String {
        match self {
            TextField::Text(s) => s.clone(),
            TextField::Items(items) => items
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(" "),
            TextField::Other(_) => String::new(),
        }
    }
}

/// A boolean request flag that clients send as a bool, number, string, or
/// anything else.
///
/// Dynamic-language clients routinely send `"stream": 1` or `"stream":
/// "true"`; a strictly typed `bool` would reject the whole request. Any
/// JSON value deserializes, and the flag is set when the value is truthy:
/// `false`, `null`, `0`, and empty strings/arrays/objects are unset,
/// everything else is set.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(from = "Value")]
pub struct FlagField(bool);

impl FlagField {
    pub fn is_set(self) -> bool {
        self.0
    }
}

impl From<Value> for FlagField {
    fn from(value: Value) -> Self {
        let truthy = match value {
            Value::Null => false,
            Value::Bool(b) => b,
            Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
            Value::String(s) => !s.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Object(entries) => !entries.is_empty(),
        };
        FlagField(truthy)
    }
}
