//! Locates and parses a single JSON object in free-form model output.
//!
//! Models wrap JSON in markdown fences, prepend chatter ("Sure! Here is...")
//! or append explanations. The extractor tries, in order:
//!
//! 1. the trimmed text, reduced to the first fenced block if a fence exists
//! 2. a direct parse of that text
//! 3. the greedy span from its first `{` to its last `}`
//!
//! Extraction is pure: no I/O, no model calls.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::core::JsonObject;
use crate::errors::ExtractError;

/// Default number of characters of raw output kept on failure.
pub const DEFAULT_DIAGNOSTIC_CHARS: usize = 500;

const FENCE: &str = "```";

// Opening fence, optional language tag, then the shortest body up to the next fence.
static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_+.-]*[ \t]*\r?\n?(.*?)```").expect("fence pattern is valid")
});

static UNCLOSED_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_+.-]*[ \t]*\r?\n?(.*)").expect("fence pattern is valid")
});

/// Configurable JSON extractor.
#[derive(Debug, Clone, Copy)]
pub struct JsonExtractor {
    diagnostic_chars: usize,
}

impl Default for JsonExtractor {
    fn default() -> Self {
        Self {
            diagnostic_chars: DEFAULT_DIAGNOSTIC_CHARS,
        }
    }
}

impl JsonExtractor {
    /// Creates an extractor keeping `diagnostic_chars` of raw text on failure.
    #[must_use]
    pub fn new(diagnostic_chars: usize) -> Self {
        Self { diagnostic_chars }
    }

    /// Characters of raw text kept on failure.
    #[must_use]
    pub fn diagnostic_chars(&self) -> usize {
        self.diagnostic_chars
    }

    /// Extracts the JSON object from `text`.
    pub fn extract(&self, text: &str) -> Result<JsonObject, ExtractError> {
        let candidate = strip_fences(text.trim());

        let direct_error = match parse_object(candidate) {
            Ok(object) => return Ok(object),
            Err(reason) => reason,
        };

        let reason = match brace_span(candidate) {
            Some(span) => match parse_object(span) {
                Ok(object) => return Ok(object),
                Err(reason) => reason,
            },
            None if candidate.is_empty() => "empty output".to_string(),
            None => format!("no JSON object found ({direct_error})"),
        };

        Err(ExtractError::malformed(
            reason,
            truncate_chars(text, self.diagnostic_chars),
        ))
    }
}

/// Extracts the JSON object from `text` with the default settings.
pub fn extract_json_object(text: &str) -> Result<JsonObject, ExtractError> {
    JsonExtractor::default().extract(text)
}

/// Reduces `text` to the body of its first fenced block.
///
/// Text without a fence is returned unchanged. An opening fence with no
/// closing fence yields everything after it.
#[must_use]
pub fn strip_fences(text: &str) -> &str {
    if !text.contains(FENCE) {
        return text;
    }
    FENCED_BLOCK
        .captures(text)
        .or_else(|| UNCLOSED_FENCE.captures(text))
        .and_then(|caps| caps.get(1))
        .map_or(text, |body| body.as_str().trim())
}

/// The greedy span from the first `{` to the last `}`.
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn parse_object(candidate: &str) -> Result<JsonObject, String> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(other) => Err(format!("expected a JSON object, found {}", value_kind(&other))),
        Err(err) => Err(err.to_string()),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Truncates to at most `max_chars` characters, never splitting a char.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn obj(value: Value) -> JsonObject {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_tagged_fence_after_prose() {
        let text = "Sure! ```json\n{\"a\": 1}\n```";
        assert_eq!(extract_json_object(text).unwrap(), obj(json!({"a": 1})));
    }

    #[test]
    fn test_no_json_is_malformed() {
        let err = extract_json_object("no json here").unwrap_err();
        assert!(matches!(err, ExtractError::MalformedOutput { .. }));
        assert_eq!(err.raw(), "no json here");
    }

    #[test]
    fn test_plain_object() {
        let text = "  {\"screen_type\": \"login\", \"components\": []}\n";
        let object = extract_json_object(text).unwrap();
        assert_eq!(object["screen_type"], "login");
    }

    #[test]
    fn test_untagged_fence() {
        let text = "```\n{\"score\": 7.5}\n```";
        assert_eq!(extract_json_object(text).unwrap(), obj(json!({"score": 7.5})));
    }

    #[test]
    fn test_fence_without_newline() {
        let text = "```json{\"a\": true}```";
        assert_eq!(extract_json_object(text).unwrap(), obj(json!({"a": true})));
    }

    #[test]
    fn test_unclosed_fence() {
        let text = "```json\n{\"a\": [1, 2]}";
        assert_eq!(extract_json_object(text).unwrap(), obj(json!({"a": [1, 2]})));
    }

    #[test]
    fn test_only_first_fenced_block_is_used() {
        let text = "```json\n{\"first\": 1}\n```\nand also\n```json\n{\"second\": 2}\n```";
        assert_eq!(extract_json_object(text).unwrap(), obj(json!({"first": 1})));
    }

    #[test]
    fn test_surrounding_prose_uses_brace_span() {
        let text = "Here is the evaluation: {\"violations\": [{\"id\": 1}]} Hope this helps!";
        let object = extract_json_object(text).unwrap();
        assert_eq!(object, obj(json!({"violations": [{"id": 1}]})));
    }

    #[test]
    fn test_nested_braces_inside_strings() {
        let text = "Result:\n{\"css\": \"a { color: red }\", \"n\": {\"x\": 1}}\nDone.";
        let object = extract_json_object(text).unwrap();
        assert_eq!(object["css"], "a { color: red }");
        assert_eq!(object["n"]["x"], 1);
    }

    #[test]
    fn test_array_is_rejected() {
        let err = extract_json_object("[1, 2, 3]").unwrap_err();
        assert!(err.to_string().contains("no JSON object"));
    }

    #[test]
    fn test_unbalanced_braces_fail() {
        assert!(extract_json_object("} backwards {").is_err());
        assert!(extract_json_object("{\"a\": 1").is_err());
    }

    #[test]
    fn test_empty_output() {
        let err = extract_json_object("   ").unwrap_err();
        assert!(err.to_string().contains("empty output"));
    }

    #[test]
    fn test_raw_is_truncated() {
        let text = "x".repeat(2_000);
        let err = JsonExtractor::new(10).extract(&text).unwrap_err();
        assert_eq!(err.raw(), "xxxxxxxxxx...");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll...");
        assert_eq!(truncate_chars("short", 10), "short");
    }

    #[test]
    fn test_strip_fences_passthrough() {
        assert_eq!(strip_fences("{\"a\":1}"), "{\"a\":1}");
    }
}
