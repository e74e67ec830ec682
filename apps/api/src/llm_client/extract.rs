//! Structured extraction: recovers a JSON value from free-form model output.
//!
//! Layers, first success wins:
//! 1. the whole trimmed text
//! 2. the first ```json fenced block, else the first fenced block of any kind
//! 3. the span from the first opening bracket to the last closing bracket of the same kind
//!
//! Total over every input: nothing here panics or returns an error.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

/// Returns the recovered JSON value, or `fallback` unchanged when every layer fails.
pub fn extract_json(text: &str, fallback: Value) -> Value {
    try_extract_json(text).unwrap_or(fallback)
}

/// Same layers as [`extract_json`], reporting failure as `None`.
pub fn try_extract_json(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(text.trim()) {
        return Some(value);
    }

    if let Some(block) = fenced_block(text) {
        if let Ok(value) = serde_json::from_str::<Value>(block.trim()) {
            return Some(value);
        }
    }

    bracket_span(text)
}

fn json_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```json\s*(.*?)(?:```|\z)").expect("valid regex"))
}

fn any_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Optional language tag on the opening fence is skipped.
    RE.get_or_init(|| {
        Regex::new(r"(?s)```[A-Za-z0-9_+-]*[ \t]*\r?\n?(.*?)(?:```|\z)").expect("valid regex")
    })
}

/// Interior of the first ```json block, or of the first fenced block of any kind.
fn fenced_block(text: &str) -> Option<&str> {
    let re = if text.contains("```json") {
        json_fence()
    } else if text.contains("```") {
        any_fence()
    } else {
        return None;
    };
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Greedy bracket span: first `{` to last `}`, first `[` to last `]`.
/// The kind that opens earlier in the text is tried first.
fn bracket_span(text: &str) -> Option<Value> {
    let mut candidates: Vec<(usize, usize)> = [('{', '}'), ('[', ']')]
        .iter()
        .filter_map(|&(open, close)| {
            let start = text.find(open)?;
            let end = text.rfind(close)?;
            (end > start).then_some((start, end))
        })
        .collect();
    candidates.sort_by_key(|&(start, _)| start);

    candidates
        .into_iter()
        .find_map(|(start, end)| serde_json::from_str::<Value>(&text[start..=end]).ok())
}
