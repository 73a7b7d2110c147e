use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

pub type JsonObject = Map<String, Value>;

static FENCED_JSON: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```json\s*(\{.*?\})\s*```").ok());

/// Pulls a JSON object out of free-form model output.
///
/// Tries, in order: a ```` ```json ```` fenced block, the span from the first
/// `{` to the last `}`, then the whole text. A stage that fails to parse (or
/// parses to something other than an object) falls through to the next.
#[must_use]
pub fn recover(raw_text: &str) -> Option<JsonObject> {
    if raw_text.is_empty() {
        return None;
    }

    fenced_block(raw_text)
        .and_then(parse_object)
        .or_else(|| extract_json_object(raw_text).and_then(parse_object))
        .or_else(|| parse_object(raw_text))
}

fn fenced_block(value: &str) -> Option<&str> {
    let regex = FENCED_JSON.as_ref()?;
    regex
        .captures(value)
        .and_then(|captures| captures.get(1))
        .map(|found| found.as_str())
}

/// Span from the first `{` to the last `}` inclusive
pub fn extract_json_object(value: &str) -> Option<&str> {
    let start = value.find('{')?;
    let end = value.rfind('}')?;
    if end <= start {
        return None;
    }
    value.get(start..=end)
}

fn parse_object(candidate: &str) -> Option<JsonObject> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(object)) => Some(object),
        Ok(_) | Err(_) => None,
    }
}
