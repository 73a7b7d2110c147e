use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pipeline::json::JsonObject;

pub const DEFAULT_NAME: &str = "Unknown";

/// One chart point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDatum {
    pub name: String,
    pub value: f64,
}

impl Default for ChartDatum {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            value: 0.0,
        }
    }
}

/// How a single record field contributes to a datum, in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Key is literally `name`
    LiteralName,
    /// Key is literally `value`
    LiteralValue,
    /// JSON number, or a string of only digits, `.` and `%`
    NumericLike,
    /// Any other string; a candidate label
    FallbackName,
}

/// Picks the rule that applies to one field, or `None` if the field is ignored
#[must_use]
pub fn classify(key: &str, value: &Value) -> Option<FieldRule> {
    if key == "name" {
        return Some(FieldRule::LiteralName);
    }
    if key == "value" {
        return Some(FieldRule::LiteralValue);
    }
    match value {
        Value::Number(_) => Some(FieldRule::NumericLike),
        Value::String(text) if is_numeric_like(text) => Some(FieldRule::NumericLike),
        Value::String(_) => Some(FieldRule::FallbackName),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Digits, dots and percent signs only, with at least one digit.
/// `"$1,000"` and `"-5"` are deliberately not numeric-like.
#[must_use]
pub fn is_numeric_like(text: &str) -> bool {
    !text.is_empty()
        && text.chars().any(|character| character.is_ascii_digit())
        && text
            .chars()
            .all(|character| character.is_ascii_digit() || character == '.' || character == '%')
}

/// Reshapes `obj.data` into `{name, value}` records. Objects without a
/// `data` key are returned untouched.
#[must_use]
pub fn normalize(mut object: JsonObject) -> JsonObject {
    let Some(data) = object.get("data") else {
        return object;
    };

    let records: Vec<Value> = match data {
        Value::Array(items) => items
            .iter()
            .map(normalize_record)
            .filter_map(|datum| serde_json::to_value(datum).ok())
            .collect(),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) | Value::Object(_) => {
            Vec::new()
        }
    };

    object.insert("data".to_string(), Value::Array(records));
    object
}

/// Builds one datum by scanning the record's fields in order
#[must_use]
pub fn normalize_record(record: &Value) -> ChartDatum {
    let mut datum = ChartDatum::default();
    let Some(fields) = record.as_object() else {
        return datum;
    };

    let mut name_locked = false;
    let mut value_locked = false;

    for (key, value) in fields {
        let Some(rule) = classify(key, value) else {
            continue;
        };
        match rule {
            FieldRule::LiteralName => {
                datum.name = stringify(value);
                name_locked = true;
            }
            FieldRule::LiteralValue => {
                if let Some(parsed) = parse_literal_value(value) {
                    datum.value = parsed;
                    value_locked = true;
                }
            }
            FieldRule::NumericLike => {
                if !value_locked && let Some(parsed) = parse_numeric_like(value) {
                    datum.value = parsed;
                }
            }
            FieldRule::FallbackName => {
                if !name_locked
                    && datum.name == DEFAULT_NAME
                    && let Value::String(text) = value
                {
                    datum.name = text.clone();
                }
            }
        }
    }

    datum
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => {
            value.to_string()
        }
    }
}

fn parse_literal_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }
    .filter(|parsed| parsed.is_finite())
}

fn parse_numeric_like(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.replace('%', "").parse::<f64>().ok(),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }
    .filter(|parsed| parsed.is_finite())
}
