use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pipeline::json::JsonObject;
use crate::pipeline::normalize::ChartDatum;
use crate::pipeline::prompt::PromptMode;

pub const DEGRADED_SUMMARY: &str =
    "Analysis complete, but I couldn't format the output. Please try again.";
pub const DEGRADED_TITLE: &str = "Error";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Bar,
    Line,
    Pie,
}

impl ChartType {
    /// Unknown or missing kinds fall back to a bar chart
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "line" => ChartType::Line,
            "pie" => ChartType::Pie,
            _ => ChartType::Bar,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryReply {
    pub summary: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartReply {
    pub chart_type: ChartType,
    pub title: String,
    pub unit: String,
    pub summary: String,
    pub data: Vec<ChartDatum>,
    pub suggestions: Vec<String>,
}

/// What the caller gets back. Untagged on the wire: the keys identify the
/// variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DecisionResult {
    Chart(ChartReply),
    Summary(SummaryReply),
    Error { error: String },
}

impl DecisionResult {
    pub fn error(message: impl Into<String>) -> Self {
        DecisionResult::Error {
            error: message.into(),
        }
    }

    /// Stable shape returned when no JSON could be recovered
    #[must_use]
    pub fn degraded() -> Self {
        DecisionResult::Summary(SummaryReply {
            summary: DEGRADED_SUMMARY.to_string(),
            title: DEGRADED_TITLE.to_string(),
        })
    }

    /// Shapes a recovered object into the variant for `mode`. Missing or
    /// mistyped fields become empty. Chart `data` must already be normalized;
    /// records not in `{name, value}` form are dropped.
    #[must_use]
    pub fn from_recovered(mode: PromptMode, object: &JsonObject) -> Self {
        match mode {
            PromptMode::Fast => DecisionResult::Summary(SummaryReply {
                summary: string_field(object, "summary"),
                title: string_field(object, "title"),
            }),
            PromptMode::Chart => DecisionResult::Chart(ChartReply {
                chart_type: ChartType::parse(&string_field(object, "chart_type")),
                title: string_field(object, "title"),
                unit: string_field(object, "unit"),
                summary: string_field(object, "summary"),
                data: object
                    .get("data")
                    .and_then(Value::as_array)
                    .map(|records| {
                        records
                            .iter()
                            .filter_map(|record| ChartDatum::deserialize(record).ok())
                            .collect()
                    })
                    .unwrap_or_default(),
                suggestions: string_list(object, "suggestions"),
            }),
        }
    }
}

/// Reads `key` as text; numbers and booleans are stringified, anything else
/// is empty
#[must_use]
pub fn string_field(object: &JsonObject, key: &str) -> String {
    object.get(key).map(value_text).unwrap_or_default()
}

#[must_use]
pub fn string_list(object: &JsonObject, key: &str) -> Vec<String> {
    object
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(value_text)
                .filter(|text| !text.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Plain text of a scalar value
#[must_use]
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}
