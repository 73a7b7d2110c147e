use serde::Serialize;

use crate::agents::CompletionClient;
use crate::pipeline::json;
use crate::pipeline::reply::{string_field, string_list};

pub const NO_HISTORY: &str = "No history.";
pub const BRIEFING_FAILED: &str = "Failed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionBriefing {
    pub title: String,
    pub key_findings: Vec<String>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BriefingResult {
    Briefing(SessionBriefing),
    Error { error: String },
}

impl BriefingResult {
    pub fn error(message: impl Into<String>) -> Self {
        BriefingResult::Error {
            error: message.into(),
        }
    }

    #[must_use]
    pub fn failed() -> Self {
        Self::error(BRIEFING_FAILED)
    }
}

fn briefing_prompt(transcript: &str) -> String {
    format!(
        "You are a board member. Summarize this conversation history for an executive briefing:\n\
{transcript}\n\
\n\
Return JSON: {{ \"title\": \"Executive Briefing\", \"key_findings\": [], \"suggestions\": [] }}"
    )
}

/// Asks the model for a `{title, key_findings, suggestions}` briefing
pub async fn generate(
    completion: &dyn CompletionClient,
    model: &str,
    transcript: &str,
) -> BriefingResult {
    let raw = match completion.complete(&briefing_prompt(transcript), model).await {
        Ok(raw) => raw,
        Err(error) => {
            tracing::error!(%error, "briefing completion failed");
            return BriefingResult::failed();
        }
    };

    let Some(object) = json::recover(&raw) else {
        tracing::warn!("briefing reply had no JSON object");
        return BriefingResult::failed();
    };

    BriefingResult::Briefing(SessionBriefing {
        title: string_field(&object, "title"),
        key_findings: string_list(&object, "key_findings"),
        suggestions: string_list(&object, "suggestions"),
    })
}
