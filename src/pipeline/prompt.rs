use crate::config::ModelsConfig;
use crate::pipeline::context::ConversationContext;

/// Which prompt/model pair a request runs with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    /// Short answer, `{summary, title}` only
    Fast,
    /// Full chart schema
    Chart,
}

impl PromptMode {
    #[must_use]
    pub fn for_request(wants_chart: bool) -> Self {
        if wants_chart {
            PromptMode::Chart
        } else {
            PromptMode::Fast
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPlan {
    pub mode: PromptMode,
    pub prompt: String,
    pub model: String,
}

/// Picks the template and model. Pure: same inputs, same plan.
#[must_use]
pub fn select(
    wants_chart: bool,
    context: &ConversationContext,
    query: &str,
    models: &ModelsConfig,
) -> PromptPlan {
    let mode = PromptMode::for_request(wants_chart);
    let history = context.history_text();
    match mode {
        PromptMode::Fast => PromptPlan {
            mode,
            prompt: fast_prompt(&history, context, query),
            model: models.fast.clone(),
        },
        PromptMode::Chart => PromptPlan {
            mode,
            prompt: chart_prompt(&history, context, query),
            model: models.logic.clone(),
        },
    }
}

fn fast_prompt(history: &str, context: &ConversationContext, query: &str) -> String {
    format!(
        "You are a world-class market analyst.\n\
\n\
[HISTORY] {history}\n\
[DATA] {data}\n\
[EXTERNAL MARKET INFO] {search}\n\
[QUERY] \"{query}\"\n\
\n\
Instructions:\n\
1. Answer the question using the history, the data and the external info.\n\
2. Keep the conversation flowing naturally.\n\
3. Be concise: at most 4 sentences.\n\
4. Respond with a JSON object containing only the keys \"summary\" and \"title\".\n\
\n\
Return JSON only: {{ \"summary\": \"Your answer...\", \"title\": \"Market Insight\" }}",
        data = context.tabular_preview,
        search = context.search_snippets,
    )
}

fn chart_prompt(history: &str, context: &ConversationContext, query: &str) -> String {
    format!(
        "You are a senior corporate strategist.\n\
\n\
[HISTORY] {history}\n\
[DATA] {data}\n\
[EXTERNAL INFO] {search}\n\
[QUERY] \"{query}\"\n\
\n\
Instructions:\n\
1. Analyze the data, the history and the external info.\n\
2. Infer the unit of the data (for example \"$\", \"₹\", \"%\", \"Users\", \"kg\").\n\
3. Write exactly 3 \"killer\" follow-up questions.\n\
4. Return valid JSON in this format:\n\
{{\n\
  \"chart_type\": \"bar\" | \"line\" | \"pie\",\n\
  \"title\": \"Strategic Visual\",\n\
  \"unit\": \"$\" | \"₹\" | \"€\" | \"%\" | \"\" | \"Qty\",\n\
  \"summary\": \"Executive summary...\",\n\
  \"data\": [ {{\"name\": \"Label\", \"value\": 100}} ],\n\
  \"suggestions\": [\"Strategy question?\", \"Market question?\", \"Trick?\"]\n\
}}",
        data = context.tabular_preview,
        search = context.search_snippets,
    )
}
