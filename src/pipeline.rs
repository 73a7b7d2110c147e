pub mod briefing;
pub mod context;
pub mod json;
pub mod normalize;
pub mod prompt;
pub mod reply;
pub mod search;

use std::sync::Arc;

use crate::agents::CompletionClient;
use crate::config::ModelsConfig;
use crate::storage::HistoryStore;
use briefing::BriefingResult;
use context::ContextAssembler;
use json::JsonObject;
use prompt::PromptMode;
pub use reply::DecisionResult;

/// A question from the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionRequest {
    pub query: String,
    pub tabular_payload: Option<String>,
    pub wants_chart: bool,
}

impl DecisionRequest {
    pub fn new(query: impl Into<String>, tabular_payload: Option<String>, wants_chart: bool) -> Self {
        Self {
            query: query.into(),
            tabular_payload,
            wants_chart,
        }
    }
}

/// Steps a single request passes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    ContextBuilt,
    PromptSelected,
    CompletionRequested,
    Recovered,
    RecoveryFailed,
    Normalized,
    Persisted,
    PersistSkipped,
    Returned,
}

/// Result plus the stages that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionOutcome {
    pub result: DecisionResult,
    pub stages: Vec<Stage>,
}

impl DecisionOutcome {
    fn finish(result: DecisionResult, mut stages: Vec<Stage>) -> Self {
        stages.push(Stage::Returned);
        Self { result, stages }
    }
}

/// Query in, chart-ready answer out
#[derive(Clone)]
pub struct DecisionPipeline {
    assembler: ContextAssembler,
    completion: Arc<dyn CompletionClient>,
    history: HistoryStore,
    models: ModelsConfig,
}

impl DecisionPipeline {
    pub fn new(
        assembler: ContextAssembler,
        completion: Arc<dyn CompletionClient>,
        history: HistoryStore,
        models: ModelsConfig,
    ) -> Self {
        Self {
            assembler,
            completion,
            history,
            models,
        }
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub async fn decide(&self, request: &DecisionRequest) -> DecisionResult {
        let outcome = self.run(request).await;
        tracing::debug!(stages = ?outcome.stages, "decision finished");
        outcome.result
    }

    /// Runs one request to completion. Never fails: provider errors become
    /// [`DecisionResult::Error`] and unreadable replies the degraded summary.
    pub async fn run(&self, request: &DecisionRequest) -> DecisionOutcome {
        let mut stages = vec![Stage::Received];

        let context = self.assembler.assemble(request).await;
        stages.push(Stage::ContextBuilt);

        let plan = prompt::select(request.wants_chart, &context, &request.query, &self.models);
        stages.push(Stage::PromptSelected);
        tracing::info!(mode = ?plan.mode, model = %plan.model, "generating reply");

        stages.push(Stage::CompletionRequested);
        let raw = match self.completion.complete(&plan.prompt, &plan.model).await {
            Ok(raw) => raw,
            Err(error) => {
                tracing::error!(%error, "completion failed");
                return DecisionOutcome::finish(DecisionResult::error(error.to_string()), stages);
            }
        };

        let Some(mut recovered) = json::recover(&raw) else {
            tracing::warn!(reply_len = raw.len(), "no JSON object in model reply");
            stages.push(Stage::RecoveryFailed);
            return DecisionOutcome::finish(DecisionResult::degraded(), stages);
        };
        stages.push(Stage::Recovered);

        if plan.mode == PromptMode::Chart {
            recovered = normalize::normalize(recovered);
            stages.push(Stage::Normalized);
        }

        stages.push(self.persist(&request.query, &recovered).await);

        let result = DecisionResult::from_recovered(plan.mode, &recovered);
        DecisionOutcome::finish(result, stages)
    }

    async fn persist(&self, query: &str, recovered: &JsonObject) -> Stage {
        let Some(summary) = recovered.get("summary") else {
            return Stage::PersistSkipped;
        };

        match self
            .history
            .append_exchange(query, &reply::value_text(summary))
            .await
        {
            Ok(()) => Stage::Persisted,
            Err(error) => {
                tracing::warn!(%error, "could not save turn to history");
                Stage::PersistSkipped
            }
        }
    }

    /// Executive briefing over the full stored conversation
    pub async fn session_briefing(&self) -> BriefingResult {
        let turns = match self.history.all().await {
            Ok(turns) => turns,
            Err(error) => {
                tracing::warn!(%error, "could not read history for briefing");
                return BriefingResult::failed();
            }
        };
        if turns.is_empty() {
            return BriefingResult::error(briefing::NO_HISTORY);
        }

        let transcript = crate::storage::render_transcript(&turns);
        briefing::generate(self.completion.as_ref(), &self.models.logic, &transcript).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::normalize::ChartDatum;
    use crate::pipeline::reply::{ChartReply, ChartType, SummaryReply};
    use crate::pipeline::search::SearchGateway;
    use crate::storage::Role;
    use crate::testing::{FakeCompletion, FakeSearch};

    async fn pipeline_with(completion: Arc<FakeCompletion>) -> DecisionPipeline {
        let history = HistoryStore::in_memory().await.expect("store");
        let search = SearchGateway::new(Arc::new(FakeSearch::with_hits(&[("Brent", "up 3%")])));
        DecisionPipeline::new(
            ContextAssembler::new(history.clone(), search),
            completion,
            history,
            ModelsConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_fast_path_returns_summary_and_persists_exchange() {
        let completion = Arc::new(FakeCompletion::replying(
            "{\"summary\": \"Revenue grew 5%.\", \"title\": \"Growth\"}",
        ));
        let pipeline = pipeline_with(completion.clone()).await;

        let outcome = pipeline
            .run(&DecisionRequest::new("How did we do?", None, false))
            .await;
        assert_eq!(
            outcome.result,
            DecisionResult::Summary(SummaryReply {
                summary: "Revenue grew 5%.".to_string(),
                title: "Growth".to_string(),
            })
        );
        assert!(outcome.stages.contains(&Stage::Persisted));
        assert!(!outcome.stages.contains(&Stage::Normalized));

        let calls = completion.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls.first().map(|(_, model)| model.as_str()), Some("llama-3.1-8b-instant"));

        let turns = pipeline.history().all().await.expect("history");
        let stored: Vec<(Role, String)> = turns.into_iter().map(|turn| (turn.role, turn.content)).collect();
        assert_eq!(
            stored,
            vec![
                (Role::User, "How did we do?".to_string()),
                (Role::Ai, "Revenue grew 5%.".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_chart_path_normalizes_data() {
        let reply = "Here is the analysis:\n```json\n{\"chart_type\": \"line\", \"title\": \"Revenue\", \"unit\": \"$\", \"summary\": \"West leads.\", \"data\": [{\"Region\": \"West\", \"Revenue\": \"42.5%\"}, {\"name\": \"East\", \"value\": 10, \"extra\": \"note\"}], \"suggestions\": [\"a?\", \"b?\", \"c?\"]}\n```";
        let completion = Arc::new(FakeCompletion::replying(reply));
        let pipeline = pipeline_with(completion.clone()).await;

        let outcome = pipeline
            .run(&DecisionRequest::new("Plot revenue by region", None, true))
            .await;
        assert_eq!(
            outcome.result,
            DecisionResult::Chart(ChartReply {
                chart_type: ChartType::Line,
                title: "Revenue".to_string(),
                unit: "$".to_string(),
                summary: "West leads.".to_string(),
                data: vec![
                    ChartDatum { name: "West".to_string(), value: 42.5 },
                    ChartDatum { name: "East".to_string(), value: 10.0 },
                ],
                suggestions: vec!["a?".to_string(), "b?".to_string(), "c?".to_string()],
            })
        );
        assert!(outcome.stages.contains(&Stage::Normalized));
        assert_eq!(
            completion.calls().first().map(|(_, model)| model.as_str()),
            Some("llama-3.3-70b-versatile")
        );
    }

    #[tokio::test]
    async fn test_unrecoverable_reply_degrades_without_persisting() {
        let completion = Arc::new(FakeCompletion::replying("Sorry, I can't help with that."));
        let pipeline = pipeline_with(completion).await;

        let outcome = pipeline
            .run(&DecisionRequest::new("Plot revenue", None, true))
            .await;
        assert_eq!(outcome.result, DecisionResult::degraded());
        assert_eq!(
            outcome.stages,
            vec![
                Stage::Received,
                Stage::ContextBuilt,
                Stage::PromptSelected,
                Stage::CompletionRequested,
                Stage::RecoveryFailed,
                Stage::Returned,
            ]
        );
        assert!(pipeline.history().all().await.expect("history").is_empty());
    }

    #[tokio::test]
    async fn test_completion_error_becomes_error_variant() {
        let completion = Arc::new(FakeCompletion::failing("connection reset"));
        let pipeline = pipeline_with(completion).await;

        let result = pipeline
            .decide(&DecisionRequest::new("What is the current stock price?", None, false))
            .await;
        assert_eq!(
            result,
            DecisionResult::error("Fake request error: connection reset")
        );
        assert!(pipeline.history().all().await.expect("history").is_empty());
    }

    #[tokio::test]
    async fn test_reply_without_summary_is_not_persisted() {
        let completion = Arc::new(FakeCompletion::replying("{\"title\": \"Only a title\"}"));
        let pipeline = pipeline_with(completion).await;

        let outcome = pipeline
            .run(&DecisionRequest::new("hello", None, false))
            .await;
        assert!(outcome.stages.contains(&Stage::PersistSkipped));
        assert!(pipeline.history().all().await.expect("history").is_empty());
    }

    #[tokio::test]
    async fn test_search_snippets_reach_the_prompt() {
        let completion = Arc::new(FakeCompletion::replying("{\"summary\": \"s\", \"title\": \"t\"}"));
        let pipeline = pipeline_with(completion.clone()).await;

        pipeline
            .decide(&DecisionRequest::new("latest oil price", None, false))
            .await;
        let prompt = completion.calls().first().map(|(prompt, _)| prompt.clone()).unwrap_or_default();
        assert!(prompt.contains("- Brent: up 3%"));
    }

    #[tokio::test]
    async fn test_previous_turns_feed_the_next_prompt() {
        let completion = Arc::new(FakeCompletion::replying("{\"summary\": \"Q1 was strong.\", \"title\": \"t\"}"));
        let pipeline = pipeline_with(completion.clone()).await;

        pipeline.decide(&DecisionRequest::new("How was Q1?", None, false)).await;
        pipeline.decide(&DecisionRequest::new("And Q2?", None, false)).await;

        let second_prompt = completion.calls().get(1).map(|(prompt, _)| prompt.clone()).unwrap_or_default();
        assert!(second_prompt.contains("User: How was Q1?\nAi: Q1 was strong."));
    }

    #[tokio::test]
    async fn test_briefing_requires_history() {
        let completion = Arc::new(FakeCompletion::replying("{}"));
        let pipeline = pipeline_with(completion.clone()).await;

        assert_eq!(
            pipeline.session_briefing().await,
            BriefingResult::error(briefing::NO_HISTORY)
        );
        assert!(completion.calls().is_empty());
    }

    #[tokio::test]
    async fn test_briefing_uses_full_transcript_and_logic_model() {
        let completion = Arc::new(FakeCompletion::replying(
            "{\"title\": \"Executive Briefing\", \"key_findings\": [\"West leads\"], \"suggestions\": [\"Expand\"]}",
        ));
        let pipeline = pipeline_with(completion.clone()).await;
        pipeline
            .history()
            .append_exchange("How is West?", "West leads.")
            .await
            .expect("exchange");

        let briefing = pipeline.session_briefing().await;
        assert_eq!(
            serde_json::to_value(&briefing).expect("serialize"),
            serde_json::json!({
                "title": "Executive Briefing",
                "key_findings": ["West leads"],
                "suggestions": ["Expand"]
            })
        );

        let calls = completion.calls();
        let (prompt, model) = calls.first().cloned().unwrap_or_default();
        assert_eq!(model, "llama-3.3-70b-versatile");
        assert!(prompt.contains("user: How is West?\nai: West leads."));
    }
}
