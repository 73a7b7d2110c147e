use crate::pipeline::DecisionRequest;
use crate::pipeline::search::{SearchGateway, should_search};
use crate::services::tabular;
use crate::storage::{HistoryStore, HistoryTurn, render_context_lines};

pub const HISTORY_WINDOW: usize = 6;
pub const NO_SEARCH_PLACEHOLDER: &str = "No external search performed.";

/// Everything the prompt needs besides the query itself
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationContext {
    /// Oldest first
    pub recent_history: Vec<HistoryTurn>,
    pub tabular_preview: String,
    pub search_snippets: String,
}

impl ConversationContext {
    #[must_use]
    pub fn history_text(&self) -> String {
        render_context_lines(&self.recent_history)
    }
}

#[derive(Clone)]
pub struct ContextAssembler {
    history: HistoryStore,
    search: SearchGateway,
}

impl ContextAssembler {
    pub fn new(history: HistoryStore, search: SearchGateway) -> Self {
        Self { history, search }
    }

    /// Read-only against history; awaits the search gateway only when the
    /// query hits the trigger vocabulary
    pub async fn assemble(&self, request: &DecisionRequest) -> ConversationContext {
        let tabular_preview = tabular::preview(request.tabular_payload.as_deref());

        let search_snippets = if should_search(&request.query) {
            tracing::info!("business keyword detected, triggering search");
            self.search.search(&request.query).await
        } else {
            NO_SEARCH_PLACEHOLDER.to_string()
        };

        let recent_history = match self.history.recent(HISTORY_WINDOW).await {
            Ok(turns) => turns,
            Err(error) => {
                tracing::warn!(%error, "could not read history, continuing without it");
                Vec::new()
            }
        };

        ConversationContext {
            recent_history,
            tabular_preview,
            search_snippets,
        }
    }
}
