use std::sync::Arc;

use crate::agents::SearchProvider;

pub const SEARCH_FALLBACK: &str = "No internet results found.";
pub const MAX_RESULTS: usize = 3;

/// Business keywords that make a query worth a live web search
pub const TRIGGER_WORDS: &[&str] = &[
    "price",
    "news",
    "current",
    "latest",
    "stock",
    "vs",
    "competitor",
    "today",
    "market",
    "trend",
    "strategy",
    "trick",
    "hack",
    "growth",
    "buy",
    "sell",
];

/// Case-insensitive substring match against [`TRIGGER_WORDS`]
#[must_use]
pub fn should_search(query: &str) -> bool {
    let lowered = query.to_lowercase();
    TRIGGER_WORDS.iter().any(|term| lowered.contains(term))
}

/// Total wrapper around a search provider: always yields text
#[derive(Clone)]
pub struct SearchGateway {
    provider: Option<Arc<dyn SearchProvider>>,
}

impl SearchGateway {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Gateway with no provider configured
    pub fn disabled() -> Self {
        Self { provider: None }
    }

    /// Up to three `- title: body` lines, or [`SEARCH_FALLBACK`]
    pub async fn search(&self, query: &str) -> String {
        tracing::info!(query, "searching internet");
        let Some(provider) = &self.provider else {
            tracing::warn!("search requested but no provider is configured");
            return SEARCH_FALLBACK.to_string();
        };

        match provider.search(query, MAX_RESULTS).await {
            Ok(hits) if !hits.is_empty() => {
                let sources: Vec<&str> = hits.iter().map(|hit| hit.url.as_str()).collect();
                tracing::debug!(?sources, "search results");
                hits.iter()
                    .take(MAX_RESULTS)
                    .map(|hit| format!("- {}: {}", hit.title, hit.body))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            Ok(_) => SEARCH_FALLBACK.to_string(),
            Err(error) => {
                tracing::warn!(%error, "internet search failed");
                SEARCH_FALLBACK.to_string()
            }
        }
    }
}
