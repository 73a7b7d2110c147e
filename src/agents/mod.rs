pub mod brave;
pub mod error;
#[path = "openai-compat.rs"]
pub mod openai_compat;

use async_trait::async_trait;
use color_eyre::Result;

pub use error::CompletionError;

/// Chat-completion backend. One call, no retries.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends `prompt` as a single user message to `model` in JSON-object mode
    /// and returns the raw text of the first choice.
    async fn complete(&self, prompt: &str, model: &str) -> Result<String, CompletionError>;
}

/// Web search backend
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<SearchHit>>;
}

/// One web search result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub body: String,
    pub url: String,
}
