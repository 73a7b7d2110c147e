use async_trait::async_trait;
use color_eyre::Result;
use reqwest::Client;
use serde::Deserialize;

use crate::agents::{SearchHit, SearchProvider};
use crate::config::TimeoutConfig;

const BRAVE_SEARCH_URL: &str = "https://api.search.brave.com/res/v1/web/search";

#[derive(Debug, Deserialize)]
struct BraveWebResponse {
    web: Option<BraveWebResults>,
}

#[derive(Debug, Deserialize)]
struct BraveWebResults {
    results: Vec<BraveSearchResult>,
}

#[derive(Debug, Deserialize)]
struct BraveSearchResult {
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: String,
}

/// Brave Web Search API provider
pub struct BraveSearch {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl BraveSearch {
    pub fn new(api_key: &str, timeouts: &TimeoutConfig) -> Result<Self> {
        Self::with_endpoint(api_key, BRAVE_SEARCH_URL, timeouts)
    }

    pub fn with_endpoint(api_key: &str, endpoint: &str, timeouts: &TimeoutConfig) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(color_eyre::eyre::eyre!("Brave API key not configured"));
        }
        let client = Client::builder()
            .connect_timeout(timeouts.connect())
            .timeout(timeouts.request())
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl SearchProvider for BraveSearch {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<SearchHit>> {
        let trimmed_query = query.trim();
        if trimmed_query.is_empty() {
            return Ok(Vec::new());
        }

        let count = count.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .header("X-Subscription-Token", &self.api_key)
            .query(&[("q", trimmed_query), ("source", "web"), ("count", count.as_str())])
            .send()
            .await?
            .error_for_status()?;

        let payload: BraveWebResponse = response.json().await?;
        let results = payload.web.map(|web| web.results).unwrap_or_default();

        Ok(results
            .into_iter()
            .map(|result| SearchHit {
                title: result.title.trim().to_string(),
                body: result.description.trim().to_string(),
                url: result.url.trim().to_string(),
            })
            .collect())
    }
}
