//! Test doubles shared across module tests

use async_trait::async_trait;
use axum::Router;
use color_eyre::Result;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::agents::{CompletionClient, CompletionError, SearchHit, SearchProvider};

/// Serves `router` on an ephemeral local port and returns its base URL
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{addr}")
}

/// Completion client that replays a fixed reply and records every call
pub struct FakeCompletion {
    reply: Result<String, String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeCompletion {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// (prompt, model) pairs in call order
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl CompletionClient for FakeCompletion {
    async fn complete(&self, prompt: &str, model: &str) -> Result<String, CompletionError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((prompt.to_string(), model.to_string()));
        self.reply.clone().map_err(|message| CompletionError::Network {
            provider: "Fake",
            message,
        })
    }
}

/// Search provider with canned hits and a call counter
pub struct FakeSearch {
    hits: Option<Vec<SearchHit>>,
    calls: AtomicUsize,
}

impl FakeSearch {
    pub fn with_hits(hits: &[(&str, &str)]) -> Self {
        Self {
            hits: Some(
                hits.iter()
                    .map(|(title, body)| SearchHit {
                        title: title.to_string(),
                        body: body.to_string(),
                        url: String::new(),
                    })
                    .collect(),
            ),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            hits: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for FakeSearch {
    async fn search(&self, _query: &str, count: usize) -> Result<Vec<SearchHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.hits {
            Some(hits) => Ok(hits.iter().take(count).cloned().collect()),
            None => Err(color_eyre::eyre::eyre!("search provider unavailable")),
        }
    }
}
