//! Client for OpenAI-compatible chat completion APIs (Groq)

use async_trait::async_trait;
use color_eyre::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::agents::{CompletionClient, CompletionError};
use crate::config::{GroqConfig, TimeoutConfig};

// -- Shared request/response types --

#[derive(Debug, Serialize)]
pub struct OpenAIChatRequest {
    pub model: String,
    pub messages: Vec<OpenAIMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

/// Structured output mode; `json_object` forces a JSON reply
#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

impl ResponseFormat {
    #[must_use]
    pub fn json_object() -> Self {
        Self {
            format_type: "json_object".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAIMessage {
    pub role: String,
    pub content: String,
}

impl OpenAIMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OpenAIChatResponse {
    pub choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    pub message: OpenAIChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct OpenAIChoiceMessage {
    /// Content may be null
    pub content: Option<String>,
}

// -- Helpers --

/// Extracts the assistant reply from an OpenAI-style response
pub fn extract_reply(
    response: OpenAIChatResponse,
    provider: &'static str,
) -> Result<String, CompletionError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(CompletionError::EmptyReply { provider })
}

/// Builds a `reqwest::Client` with the configured timeouts
pub fn build_client(timeouts: &TimeoutConfig) -> Result<Client> {
    Ok(Client::builder()
        .connect_timeout(timeouts.connect())
        .timeout(timeouts.request())
        .build()?)
}

/// Chat completion client for any OpenAI-compatible endpoint
pub struct OpenAICompatClient {
    client: Client,
    provider: &'static str,
    base_url: String,
    api_key: String,
}

impl OpenAICompatClient {
    pub fn new(
        provider: &'static str,
        base_url: &str,
        api_key: &str,
        timeouts: &TimeoutConfig,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(timeouts)?,
            provider,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn groq(config: &GroqConfig, timeouts: &TimeoutConfig) -> Result<Self> {
        Self::new("Groq", &config.base_url, &config.api_key, timeouts)
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Sends a chat request and returns the first choice's content
    pub async fn chat(
        &self,
        model: &str,
        messages: Vec<OpenAIMessage>,
        json_mode: bool,
    ) -> Result<String, CompletionError> {
        let request = OpenAIChatRequest {
            model: model.to_string(),
            messages,
            stream: false,
            response_format: json_mode.then(ResponseFormat::json_object),
        };

        let response = self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|error| CompletionError::from_reqwest(self.provider, &error))?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(CompletionError::from_status(
                self.provider,
                status.as_u16(),
                &details,
            ));
        }

        let payload: OpenAIChatResponse =
            response
                .json()
                .await
                .map_err(|error| CompletionError::Decode {
                    provider: self.provider,
                    message: error.to_string(),
                })?;
        extract_reply(payload, self.provider)
    }
}

#[async_trait]
impl CompletionClient for OpenAICompatClient {
    async fn complete(&self, prompt: &str, model: &str) -> Result<String, CompletionError> {
        tracing::debug!(provider = self.provider, model, "requesting completion");
        self.chat(model, vec![OpenAIMessage::user(prompt)], true).await
    }
}
