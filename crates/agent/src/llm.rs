//! Seam over the hosted completion API.

use std::time::Duration;

use async_trait::async_trait;
use careline_core::config::LlmConfig;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".to_string(), content: content.into() }
    }
}

/// Wire shape of one completion call:
/// `{model, messages, temperature, max_tokens}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// All variants are soft failures to the fallback ladder; none escape the
/// response generator.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("model `{model}` answered with status {status}")]
    Status { model: String, status: StatusCode },
    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// One synchronous completion attempt; returns the assistant text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionChoiceMessage {
    content: String,
}

/// Production client: bearer-token POST to `{base_url}/chat/completions`
/// with a fixed per-attempt timeout taken from config.
pub struct HostedCompletionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl HostedCompletionClient {
    pub fn new(config: &LlmConfig) -> Result<Self, CompletionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().unwrap_or_else(|| String::new().into()),
        })
    }
}

#[async_trait]
impl CompletionClient for HostedCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(request)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(CompletionError::Status {
                model: request.model.clone(),
                status: response.status(),
            });
        }

        let payload: CompletionResponse = response
            .json()
            .await
            .map_err(|error| CompletionError::MalformedResponse(error.to_string()))?;

        payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| CompletionError::MalformedResponse("response has no choices".into()))
    }
}
