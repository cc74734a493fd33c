use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, UpstreamError};
use crate::models::{ChatCompletionRequest, ChatCompletionResponse};

/// A chat-completion provider. Implementations make exactly one attempt per call.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Returns the content of the first choice, verbatim.
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<String, UpstreamError>;
}

/// Groq's OpenAI-compatible chat completion API.
pub struct GroqClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GroqClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Option<Duration>,
    ) -> AppResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| AppError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| AppError::config("GROQ_API_KEY must be set"))?;
        Self::new(&config.upstream_base_url, api_key, config.upstream_timeout())
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<String, UpstreamError> {
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Completion provider rejected request");
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| UpstreamError::MalformedResponse(e.to_string()))?;

        let choice = parsed.choices.into_iter().next().ok_or(UpstreamError::NoChoices)?;
        choice
            .message
            .content
            .ok_or_else(|| UpstreamError::MalformedResponse("first choice has no content".to_string()))
    }
}
