use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::models::{ErrorBody, SummarizeRequest, SummarizeResponse};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3001";

/// Calls a running summarization service over HTTP.
#[derive(Debug, Clone)]
pub struct SummaryClient {
    http: reqwest::Client,
    endpoint: String,
}

impl Default for SummaryClient {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_URL)
    }
}

impl SummaryClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url)
    }

    pub fn with_http_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            endpoint: format!("{}/api/summarize", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends `text` as is and returns the service's summary.
    pub async fn summarize(&self, text: &str) -> AppResult<String> {
        debug!(endpoint = %self.endpoint, text_length = text.len(), "Requesting summary");

        let response = self
            .http
            .post(&self.endpoint)
            .json(&SummarizeRequest::new(text))
            .send()
            .await
            .map_err(|e| AppError::Remote {
                status: 0,
                message: format!("Failed to reach summarization service: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("Unknown error").to_string());
            warn!(status = status.as_u16(), message = %message, "Summarization service returned an error");
            return Err(AppError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        let body: SummarizeResponse = response.json().await.map_err(|e| AppError::Remote {
            status: status.as_u16(),
            message: format!("Malformed response from summarization service: {}", e),
        })?;

        Ok(body.summary)
    }
}
