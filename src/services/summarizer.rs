use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use crate::config::GenerationSettings;
use crate::error::{AppError, AppResult};
use crate::models::{ChatCompletionRequest, ChatMessage};
use crate::services::completion::CompletionClient;

pub const SYSTEM_PROMPT: &str = "You are an expert summarizer. Your task is to create a concise, well-structured summary of the provided text. Focus on the main ideas, key points, and important details. Organize the summary with clear sections if appropriate. The summary should be comprehensive yet concise.";

pub const USER_PROMPT_PREFIX: &str = "Please summarize the following text: \n\n";

/// Forwards document text to the completion provider and hands back its
/// answer untouched.
#[derive(Clone)]
pub struct SummaryService {
    client: Arc<dyn CompletionClient>,
    settings: GenerationSettings,
}

impl SummaryService {
    pub fn new(client: Arc<dyn CompletionClient>, settings: GenerationSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// The fixed two-message conversation for `text`. The text is embedded as is.
    pub fn build_request(&self, text: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(format!("{}{}", USER_PROMPT_PREFIX, text)),
            ],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        }
    }

    pub async fn summarize(&self, text: &str) -> AppResult<String> {
        if text.trim().is_empty() {
            return Err(AppError::no_text());
        }

        let start = Instant::now();
        let request = self.build_request(text);

        match self.client.complete(&request).await {
            Ok(summary) => {
                info!(
                    input_chars = text.len(),
                    summary_chars = summary.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Summary generated"
                );
                Ok(summary)
            }
            Err(e) => {
                error!(error = %e, "Error generating summary");
                Err(AppError::Upstream(e))
            }
        }
    }
}
