use reqwest::Client;
use tracing::{debug, error, warn};

use super::types::*;
use crate::error::{GeneratorError, GeneratorResult};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for an OpenAI-compatible chat completions API
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl ChatClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Single chat completion; failures are returned as-is, never retried.
    pub async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
        model: &str,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> GeneratorResult<String> {
        debug!(
            "Creating chat completion with {} messages, model {}",
            messages.len(),
            model
        );

        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages,
            temperature,
            max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                warn!("Rate limited by chat API");
                return Err(GeneratorError::RateLimited);
            }

            if let Ok(error_resp) = serde_json::from_str::<ApiErrorBody>(&error_text) {
                error!(
                    "Chat API error: {} (type: {:?}, code: {:?})",
                    error_resp.error.message, error_resp.error.error_type, error_resp.error.code
                );
                return Err(GeneratorError::Api {
                    message: error_resp.error.message,
                    status_code: Some(status.as_u16()),
                });
            }

            return Err(GeneratorError::Api {
                message: error_text,
                status_code: Some(status.as_u16()),
            });
        }

        let chat_response: ChatCompletionResponse = response.json().await?;
        if let Some(usage) = &chat_response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "Chat completion usage"
            );
        }

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(GeneratorError::EmptyResponse)
    }
}
