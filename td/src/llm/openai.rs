//! OpenAI-compatible Chat Completions client
//!
//! Performs exactly one HTTP POST per `complete` call. Retrying is layered on
//! top by [`RetryingClient`](super::RetryingClient).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, TokenUsage};
use crate::config::LlmConfig;

/// Chat-completions client for DeepSeek/OpenAI-style endpoints
pub struct OpenAICompatClient {
    endpoint: String,
    model: String,
    api_key: String,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
    http: Client,
}

impl OpenAICompatClient {
    /// Create a new client from configuration
    ///
    /// Reads the API key from the environment variable named in the config.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(endpoint = %config.endpoint(), model = %config.model, "from_config: called");
        let api_key = config
            .get_api_key()
            .map_err(|_| LlmError::MissingApiKey(config.api_key_env.clone()))?;

        Self::with_api_key(config, api_key)
    }

    /// Create a client with an explicit API key
    pub fn with_api_key(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self, LlmError> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build().map_err(LlmError::Network)?;

        Ok(Self {
            endpoint: config.endpoint(),
            model: config.model.clone(),
            api_key: api_key.into(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            top_p: config.top_p,
            frequency_penalty: config.frequency_penalty,
            presence_penalty: config.presence_penalty,
            http,
        })
    }

    /// Build the request body for the Chat Completions API
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(%self.model, message_count = request.messages.len(), "build_request_body: called");

        serde_json::json!({
            "model": self.model,
            "messages": request.messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "stream": false,
            "top_p": self.top_p,
            "frequency_penalty": self.frequency_penalty,
            "presence_penalty": self.presence_penalty,
        })
    }

    /// Extract the first choice's text from a success body
    fn parse_response(&self, api_response: ChatResponse) -> Result<CompletionResponse, LlmError> {
        debug!(choice_count = api_response.choices.len(), "parse_response: called");
        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("response has no choices[0].message.content".to_string()))?;

        let usage = api_response
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse { content, usage })
    }
}

/// Message for a non-success response: `{error:{message}}` if present,
/// otherwise the status reason phrase
fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string())
}

#[async_trait]
impl LlmClient for OpenAICompatClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.endpoint, "complete: called");
        let body = self.build_request_body(&request);

        let response = self
            .http
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = error_message(&text, status);
            debug!(status = status.as_u16(), %message, "complete: API error");
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        debug!("complete: success");
        let api_response: ChatResponse = response.json().await?;
        self.parse_response(api_response)
    }
}

// Chat Completions response types

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}
