//! LLM client module for TaskDecomposer
//!
//! Provides chat-completion requests with exponential-backoff retry.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod openai;
mod retry;
mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use openai::OpenAICompatClient;
pub use retry::{RetryPolicy, RetryingClient};
pub use types::{CompletionRequest, CompletionResponse, Message, Role, TokenUsage};

use crate::config::{LlmConfig, RetryConfig};

/// Create the retrying chat client described by config
///
/// The HTTP client makes one attempt per call; the returned client wraps it
/// in the configured retry policy.
pub fn create_client(llm: &LlmConfig, retry: &RetryConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(endpoint = %llm.endpoint(), model = %llm.model, "create_client: called");
    let http: Arc<dyn LlmClient> = Arc::new(OpenAICompatClient::from_config(llm)?);
    Ok(Arc::new(RetryingClient::new(http, RetryPolicy::from(retry))))
}

/// Send a persona + prompt pair and return the reply text
pub async fn complete_text(
    llm: &Arc<dyn LlmClient>,
    system_prompt: &str,
    user_prompt: &str,
) -> Result<String, LlmError> {
    debug!(
        system_len = system_prompt.len(),
        user_len = user_prompt.len(),
        "complete_text: called"
    );
    let response = llm
        .complete(CompletionRequest::new(system_prompt, user_prompt))
        .await?;
    debug!(
        content_len = response.content.len(),
        tokens = response.usage.total(),
        "complete_text: done"
    );
    Ok(response.content)
}
