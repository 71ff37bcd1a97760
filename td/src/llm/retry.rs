//! Exponential-backoff retry around any LlmClient

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError};
use crate::config::RetryConfig;

/// Retry budget and backoff schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before retry 0; retry n waits `base_delay * 2^n`
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self { max_retries, base_delay }
    }

    /// Backoff before the retry that follows failed attempt `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Total attempts this policy allows
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.max_retries, Duration::from_millis(config.base_delay_ms))
    }
}

/// Wraps a client and retries every failure with exponential backoff
///
/// After `max_retries` retries the call fails with [`LlmError::Exhausted`]
/// carrying the last underlying error.
pub struct RetryingClient {
    inner: Arc<dyn LlmClient>,
    policy: RetryPolicy,
}

impl RetryingClient {
    pub fn new(inner: Arc<dyn LlmClient>, policy: RetryPolicy) -> Self {
        debug!(?policy, "RetryingClient::new: called");
        Self { inner, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }
}

#[async_trait]
impl LlmClient for RetryingClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(max_retries = self.policy.max_retries, "RetryingClient::complete: called");
        let mut attempt = 0;
        loop {
            let err = match self.inner.complete(request.clone()).await {
                Ok(response) => {
                    debug!(attempt, "RetryingClient::complete: success");
                    return Ok(response);
                }
                Err(e) => e,
            };

            if !err.is_retryable() {
                debug!(attempt, error = %err, "RetryingClient::complete: non-retryable error");
                return Err(err);
            }

            if attempt >= self.policy.max_retries {
                warn!(attempts = attempt + 1, error = %err, "API call failed, retries exhausted");
                return Err(LlmError::Exhausted {
                    attempts: attempt + 1,
                    last_error: Box::new(err),
                });
            }

            let backoff = self.policy.delay_for(attempt);
            warn!(
                attempt = attempt + 1,
                backoff_ms = backoff.as_millis() as u64,
                error = %err,
                "API call failed, retrying after backoff"
            );
            tokio::time::sleep(backoff).await;
            attempt += 1;
        }
    }
}
