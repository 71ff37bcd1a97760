//! LLM error types

use thiserror::Error;

/// Errors that can occur during remote completion calls
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing API key: set the {0} environment variable")]
    MissingApiKey(String),

    #[error("API call failed after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: Box<LlmError> },
}

impl LlmError {
    /// Permanent failure after the retry budget was spent
    pub fn is_exhausted(&self) -> bool {
        matches!(self, LlmError::Exhausted { .. })
    }

    /// HTTP status of the underlying failure, looking through `Exhausted`
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::ApiError { status, .. } => Some(*status),
            LlmError::Network(e) => e.status().map(|s| s.as_u16()),
            LlmError::Exhausted { last_error, .. } => last_error.status(),
            _ => None,
        }
    }

    /// Whether another attempt could succeed
    ///
    /// Every transport or endpoint failure is worth another attempt; only a
    /// missing key and an already-exhausted call are final.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, LlmError::MissingApiKey(_) | LlmError::Exhausted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_exhausted() {
        let err = LlmError::Exhausted {
            attempts: 4,
            last_error: Box::new(LlmError::ApiError {
                status: 500,
                message: "Server error".to_string(),
            }),
        };
        assert!(err.is_exhausted());
        assert!(!err.is_retryable());
        assert_eq!(err.status(), Some(500));

        let err = LlmError::InvalidResponse("bad".to_string());
        assert!(!err.is_exhausted());
    }

    #[test]
    fn test_is_retryable() {
        assert!(
            LlmError::ApiError {
                status: 500,
                message: "Server error".to_string()
            }
            .is_retryable()
        );

        // Client errors are retried too
        assert!(
            LlmError::ApiError {
                status: 400,
                message: "Bad request".to_string()
            }
            .is_retryable()
        );

        assert!(LlmError::InvalidResponse("no choices".to_string()).is_retryable());
        assert!(!LlmError::MissingApiKey("DEEPSEEK_API_KEY".to_string()).is_retryable());
    }

    #[test]
    fn test_exhausted_message_includes_last_error() {
        let err = LlmError::Exhausted {
            attempts: 4,
            last_error: Box::new(LlmError::ApiError {
                status: 503,
                message: "unavailable".to_string(),
            }),
        };
        let msg = err.to_string();
        assert!(msg.contains("4 attempts"));
        assert!(msg.contains("503"));
        assert!(msg.contains("unavailable"));
    }
}
