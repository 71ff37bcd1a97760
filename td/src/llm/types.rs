//! Chat-completion request/response types
//!
//! These model the OpenAI-style Chat Completions API used by the pipeline.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A completion request - the prompt messages for one remote call
///
/// Generation parameters are not part of the request; they are fixed by
/// the client's configuration.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
}

impl CompletionRequest {
    /// Build the usual two-message request: persona plus user prompt
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        debug!("CompletionRequest::new: called");
        Self {
            messages: vec![Message::system(system_prompt), Message::user(user_prompt)],
        }
    }

    /// The system message text, if any
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a system message
    pub fn system(text: impl Into<String>) -> Self {
        debug!("Message::system: called");
        Self {
            role: Role::System,
            content: text.into(),
        }
    }

    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        debug!("Message::user: called");
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        debug!("Message::assistant: called");
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Response from a completion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    /// Text of the first choice
    pub content: String,

    /// Token usage, when the endpoint reports it
    pub usage: TokenUsage,
}

impl CompletionResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: TokenUsage::default(),
        }
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}
