//! Pipeline error types

use thiserror::Error;

use super::result::PipelineResult;
use super::stage::Stage;
use crate::llm::LlmError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("A decomposition is already running")]
    AlreadyRunning,

    /// The model call for a stage failed after all retries
    #[error("{stage} stage failed: {source}")]
    Remote {
        stage: Stage,
        #[source]
        source: LlmError,
        partial: Box<PipelineResult>,
    },

    #[error("{stage} prompt could not be rendered: {message}")]
    Prompt {
        stage: Stage,
        message: String,
        partial: Box<PipelineResult>,
    },
}

impl PipelineError {
    /// Results of the stages that finished before the failure
    pub fn partial(&self) -> Option<&PipelineResult> {
        match self {
            Self::Remote { partial, .. } | Self::Prompt { partial, .. } => Some(&**partial),
            _ => None,
        }
    }

    pub fn into_partial(self) -> Option<PipelineResult> {
        match self {
            Self::Remote { partial, .. } | Self::Prompt { partial, .. } => Some(*partial),
            _ => None,
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Remote { stage, .. } | Self::Prompt { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
