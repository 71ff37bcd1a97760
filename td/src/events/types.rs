//! Event types for pipeline activity
//!
//! These events are everything a front end can observe about a run:
//! - status line changes (processing, success, error)
//! - stage lifecycle (started, completed)
//! - feedback entries and graph warnings

use serde::{Deserialize, Serialize};

use crate::domain::Feedback;
use crate::pipeline::Stage;

/// Status line state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Processing,
    Success,
    Error,
}

/// Core event enum - the vocabulary of a decomposition run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PipelineEvent {
    /// Status line changed
    Status {
        run_id: String,
        kind: StatusKind,
        message: String,
    },
    /// A stage is about to call the model
    StageStarted {
        run_id: String,
        stage: Stage,
        index: usize,
        total: usize,
    },
    /// A stage produced its output
    StageCompleted {
        run_id: String,
        stage: Stage,
        duration_ms: u64,
    },
    /// A feedback panel entry
    Feedback { run_id: String, feedback: Feedback },
}

impl PipelineEvent {
    /// Run this event belongs to
    pub fn run_id(&self) -> &str {
        match self {
            Self::Status { run_id, .. }
            | Self::StageStarted { run_id, .. }
            | Self::StageCompleted { run_id, .. }
            | Self::Feedback { run_id, .. } => run_id,
        }
    }

    /// Variant name, for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Status { .. } => "Status",
            Self::StageStarted { .. } => "StageStarted",
            Self::StageCompleted { .. } => "StageCompleted",
            Self::Feedback { .. } => "Feedback",
        }
    }

    /// True for the status that closes a run
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Status {
                kind: StatusKind::Success | StatusKind::Error,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_type_tag() {
        let event = PipelineEvent::Status {
            run_id: "r1".to_string(),
            kind: StatusKind::Processing,
            message: "Analyzing task...".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Status");
        assert_eq!(json["kind"], "processing");

        let back: PipelineEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_terminal_only_for_final_status() {
        let processing = PipelineEvent::Status {
            run_id: "r".to_string(),
            kind: StatusKind::Processing,
            message: String::new(),
        };
        let failed = PipelineEvent::Status {
            run_id: "r".to_string(),
            kind: StatusKind::Error,
            message: String::new(),
        };
        let feedback = PipelineEvent::Feedback {
            run_id: "r".to_string(),
            feedback: Feedback::warning("cycle"),
        };

        assert!(!processing.is_terminal());
        assert!(failed.is_terminal());
        assert!(!feedback.is_terminal());
    }
}
