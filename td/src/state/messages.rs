//! Application state messages
//!
//! Every change to [`AppState`](super::AppState) arrives as one of these.

use thiserror::Error;

use crate::domain::{Context, Subtask};
use crate::graph::Position;
use crate::pipeline::PipelineResult;

/// Errors from state operations
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Subtask not found: {0}")]
    NotFound(String),

    #[error("Invalid subtask: {0}")]
    Invalid(String),

    #[error("Graph node not found: {0}")]
    NodeNotFound(String),
}

/// Edit-flow messages
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A run finished (fully or partially); its subtasks replace the current ones
    DecompositionFinished(PipelineResult),
    /// Full replacement value for the subtask with the same id
    SubtaskEdited(Subtask),
    ProgressUpdated {
        id: String,
        percent: i64,
        note: Option<String>,
    },
    /// A node was placed at new coordinates; `id` is a node id or a subtask id
    NodeMoved { id: String, position: Position },
    /// New form inputs, e.g. from a template
    FormChanged(Context),
    /// Clear inputs and results
    Reset,
}

impl AppEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DecompositionFinished(_) => "DecompositionFinished",
            Self::SubtaskEdited(_) => "SubtaskEdited",
            Self::ProgressUpdated { .. } => "ProgressUpdated",
            Self::NodeMoved { .. } => "NodeMoved",
            Self::FormChanged(_) => "FormChanged",
            Self::Reset => "Reset",
        }
    }
}
