//! Feedback panel entries

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Success,
    Warning,
    Error,
    #[default]
    Info,
}

/// One message shown to the user alongside the results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(rename = "type")]
    pub kind: FeedbackKind,
    pub message: String,
}

impl Feedback {
    pub fn new(kind: FeedbackKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(FeedbackKind::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(FeedbackKind::Warning, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(FeedbackKind::Success, message)
    }
}
