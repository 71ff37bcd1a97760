//! The six decomposition stages, in execution order

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Classify,
    Decompose,
    Resources,
    Risks,
    Timeline,
    Suggest,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Classify,
        Stage::Decompose,
        Stage::Resources,
        Stage::Risks,
        Stage::Timeline,
        Stage::Suggest,
    ];

    /// Template name of the user prompt; the system prompt is `{name}-system`
    pub fn template_name(&self) -> &'static str {
        match self {
            Self::Classify => "classify",
            Self::Decompose => "decompose",
            Self::Resources => "resources",
            Self::Risks => "risks",
            Self::Timeline => "timeline",
            Self::Suggest => "suggest",
        }
    }

    pub fn system_template_name(&self) -> String {
        format!("{}-system", self.template_name())
    }

    /// Human-readable stage name
    pub fn title(&self) -> &'static str {
        match self {
            Self::Classify => "Task analysis",
            Self::Decompose => "Decomposition",
            Self::Resources => "Resource analysis",
            Self::Risks => "Risk analysis",
            Self::Timeline => "Timeline",
            Self::Suggest => "Suggestions",
        }
    }

    /// Status line shown while the stage runs
    pub fn status_message(&self) -> &'static str {
        match self {
            Self::Classify => "Analyzing task type...",
            Self::Decompose => "Decomposing task...",
            Self::Resources => "Analyzing resource requirements...",
            Self::Risks => "Assessing risks...",
            Self::Timeline => "Planning timeline...",
            Self::Suggest => "Generating suggestions...",
        }
    }

    /// Zero-based position in the pipeline
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.template_name())
    }
}
