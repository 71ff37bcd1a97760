//! Subtask domain type
//!
//! A unit of decomposed work. Subtasks reference each other only by id.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Lowest and highest complexity/priority score
pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 5;

/// Score at or above which a subtask counts as critical
pub const CRITICAL_SCORE: u8 = 4;

/// Clamp a score into 1..=5
pub fn clamp_score(score: i64) -> u8 {
    score.clamp(MIN_SCORE as i64, MAX_SCORE as i64) as u8
}

/// Risk severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" | "低" => Ok(Self::Low),
            "medium" | "mid" | "moderate" | "中" => Ok(Self::Medium),
            "high" | "critical" | "高" => Ok(Self::High),
            other => Err(format!("unknown risk level '{}'", other)),
        }
    }
}

/// A risk attached to a subtask
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Risk {
    pub level: RiskLevel,
    #[serde(default)]
    pub description: String,
}

impl Risk {
    pub fn new(level: RiskLevel, description: impl Into<String>) -> Self {
        Self {
            level,
            description: description.into(),
        }
    }
}

/// One decomposed unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// 1 (trivial) to 5 (very complex)
    #[serde(default = "default_complexity")]
    pub complexity: u8,
    /// 1 (low) to 5 (urgent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Ids of subtasks that must finish first
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risks: Vec<Risk>,
    /// Explicit graph group, overrides inference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Phase tag such as "development" or "testing"
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_key_path: bool,
}

fn default_complexity() -> u8 {
    MIN_SCORE
}

impl Subtask {
    /// Create a subtask with default scores and no relations
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            complexity: MIN_SCORE,
            priority: None,
            duration: None,
            dependencies: Vec::new(),
            risks: Vec::new(),
            group: None,
            task_type: None,
            is_key_path: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_complexity(mut self, complexity: u8) -> Self {
        self.complexity = clamp_score(complexity as i64);
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(clamp_score(priority as i64));
        self
    }

    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = Some(duration.into());
        self
    }

    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_risk(mut self, risk: Risk) -> Self {
        self.risks.push(risk);
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = Some(task_type.into());
        self
    }

    pub fn with_key_path(mut self, is_key_path: bool) -> Self {
        self.is_key_path = is_key_path;
        self
    }

    /// Priority for ordering; unset sorts below every explicit priority
    pub fn priority_score(&self) -> u8 {
        self.priority.unwrap_or(0)
    }

    /// Critical subtasks get highlighted in the graph
    ///
    /// High complexity, high priority, an explicit key-path flag, or any
    /// high-severity risk.
    pub fn is_critical(&self) -> bool {
        let critical = self.complexity >= CRITICAL_SCORE
            || self.priority_score() >= CRITICAL_SCORE
            || self.is_key_path
            || self.risks.iter().any(|r| r.level == RiskLevel::High);
        debug!(id = %self.id, critical, "Subtask::is_critical: evaluated");
        critical
    }
}
