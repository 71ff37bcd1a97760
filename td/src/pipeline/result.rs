//! Aggregated output of one decomposition run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stage::Stage;
use crate::domain::{Context, Feedback, Subtask};

/// Stage outputs, filled in as each stage completes
///
/// A field is `None` until its stage finishes. On failure the fields of the
/// stages that did finish are kept and `failed_stage` names the one that
/// did not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub context: Context,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtasks: Option<Vec<Subtask>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risks: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<Stage>,
    #[serde(default)]
    pub feedback: Vec<Feedback>,
}

impl PipelineResult {
    pub fn new(run_id: impl Into<String>, context: Context) -> Self {
        Self {
            run_id: run_id.into(),
            started_at: Utc::now(),
            context,
            analysis: None,
            subtasks: None,
            resources: None,
            risks: None,
            timeline: None,
            suggestions: None,
            failed_stage: None,
            feedback: Vec::new(),
        }
    }

    /// Whether the stage's output is present
    pub fn has_output(&self, stage: Stage) -> bool {
        match stage {
            Stage::Classify => self.analysis.is_some(),
            Stage::Decompose => self.subtasks.is_some(),
            Stage::Resources => self.resources.is_some(),
            Stage::Risks => self.risks.is_some(),
            Stage::Timeline => self.timeline.is_some(),
            Stage::Suggest => self.suggestions.is_some(),
        }
    }

    pub fn completed_stages(&self) -> Vec<Stage> {
        Stage::ALL.into_iter().filter(|s| self.has_output(*s)).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failed_stage.is_none() && Stage::ALL.iter().all(|s| self.has_output(*s))
    }

    /// Subtasks, or an empty slice before decomposition finished
    pub fn subtasks(&self) -> &[Subtask] {
        self.subtasks.as_deref().unwrap_or_default()
    }

    /// Everything produced so far, as handed to the suggestion stage
    pub fn aggregate(&self) -> serde_json::Value {
        serde_json::json!({
            "taskAnalysis": self.analysis,
            "subtasks": self.subtasks(),
            "resources": self.resources,
            "risks": self.risks,
            "timeline": self.timeline,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_result_has_no_outputs() {
        let result = PipelineResult::new("r", Context::new("x"));
        assert!(result.completed_stages().is_empty());
        assert!(!result.is_complete());
        assert!(result.subtasks().is_empty());
    }

    #[test]
    fn test_completed_stages_in_order() {
        let mut result = PipelineResult::new("r", Context::new("x"));
        result.analysis = Some("a".to_string());
        result.subtasks = Some(vec![Subtask::new("1", "t")]);
        assert_eq!(result.completed_stages(), vec![Stage::Classify, Stage::Decompose]);
    }

    #[test]
    fn test_aggregate_contains_prior_outputs() {
        let mut result = PipelineResult::new("r", Context::new("x"));
        result.analysis = Some("analysis".to_string());
        result.timeline = Some("week 1".to_string());

        let agg = result.aggregate();
        assert_eq!(agg["taskAnalysis"], "analysis");
        assert_eq!(agg["timeline"], "week 1");
        assert!(agg["resources"].is_null());
        assert!(agg["subtasks"].as_array().unwrap().is_empty());
    }
}
