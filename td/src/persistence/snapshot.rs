//! Persisted project document

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Subtask;
use crate::progress::TaskProgress;

/// Form inputs, subtasks and progress as stored under `taskDecomposerProject`
///
/// Every field defaults so a document from an older or partial save still
/// loads. Domain and complexity stay strings here and are parsed leniently
/// on restore.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectSnapshot {
    pub main_task: String,
    pub constraints: String,
    pub domain: String,
    pub complexity: String,
    pub time_constraint: String,
    pub subtasks: Vec<Subtask>,
    /// `[id, progress]` pairs ordered by id
    pub progress: Vec<(String, TaskProgress)>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl ProjectSnapshot {
    /// Same document with `lastModified` cleared, for change detection
    pub fn without_timestamp(&self) -> Self {
        Self {
            last_modified: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_serializes_as_pairs() {
        let snapshot = ProjectSnapshot {
            main_task: "Ship".to_string(),
            progress: vec![("1".to_string(), TaskProgress::default())],
            ..Default::default()
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["mainTask"], "Ship");
        assert_eq!(json["progress"][0][0], "1");
        assert_eq!(json["progress"][0][1]["status"], "pending");
    }

    #[test]
    fn test_partial_document_loads() {
        let snapshot: ProjectSnapshot = serde_json::from_str(r#"{"mainTask": "Only this"}"#).unwrap();
        assert_eq!(snapshot.main_task, "Only this");
        assert!(snapshot.subtasks.is_empty());
        assert!(snapshot.last_modified.is_none());
    }
}
