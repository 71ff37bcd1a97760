//! Per-subtask progress state machine
//!
//! Status is a pure function of the percent value:
//!
//! | percent      | status      | timestamps                      |
//! |--------------|-------------|---------------------------------|
//! | 0            | pending     | -                               |
//! | 1..=99       | in-progress | start set on first entry        |
//! | 100          | completed   | end set                         |

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Completion state of one subtask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl ProgressStatus {
    /// Status implied by a clamped percent value
    pub fn from_percent(percent: u8) -> Self {
        match percent {
            0 => Self::Pending,
            100.. => Self::Completed,
            _ => Self::InProgress,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Clamp any requested percent into 0..=100
pub fn clamp_percent(percent: i64) -> u8 {
    percent.clamp(0, 100) as u8
}

/// A timestamped note recorded with a progress update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressNote {
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Percent at the time the note was written
    pub progress: u8,
}

/// Progress of one subtask
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskProgress {
    pub status: ProgressStatus,
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Vec<ProgressNote>,
}

impl TaskProgress {
    /// Apply an update as of `now`
    pub fn update_at(&mut self, percent: i64, note: Option<&str>, now: DateTime<Utc>) {
        let progress = clamp_percent(percent);
        let status = ProgressStatus::from_percent(progress);
        debug!(requested = percent, progress, %status, "TaskProgress::update_at: called");

        self.progress = progress;
        self.status = status;
        match status {
            ProgressStatus::Pending => {
                self.end_time = None;
            }
            ProgressStatus::InProgress => {
                if self.start_time.is_none() {
                    self.start_time = Some(now);
                }
                self.end_time = None;
            }
            ProgressStatus::Completed => {
                if self.start_time.is_none() {
                    self.start_time = Some(now);
                }
                self.end_time = Some(now);
            }
        }

        if let Some(content) = note.map(str::trim).filter(|n| !n.is_empty()) {
            self.notes.push(ProgressNote {
                content: content.to_string(),
                timestamp: now,
                progress,
            });
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == ProgressStatus::Completed
    }
}

/// Counts by status, for summaries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl ProgressCounts {
    pub fn total(&self) -> usize {
        self.pending + self.in_progress + self.completed
    }
}

/// Subtask id → progress
///
/// Ordered by id so snapshots serialize identically between saves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressTracker {
    entries: BTreeMap<String, TaskProgress>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted `[id, progress]` pairs
    pub fn from_entries(entries: impl IntoIterator<Item = (String, TaskProgress)>) -> Self {
        let entries: BTreeMap<_, _> = entries.into_iter().collect();
        debug!(count = entries.len(), "ProgressTracker::from_entries: called");
        Self { entries }
    }

    /// Create a pending entry for every id lacking one
    pub fn seed<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) -> usize {
        let mut added = 0;
        for id in ids {
            if !self.entries.contains_key(id) {
                self.entries.insert(id.to_string(), TaskProgress::default());
                added += 1;
            }
        }
        debug!(added, "ProgressTracker::seed: done");
        added
    }

    /// Apply an update; returns false for an unknown id
    pub fn update(&mut self, id: &str, percent: i64, note: Option<&str>) -> bool {
        self.update_at(id, percent, note, Utc::now())
    }

    pub fn update_at(&mut self, id: &str, percent: i64, note: Option<&str>, now: DateTime<Utc>) -> bool {
        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.update_at(percent, note, now);
                info!(%id, progress = entry.progress, status = %entry.status, "Progress updated");
                true
            }
            None => {
                debug!(%id, "ProgressTracker::update_at: unknown id, ignoring");
                false
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&TaskProgress> {
        self.entries.get(id)
    }

    /// Percent for an id, 0 when untracked
    pub fn percent(&self, id: &str) -> u8 {
        self.entries.get(id).map(|p| p.progress).unwrap_or(0)
    }

    pub fn status(&self, id: &str) -> ProgressStatus {
        self.entries.get(id).map(|p| p.status).unwrap_or_default()
    }

    /// Entries ordered by id
    pub fn entries(&self) -> impl Iterator<Item = (&String, &TaskProgress)> {
        self.entries.iter()
    }

    /// Owned `[id, progress]` pairs ordered by id
    pub fn snapshot(&self) -> Vec<(String, TaskProgress)> {
        self.entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn counts(&self) -> ProgressCounts {
        let mut counts = ProgressCounts::default();
        for progress in self.entries.values() {
            match progress.status {
                ProgressStatus::Pending => counts.pending += 1,
                ProgressStatus::InProgress => counts.in_progress += 1,
                ProgressStatus::Completed => counts.completed += 1,
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_transitions_and_timestamps() {
        let mut p = TaskProgress::default();

        p.update_at(40, Some("halfway-ish"), at(0));
        assert_eq!(p.status, ProgressStatus::InProgress);
        assert_eq!(p.start_time, Some(at(0)));
        assert_eq!(p.end_time, None);

        p.update_at(60, None, at(10));
        // Start time is set on first entry only
        assert_eq!(p.start_time, Some(at(0)));

        p.update_at(100, Some("done"), at(20));
        assert_eq!(p.status, ProgressStatus::Completed);
        assert_eq!(p.end_time, Some(at(20)));

        p.update_at(90, None, at(30));
        assert_eq!(p.status, ProgressStatus::InProgress);
        assert_eq!(p.end_time, None);

        let notes: Vec<_> = p.notes.iter().map(|n| (n.content.as_str(), n.progress)).collect();
        assert_eq!(notes, vec![("halfway-ish", 40), ("done", 100)]);
    }

    #[test]
    fn test_out_of_range_values_clamped() {
        let mut p = TaskProgress::default();
        p.update_at(250, None, at(0));
        assert_eq!(p.progress, 100);
        assert!(p.is_completed());

        p.update_at(-7, None, at(1));
        assert_eq!(p.progress, 0);
        assert_eq!(p.status, ProgressStatus::Pending);
    }

    #[test]
    fn test_blank_note_not_recorded() {
        let mut p = TaskProgress::default();
        p.update_at(10, Some("   "), at(0));
        assert!(p.notes.is_empty());
    }

    #[test]
    fn test_tracker_ignores_unknown_ids() {
        let mut tracker = ProgressTracker::new();
        tracker.seed(["a", "b"]);

        assert!(!tracker.update("zzz", 50, None));
        assert!(tracker.get("zzz").is_none());
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_seed_keeps_existing_entries() {
        let mut tracker = ProgressTracker::new();
        tracker.seed(["a"]);
        tracker.update("a", 30, None);

        let added = tracker.seed(["a", "b"]);
        assert_eq!(added, 1);
        assert_eq!(tracker.percent("a"), 30);
        assert_eq!(tracker.status("b"), ProgressStatus::Pending);
    }

    #[test]
    fn test_snapshot_ordered_by_id() {
        let mut tracker = ProgressTracker::new();
        tracker.seed(["c", "a", "b"]);
        let ids: Vec<_> = tracker.snapshot().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_counts() {
        let mut tracker = ProgressTracker::new();
        tracker.seed(["a", "b", "c"]);
        tracker.update("a", 100, None);
        tracker.update("b", 5, None);

        let counts = tracker.counts();
        assert_eq!((counts.pending, counts.in_progress, counts.completed), (1, 1, 1));
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_value(ProgressStatus::InProgress).unwrap();
        assert_eq!(json, "in-progress");
    }

    proptest! {
        #[test]
        fn prop_progress_clamped_and_status_derived(updates in prop::collection::vec(-500i64..500, 1..20)) {
            let mut p = TaskProgress::default();
            for (i, percent) in updates.iter().enumerate() {
                p.update_at(*percent, None, at(i as i64));
                prop_assert!(p.progress <= 100);
                prop_assert_eq!(p.status, ProgressStatus::from_percent(p.progress));
                prop_assert_eq!(p.progress, clamp_percent(*percent));
                if p.status == ProgressStatus::Completed {
                    prop_assert!(p.end_time.is_some());
                }
                if p.status == ProgressStatus::InProgress {
                    prop_assert!(p.start_time.is_some());
                }
            }
        }
    }
}
