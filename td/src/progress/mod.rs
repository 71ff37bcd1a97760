//! Progress tracking for decomposed subtasks

mod tracker;

pub use tracker::{ProgressCounts, ProgressNote, ProgressStatus, ProgressTracker, TaskProgress, clamp_percent};
