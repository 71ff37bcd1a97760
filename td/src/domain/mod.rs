//! Domain types for TaskDecomposer
//!
//! Core domain types: Context (per-run input), Subtask (unit of work with
//! scores, dependencies and risks), Feedback (user-facing messages).

mod context;
mod feedback;
mod subtask;

pub use context::{ComplexityLevel, Context, Domain};
pub use feedback::{Feedback, FeedbackKind};
pub use subtask::{CRITICAL_SCORE, MAX_SCORE, MIN_SCORE, Risk, RiskLevel, Subtask, clamp_score};
