//! Staged decomposition pipeline
//!
//! ```text
//! Classify ─▶ Decompose ─▶ Resources ─▶ Risks ─▶ Timeline ─▶ Suggest
//!  analysis    subtasks     text         text     text        text
//! ```
//!
//! Stages run strictly in sequence and each feeds the next. Status events
//! go to the [`EventBus`](crate::events::EventBus).

mod error;
mod orchestrator;
mod result;
mod stage;

pub use error::PipelineError;
pub use orchestrator::Orchestrator;
pub use result::PipelineResult;
pub use stage::Stage;
