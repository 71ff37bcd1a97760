//! TaskDecomposer - staged LLM task decomposition
//!
//! Takes a natural-language task plus context (constraints, domain,
//! complexity, time available) and runs it through six LLM-backed analysis
//! stages. The resulting subtasks become a mind map with phase groups and
//! dependency edges, and each subtask gets a progress record. Everything is
//! saved between invocations.
//!
//! # Modules
//!
//! - [`llm`] - Chat-completion client trait, HTTP client and retry wrapper
//! - [`parser`] - Turns free-form model replies into subtasks
//! - [`pipeline`] - The staged orchestrator
//! - [`prompts`] - Handlebars prompt templates per stage
//! - [`events`] - Live status bus and terminal printer
//! - [`graph`] - Mind map construction, view state and rendering
//! - [`progress`] - Per-subtask progress tracking
//! - [`persistence`] - Key-value store, saved documents and autosave
//! - [`state`] - Application state and the edit flow
//! - [`export`] - HTML panel report
//! - [`templates`] - Built-in project templates
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod domain;
pub mod events;
pub mod export;
pub mod graph;
pub mod llm;
pub mod parser;
pub mod persistence;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod state;
pub mod templates;

// Re-export commonly used types
pub use config::{Config, LlmConfig};
pub use domain::{ComplexityLevel, Context, Domain, Feedback, FeedbackKind, Risk, RiskLevel, Subtask};
pub use events::{EventBus, EventEmitter, PipelineEvent, StatusKind, create_event_bus};
pub use graph::{Graph, GraphNode, build_graph};
pub use llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, OpenAICompatClient, create_client};
pub use parser::{ParsedOutput, parse_subtasks};
pub use persistence::{FileStore, KvStore, PersistenceGateway, ProjectSnapshot, StoreError};
pub use pipeline::{Orchestrator, PipelineError, PipelineResult, Stage};
pub use progress::{ProgressStatus, ProgressTracker, TaskProgress};
pub use prompts::{PromptContext, PromptLoader};
pub use state::{AppEvent, AppState, StateError};
