//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files for the pipeline stages.
//! Each stage has a system persona (`{stage}-system`) and a user prompt
//! (`{stage}`).
//!
//! Template loading chain:
//! 1. `.taskdecomposer/prompts/{name}.pmt` (user override)
//! 2. Embedded default compiled from `td/prompts/`
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{PromptContext, PromptLoader};
