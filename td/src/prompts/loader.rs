//! Prompt Loader
//!
//! Loads prompt templates from files or falls back to embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info};

use super::embedded;
use crate::domain::{Context, Subtask};
use crate::pipeline::Stage;

/// Variables available to stage templates
///
/// Fields a stage does not use stay empty; `{{#if}}` treats them as false.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PromptContext {
    pub task: String,
    pub constraints: String,
    pub time_constraint: String,
    /// The whole Context as pretty JSON
    pub context_json: String,
    /// Output of the classify stage
    pub analysis: String,
    /// Subtask list as pretty JSON
    pub subtasks_json: String,
    /// Every prior stage output as pretty JSON
    pub aggregate_json: String,
}

impl PromptContext {
    fn from_context(ctx: &Context) -> Self {
        Self {
            task: ctx.task.clone(),
            constraints: ctx.constraints.clone(),
            time_constraint: ctx.time_constraint.clone(),
            context_json: ctx.to_prompt_json(),
            ..Default::default()
        }
    }

    pub fn classify(ctx: &Context) -> Self {
        debug!("PromptContext::classify: called");
        Self::from_context(ctx)
    }

    pub fn decompose(ctx: &Context, analysis: &str) -> Self {
        debug!(analysis_len = analysis.len(), "PromptContext::decompose: called");
        Self {
            analysis: analysis.to_string(),
            ..Self::from_context(ctx)
        }
    }

    /// Context for the stages that work from the subtask list
    pub fn with_subtasks(ctx: &Context, subtasks: &[Subtask]) -> Self {
        debug!(count = subtasks.len(), "PromptContext::with_subtasks: called");
        Self {
            subtasks_json: serde_json::to_string_pretty(subtasks).unwrap_or_else(|_| "[]".to_string()),
            ..Self::from_context(ctx)
        }
    }

    pub fn suggest(ctx: &Context, aggregate: &serde_json::Value) -> Self {
        debug!("PromptContext::suggest: called");
        Self {
            aggregate_json: serde_json::to_string_pretty(aggregate).unwrap_or_default(),
            ..Self::from_context(ctx)
        }
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    hbs: Handlebars<'static>,
    /// User override directory (`.taskdecomposer/prompts/`)
    user_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader rooted at `dir`, picking up `.taskdecomposer/prompts/` if present
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let user_dir = dir.as_ref().join(".taskdecomposer").join("prompts");
        let exists = user_dir.is_dir();
        debug!(?user_dir, %exists, "PromptLoader::new: called");
        if exists {
            info!("Using prompt overrides from {}", user_dir.display());
        }
        Self {
            hbs: Self::engine(),
            user_dir: exists.then_some(user_dir),
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            user_dir: None,
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // Prompts are plain text; JSON must reach the model unescaped
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name: user override first, then embedded
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        if let Some(ref user_dir) = self.user_dir {
            let path = user_dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found in user override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read user prompt {}: {}", path.display(), e));
            }
        }

        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render(&self, template_name: &str, context: &PromptContext) -> Result<String> {
        debug!(%template_name, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        self.hbs
            .render_template(&template, context)
            .map(|s| s.trim().to_string())
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }

    /// Render the (system, user) prompt pair for a stage
    pub fn stage_prompts(&self, stage: Stage, context: &PromptContext) -> Result<(String, String)> {
        debug!(%stage, "PromptLoader::stage_prompts: called");
        let system = self.render(&stage.system_template_name(), context)?;
        let user = self.render(stage.template_name(), context)?;
        Ok((system, user))
    }
}

impl Default for PromptLoader {
    fn default() -> Self {
        Self::embedded_only()
    }
}
