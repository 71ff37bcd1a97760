//! CLI command definitions and subcommands

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::debug;

use crate::config::LlmConfig;
use crate::domain::{ComplexityLevel, Domain};
use crate::export::DEFAULT_REPORT_FILE;
use crate::graph::FilterCriteria;

/// TaskDecomposer - staged LLM task decomposition
#[derive(Parser)]
#[command(
    name = "td",
    about = "Break a task into subtasks with an LLM, then track them as a mind map",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Directory for saved state (overrides config storage.state-dir)
    #[arg(long = "state-dir", global = true)]
    pub state_dir: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Decompose a task through the full analysis pipeline
    Run {
        /// Task to decompose (defaults to the saved form, e.g. from `template`)
        task: Option<String>,

        /// Constraints the plan must respect
        #[arg(long)]
        constraints: Option<String>,

        /// Task domain (general, tech, business, research, education, personal)
        #[arg(short, long)]
        domain: Option<Domain>,

        /// Complexity level (simple, medium, complex)
        #[arg(long)]
        complexity: Option<ComplexityLevel>,

        /// Time available, free text (e.g. "2 weeks")
        #[arg(short, long)]
        time: Option<String>,
    },

    /// Show the last decomposition with progress
    Show {
        /// Print the stored result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render the mind map
    Graph {
        /// Output format
        #[arg(short, long, default_value = "tree")]
        format: GraphFormat,

        /// Only show tasks whose title or description contains this
        #[arg(short, long)]
        search: Option<String>,

        /// Filter tasks (all, high-priority, complex, in-progress, completed)
        #[arg(long)]
        filter: Option<FilterCriteria>,

        /// Collapse a group by name (repeatable)
        #[arg(long)]
        collapse: Vec<String>,
    },

    /// Record progress on a subtask
    Progress {
        /// Subtask id
        id: String,

        /// Percent complete; clamped to 0-100
        #[arg(allow_hyphen_values = true)]
        percent: i64,

        /// Note to attach
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Edit a subtask
    Edit {
        /// Subtask id
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Complexity score 1-5
        #[arg(long)]
        complexity: Option<u8>,

        /// Priority score 1-5
        #[arg(long)]
        priority: Option<u8>,

        #[arg(long)]
        duration: Option<String>,

        /// Replacement dependency list, comma separated
        #[arg(long = "depends-on", value_delimiter = ',')]
        depends_on: Option<Vec<String>>,
    },

    /// Place a mind map node; the position is saved and kept across rebuilds
    Move {
        /// Node id (e.g. main, group_0, task_3) or a subtask id
        node: String,

        #[arg(allow_hyphen_values = true)]
        x: f64,

        #[arg(allow_hyphen_values = true)]
        y: f64,
    },

    /// Export the last decomposition as a JSON report of HTML panels
    Export {
        /// Output file
        #[arg(short, long, default_value = DEFAULT_REPORT_FILE)]
        output: PathBuf,
    },

    /// List built-in project templates
    Templates,

    /// Load a template into the form
    Template {
        /// Template id (see `td templates`)
        name: String,
    },

    /// Clear the form, results and progress
    Reset,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    #[default]
    Tree,
    Json,
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskdecomposer")
        .join("logs")
        .join("taskdecomposer.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Generate the after_help text with API key status and log location
pub fn generate_after_help() -> String {
    debug!("generate_after_help: called");
    let key_env = LlmConfig::default().api_key_env;
    let key_set = std::env::var(&key_env).is_ok_and(|v| !v.trim().is_empty());

    let mut help = String::new();
    help.push_str("API Key:\n");
    let icon = if key_set { "\u{2705}" } else { "\u{274C}" };
    let state = if key_set { "set" } else { "not set" };
    help.push_str(&format!("  {} {:<20} {}\n", icon, key_env, state));

    help.push('\n');
    help.push_str("Logs:\n");
    help.push_str(&format!("  {}\n", get_log_path().display()));
    help
}
