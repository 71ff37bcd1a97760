//! TaskDecomposer - staged LLM task decomposition
//!
//! CLI entry point: runs the pipeline, edits and tracks the saved plan.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context as _, Result, bail, eyre};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use taskdecomposer::cli::{Cli, Command, GraphFormat, generate_after_help};
use taskdecomposer::config::Config;
use taskdecomposer::domain::{ComplexityLevel, Context, Domain, Feedback, FeedbackKind};
use taskdecomposer::events::{create_event_bus, spawn_status_printer};
use taskdecomposer::export::{export_report, write_report};
use taskdecomposer::graph::{FilterCriteria, Position, render_tree};
use taskdecomposer::llm::create_client;
use taskdecomposer::persistence::{FileStore, PersistenceGateway, ProjectSnapshot, save_state, spawn_autosave};
use taskdecomposer::pipeline::{Orchestrator, PipelineResult};
use taskdecomposer::prompts::PromptLoader;
use taskdecomposer::state::{AppEvent, AppState};
use taskdecomposer::templates::{TEMPLATES, find_template};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskdecomposer")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("taskdecomposer.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(dir) = cli.state_dir {
        debug!(?dir, "main: state dir overridden on command line");
        config.storage.state_dir = dir;
    }
    info!(
        model = %config.llm.model,
        state_dir = %config.storage.state_dir.display(),
        "TaskDecomposer loaded config"
    );

    let gateway = Arc::new(PersistenceGateway::new(Arc::new(FileStore::new(
        &config.storage.state_dir,
    ))));
    let state = load_state(&gateway);

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Run {
            task,
            constraints,
            domain,
            complexity,
            time,
        }) => {
            let context = merge_form(&state.form, task, constraints, domain, complexity, time);
            cmd_run(&config, gateway, state, context).await
        }
        Some(Command::Show { json }) => cmd_show(&state, json),
        Some(Command::Graph {
            format,
            search,
            filter,
            collapse,
        }) => cmd_graph(&state, format, search.as_deref(), filter, &collapse),
        Some(Command::Progress { id, percent, note }) => cmd_progress(&gateway, state, id, percent, note),
        Some(Command::Edit {
            id,
            title,
            description,
            complexity,
            priority,
            duration,
            depends_on,
        }) => {
            let edit = SubtaskEdit {
                title,
                description,
                complexity,
                priority,
                duration,
                depends_on,
            };
            cmd_edit(&gateway, state, &id, edit)
        }
        Some(Command::Move { node, x, y }) => cmd_move(&gateway, state, node, Position::new(x, y)),
        Some(Command::Export { output }) => cmd_export(&state, &output),
        Some(Command::Templates) => cmd_templates(),
        Some(Command::Template { name }) => cmd_template(&gateway, state, &name),
        Some(Command::Reset) => cmd_reset(&gateway, state),
        None => {
            debug!("main: no command specified, showing saved plan");
            cmd_show(&state, false)
        }
    }
}

/// Rebuild state from whatever was saved; anything missing starts empty
fn load_state(gateway: &PersistenceGateway) -> AppState {
    let snapshot = gateway.load_project().unwrap_or_else(ProjectSnapshot::default);
    let last_result = gateway.load_last_result();
    let positions = gateway.load_positions();
    AppState::restore(snapshot, last_result, &positions)
}

fn persist(state: &AppState, gateway: &PersistenceGateway) {
    if !save_state(state, gateway) {
        eprintln!("{} failed to save state (see log)", "warning:".yellow());
    }
}

/// A new task starts a fresh form; otherwise options adjust the saved one
fn merge_form(
    saved: &Context,
    task: Option<String>,
    constraints: Option<String>,
    domain: Option<Domain>,
    complexity: Option<ComplexityLevel>,
    time: Option<String>,
) -> Context {
    let mut form = match task {
        Some(task) => Context::new(task),
        None => saved.clone(),
    };
    if let Some(constraints) = constraints {
        form.constraints = constraints;
    }
    if let Some(domain) = domain {
        form.domain = domain;
    }
    if let Some(complexity) = complexity {
        form.complexity = complexity;
    }
    if let Some(time) = time {
        form.time_constraint = time;
    }
    form
}

/// Run the pipeline with live status, autosave and Ctrl-C handling
async fn cmd_run(config: &Config, gateway: Arc<PersistenceGateway>, mut state: AppState, context: Context) -> Result<()> {
    debug!(task = %context.task, "cmd_run: called");
    config.validate()?;
    let client = create_client(&config.llm, &config.retry).context("Failed to create LLM client")?;
    let cwd = std::env::current_dir().context("Failed to read current directory")?;

    state.apply(AppEvent::FormChanged(context.clone()))?;
    let state = Arc::new(Mutex::new(state));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let autosave = spawn_autosave(state.clone(), gateway, config.autosave.interval(), shutdown_rx);

    let bus = create_event_bus();
    let printer = spawn_status_printer(&bus);
    let orchestrator = Orchestrator::new(client, PromptLoader::new(cwd), bus);

    let outcome = tokio::select! {
        result = orchestrator.run(context) => Some(result),
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted during run");
            None
        }
    };

    let outcome = match outcome {
        Some(result) => {
            // Printer stops on the run's final status
            let _ = printer.await;
            result
        }
        None => {
            printer.abort();
            let _ = shutdown_tx.send(true);
            if let Err(e) = autosave.await {
                warn!(error = %e, "Autosave task failed during interrupt");
            }
            bail!("Interrupted; state saved");
        }
    };

    let result = match outcome {
        Ok(result) => {
            let mut state = state.lock().await;
            state.apply(AppEvent::DecompositionFinished(result))?;
            println!("{}", render_tree(&state.graph));
            Ok(())
        }
        Err(e) => {
            let message = e.to_string();
            if let Some(partial) = e.into_partial()
                && partial.subtasks.is_some()
            {
                info!("Keeping subtasks from partial run");
                state.lock().await.apply(AppEvent::DecompositionFinished(partial))?;
            }
            Err(eyre!(message))
        }
    };

    let _ = shutdown_tx.send(true);
    autosave.await.context("Autosave task failed")?;
    result
}

fn feedback_line(feedback: &Feedback) -> String {
    let icon = match feedback.kind {
        FeedbackKind::Success => "✓".green(),
        FeedbackKind::Warning => "!".yellow(),
        FeedbackKind::Error => "✗".red(),
        FeedbackKind::Info => "i".blue(),
    };
    format!("  {} {}", icon, feedback.message)
}

fn print_section(title: &str, body: Option<&str>) {
    if let Some(body) = body.filter(|b| !b.trim().is_empty()) {
        println!("\n{}", title.bold().underline());
        println!("{}", body.trim());
    }
}

fn cmd_show(state: &AppState, json: bool) -> Result<()> {
    debug!(json, "cmd_show: called");
    if json {
        let Some(result) = &state.last_result else {
            bail!("No decomposition saved yet; run `td run <task>` first");
        };
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    if state.form.is_blank() && state.subtasks.is_empty() {
        println!("Nothing saved yet. Start with `td run <task>` or `td template <name>`.");
        return Ok(());
    }

    let form = &state.form;
    println!("{} {}", "Task:".bold(), form.task);
    println!(
        "{} {} | {} {} | {} {}",
        "Domain:".bold(),
        form.domain,
        "Complexity:".bold(),
        form.complexity,
        "Time:".bold(),
        if form.time_constraint.is_empty() { "-" } else { &form.time_constraint }
    );
    if !form.constraints.is_empty() {
        println!("{} {}", "Constraints:".bold(), form.constraints);
    }

    let result: Option<&PipelineResult> = state.last_result.as_ref();
    print_section("Analysis", result.and_then(|r| r.analysis.as_deref()));

    if !state.subtasks.is_empty() {
        println!("\n{}", "Subtasks".bold().underline());
        for task in &state.subtasks {
            let status = state.progress.status(&task.id);
            let mut line = format!(
                "  {:>4}  {}  {}% {}",
                task.id,
                task.title,
                state.progress.percent(&task.id),
                status.as_str().dimmed()
            );
            if task.is_critical() {
                line.push_str(&format!(" {}", "critical".yellow()));
            }
            println!("{}", line);
            if !task.dependencies.is_empty() {
                println!("        after: {}", task.dependencies.join(", ").dimmed());
            }
        }
        let counts = state.progress.counts();
        println!(
            "  {} completed, {} in progress, {} pending",
            counts.completed, counts.in_progress, counts.pending
        );
    }

    print_section("Resources", result.and_then(|r| r.resources.as_deref()));
    print_section("Risks", result.and_then(|r| r.risks.as_deref()));
    print_section("Timeline", result.and_then(|r| r.timeline.as_deref()));
    print_section("Suggestions", result.and_then(|r| r.suggestions.as_deref()));

    if !state.feedback.is_empty() {
        println!("\n{}", "Feedback".bold().underline());
        for feedback in &state.feedback {
            println!("{}", feedback_line(feedback));
        }
    }
    Ok(())
}

fn cmd_graph(
    state: &AppState,
    format: GraphFormat,
    search: Option<&str>,
    filter: Option<FilterCriteria>,
    collapse: &[String],
) -> Result<()> {
    debug!(?format, ?search, ?filter, ?collapse, "cmd_graph: called");
    let mut graph = state.graph.clone();
    if graph.is_empty() {
        bail!("No graph yet; run `td run <task>` first");
    }

    for group in collapse {
        if !graph.collapse(group) {
            eprintln!("{} no group named '{}'", "warning:".yellow(), group);
        }
    }
    if let Some(query) = search {
        graph.search(query);
    }
    if let Some(filter) = filter {
        graph.filter(filter);
    }

    match format {
        GraphFormat::Tree => println!("{}", render_tree(&graph)),
        GraphFormat::Json => println!("{}", serde_json::to_string_pretty(&graph)?),
    }
    Ok(())
}

fn cmd_progress(
    gateway: &PersistenceGateway,
    mut state: AppState,
    id: String,
    percent: i64,
    note: Option<String>,
) -> Result<()> {
    debug!(%id, percent, "cmd_progress: called");
    state
        .apply(AppEvent::ProgressUpdated {
            id: id.clone(),
            percent,
            note,
        })
        .context("Failed to update progress")?;
    persist(&state, gateway);

    println!(
        "{} {}: {}% ({})",
        "✓".green(),
        id,
        state.progress.percent(&id),
        state.progress.status(&id)
    );
    Ok(())
}

/// Fields to change on a subtask; `None` leaves the field alone
struct SubtaskEdit {
    title: Option<String>,
    description: Option<String>,
    complexity: Option<u8>,
    priority: Option<u8>,
    duration: Option<String>,
    depends_on: Option<Vec<String>>,
}

fn cmd_edit(gateway: &PersistenceGateway, mut state: AppState, id: &str, edit: SubtaskEdit) -> Result<()> {
    debug!(%id, "cmd_edit: called");
    let mut subtask = state
        .subtask(id)
        .cloned()
        .ok_or_else(|| eyre!("Subtask not found: {}", id))?;

    if let Some(title) = edit.title {
        subtask.title = title;
    }
    if let Some(description) = edit.description {
        subtask.description = description;
    }
    if let Some(complexity) = edit.complexity {
        subtask.complexity = complexity;
    }
    if let Some(priority) = edit.priority {
        subtask.priority = Some(priority);
    }
    if let Some(duration) = edit.duration {
        subtask.duration = Some(duration);
    }
    if let Some(deps) = edit.depends_on {
        subtask.dependencies = deps.into_iter().map(|d| d.trim().to_string()).filter(|d| !d.is_empty()).collect();
    }

    state
        .apply(AppEvent::SubtaskEdited(subtask))
        .context("Failed to edit subtask")?;
    persist(&state, gateway);

    println!("{} updated subtask {}", "✓".green(), id);
    for warning in &state.graph.warnings {
        eprintln!("{} {}", "warning:".yellow(), warning);
    }
    Ok(())
}

fn cmd_move(gateway: &PersistenceGateway, mut state: AppState, node: String, position: Position) -> Result<()> {
    debug!(%node, x = position.x, y = position.y, "cmd_move: called");
    state
        .apply(AppEvent::NodeMoved {
            id: node.clone(),
            position,
        })
        .context("Failed to move node")?;
    persist(&state, gateway);

    println!("{} moved {} to ({}, {})", "✓".green(), node, position.x, position.y);
    Ok(())
}

fn cmd_export(state: &AppState, output: &Path) -> Result<()> {
    debug!(?output, "cmd_export: called");
    let Some(result) = &state.last_result else {
        bail!("Nothing to export; run `td run <task>` first");
    };
    write_report(&export_report(result), output)?;
    println!("{} report written to {}", "✓".green(), output.display());
    Ok(())
}

fn cmd_templates() -> Result<()> {
    debug!("cmd_templates: called");
    let mut category = "";
    for template in &TEMPLATES {
        if template.category != category {
            category = template.category;
            println!("{}", category.bold());
        }
        println!(
            "  {:<16} {:<9} {:<8} {:<9} {}",
            template.id,
            template.domain.as_str(),
            template.complexity.as_str(),
            template.time_constraint,
            template.description.dimmed()
        );
    }
    Ok(())
}

fn cmd_template(gateway: &PersistenceGateway, mut state: AppState, name: &str) -> Result<()> {
    debug!(%name, "cmd_template: called");
    let Some(template) = find_template(name) else {
        let ids: Vec<&str> = TEMPLATES.iter().map(|t| t.id).collect();
        bail!("Unknown template '{}' (available: {})", name, ids.join(", "));
    };

    state.apply(AppEvent::FormChanged(template.to_context()))?;
    persist(&state, gateway);

    println!("{} loaded template '{}'", "✓".green(), template.id);
    println!("  {}", template.description);
    println!("Run `td run` to decompose it.");
    Ok(())
}

fn cmd_reset(gateway: &PersistenceGateway, mut state: AppState) -> Result<()> {
    debug!("cmd_reset: called");
    state.apply(AppEvent::Reset)?;
    gateway.clear().context("Failed to clear saved state")?;
    println!("{} cleared form, results and progress", "✓".green());
    Ok(())
}
