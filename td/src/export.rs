//! Report export
//!
//! Renders each analysis panel of a run as an HTML fragment and writes them
//! together as one pretty-printed JSON document.

use std::fs;
use std::path::Path;

use handlebars::html_escape;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::Subtask;
use crate::pipeline::PipelineResult;

pub const DEFAULT_REPORT_FILE: &str = "task-report.json";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Cannot render {panel}: {reason}")]
    Render { panel: &'static str, reason: String },

    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write report to {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// One HTML fragment per panel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub task_analysis: String,
    pub subtasks: String,
    pub resources: String,
    pub risks: String,
    pub timeline: String,
}

/// Escaped text with newlines as `<br>`
fn text_html(text: &str) -> String {
    html_escape(text).replace("\r\n", "\n").replace('\n', "<br>")
}

fn placeholder(panel: &'static str) -> String {
    format!("<div class=\"error-message\">Unable to display {}</div>", panel)
}

fn empty(message: &str) -> String {
    format!("<p class=\"empty\">{}</p>", message)
}

/// Render a panel, swapping in a placeholder if rendering fails
fn panel(name: &'static str, render: impl FnOnce() -> Result<String, ExportError>) -> String {
    render().unwrap_or_else(|e| {
        warn!(panel = name, error = %e, "Panel render failed, using placeholder");
        placeholder(name)
    })
}

fn field<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| item.get(*k).and_then(Value::as_str))
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Text that may hold JSON: structured when it parses as the expected shape
fn structured(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}

fn render_analysis(analysis: Option<&str>) -> Result<String, ExportError> {
    Ok(match analysis.filter(|a| !a.trim().is_empty()) {
        Some(text) => format!("<div class=\"analysis-content\">{}</div>", text_html(text)),
        None => empty("No analysis data"),
    })
}

fn render_subtask(task: &Subtask) -> String {
    let mut details = format!("<p class=\"description\">{}</p>", text_html(&task.description));
    if task.complexity > 0 {
        details.push_str(&format!("<p class=\"complexity\">Complexity: {}</p>", task.complexity));
    }
    if let Some(duration) = &task.duration {
        details.push_str(&format!("<p class=\"duration\">Duration: {}</p>", html_escape(duration)));
    }
    if !task.dependencies.is_empty() {
        details.push_str(&format!(
            "<p class=\"dependencies\">Depends on: {}</p>",
            html_escape(&task.dependencies.join(", "))
        ));
    }
    format!(
        "<div class=\"subtask-item\"><h3>{}</h3><div class=\"subtask-details\">{}</div></div>",
        html_escape(&task.title),
        details
    )
}

fn render_subtasks(subtasks: &[Subtask]) -> Result<String, ExportError> {
    if subtasks.is_empty() {
        return Ok(empty("No subtasks"));
    }
    Ok(subtasks.iter().map(render_subtask).collect())
}

fn render_resources(resources: Option<&str>) -> Result<String, ExportError> {
    let Some(text) = resources.filter(|r| !r.trim().is_empty()) else {
        return Ok(empty("No resource data"));
    };
    match structured(text) {
        Some(Value::Object(map)) => Ok(map
            .iter()
            .map(|(name, details)| {
                format!(
                    "<div class=\"resource-item\"><h4>{}</h4><p>{}</p></div>",
                    html_escape(name),
                    text_html(&value_text(details))
                )
            })
            .collect()),
        _ => Ok(text_html(text)),
    }
}

fn render_items(
    panel: &'static str,
    items: &[Value],
    render: impl Fn(&Value) -> Result<String, ExportError>,
) -> Result<String, ExportError> {
    debug!(panel, count = items.len(), "render_items: called");
    items.iter().map(render).collect()
}

fn render_risk(item: &Value) -> Result<String, ExportError> {
    if let Some(text) = item.as_str() {
        return Ok(format!("<div class=\"risk-item\"><p>{}</p></div>", text_html(text)));
    }
    if !item.is_object() {
        return Err(ExportError::Render {
            panel: "risks",
            reason: format!("unexpected item {}", item),
        });
    }
    let title = field(item, &["title", "name", "risk"]).unwrap_or("Risk");
    let description = field(item, &["description", "desc", "details"]).unwrap_or_default();
    let mut html = format!(
        "<div class=\"risk-item\"><h4>{}</h4><p>{}</p>",
        html_escape(title),
        text_html(description)
    );
    if let Some(mitigation) = field(item, &["mitigation", "response"]) {
        html.push_str(&format!("<p class=\"mitigation\">Mitigation: {}</p>", text_html(mitigation)));
    }
    html.push_str("</div>");
    Ok(html)
}

fn render_risks(risks: Option<&str>) -> Result<String, ExportError> {
    let Some(text) = risks.filter(|r| !r.trim().is_empty()) else {
        return Ok(empty("No risk assessment data"));
    };
    match structured(text) {
        Some(Value::Array(items)) => render_items("risks", &items, render_risk),
        _ => Ok(text_html(text)),
    }
}

fn render_milestone(item: &Value) -> Result<String, ExportError> {
    let Some(obj) = item.as_object() else {
        return Err(ExportError::Render {
            panel: "timeline",
            reason: format!("unexpected item {}", item),
        });
    };
    let date = field(item, &["date", "time", "week", "phase"]).unwrap_or_default();
    let title = field(item, &["title", "name", "milestone"]).unwrap_or("Milestone");
    let description = field(item, &["description", "desc", "details"])
        .map(str::to_string)
        .unwrap_or_else(|| Value::Object(obj.clone()).to_string());
    Ok(format!(
        "<div class=\"timeline-item\"><div class=\"timeline-date\">{}</div><div class=\"timeline-content\"><h4>{}</h4><p>{}</p></div></div>",
        html_escape(date),
        html_escape(title),
        text_html(&description)
    ))
}

fn render_timeline(timeline: Option<&str>) -> Result<String, ExportError> {
    let Some(text) = timeline.filter(|t| !t.trim().is_empty()) else {
        return Ok(empty("No timeline data"));
    };
    match structured(text) {
        Some(Value::Array(items)) => render_items("timeline", &items, render_milestone),
        _ => Ok(text_html(text)),
    }
}

/// Render every panel of a run
pub fn export_report(result: &PipelineResult) -> ExportReport {
    debug!(run_id = %result.run_id, "export_report: called");
    ExportReport {
        task_analysis: panel("task analysis", || render_analysis(result.analysis.as_deref())),
        subtasks: panel("subtasks", || render_subtasks(result.subtasks())),
        resources: panel("resources", || render_resources(result.resources.as_deref())),
        risks: panel("risks", || render_risks(result.risks.as_deref())),
        timeline: panel("timeline", || render_timeline(result.timeline.as_deref())),
    }
}

/// Write the report as pretty JSON
pub fn write_report(report: &ExportReport, path: &Path) -> Result<(), ExportError> {
    debug!(?path, "write_report: called");
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    info!(path = %path.display(), "Report exported");
    Ok(())
}
