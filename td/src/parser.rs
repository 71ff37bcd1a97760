//! Response parsing for the decomposition stage
//!
//! Model output is a mix of JSON and prose. It is resolved once, here, into
//! a [`ParsedOutput`]; everything downstream works with `Vec<Subtask>`.
//!
//! Order of attempts:
//! 1. the whole reply as JSON (object → one subtask, array → many)
//! 2. the first fenced ```json block inside the reply
//! 3. line heuristics: one subtask per non-blank line
//!
//! Parsing never fails outward. Anything unusable is logged and skipped.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{Risk, RiskLevel, Subtask, clamp_score};

/// Leading ordinal marker such as "1." or "12. "
static ORDINAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\s*").expect("valid ordinal regex"));

/// Fenced code block, optionally tagged json
static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("valid fence regex"));

/// Separator between a line's title and its detail
const FULL_WIDTH_COLON: char = '：';

/// Model output after a single classification pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedOutput {
    /// Nothing structured was found; the text is kept as-is
    RawText(String),
    /// A structured task list
    StructuredList(Vec<Subtask>),
}

impl ParsedOutput {
    /// Classify a raw model reply
    pub fn parse(raw: &str) -> Self {
        debug!(raw_len = raw.len(), "ParsedOutput::parse: called");
        match structured_value(raw) {
            Some(value) => {
                debug!("ParsedOutput::parse: structured JSON found");
                Self::StructuredList(subtasks_from_value(value))
            }
            None => {
                debug!("ParsedOutput::parse: no JSON, keeping raw text");
                Self::RawText(raw.to_string())
            }
        }
    }

    /// Resolve into subtasks, applying line heuristics to raw text
    pub fn into_subtasks(self) -> Vec<Subtask> {
        match self {
            Self::StructuredList(tasks) => tasks,
            Self::RawText(text) => subtasks_from_lines(&text),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Self::StructuredList(_))
    }
}

/// Extract subtasks from a model reply
pub fn parse_subtasks(raw: &str) -> Vec<Subtask> {
    let tasks = ParsedOutput::parse(raw).into_subtasks();
    debug!(count = tasks.len(), "parse_subtasks: done");
    tasks
}

/// Find a JSON object or array in the reply
fn structured_value(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed)
        && (value.is_object() || value.is_array())
    {
        return Some(value);
    }

    let inner = FENCED_JSON.captures(trimmed)?.get(1)?.as_str();
    match serde_json::from_str::<Value>(inner.trim()) {
        Ok(value) if value.is_object() || value.is_array() => Some(value),
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "structured_value: fenced block is not valid JSON");
            None
        }
    }
}

/// Turn a JSON object/array into subtasks
///
/// A wrapper object such as `{"subtasks": [...]}` is unwrapped; any other
/// object is a single subtask.
fn subtasks_from_value(value: Value) -> Vec<Subtask> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            let wrapped = ["subtasks", "tasks"]
                .iter()
                .find_map(|key| match map.remove(*key) {
                    Some(Value::Array(items)) => Some(items),
                    Some(other) => {
                        map.insert((*key).to_string(), other);
                        None
                    }
                    None => None,
                });
            wrapped.unwrap_or_else(|| vec![Value::Object(map)])
        }
        other => {
            warn!(kind = ?other, "subtasks_from_value: unexpected JSON scalar");
            return Vec::new();
        }
    };

    let tasks = items
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| {
            let task = subtask_from_value(item);
            if task.is_none() {
                warn!(idx, "subtasks_from_value: skipping unusable item");
            }
            task.map(|t| (idx, t))
        })
        .collect();
    assign_unique_ids(tasks)
}

/// Give every subtask a distinct id
///
/// Explicit ids are kept on first use; a repeat gets a `-2`, `-3`... suffix.
/// Items without an id get `task-N` from their position, moving to the next
/// free N when an explicit id already holds it.
fn assign_unique_ids(tasks: Vec<(usize, Subtask)>) -> Vec<Subtask> {
    let explicit: HashSet<String> = tasks
        .iter()
        .filter(|(_, t)| !t.id.is_empty())
        .map(|(_, t)| t.id.clone())
        .collect();
    let mut taken: HashSet<String> = HashSet::new();

    tasks
        .into_iter()
        .map(|(idx, mut task)| {
            if task.id.is_empty() {
                let mut n = idx;
                while explicit.contains(&synthetic_id(n)) || taken.contains(&synthetic_id(n)) {
                    n += 1;
                }
                task.id = synthetic_id(n);
                if n != idx {
                    warn!(idx, id = %task.id, "assign_unique_ids: positional id already used, moved on");
                }
            } else if taken.contains(&task.id) {
                let original = task.id.clone();
                let mut suffix = 2;
                while taken.contains(&format!("{}-{}", original, suffix))
                    || explicit.contains(&format!("{}-{}", original, suffix))
                {
                    suffix += 1;
                }
                task.id = format!("{}-{}", original, suffix);
                warn!(%original, id = %task.id, "assign_unique_ids: duplicate id renamed");
            }
            taken.insert(task.id.clone());
            task
        })
        .collect()
}

/// Synthetic id for position `idx` (0-based)
fn synthetic_id(idx: usize) -> String {
    format!("task-{}", idx + 1)
}

/// Read one subtask leniently; field names and types vary between replies
///
/// The id is left empty when the item has none.
fn subtask_from_value(item: &Value) -> Option<Subtask> {
    let obj = match item {
        Value::Object(obj) => obj,
        Value::String(s) if !s.trim().is_empty() => {
            return Some(Subtask::new(String::new(), s.trim()).with_description(s.trim()));
        }
        _ => return None,
    };

    let field = |names: &[&str]| names.iter().find_map(|n| obj.get(*n)).filter(|v| !v.is_null());

    let title = field(&["title", "name", "task"]).and_then(as_text)?;
    let id = field(&["id", "taskId", "task_id"]).and_then(as_text).unwrap_or_default();

    let mut task = Subtask::new(id, title);
    task.description = field(&["description", "desc", "details"])
        .and_then(as_text)
        .unwrap_or_default();
    task.complexity = field(&["complexity"]).and_then(as_score).unwrap_or(1);
    task.priority = field(&["priority"]).and_then(as_score);
    task.duration = field(&["duration", "estimatedTime", "estimated_duration", "time"]).and_then(as_text);
    task.dependencies = field(&["dependencies", "dependsOn", "depends_on", "deps"])
        .map(as_id_list)
        .unwrap_or_default();
    task.risks = field(&["risks"]).map(as_risks).unwrap_or_default();
    task.group = field(&["group"]).and_then(as_text);
    task.task_type = field(&["type", "phase"]).and_then(as_text);
    task.is_key_path = field(&["isKeyPath", "is_key_path", "keyPath"])
        .and_then(Value::as_bool)
        .unwrap_or(false);

    Some(task)
}

/// String or number as trimmed text
fn as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Number, or string starting with digits ("4", "4/5", "3分"), clamped to 1..=5
fn as_score(value: &Value) -> Option<u8> {
    let raw = match value {
        Value::Number(n) => n.as_f64().map(|f| f.round() as i64),
        Value::String(s) => {
            let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse::<i64>().ok()
        }
        _ => None,
    }?;
    Some(clamp_score(raw))
}

/// Array of ids, a single id, or a comma-separated string
fn as_id_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(as_text).collect(),
        Value::String(s) => s
            .split([',', '，', '、'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        Value::Number(n) => vec![n.to_string()],
        _ => Vec::new(),
    }
}

/// Risks as objects with a level/severity, or plain strings (medium)
fn as_risks(value: &Value) -> Vec<Risk> {
    let Value::Array(items) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(Risk::new(RiskLevel::Medium, s.trim())),
            Value::Object(obj) => {
                let level = ["level", "severity"]
                    .iter()
                    .find_map(|k| obj.get(*k))
                    .and_then(Value::as_str)
                    .and_then(|s| s.parse::<RiskLevel>().ok())
                    .unwrap_or_default();
                let description = ["description", "risk", "name"]
                    .iter()
                    .find_map(|k| obj.get(*k))
                    .and_then(as_text)
                    .unwrap_or_default();
                Some(Risk::new(level, description))
            }
            _ => None,
        })
        .collect()
}

/// One minimal subtask per non-blank line
fn subtasks_from_lines(text: &str) -> Vec<Subtask> {
    debug!("subtasks_from_lines: called");
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(idx, line)| {
            let stripped = ORDINAL.replace(line, "");
            let title = stripped.split(FULL_WIDTH_COLON).next().unwrap_or_default().trim();
            Subtask::new(synthetic_id(idx), title).with_description(line)
        })
        .collect()
}
