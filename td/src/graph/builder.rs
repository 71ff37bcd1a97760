//! Builds the mind map from a flat subtask list
//!
//! Layout is three levels: the root task, one node per phase group, and one
//! node per subtask. Containment edges are solid; dependency edges dashed.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use super::model::{Graph, GraphEdge, GraphNode, NodeKind, ROOT_ID, group_node_id, task_node_id};
use super::validate::dependency_warnings;
use crate::domain::Subtask;
use crate::progress::ProgressTracker;

const ROOT_TITLE_MAX: usize = 30;
const DESCRIPTION_MAX: usize = 50;
const UNTITLED: &str = "Untitled task";

/// Phase groups in display priority, with type tags and title keywords
///
/// English keywords must start a word; CJK keywords match anywhere.
const PHASES: [(&str, &str, &str); 4] = [
    ("Preparation", "preparation", r"\bprepar|准备"),
    ("Development", "development", r"\bdevelop|开发"),
    ("Testing", "testing", r"\btest|测试"),
    ("Deployment", "deployment", r"\bdeploy|部署"),
];

static PHASE_KEYWORDS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    PHASES
        .iter()
        .map(|(_, _, pattern)| Regex::new(pattern).expect("valid phase keyword regex"))
        .collect()
});

/// Group for subtasks matching no phase
pub const OTHER_GROUP: &str = "Other";

/// Truncate to `max` characters, marking the cut with "..."
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    }
}

/// Group a subtask belongs to
///
/// An explicit group wins; then the type tag; then a title keyword.
pub fn group_name(task: &Subtask) -> String {
    if let Some(group) = task.group.as_deref().map(str::trim).filter(|g| !g.is_empty()) {
        return group.to_string();
    }

    let task_type = task.task_type.as_deref().map(str::to_lowercase);
    let title = task.title.to_lowercase();
    for ((name, tag, _), keywords) in PHASES.iter().zip(PHASE_KEYWORDS.iter()) {
        if task_type.as_deref() == Some(*tag) || keywords.is_match(&title) {
            return name.to_string();
        }
    }
    OTHER_GROUP.to_string()
}

/// Priority desc, then complexity desc, then title asc
fn display_order(a: &Subtask, b: &Subtask) -> Ordering {
    b.priority_score()
        .cmp(&a.priority_score())
        .then_with(|| b.complexity.cmp(&a.complexity))
        .then_with(|| a.title.cmp(&b.title))
}

/// Label for the root node
pub fn root_label(title: &str, description: &str) -> String {
    let mut label = truncate(title.trim(), ROOT_TITLE_MAX);
    if !description.trim().is_empty() {
        label.push('\n');
        label.push_str(&truncate(description.trim(), DESCRIPTION_MAX));
    }
    label
}

/// Label for a task node: title, short description, then a detail line
pub fn task_label(task: &Subtask, progress: Option<u8>) -> String {
    let title = if task.title.trim().is_empty() { UNTITLED } else { task.title.trim() };
    let mut label = title.to_string();

    if !task.description.trim().is_empty() {
        label.push('\n');
        label.push_str(&truncate(task.description.trim(), DESCRIPTION_MAX));
    }

    let mut details = vec![format!("Complexity {}", task.complexity)];
    if let Some(duration) = task.duration.as_deref().filter(|d| !d.trim().is_empty()) {
        details.push(duration.trim().to_string());
    }
    if let Some(priority) = task.priority {
        details.push(format!("P{}", priority));
    }
    if let Some(percent) = progress {
        details.push(format!("{}%", percent));
    }
    label.push('\n');
    label.push_str(&details.join(" | "));
    label
}

/// Build the graph for `subtasks` under a root titled `root_title`
///
/// Re-invocation with new input produces a fresh graph; nothing carries over.
pub fn build_graph(root_title: &str, root_description: &str, subtasks: &[Subtask], progress: &ProgressTracker) -> Graph {
    debug!(count = subtasks.len(), "build_graph: called");
    let mut graph = Graph {
        warnings: dependency_warnings(subtasks),
        ..Default::default()
    };

    let mut root = GraphNode::new(ROOT_ID, NodeKind::Root, root_label(root_title, root_description));
    root.title = root_title.to_string();
    root.description = root_description.to_string();
    graph.nodes.push(root);

    // Groups in first-seen order
    let mut groups: Vec<(String, Vec<&Subtask>)> = Vec::new();
    for task in subtasks {
        let name = group_name(task);
        match groups.iter().position(|(g, _)| *g == name) {
            Some(i) => groups[i].1.push(task),
            None => groups.push((name, vec![task])),
        }
    }

    let known: HashSet<&str> = subtasks.iter().map(|s| s.id.as_str()).collect();

    for (index, (name, mut members)) in groups.into_iter().enumerate() {
        members.sort_by(|a, b| display_order(a, b));
        let group_id = group_node_id(index);
        debug!(%group_id, %name, members = members.len(), "build_graph: adding group");

        let mut group = GraphNode::new(&group_id, NodeKind::Group, format!("{} ({})", name, members.len()));
        group.title = name;
        group.parent = Some(ROOT_ID.to_string());
        graph.nodes.push(group);
        graph.edges.push(GraphEdge::contains(ROOT_ID, &group_id));

        for task in members {
            let node_id = task_node_id(&task.id);
            let tracked = progress.get(&task.id);

            let mut node = GraphNode::new(
                &node_id,
                NodeKind::Task,
                task_label(task, tracked.map(|p| p.progress)),
            );
            node.parent = Some(group_id.clone());
            node.subtask_id = Some(task.id.clone());
            node.title = task.title.clone();
            node.description = task.description.clone();
            node.complexity = task.complexity;
            node.priority = task.priority;
            node.status = tracked.map(|p| p.status);
            node.critical = task.is_critical();
            graph.nodes.push(node);
            graph.edges.push(GraphEdge::contains(&group_id, &node_id));

            for dep in &task.dependencies {
                if known.contains(dep.as_str()) {
                    graph.edges.push(GraphEdge::depends_on(task_node_id(dep), &node_id));
                }
            }
        }
    }

    info!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        warnings = graph.warnings.len(),
        "Graph built"
    );
    graph
}
