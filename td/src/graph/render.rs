//! Text-tree rendering of the mind map

use colored::Colorize;

use super::model::{Graph, GraphNode, ROOT_ID};
use crate::progress::ProgressStatus;

fn status_marker(node: &GraphNode) -> String {
    match node.status {
        Some(ProgressStatus::Completed) => "[x]".green().to_string(),
        Some(ProgressStatus::InProgress) => "[~]".cyan().to_string(),
        _ => "[ ]".to_string(),
    }
}

fn task_line(node: &GraphNode) -> String {
    let mut lines = node.label.lines();
    let title = lines.next().unwrap_or_default();
    let title = if node.critical {
        title.yellow().bold().to_string()
    } else {
        title.to_string()
    };
    let rest: Vec<&str> = lines.collect();
    let mut line = format!("{} {}", status_marker(node), title);
    if let Some(details) = rest.last() {
        line.push_str(&format!(" {}", format!("({})", details).dimmed()));
    }
    line
}

/// Render visible nodes as an indented tree
///
/// Collapsed groups show a marker instead of their members; hidden tasks
/// are omitted. Dependencies are listed under each task.
pub fn render_tree(graph: &Graph) -> String {
    let mut out = String::new();
    let Some(root) = graph.node(ROOT_ID) else {
        return out;
    };

    for line in root.label.lines() {
        out.push_str(&format!("{}\n", line.bold()));
    }

    let groups: Vec<&GraphNode> = graph.groups().collect();
    for (gi, group) in groups.iter().enumerate() {
        let last_group = gi + 1 == groups.len();
        let (branch, indent) = if last_group { ("└── ", "    ") } else { ("├── ", "│   ") };

        if group.collapsed {
            out.push_str(&format!("{}{} {}\n", branch, group.label.blue().bold(), "[+]".dimmed()));
            continue;
        }
        out.push_str(&format!("{}{}\n", branch, group.label.blue().bold()));

        let tasks: Vec<&GraphNode> = graph.tasks_in(&group.id).filter(|n| !n.hidden).collect();
        for (ti, task) in tasks.iter().enumerate() {
            let last_task = ti + 1 == tasks.len();
            let task_branch = if last_task { "└── " } else { "├── " };
            out.push_str(&format!("{}{}{}\n", indent, task_branch, task_line(task)));

            let deps: Vec<String> = graph
                .edges
                .iter()
                .filter(|e| e.is_dashed() && e.to == task.id)
                .filter_map(|e| graph.node(&e.from))
                .map(|n| n.title.clone())
                .collect();
            if !deps.is_empty() {
                let dep_indent = if last_task { "    " } else { "│   " };
                out.push_str(&format!(
                    "{}{}{}\n",
                    indent,
                    dep_indent,
                    format!("after: {}", deps.join(", ")).dimmed()
                ));
            }
        }
    }

    for warning in &graph.warnings {
        out.push_str(&format!("{} {}\n", "warning:".yellow(), warning));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Subtask;
    use crate::graph::build_graph;
    use crate::progress::ProgressTracker;

    fn plain(graph: &Graph) -> String {
        colored::control::set_override(false);
        render_tree(graph)
    }

    #[test]
    fn test_tree_lists_groups_and_tasks() {
        let tasks = vec![
            Subtask::new("1", "Develop API"),
            Subtask::new("2", "Test API").with_dependencies(["1"]),
        ];
        let graph = build_graph("Ship it", "", &tasks, &ProgressTracker::new());
        let text = plain(&graph);

        assert!(text.starts_with("Ship it\n"));
        assert!(text.contains("├── Development (1)"));
        assert!(text.contains("└── Testing (1)"));
        assert!(text.contains("[ ] Develop API"));
        assert!(text.contains("after: Develop API"));
    }

    #[test]
    fn test_collapsed_group_hides_members() {
        let tasks = vec![Subtask::new("1", "Develop API")];
        let mut graph = build_graph("Ship", "", &tasks, &ProgressTracker::new());
        graph.toggle_group("group_0");

        let text = plain(&graph);
        assert!(text.contains("Development (1) [+]"));
        assert!(!text.contains("Develop API"));
    }

    #[test]
    fn test_empty_graph_renders_nothing() {
        assert!(render_tree(&Graph::default()).is_empty());
    }
}
