//! Dependency checks over a subtask list

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::domain::Subtask;

/// Check the dependency graph for cycles (DFS)
///
/// Returns the first cycle found as a path of ids, closing back on its start.
/// Dependencies on unknown ids are ignored here.
pub fn validate_dependency_graph(subtasks: &[Subtask]) -> Result<(), Vec<String>> {
    debug!(count = subtasks.len(), "validate_dependency_graph: called");
    let graph: HashMap<&str, &Subtask> = subtasks.iter().map(|s| (s.id.as_str(), s)).collect();

    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();
    let mut cycle_path = Vec::new();

    // Walk in list order so the reported cycle is stable
    for task in subtasks {
        let id = task.id.as_str();
        if !visited.contains(id) && has_cycle_dfs(id, &graph, &mut visited, &mut rec_stack, &mut cycle_path) {
            debug!(?cycle_path, "validate_dependency_graph: cycle detected");
            return Err(cycle_path);
        }
    }

    debug!("validate_dependency_graph: no cycles found");
    Ok(())
}

fn has_cycle_dfs<'a>(
    node: &'a str,
    graph: &HashMap<&'a str, &'a Subtask>,
    visited: &mut HashSet<&'a str>,
    rec_stack: &mut HashSet<&'a str>,
    cycle_path: &mut Vec<String>,
) -> bool {
    visited.insert(node);
    rec_stack.insert(node);
    cycle_path.push(node.to_string());

    if let Some(&task) = graph.get(node) {
        for dep in &task.dependencies {
            let dep = dep.as_str();
            if !graph.contains_key(dep) {
                continue;
            }
            if !visited.contains(dep) {
                if has_cycle_dfs(dep, graph, visited, rec_stack, cycle_path) {
                    return true;
                }
            } else if rec_stack.contains(dep) {
                debug!(%node, %dep, "has_cycle_dfs: back edge found");
                cycle_path.push(dep.to_string());
                return true;
            }
        }
    }

    rec_stack.remove(node);
    cycle_path.pop();
    false
}

/// Human-readable warnings for dangling dependencies and cycles
pub fn dependency_warnings(subtasks: &[Subtask]) -> Vec<String> {
    let known: HashSet<&str> = subtasks.iter().map(|s| s.id.as_str()).collect();
    let mut warnings = Vec::new();

    for task in subtasks {
        for dep in &task.dependencies {
            if !known.contains(dep.as_str()) {
                warn!(task = %task.id, %dep, "Dependency on unknown subtask");
                warnings.push(format!("Subtask '{}' depends on unknown subtask '{}'", task.title, dep));
            }
        }
    }

    if let Err(cycle) = validate_dependency_graph(subtasks) {
        warn!(?cycle, "Dependency cycle detected");
        warnings.push(format!("Dependency cycle: {}", cycle.join(" -> ")));
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, deps: &[&str]) -> Subtask {
        Subtask::new(id, id.to_uppercase()).with_dependencies(deps.iter().copied())
    }

    #[test]
    fn test_acyclic_graph_ok() {
        let tasks = vec![task("a", &[]), task("b", &["a"]), task("c", &["a", "b"])];
        assert!(validate_dependency_graph(&tasks).is_ok());
        assert!(dependency_warnings(&tasks).is_empty());
    }

    #[test]
    fn test_cycle_reported_with_path() {
        let tasks = vec![task("a", &["c"]), task("b", &["a"]), task("c", &["b"])];
        let cycle = validate_dependency_graph(&tasks).unwrap_err();
        assert_eq!(cycle, vec!["a", "c", "b", "a"]);
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let tasks = vec![task("a", &["a"])];
        assert!(validate_dependency_graph(&tasks).is_err());
    }

    #[test]
    fn test_unknown_dependency_warned_not_cycle() {
        let tasks = vec![task("a", &["ghost"])];
        assert!(validate_dependency_graph(&tasks).is_ok());

        let warnings = dependency_warnings(&tasks);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("ghost"));
    }
}
