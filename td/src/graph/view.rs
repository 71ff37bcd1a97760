//! Interactive view state: collapse, search, filter, saved positions
//!
//! A task node is hidden when its group is collapsed, when it does not match
//! the active search, or when it fails the active filter. Visibility is
//! recomputed from those three inputs after every change.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info};

use super::model::{FilterCriteria, Graph, GraphNode, Position};
use crate::domain::CRITICAL_SCORE;
use crate::progress::ProgressStatus;

fn matches_search(node: &GraphNode, query: &str) -> bool {
    let query = query.to_lowercase();
    node.title.to_lowercase().contains(&query) || node.description.to_lowercase().contains(&query)
}

fn matches_filter(node: &GraphNode, filter: FilterCriteria) -> bool {
    match filter {
        FilterCriteria::All => true,
        FilterCriteria::HighPriority => node.priority.unwrap_or(0) >= CRITICAL_SCORE,
        FilterCriteria::Complex => node.complexity >= CRITICAL_SCORE,
        FilterCriteria::InProgress => node.status == Some(ProgressStatus::InProgress),
        FilterCriteria::Completed => node.status == Some(ProgressStatus::Completed),
    }
}

impl Graph {
    /// Collapse or expand a group; returns the new collapsed state
    pub fn toggle_group(&mut self, group_id: &str) -> Option<bool> {
        debug!(%group_id, "Graph::toggle_group: called");
        let group = self.node_mut(group_id).filter(|n| n.is_group())?;
        group.collapsed = !group.collapsed;
        let collapsed = group.collapsed;
        self.refresh_visibility();
        Some(collapsed)
    }

    /// Collapse a group by id or display name
    pub fn collapse(&mut self, group: &str) -> bool {
        let Some(id) = self.group_by_name(group).map(|g| g.id.clone()) else {
            debug!(%group, "Graph::collapse: no such group");
            return false;
        };
        if let Some(node) = self.node_mut(&id) {
            node.collapsed = true;
        }
        self.refresh_visibility();
        true
    }

    /// Show only task nodes whose title or description contains `query`
    ///
    /// An empty query clears the search.
    pub fn search(&mut self, query: &str) -> usize {
        let query = query.trim();
        debug!(%query, "Graph::search: called");
        self.search = (!query.is_empty()).then(|| query.to_string());
        self.refresh_visibility();
        let matches = self.visible_tasks().count();
        info!(%query, matches, "Search applied");
        matches
    }

    pub fn filter(&mut self, criteria: FilterCriteria) -> usize {
        debug!(?criteria, "Graph::filter: called");
        self.filter = criteria;
        self.refresh_visibility();
        self.visible_tasks().count()
    }

    /// Recompute `hidden` on every task node
    pub fn refresh_visibility(&mut self) {
        let collapsed: Vec<String> = self
            .groups()
            .filter(|g| g.collapsed)
            .map(|g| g.id.clone())
            .collect();
        let search = self.search.clone();
        let filter = self.filter;

        for node in self.nodes.iter_mut().filter(|n| n.is_task()) {
            let in_collapsed = node.parent.as_ref().is_some_and(|p| collapsed.contains(p));
            let searched_out = search.as_deref().is_some_and(|q| !matches_search(node, q));
            node.hidden = in_collapsed || searched_out || !matches_filter(node, filter);
        }
    }

    pub fn visible_tasks(&self) -> impl Iterator<Item = &GraphNode> {
        self.tasks().filter(|n| !n.hidden)
    }

    /// Reapply saved coordinates by node id; returns how many matched
    pub fn restore_positions(&mut self, positions: &HashMap<String, Position>) -> usize {
        let mut restored = 0;
        for node in &mut self.nodes {
            if let Some(pos) = positions.get(&node.id) {
                node.position = Some(*pos);
                restored += 1;
            }
        }
        debug!(restored, saved = positions.len(), "Graph::restore_positions: done");
        restored
    }

    /// Current coordinates, for saving
    pub fn positions(&self) -> BTreeMap<String, Position> {
        self.nodes
            .iter()
            .filter_map(|n| n.position.map(|p| (n.id.clone(), p)))
            .collect()
    }

    /// Record a node's coordinates (e.g. after a drag)
    pub fn move_node(&mut self, id: &str, position: Position) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.position = Some(position);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Subtask;
    use crate::graph::build_graph;
    use crate::progress::ProgressTracker;

    fn graph() -> Graph {
        let tasks = vec![
            Subtask::new("1", "Develop API").with_description("REST endpoints").with_priority(5),
            Subtask::new("2", "Develop UI").with_complexity(4),
            Subtask::new("3", "Load testing").with_description("soak the api"),
        ];
        let mut progress = ProgressTracker::new();
        progress.seed(["1", "2", "3"]);
        progress.update("1", 50, None);
        progress.update("3", 100, None);
        build_graph("Ship", "", &tasks, &progress)
    }

    fn visible(graph: &Graph) -> Vec<&str> {
        graph.visible_tasks().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn test_toggle_group_hides_members() {
        let mut g = graph();
        assert_eq!(g.toggle_group("group_0"), Some(true));
        assert_eq!(visible(&g), vec!["task_3"]);

        assert_eq!(g.toggle_group("group_0"), Some(false));
        assert_eq!(visible(&g).len(), 3);
    }

    #[test]
    fn test_toggle_non_group_is_none() {
        let mut g = graph();
        assert_eq!(g.toggle_group("task_1"), None);
        assert_eq!(g.toggle_group("group_9"), None);
    }

    #[test]
    fn test_search_is_case_insensitive_over_description() {
        let mut g = graph();
        assert_eq!(g.search("API"), 2);
        assert_eq!(visible(&g), vec!["task_1", "task_3"]);

        assert_eq!(g.search(""), 3);
        assert!(g.search.is_none());
    }

    #[test]
    fn test_filters() {
        let mut g = graph();
        assert_eq!(g.filter(FilterCriteria::HighPriority), 1);
        assert_eq!(g.filter(FilterCriteria::Complex), 1);
        assert_eq!(visible(&g), vec!["task_2"]);
        assert_eq!(g.filter(FilterCriteria::InProgress), 1);
        assert_eq!(g.filter(FilterCriteria::Completed), 1);
        assert_eq!(visible(&g), vec!["task_3"]);
        assert_eq!(g.filter(FilterCriteria::All), 3);
    }

    #[test]
    fn test_search_and_collapse_combine() {
        let mut g = graph();
        g.search("develop");
        assert!(g.collapse("Development"));
        assert!(visible(&g).is_empty());
        assert!(!g.collapse("Nope"));
    }

    #[test]
    fn test_restore_positions_by_id() {
        let mut g = graph();
        let saved = HashMap::from([
            ("main".to_string(), Position::new(0.0, 0.0)),
            ("task_2".to_string(), Position::new(120.5, 80.0)),
            ("task_gone".to_string(), Position::new(1.0, 1.0)),
        ]);

        assert_eq!(g.restore_positions(&saved), 2);
        assert_eq!(g.node("task_2").unwrap().position, Some(Position::new(120.5, 80.0)));
        assert_eq!(g.positions().len(), 2);

        assert!(g.move_node("task_1", Position::new(5.0, 5.0)));
        assert_eq!(g.positions().len(), 3);
    }
}
