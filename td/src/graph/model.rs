//! Mind map node/edge model

use serde::{Deserialize, Serialize};

use crate::progress::ProgressStatus;

/// Id of the single root node
pub const ROOT_ID: &str = "main";

/// Node id for a subtask
pub fn task_node_id(subtask_id: &str) -> String {
    format!("task_{}", subtask_id)
}

/// Node id for the group at position `index`
pub fn group_node_id(index: usize) -> String {
    format!("group_{}", index)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Root,
    Group,
    Task,
}

impl NodeKind {
    /// Depth in the hierarchy
    pub fn level(&self) -> u8 {
        match self {
            Self::Root => 0,
            Self::Group => 1,
            Self::Task => 2,
        }
    }
}

/// Saved canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    pub level: u8,
    /// Multi-line display label
    pub label: String,
    /// Group node id for tasks, root id for groups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Subtask this node renders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtask_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub complexity: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProgressStatus>,
    #[serde(default)]
    pub critical: bool,
    #[serde(default)]
    pub hidden: bool,
    /// Only meaningful on group nodes
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, kind: NodeKind, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            level: kind.level(),
            label: label.into(),
            parent: None,
            subtask_id: None,
            title: String::new(),
            description: String::new(),
            complexity: 0,
            priority: None,
            status: None,
            critical: false,
            hidden: false,
            collapsed: false,
            position: None,
        }
    }

    pub fn is_task(&self) -> bool {
        self.kind == NodeKind::Task
    }

    pub fn is_group(&self) -> bool {
        self.kind == NodeKind::Group
    }

    /// Fill colour by progress; critical tasks keep an orange border elsewhere
    pub fn color(&self) -> &'static str {
        match (self.kind, self.status) {
            (NodeKind::Root, _) => "#1976d2",
            (NodeKind::Group, _) => "#f5f5f5",
            (NodeKind::Task, Some(ProgressStatus::Completed)) => "#4caf50",
            (NodeKind::Task, Some(ProgressStatus::InProgress)) => "#2196f3",
            (NodeKind::Task, _) if self.critical => "#fff3e0",
            (NodeKind::Task, _) => "#ffffff",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Solid: root→group, group→task
    Contains,
    /// Dashed: dependency→dependent
    DependsOn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

impl GraphEdge {
    pub fn contains(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind: EdgeKind::Contains,
        }
    }

    pub fn depends_on(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind: EdgeKind::DependsOn,
        }
    }

    pub fn is_dashed(&self) -> bool {
        self.kind == EdgeKind::DependsOn
    }
}

/// Task node filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterCriteria {
    #[default]
    All,
    HighPriority,
    Complex,
    InProgress,
    Completed,
}

impl std::str::FromStr for FilterCriteria {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "high-priority" | "high" => Ok(Self::HighPriority),
            "complex" => Ok(Self::Complex),
            "in-progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(format!(
                "unknown filter '{}' (expected one of: all, high-priority, complex, in-progress, completed)",
                other
            )),
        }
    }
}

/// The derived mind map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    /// Dangling dependencies and cycles found while building
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default)]
    pub filter: FilterCriteria,
}

impl Graph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut GraphNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn groups(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().filter(|n| n.is_group())
    }

    pub fn tasks(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().filter(|n| n.is_task())
    }

    /// Task nodes under a group, in display order
    pub fn tasks_in<'a>(&'a self, group_id: &'a str) -> impl Iterator<Item = &'a GraphNode> + 'a {
        self.tasks().filter(move |n| n.parent.as_deref() == Some(group_id))
    }

    /// Find a group node by its display name
    pub fn group_by_name(&self, name: &str) -> Option<&GraphNode> {
        self.groups().find(|g| g.title.eq_ignore_ascii_case(name) || g.id == name)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_ids() {
        assert_eq!(task_node_id("7"), "task_7");
        assert_eq!(group_node_id(0), "group_0");
    }

    #[test]
    fn test_levels_follow_kind() {
        assert_eq!(GraphNode::new(ROOT_ID, NodeKind::Root, "").level, 0);
        assert_eq!(GraphNode::new("group_0", NodeKind::Group, "").level, 1);
        assert_eq!(GraphNode::new("task_a", NodeKind::Task, "").level, 2);
    }

    #[test]
    fn test_filter_parses() {
        assert_eq!("high-priority".parse::<FilterCriteria>().unwrap(), FilterCriteria::HighPriority);
        assert_eq!("In-Progress".parse::<FilterCriteria>().unwrap(), FilterCriteria::InProgress);
        assert!("urgent".parse::<FilterCriteria>().is_err());
    }

    #[test]
    fn test_task_colour_follows_status() {
        let mut node = GraphNode::new("task_a", NodeKind::Task, "");
        assert_eq!(node.color(), "#ffffff");
        node.status = Some(ProgressStatus::Completed);
        assert_eq!(node.color(), "#4caf50");
    }
}
