//! Mind map construction and interaction
//!
//! `build_graph` turns a flat subtask list into a three-level graph
//! (root → phase groups → tasks). The view methods on [`Graph`] implement
//! collapse, search, filter and position restore on top of it.

mod builder;
mod model;
mod render;
mod validate;
mod view;

pub use builder::{OTHER_GROUP, build_graph, group_name, root_label, task_label, truncate};
pub use model::{
    EdgeKind, FilterCriteria, Graph, GraphEdge, GraphNode, NodeKind, Position, ROOT_ID, group_node_id, task_node_id,
};
pub use render::render_tree;
pub use validate::{dependency_warnings, validate_dependency_graph};
