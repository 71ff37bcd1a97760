//! AppState - everything the user is working on
//!
//! Owned by the binary and shared with the autosave task as
//! `Arc<tokio::sync::Mutex<AppState>>`. The graph is derived: it is rebuilt
//! whenever subtasks or progress change.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use super::messages::{AppEvent, StateError};
use crate::domain::{ComplexityLevel, Context, Domain, Feedback, Subtask, clamp_score};
use crate::graph::{Graph, Position, build_graph, task_node_id};
use crate::persistence::ProjectSnapshot;
use crate::pipeline::PipelineResult;
use crate::progress::ProgressTracker;

#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// Current form inputs
    pub form: Context,
    pub subtasks: Vec<Subtask>,
    pub progress: ProgressTracker,
    pub last_result: Option<PipelineResult>,
    pub graph: Graph,
    pub feedback: Vec<Feedback>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from saved documents
    ///
    /// Progress entries are seeded for any subtask lacking one, and saved
    /// node positions are reapplied to the fresh graph.
    pub fn restore(
        snapshot: ProjectSnapshot,
        last_result: Option<PipelineResult>,
        positions: &HashMap<String, Position>,
    ) -> Self {
        debug!(subtasks = snapshot.subtasks.len(), "AppState::restore: called");
        let domain = snapshot.domain.parse::<Domain>().unwrap_or_else(|e| {
            if !snapshot.domain.is_empty() {
                warn!(error = %e, "Saved domain not recognised, using default");
            }
            Domain::default()
        });
        let complexity = snapshot.complexity.parse::<ComplexityLevel>().unwrap_or_else(|e| {
            if !snapshot.complexity.is_empty() {
                warn!(error = %e, "Saved complexity not recognised, using default");
            }
            ComplexityLevel::default()
        });

        let form = Context::new(snapshot.main_task)
            .with_constraints(snapshot.constraints)
            .with_domain(domain)
            .with_complexity(complexity)
            .with_time_constraint(snapshot.time_constraint);

        let mut state = Self {
            form,
            subtasks: snapshot.subtasks,
            progress: ProgressTracker::from_entries(snapshot.progress),
            last_result,
            ..Default::default()
        };
        state.progress.seed(state.subtasks.iter().map(|s| s.id.as_str()));
        state.rebuild_graph();
        state.graph.restore_positions(positions);
        info!(subtasks = state.subtasks.len(), "State restored");
        state
    }

    /// Persistable view of the current state
    pub fn snapshot(&self) -> ProjectSnapshot {
        ProjectSnapshot {
            main_task: self.form.task.clone(),
            constraints: self.form.constraints.clone(),
            domain: self.form.domain.to_string(),
            complexity: self.form.complexity.to_string(),
            time_constraint: self.form.time_constraint.clone(),
            subtasks: self.subtasks.clone(),
            progress: self.progress.snapshot(),
            last_modified: None,
        }
    }

    pub fn subtask(&self, id: &str) -> Option<&Subtask> {
        self.subtasks.iter().find(|s| s.id == id)
    }

    /// Rebuild the graph, keeping positions, collapsed groups, search and filter
    pub fn rebuild_graph(&mut self) {
        let positions: HashMap<String, Position> = self.graph.positions().into_iter().collect();
        let collapsed: Vec<String> = self
            .graph
            .groups()
            .filter(|g| g.collapsed)
            .map(|g| g.title.clone())
            .collect();
        let search = self.graph.search.take();
        let filter = self.graph.filter;

        self.graph = build_graph(&self.form.task, &self.form.constraints, &self.subtasks, &self.progress);
        self.graph.restore_positions(&positions);
        self.graph.search = search;
        self.graph.filter = filter;
        for node in self.graph.nodes.iter_mut().filter(|n| n.is_group()) {
            node.collapsed = collapsed.contains(&node.title);
        }
        self.graph.refresh_visibility();
    }

    /// Apply one edit-flow message
    pub fn apply(&mut self, event: AppEvent) -> Result<(), StateError> {
        debug!(event = event.name(), "AppState::apply: called");
        match event {
            AppEvent::DecompositionFinished(result) => {
                self.form = result.context.clone();
                self.subtasks = result.subtasks().to_vec();
                self.feedback = result.feedback.clone();
                // A new decomposition starts progress from scratch
                self.progress.clear();
                self.progress.seed(self.subtasks.iter().map(|s| s.id.as_str()));
                self.last_result = Some(result);
                self.graph = Graph::default();
                self.rebuild_graph();
            }
            AppEvent::SubtaskEdited(mut edited) => {
                if edited.title.trim().is_empty() {
                    return Err(StateError::Invalid("title must not be empty".to_string()));
                }
                edited.complexity = clamp_score(edited.complexity as i64);
                edited.priority = edited.priority.map(|p| clamp_score(p as i64));

                let slot = self
                    .subtasks
                    .iter_mut()
                    .find(|s| s.id == edited.id)
                    .ok_or_else(|| StateError::NotFound(edited.id.clone()))?;
                *slot = edited.clone();

                if let Some(result) = self.last_result.as_mut()
                    && let Some(subtasks) = result.subtasks.as_mut()
                    && let Some(stored) = subtasks.iter_mut().find(|s| s.id == edited.id)
                {
                    *stored = edited.clone();
                }

                self.progress.seed([edited.id.as_str()]);
                self.rebuild_graph();
                info!(id = %edited.id, "Subtask edited");
            }
            AppEvent::ProgressUpdated { id, percent, note } => {
                if !self.progress.update(&id, percent, note.as_deref()) {
                    return Err(StateError::NotFound(id));
                }
                self.rebuild_graph();
            }
            AppEvent::NodeMoved { id, position } => {
                let moved = self.graph.move_node(&id, position) || self.graph.move_node(&task_node_id(&id), position);
                if !moved {
                    return Err(StateError::NodeNotFound(id));
                }
                debug!(%id, x = position.x, y = position.y, "AppState::apply: node moved");
            }
            AppEvent::FormChanged(form) => {
                self.form = form;
                self.rebuild_graph();
            }
            AppEvent::Reset => {
                info!("State reset");
                *self = Self::default();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressStatus;

    fn finished() -> PipelineResult {
        let mut result = PipelineResult::new("run-1", Context::new("Ship v2").with_domain(Domain::Tech));
        result.subtasks = Some(vec![
            Subtask::new("1", "Develop API").with_complexity(3),
            Subtask::new("2", "Test API").with_dependencies(["1"]),
        ]);
        result
    }

    fn state() -> AppState {
        let mut state = AppState::new();
        state.apply(AppEvent::DecompositionFinished(finished())).unwrap();
        state
    }

    #[test]
    fn test_decomposition_seeds_progress_and_graph() {
        let state = state();
        assert_eq!(state.form.task, "Ship v2");
        assert_eq!(state.progress.len(), 2);
        assert_eq!(state.progress.status("1"), ProgressStatus::Pending);
        assert!(state.graph.node("task_2").is_some());
    }

    #[test]
    fn test_new_decomposition_resets_progress() {
        let mut state = state();
        state
            .apply(AppEvent::ProgressUpdated {
                id: "1".to_string(),
                percent: 50,
                note: None,
            })
            .unwrap();

        state.apply(AppEvent::DecompositionFinished(finished())).unwrap();
        assert_eq!(state.progress.percent("1"), 0);
    }

    #[test]
    fn test_edit_replaces_subtask_and_rebuilds() {
        let mut state = state();
        let edited = Subtask::new("2", "Deploy API").with_complexity(9);
        state.apply(AppEvent::SubtaskEdited(edited)).unwrap();

        let stored = state.subtask("2").unwrap();
        assert_eq!(stored.title, "Deploy API");
        assert_eq!(stored.complexity, 5);
        assert!(stored.dependencies.is_empty());
        assert_eq!(state.graph.node("task_2").unwrap().title, "Deploy API");
        assert!(state.graph.group_by_name("Deployment").is_some());

        let in_result = &state.last_result.as_ref().unwrap().subtasks()[1];
        assert_eq!(in_result.title, "Deploy API");
    }

    #[test]
    fn test_edit_unknown_or_blank_rejected() {
        let mut state = state();
        assert!(matches!(
            state.apply(AppEvent::SubtaskEdited(Subtask::new("zz", "X"))),
            Err(StateError::NotFound(_))
        ));
        assert!(matches!(
            state.apply(AppEvent::SubtaskEdited(Subtask::new("1", "  "))),
            Err(StateError::Invalid(_))
        ));
    }

    #[test]
    fn test_progress_update_shows_in_graph() {
        let mut state = state();
        state
            .apply(AppEvent::ProgressUpdated {
                id: "1".to_string(),
                percent: 100,
                note: Some("merged".to_string()),
            })
            .unwrap();

        let node = state.graph.node("task_1").unwrap();
        assert_eq!(node.status, Some(ProgressStatus::Completed));
        assert_eq!(state.progress.get("1").unwrap().notes.len(), 1);

        let unknown = state.apply(AppEvent::ProgressUpdated {
            id: "nope".to_string(),
            percent: 10,
            note: None,
        });
        assert!(matches!(unknown, Err(StateError::NotFound(_))));
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let mut state = state();
        state
            .apply(AppEvent::ProgressUpdated {
                id: "2".to_string(),
                percent: 30,
                note: None,
            })
            .unwrap();
        let positions = HashMap::from([("task_1".to_string(), Position::new(10.0, 20.0))]);

        let restored = AppState::restore(state.snapshot(), None, &positions);

        assert_eq!(restored.form, state.form);
        assert_eq!(restored.subtasks, state.subtasks);
        assert_eq!(restored.progress, state.progress);
        assert_eq!(restored.graph.node("task_1").unwrap().position, Some(Position::new(10.0, 20.0)));
    }

    #[test]
    fn test_restore_seeds_missing_progress_and_tolerates_bad_enums() {
        let snapshot = ProjectSnapshot {
            main_task: "x".to_string(),
            domain: "astrology".to_string(),
            subtasks: vec![Subtask::new("a", "A")],
            ..Default::default()
        };
        let state = AppState::restore(snapshot, None, &HashMap::new());
        assert_eq!(state.form.domain, Domain::General);
        assert_eq!(state.progress.status("a"), ProgressStatus::Pending);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut state = state();
        state.apply(AppEvent::Reset).unwrap();
        assert!(state.subtasks.is_empty());
        assert!(state.last_result.is_none());
        assert!(state.graph.is_empty());
        assert!(state.form.is_blank());
    }

    #[test]
    fn test_moved_node_survives_edit_and_restore() {
        let mut state = state();
        state
            .apply(AppEvent::NodeMoved {
                id: "2".to_string(),
                position: Position::new(120.0, -40.0),
            })
            .unwrap();
        state
            .apply(AppEvent::NodeMoved {
                id: "main".to_string(),
                position: Position::new(0.0, 0.0),
            })
            .unwrap();

        state
            .apply(AppEvent::SubtaskEdited(Subtask::new("2", "Test API v2")))
            .unwrap();
        assert_eq!(state.graph.node("task_2").unwrap().position, Some(Position::new(120.0, -40.0)));

        let positions: HashMap<String, Position> = state.graph.positions().into_iter().collect();
        assert_eq!(positions.len(), 2);
        let restored = AppState::restore(state.snapshot(), None, &positions);
        assert_eq!(restored.graph.node("task_2").unwrap().position, Some(Position::new(120.0, -40.0)));

        let missing = state.apply(AppEvent::NodeMoved {
            id: "nope".to_string(),
            position: Position::new(1.0, 1.0),
        });
        assert!(matches!(missing, Err(StateError::NodeNotFound(_))));
    }

    #[test]
    fn test_rebuild_keeps_collapsed_groups() {
        let mut state = state();
        state.graph.collapse("Development");
        state
            .apply(AppEvent::ProgressUpdated {
                id: "2".to_string(),
                percent: 10,
                note: None,
            })
            .unwrap();
        assert!(state.graph.group_by_name("Development").unwrap().collapsed);
        assert!(state.graph.node("task_1").unwrap().hidden);
    }
}
