//! Persistence gateway
//!
//! Maps application documents onto store keys. Load failures are absorbed
//! (logged, then an empty baseline); save failures are returned so the
//! caller can log them.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::snapshot::ProjectSnapshot;
use super::store::{KvStore, StoreError};
use crate::graph::Position;
use crate::pipeline::PipelineResult;

pub const PROJECT_KEY: &str = "taskDecomposerProject";
pub const POSITIONS_KEY: &str = "nodePositions";
pub const LAST_RESULT_KEY: &str = "lastResult";

pub struct PersistenceGateway {
    store: Arc<dyn KvStore>,
}

impl PersistenceGateway {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
            key: key.to_string(),
            source,
        })?;
        self.store.set(key, &json)
    }

    /// Read a document; missing, unreadable or corrupt all yield None
    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(%key, "PersistenceGateway::read: nothing saved");
                return None;
            }
            Err(e) => {
                warn!(%key, error = %e, "Failed to read saved data, starting empty");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(%key, error = %e, "Saved data is corrupt, starting empty");
                None
            }
        }
    }

    /// Stamp `lastModified` and write the project document
    pub fn save_project(&self, snapshot: &ProjectSnapshot) -> Result<(), StoreError> {
        let stamped = ProjectSnapshot {
            last_modified: Some(Utc::now()),
            ..snapshot.clone()
        };
        self.write(PROJECT_KEY, &stamped)?;
        info!(subtasks = stamped.subtasks.len(), "Project saved");
        Ok(())
    }

    pub fn load_project(&self) -> Option<ProjectSnapshot> {
        self.read(PROJECT_KEY)
    }

    pub fn save_positions(&self, positions: &BTreeMap<String, Position>) -> Result<(), StoreError> {
        debug!(count = positions.len(), "PersistenceGateway::save_positions: called");
        self.write(POSITIONS_KEY, positions)
    }

    pub fn load_positions(&self) -> HashMap<String, Position> {
        self.read(POSITIONS_KEY).unwrap_or_default()
    }

    pub fn save_last_result(&self, result: &PipelineResult) -> Result<(), StoreError> {
        self.write(LAST_RESULT_KEY, result)
    }

    pub fn load_last_result(&self) -> Option<PipelineResult> {
        self.read(LAST_RESULT_KEY)
    }

    /// Remove every saved document
    pub fn clear(&self) -> Result<(), StoreError> {
        info!("Clearing saved project");
        for key in [PROJECT_KEY, POSITIONS_KEY, LAST_RESULT_KEY] {
            self.store.remove(key)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Subtask;
    use crate::persistence::FileStore;
    use crate::progress::ProgressTracker;
    use tempfile::TempDir;

    fn gateway(dir: &TempDir) -> (PersistenceGateway, Arc<FileStore>) {
        let store = Arc::new(FileStore::new(dir.path()));
        (PersistenceGateway::new(store.clone()), store)
    }

    fn snapshot() -> ProjectSnapshot {
        let mut tracker = ProgressTracker::new();
        tracker.seed(["b", "a"]);
        tracker.update("a", 60, Some("halfway"));
        ProjectSnapshot {
            main_task: "Ship".to_string(),
            domain: "tech".to_string(),
            subtasks: vec![Subtask::new("a", "A"), Subtask::new("b", "B")],
            progress: tracker.snapshot(),
            ..Default::default()
        }
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let (gw, _) = gateway(&dir);
        let saved = snapshot();
        gw.save_project(&saved).unwrap();

        let loaded = gw.load_project().unwrap();
        assert!(loaded.last_modified.is_some());
        assert_eq!(loaded.without_timestamp(), saved);
    }

    #[test]
    fn test_repeated_saves_identical_except_timestamp() {
        let dir = TempDir::new().unwrap();
        let (gw, store) = gateway(&dir);

        let saved = snapshot();
        gw.save_project(&saved).unwrap();
        let first = store.get(PROJECT_KEY).unwrap().unwrap();
        gw.save_project(&saved).unwrap();
        let second = store.get(PROJECT_KEY).unwrap().unwrap();

        let strip = |raw: &str| {
            let mut value: serde_json::Value = serde_json::from_str(raw).unwrap();
            value.as_object_mut().unwrap().remove("lastModified");
            serde_json::to_string(&value).unwrap()
        };
        assert_eq!(strip(&first), strip(&second));
    }

    #[test]
    fn test_corrupt_or_missing_is_empty_baseline() {
        let dir = TempDir::new().unwrap();
        let (gw, store) = gateway(&dir);
        assert!(gw.load_project().is_none());

        store.set(PROJECT_KEY, "{not json").unwrap();
        assert!(gw.load_project().is_none());
        assert!(gw.load_positions().is_empty());
    }

    #[test]
    fn test_positions_round_trip_and_clear() {
        let dir = TempDir::new().unwrap();
        let (gw, _) = gateway(&dir);
        let positions = BTreeMap::from([("task_a".to_string(), Position::new(1.5, -2.0))]);

        gw.save_positions(&positions).unwrap();
        assert_eq!(gw.load_positions().get("task_a"), Some(&Position::new(1.5, -2.0)));

        gw.save_project(&snapshot()).unwrap();
        gw.clear().unwrap();
        assert!(gw.load_project().is_none());
        assert!(gw.load_positions().is_empty());
    }
}
