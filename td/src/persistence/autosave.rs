//! Periodic background save

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::gateway::PersistenceGateway;
use super::snapshot::ProjectSnapshot;
use crate::graph::Position;
use crate::pipeline::PipelineResult;
use crate::state::AppState;

/// Write every document; failures are logged, returns true if all succeeded
fn write_documents(
    gateway: &PersistenceGateway,
    snapshot: &ProjectSnapshot,
    positions: &BTreeMap<String, Position>,
    last_result: Option<&PipelineResult>,
) -> bool {
    let mut ok = true;
    if let Err(e) = gateway.save_project(snapshot) {
        warn!(error = %e, "Saving project failed");
        ok = false;
    }
    if let Err(e) = gateway.save_positions(positions) {
        warn!(error = %e, "Saving node positions failed");
        ok = false;
    }
    if let Some(result) = last_result
        && let Err(e) = gateway.save_last_result(result)
    {
        warn!(error = %e, "Saving last result failed");
        ok = false;
    }
    ok
}

/// Save state the caller owns outright
pub fn save_state(state: &AppState, gateway: &PersistenceGateway) -> bool {
    debug!("save_state: called");
    write_documents(
        gateway,
        &state.snapshot(),
        &state.graph.positions(),
        state.last_result.as_ref(),
    )
}

/// Save shared state once
///
/// The state lock is held only while copying out the documents.
pub async fn save_now(state: &Mutex<AppState>, gateway: &PersistenceGateway) -> bool {
    let (snapshot, positions, last_result) = {
        let state = state.lock().await;
        (state.snapshot(), state.graph.positions(), state.last_result.clone())
    };
    write_documents(gateway, &snapshot, &positions, last_result.as_ref())
}

/// Save every `interval` until `shutdown` flips to true, then save once more
pub fn spawn_autosave(
    state: Arc<Mutex<AppState>>,
    gateway: Arc<PersistenceGateway>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    info!(interval_secs = interval.as_secs(), "Starting autosave");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    debug!("spawn_autosave: tick");
                    save_now(&state, &gateway).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        save_now(&state, &gateway).await;
        info!("Autosave stopped after final save");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Context, Subtask};
    use crate::persistence::FileStore;
    use crate::state::AppEvent;
    use tempfile::TempDir;

    fn populated() -> AppState {
        let mut result = PipelineResult::new("run-1", Context::new("Move house"));
        result.subtasks = Some(vec![Subtask::new("1", "Pack boxes")]);
        let mut state = AppState::new();
        state.apply(AppEvent::DecompositionFinished(result)).unwrap();
        state
    }

    #[tokio::test]
    async fn test_final_save_on_shutdown() {
        let dir = TempDir::new().unwrap();
        let gateway = Arc::new(PersistenceGateway::new(Arc::new(FileStore::new(dir.path()))));
        let state = Arc::new(Mutex::new(populated()));
        let (tx, rx) = watch::channel(false);

        let handle = spawn_autosave(state.clone(), gateway.clone(), Duration::from_secs(3600), rx);
        tx.send(true).unwrap();
        handle.await.unwrap();

        let saved = gateway.load_project().unwrap();
        assert_eq!(saved.main_task, "Move house");
        assert_eq!(saved.subtasks.len(), 1);
        assert_eq!(gateway.load_last_result().unwrap().run_id, "run-1");
    }

    #[tokio::test]
    async fn test_periodic_save() {
        let dir = TempDir::new().unwrap();
        let gateway = Arc::new(PersistenceGateway::new(Arc::new(FileStore::new(dir.path()))));
        let state = Arc::new(Mutex::new(populated()));
        let (tx, rx) = watch::channel(false);

        let handle = spawn_autosave(state, gateway.clone(), Duration::from_millis(20), rx);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(gateway.load_project().is_some());

        drop(tx);
        handle.await.unwrap();
    }
}
