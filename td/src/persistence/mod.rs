//! Persistence - saved project, node positions and last result

mod autosave;
mod gateway;
mod snapshot;
mod store;

pub use autosave::{save_now, save_state, spawn_autosave};
pub use gateway::{LAST_RESULT_KEY, POSITIONS_KEY, PROJECT_KEY, PersistenceGateway};
pub use snapshot::ProjectSnapshot;
pub use store::{FileStore, KvStore, StoreError};
