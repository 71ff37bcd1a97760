//! Application state and the edit flow
//!
//! `AppState` is passed explicitly; changes arrive as [`AppEvent`] messages.

mod app;
mod messages;

pub use app::AppState;
pub use messages::{AppEvent, StateError};
