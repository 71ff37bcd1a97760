//! Event bus for live pipeline status
//!
//! The orchestrator emits an event for every status change, stage boundary
//! and feedback entry. Consumers subscribe to the bus.
//!
//! ```text
//!   Orchestrator ──emit──▶ EventBus (tokio::sync::broadcast)
//!                              │
//!                 ┌────────────┴────────────┐
//!                 ▼                         ▼
//!          status printer              tests / other
//!          (stderr, coloured)          subscribers
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use taskdecomposer::events::{EventBus, StatusKind};
//!
//! let bus = EventBus::with_default_capacity();
//! let mut rx = bus.subscribe();
//! bus.emitter_for("run-1").status(StatusKind::Processing, "Analyzing task...");
//! ```

mod bus;
mod printer;
mod types;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventEmitter, create_event_bus};
pub use printer::{format_event, print_events, spawn_status_printer};
pub use types::{PipelineEvent, StatusKind};
