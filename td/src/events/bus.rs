//! Event Bus - pub/sub for pipeline status
//!
//! The orchestrator emits, front ends (the CLI status printer, tests)
//! subscribe. Emission never blocks and never fails.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use super::types::{PipelineEvent, StatusKind};
use crate::domain::Feedback;
use crate::pipeline::Stage;

/// Default channel capacity (events)
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Central event bus for pipeline activity
pub struct EventBus {
    tx: broadcast::Sender<PipelineEvent>,
}

impl EventBus {
    /// Create a new event bus with the given capacity
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "EventBus::new: creating event bus");
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Emit an event to all subscribers
    ///
    /// Fire-and-forget: with no subscribers the event is dropped, and a slow
    /// subscriber loses the oldest events.
    pub fn emit(&self, event: PipelineEvent) {
        debug!(event_type = event.event_type(), run_id = event.run_id(), "EventBus::emit");
        let _ = self.tx.send(event);
    }

    /// Subscribe to events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        debug!("EventBus::subscribe: new subscriber");
        self.tx.subscribe()
    }

    /// Create an emitter bound to one run
    pub fn emitter_for(&self, run_id: impl Into<String>) -> EventEmitter {
        let run_id = run_id.into();
        debug!(%run_id, "EventBus::emitter_for: creating emitter");
        EventEmitter {
            tx: self.tx.clone(),
            run_id,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Handle for emitting events of a single run
#[derive(Clone)]
pub struct EventEmitter {
    tx: broadcast::Sender<PipelineEvent>,
    run_id: String,
}

impl EventEmitter {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn emit(&self, event: PipelineEvent) {
        debug!(event_type = event.event_type(), "EventEmitter::emit");
        let _ = self.tx.send(event);
    }

    pub fn status(&self, kind: StatusKind, message: impl Into<String>) {
        self.emit(PipelineEvent::Status {
            run_id: self.run_id.clone(),
            kind,
            message: message.into(),
        });
    }

    pub fn stage_started(&self, stage: Stage, index: usize, total: usize) {
        self.emit(PipelineEvent::StageStarted {
            run_id: self.run_id.clone(),
            stage,
            index,
            total,
        });
    }

    pub fn stage_completed(&self, stage: Stage, duration_ms: u64) {
        self.emit(PipelineEvent::StageCompleted {
            run_id: self.run_id.clone(),
            stage,
            duration_ms,
        });
    }

    pub fn feedback(&self, feedback: Feedback) {
        self.emit(PipelineEvent::Feedback {
            run_id: self.run_id.clone(),
            feedback,
        });
    }
}

/// Create an event bus wrapped in an Arc for shared ownership
pub fn create_event_bus() -> Arc<EventBus> {
    Arc::new(EventBus::with_default_capacity())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    #[test]
    fn test_event_bus_subscribe_counts() {
        let bus = EventBus::new(16);
        assert_eq!(bus.subscriber_count(), 0);
        let _rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn test_emit_without_subscribers_is_fine() {
        let bus = EventBus::new(16);
        bus.emitter_for("r").status(StatusKind::Processing, "working");
    }

    #[tokio::test]
    async fn test_emitter_tags_run_id() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let emitter = bus.emitter_for("run-42");

        emitter.stage_started(Stage::Classify, 0, 6);
        emitter.stage_completed(Stage::Classify, 5);
        emitter.feedback(Feedback::success("done"));
        emitter.status(StatusKind::Success, "Analysis complete");

        for expected in ["StageStarted", "StageCompleted", "Feedback", "Status"] {
            let event = rx.recv().await.unwrap();
            assert_eq!(event.run_id(), "run-42");
            assert_eq!(event.event_type(), expected);
        }
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_multiple_subscribers_each_receive() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.emitter_for("r").status(StatusKind::Error, "boom");

        assert!(rx1.recv().await.unwrap().is_terminal());
        assert!(rx2.recv().await.unwrap().is_terminal());
    }
}
