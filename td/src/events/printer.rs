//! Status printer - renders bus events on the terminal
//!
//! Subscribes to the EventBus and writes one coloured line per event to
//! stderr until the run's terminal status arrives or the bus closes.

use std::io::Write;
use std::sync::Arc;

use colored::Colorize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::bus::EventBus;
use super::types::{PipelineEvent, StatusKind};
use crate::domain::FeedbackKind;

/// Format one event as a terminal line
pub fn format_event(event: &PipelineEvent) -> String {
    match event {
        PipelineEvent::Status { kind, message, .. } => match kind {
            StatusKind::Processing => format!("{} {}", "…".cyan(), message),
            StatusKind::Success => format!("{} {}", "✓".green().bold(), message.green()),
            StatusKind::Error => format!("{} {}", "✗".red().bold(), message.red()),
        },
        PipelineEvent::StageStarted { stage, index, total, .. } => {
            format!("  [{}/{}] {}", index + 1, total, stage.title().bold())
        }
        PipelineEvent::StageCompleted { stage, duration_ms, .. } => {
            format!("  {} {} ({} ms)", "done".dimmed(), stage.title(), duration_ms)
        }
        PipelineEvent::Feedback { feedback, .. } => {
            let tag = match feedback.kind {
                FeedbackKind::Success => "success".green(),
                FeedbackKind::Warning => "warning".yellow(),
                FeedbackKind::Error => "error".red(),
                FeedbackKind::Info => "info".blue(),
            };
            format!("  {}: {}", tag, feedback.message)
        }
    }
}

/// Print events until a terminal status or the bus closes
pub async fn print_events(mut rx: broadcast::Receiver<PipelineEvent>) {
    debug!("print_events: starting");
    loop {
        match rx.recv().await {
            Ok(event) => {
                let terminal = event.is_terminal();
                let mut stderr = std::io::stderr().lock();
                let _ = writeln!(stderr, "{}", format_event(&event));
                if terminal {
                    debug!("print_events: terminal status received");
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(missed = n, "print_events: lagged behind, missed events");
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("print_events: channel closed");
                break;
            }
        }
    }
}

/// Spawn a printer task subscribed to the bus
///
/// Subscribes before spawning so no event emitted after this call is lost.
pub fn spawn_status_printer(bus: &Arc<EventBus>) -> JoinHandle<()> {
    let rx = bus.subscribe();
    tokio::spawn(print_events(rx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Feedback;
    use crate::pipeline::Stage;

    #[test]
    fn test_format_stage_started_is_one_based() {
        colored::control::set_override(false);
        let line = format_event(&PipelineEvent::StageStarted {
            run_id: "r".to_string(),
            stage: Stage::Resources,
            index: 2,
            total: 6,
        });
        assert!(line.contains("[3/6]"));
        assert!(line.contains(Stage::Resources.title()));
    }

    #[test]
    fn test_format_feedback_includes_kind_and_message() {
        colored::control::set_override(false);
        let line = format_event(&PipelineEvent::Feedback {
            run_id: "r".to_string(),
            feedback: Feedback::warning("dependency cycle"),
        });
        assert!(line.contains("warning: dependency cycle"));
    }

    #[tokio::test]
    async fn test_printer_stops_on_terminal_status() {
        let bus = Arc::new(EventBus::new(16));
        let handle = spawn_status_printer(&bus);
        let emitter = bus.emitter_for("r");
        emitter.status(StatusKind::Processing, "working");
        emitter.status(StatusKind::Success, "done");

        handle.await.unwrap();
    }
}
