//! Stage orchestrator
//!
//! Runs the six stages strictly in sequence. Each stage renders its prompt
//! pair, makes one (retried) model call and stores its output on the
//! result before the next stage starts. The first failure stops the run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::error::PipelineError;
use super::result::PipelineResult;
use super::stage::Stage;
use crate::domain::{Context, Feedback};
use crate::events::{EventBus, EventEmitter, StatusKind};
use crate::graph::dependency_warnings;
use crate::llm::{self, LlmClient, LlmError};
use crate::parser::parse_subtasks;
use crate::prompts::{PromptContext, PromptLoader};

/// Why a stage stopped the run
enum StageFailure {
    Remote(LlmError),
    Prompt(String),
}

/// Clears the running flag when a run ends, however it ends
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Orchestrator {
    client: Arc<dyn LlmClient>,
    prompts: PromptLoader,
    bus: Arc<EventBus>,
    running: AtomicBool,
}

impl Orchestrator {
    pub fn new(client: Arc<dyn LlmClient>, prompts: PromptLoader, bus: Arc<EventBus>) -> Self {
        debug!("Orchestrator::new: called");
        Self {
            client,
            prompts,
            bus,
            running: AtomicBool::new(false),
        }
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run every stage for `context`
    ///
    /// On a stage failure the error carries the partial result holding the
    /// outputs of the stages that completed.
    pub async fn run(&self, context: Context) -> Result<PipelineResult, PipelineError> {
        debug!(task_len = context.task.len(), "Orchestrator::run: called");
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            warn!("Decomposition requested while another is running");
            return Err(PipelineError::AlreadyRunning);
        };

        let run_id = Uuid::now_v7().to_string();
        let emitter = self.bus.emitter_for(&run_id);

        if context.is_blank() {
            let message = "Please enter a task description".to_string();
            warn!(%run_id, "Rejected empty task description");
            emitter.feedback(Feedback::error(&message));
            emitter.status(StatusKind::Error, &message);
            return Err(PipelineError::Validation(message));
        }

        info!(%run_id, domain = %context.domain, complexity = %context.complexity, "Decomposition started");
        let mut result = PipelineResult::new(&run_id, context);

        match self.run_stages(&mut result, &emitter).await {
            Ok(()) => {
                let count = result.subtasks().len();
                record(&mut result, &emitter, Feedback::success(format!("Decomposed into {} subtasks", count)));
                emitter.status(StatusKind::Success, "Analysis complete");
                info!(%run_id, subtasks = count, "Decomposition finished");
                Ok(result)
            }
            Err((stage, failure)) => {
                result.failed_stage = Some(stage);
                let (message, err) = match failure {
                    StageFailure::Remote(source) => {
                        let message = format!("{} failed: {}", stage.title(), source);
                        (message, Some(source))
                    }
                    StageFailure::Prompt(message) => (format!("{} failed: {}", stage.title(), message), None),
                };
                error!(%run_id, %stage, %message, "Decomposition aborted");
                record(&mut result, &emitter, Feedback::error(&message));
                emitter.status(StatusKind::Error, &message);

                let partial = Box::new(result);
                Err(match err {
                    Some(source) => PipelineError::Remote { stage, source, partial },
                    None => PipelineError::Prompt { stage, message, partial },
                })
            }
        }
    }

    async fn run_stages(&self, result: &mut PipelineResult, emitter: &EventEmitter) -> Result<(), (Stage, StageFailure)> {
        let ctx = result.context.clone();

        let analysis = self
            .call_stage(Stage::Classify, &PromptContext::classify(&ctx), emitter)
            .await?;
        result.analysis = Some(analysis.clone());

        let raw = self
            .call_stage(Stage::Decompose, &PromptContext::decompose(&ctx, &analysis), emitter)
            .await?;
        let subtasks = parse_subtasks(&raw);
        if subtasks.is_empty() {
            record(result, emitter, Feedback::warning("No subtasks could be extracted from the response"));
        }
        for warning in dependency_warnings(&subtasks) {
            record(result, emitter, Feedback::warning(warning));
        }
        result.subtasks = Some(subtasks);

        let with_subtasks = PromptContext::with_subtasks(&ctx, result.subtasks());
        result.resources = Some(self.call_stage(Stage::Resources, &with_subtasks, emitter).await?);
        result.risks = Some(self.call_stage(Stage::Risks, &with_subtasks, emitter).await?);
        result.timeline = Some(self.call_stage(Stage::Timeline, &with_subtasks, emitter).await?);

        let suggest = PromptContext::suggest(&ctx, &result.aggregate());
        result.suggestions = Some(self.call_stage(Stage::Suggest, &suggest, emitter).await?);
        Ok(())
    }

    async fn call_stage(
        &self,
        stage: Stage,
        prompt: &PromptContext,
        emitter: &EventEmitter,
    ) -> Result<String, (Stage, StageFailure)> {
        debug!(%stage, "Orchestrator::call_stage: called");
        emitter.status(StatusKind::Processing, stage.status_message());
        emitter.stage_started(stage, stage.index(), Stage::ALL.len());

        let (system, user) = self
            .prompts
            .stage_prompts(stage, prompt)
            .map_err(|e| (stage, StageFailure::Prompt(e.to_string())))?;

        let started = Instant::now();
        let text = llm::complete_text(&self.client, &system, &user)
            .await
            .map_err(|e| (stage, StageFailure::Remote(e)))?;

        let duration_ms = started.elapsed().as_millis() as u64;
        emitter.stage_completed(stage, duration_ms);
        info!(%stage, duration_ms, response_len = text.len(), "Stage completed");
        Ok(text)
    }
}

fn record(result: &mut PipelineResult, emitter: &EventEmitter, feedback: Feedback) {
    emitter.feedback(feedback.clone());
    result.feedback.push(feedback);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::PipelineEvent;
    use crate::llm::client::mock::MockLlmClient;
    use crate::llm::{CompletionResponse, RetryPolicy, RetryingClient};
    use std::time::Duration;

    const SUBTASKS_JSON: &str = r#"[
        {"id": "1", "title": "Develop API", "complexity": 4, "dependencies": []},
        {"id": "2", "title": "Test API", "complexity": 2, "dependencies": ["1"]}
    ]"#;

    fn happy_script() -> Vec<&'static str> {
        vec!["analysis", SUBTASKS_JSON, "resources", "risks", "timeline", "suggestions"]
    }

    fn orchestrator(client: Arc<dyn LlmClient>) -> Orchestrator {
        Orchestrator::new(client, PromptLoader::embedded_only(), Arc::new(EventBus::new(64)))
    }

    fn drain(rx: &mut tokio::sync::broadcast::Receiver<PipelineEvent>) -> Vec<PipelineEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_full_run_fills_every_stage() {
        let mock = Arc::new(MockLlmClient::with_texts(&happy_script()));
        let orch = orchestrator(mock.clone());
        let mut rx = orch.bus().subscribe();

        let result = orch.run(Context::new("Build a service")).await.unwrap();

        assert!(result.is_complete());
        assert_eq!(result.analysis.as_deref(), Some("analysis"));
        assert_eq!(result.subtasks().len(), 2);
        assert_eq!(result.suggestions.as_deref(), Some("suggestions"));
        assert_eq!(mock.call_count(), 6);

        let events = drain(&mut rx);
        let processing = events
            .iter()
            .filter(|e| matches!(e, PipelineEvent::Status { kind: StatusKind::Processing, .. }))
            .count();
        assert_eq!(processing, 6);
        assert!(matches!(
            events.last(),
            Some(PipelineEvent::Status { kind: StatusKind::Success, .. })
        ));
    }

    #[tokio::test]
    async fn test_stages_feed_forward() {
        let mock = Arc::new(MockLlmClient::with_texts(&happy_script()));
        let orch = orchestrator(mock.clone());
        orch.run(Context::new("Build a service")).await.unwrap();

        let requests = mock.requests();
        // Decompose sees the classification output
        assert!(requests[1].messages[1].content.contains(":\nanalysis\n"));
        // Resources sees the parsed subtasks
        assert!(requests[2].messages[1].content.contains("\"title\": \"Develop API\""));
        // Suggest sees the aggregate
        assert!(requests[5].messages[1].content.contains("\"timeline\": \"timeline\""));
    }

    #[tokio::test]
    async fn test_blank_task_rejected_before_any_call() {
        let mock = Arc::new(MockLlmClient::with_texts(&happy_script()));
        let orch = orchestrator(mock.clone());
        let mut rx = orch.bus().subscribe();

        let err = orch.run(Context::new("   ")).await.unwrap_err();

        assert!(matches!(err, PipelineError::Validation(_)));
        assert_eq!(mock.call_count(), 0);
        let events = drain(&mut rx);
        assert!(events.iter().any(|e| e.is_terminal()));
        assert!(!orch.is_running());
    }

    #[tokio::test]
    async fn test_failure_keeps_prior_stages() {
        let script = vec![
            Ok(CompletionResponse::text("analysis")),
            Ok(CompletionResponse::text(SUBTASKS_JSON)),
            Err(LlmError::ApiError {
                status: 500,
                message: "down".to_string(),
            }),
        ];
        let orch = orchestrator(Arc::new(MockLlmClient::scripted(script)));
        let mut rx = orch.bus().subscribe();

        let err = orch.run(Context::new("Build a service")).await.unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Resources));
        let partial = err.partial().unwrap();
        assert_eq!(partial.analysis.as_deref(), Some("analysis"));
        assert_eq!(partial.subtasks().len(), 2);
        assert!(partial.resources.is_none());
        assert!(partial.timeline.is_none());
        assert_eq!(partial.failed_stage, Some(Stage::Resources));

        let events = drain(&mut rx);
        let errors = events
            .iter()
            .filter(|e| matches!(e, PipelineEvent::Status { kind: StatusKind::Error, .. }))
            .count();
        assert_eq!(errors, 1);
        assert!(!orch.is_running());
    }

    #[tokio::test]
    async fn test_exhausted_retries_abort_run() {
        let failures = (0..4)
            .map(|_| {
                Err(LlmError::ApiError {
                    status: 503,
                    message: "busy".to_string(),
                })
            })
            .collect();
        let mock = Arc::new(MockLlmClient::scripted(failures));
        let retrying = Arc::new(RetryingClient::new(
            mock.clone(),
            RetryPolicy::new(3, Duration::ZERO),
        ));
        let orch = orchestrator(retrying);

        let err = orch.run(Context::new("Build a service")).await.unwrap_err();

        match err {
            PipelineError::Remote { stage, source, .. } => {
                assert_eq!(stage, Stage::Classify);
                assert!(source.is_exhausted());
            }
            other => panic!("expected remote failure, got {other:?}"),
        }
        assert_eq!(mock.call_count(), 4);
    }

    #[tokio::test]
    async fn test_dependency_warnings_become_feedback() {
        let cyclic = r#"[
            {"id": "a", "title": "A", "dependencies": ["b"]},
            {"id": "b", "title": "B", "dependencies": ["a", "zzz"]}
        ]"#;
        let texts = vec!["analysis", cyclic, "r", "r", "t", "s"];
        let orch = orchestrator(Arc::new(MockLlmClient::with_texts(&texts)));

        let result = orch.run(Context::new("x")).await.unwrap();

        let warnings: Vec<_> = result
            .feedback
            .iter()
            .filter(|f| f.kind == crate::domain::FeedbackKind::Warning)
            .collect();
        assert_eq!(warnings.len(), 2);
        // Cycles are reported, not repaired
        assert_eq!(result.subtasks().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_run_rejected() {
        let orch = orchestrator(Arc::new(MockLlmClient::with_texts(&happy_script())));
        let guard = RunGuard::acquire(&orch.running).unwrap();

        let err = orch.run(Context::new("x")).await.unwrap_err();
        assert!(matches!(err, PipelineError::AlreadyRunning));

        drop(guard);
        assert!(orch.run(Context::new("x")).await.is_ok());
    }
}
