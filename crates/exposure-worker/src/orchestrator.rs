//! Background task orchestration.
//!
//! One scheduler-issued task runs through a fixed sequence of suspending
//! phases: decoy traffic, test-result retrieval, exposure detection. Each
//! phase returns a [`PhaseOutcome`]; the outcomes are folded into one
//! [`PipelineResult`] and reported through the task's single completion.
//!
//! The phases run sequentially. Both are always attempted, and a failure in
//! one never skips the other.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, info_span, warn, Instrument};

use exposure_core::{
    DetectionMode, Notification, PhaseOutcome, PipelineError, PipelineResult, TaskIdentifier,
};

use crate::collaborators::{
    BackgroundStatusSource, Notifier, RegistrationStore, RiskEvaluator, TestResultFetcher,
};
use crate::config::OrchestratorConfig;
use crate::fake_request::FakeRequestGate;
use crate::task::{TaskCompletion, TaskHandle};

/// What a single run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub task: TaskIdentifier,
    pub fetch: PhaseOutcome,
    pub detection: PhaseOutcome,
    pub result: PipelineResult,
}

impl RunReport {
    /// The value that was passed to the completion.
    pub fn success(&self) -> bool {
        self.result.is_success()
    }
}

/// Coordinates the test-result and exposure-detection phases of one
/// background task.
pub struct BackgroundTaskOrchestrator {
    gate: Option<FakeRequestGate>,
    registration: Arc<dyn RegistrationStore>,
    fetcher: Arc<dyn TestResultFetcher>,
    evaluator: Arc<dyn RiskEvaluator>,
    notifier: Arc<dyn Notifier>,
    background_status: Arc<dyn BackgroundStatusSource>,
    config: OrchestratorConfig,
}

impl BackgroundTaskOrchestrator {
    /// Create an orchestrator without a fake-request gate.
    pub fn new(
        registration: Arc<dyn RegistrationStore>,
        fetcher: Arc<dyn TestResultFetcher>,
        evaluator: Arc<dyn RiskEvaluator>,
        notifier: Arc<dyn Notifier>,
        background_status: Arc<dyn BackgroundStatusSource>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            gate: None,
            registration,
            fetcher,
            evaluator,
            notifier,
            background_status,
            config,
        }
    }

    /// Run decoy traffic before every pipeline.
    pub fn with_fake_requests(mut self, gate: FakeRequestGate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Run the pipeline for `task` and fire `completion` exactly once.
    ///
    /// Completion receives `true` unless a phase timed out or the task
    /// expired. If the task's deadline passes or it is cancelled, in-flight
    /// collaborator calls are dropped and their results discarded.
    pub async fn run(&self, task: &TaskHandle, completion: TaskCompletion) -> RunReport {
        let span = info_span!("background_task", task = %task.identifier());
        self.run_inner(task, completion).instrument(span).await
    }

    async fn run_inner(&self, task: &TaskHandle, completion: TaskCompletion) -> RunReport {
        let identifier = task.identifier();
        let cancellation = task.cancellation();

        info!(budget_ms = task.remaining().as_millis() as u64, "Background task started");

        let mut fetch = PhaseOutcome::Cancelled;
        let mut detection = PhaseOutcome::Cancelled;

        tokio::select! {
            biased;

            _ = cancellation.cancelled() => {
                warn!("Background task expired, abandoning in-flight work");
            }
            _ = tokio::time::sleep_until(task.deadline()) => {
                warn!("Background task deadline reached, abandoning in-flight work");
            }
            _ = async {
                if let Some(gate) = &self.gate {
                    gate.execute().await;
                }

                let phase = self.test_result_phase(identifier);
                fetch = self.bounded("test_result", self.config.fetch_timeout, phase).await;

                let phase = self.detection_phase(identifier);
                detection = self
                    .bounded("exposure_detection", self.config.detection_timeout, phase)
                    .await;
            } => {}
        }

        let result = PipelineResult::from_outcomes(&fetch, &detection);
        info!(
            fetch = ?fetch,
            detection = ?detection,
            success = result.is_success(),
            "Background task finished"
        );
        completion.complete(result.is_success());

        RunReport {
            task: identifier.clone(),
            fetch,
            detection,
            result,
        }
    }

    async fn bounded<F>(&self, phase: &'static str, budget: Duration, work: F) -> PhaseOutcome
    where
        F: Future<Output = PhaseOutcome>,
    {
        match tokio::time::timeout(budget, work).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(phase, budget_ms = budget.as_millis() as u64, "Phase timed out");
                PhaseOutcome::TimedOut
            }
        }
    }

    async fn test_result_phase(&self, identifier: &TaskIdentifier) -> PhaseOutcome {
        let state = self.registration.registration_state().await;
        if !state.needs_test_result_fetch() {
            debug!(
                has_token = state.token.is_some(),
                has_result = state.test_result_received_at.is_some(),
                "No test result to fetch"
            );
            return PhaseOutcome::Skipped;
        }

        if self.fetcher.is_outdated_and_cleaned().await {
            let cause = PipelineError::OutdatedTestResult;
            info!(error = %cause, "Test registration cleaned up");
            return PhaseOutcome::Absorbed(cause.to_string());
        }

        match self.fetcher.get_test_result().await {
            // Absorbed: a failed report would push the scheduler into
            // backoff. This hides the real failure rate from it.
            Err(e) => {
                warn!(error = %e, "Fetching test result failed");
                PhaseOutcome::Absorbed(e.to_string())
            }
            Ok(result) if result.is_resolved() => {
                info!(result = ?result, "Test result available");
                self.notifier
                    .present(Notification::test_result(identifier))
                    .await;
                PhaseOutcome::Notified
            }
            Ok(_) => {
                debug!("Test result still pending");
                PhaseOutcome::Completed
            }
        }
    }

    async fn detection_phase(&self, identifier: &TaskIdentifier) -> PhaseOutcome {
        let mode =
            DetectionMode::from_background_status(self.background_status.background_refresh_status());
        self.evaluator.configuration().set_mode(mode).await;

        match self.evaluator.request_risk(false).await {
            Some(risk) if risk.risk_level_has_changed => {
                info!(level = ?risk.level, "Risk level changed");
                self.notifier
                    .present(Notification::risk_changed(identifier))
                    .await;
                PhaseOutcome::Notified
            }
            Some(risk) => {
                debug!(level = ?risk.level, "Risk level unchanged");
                PhaseOutcome::Completed
            }
            None => {
                debug!(mode = ?mode, "No risk available");
                PhaseOutcome::Completed
            }
        }
    }
}
