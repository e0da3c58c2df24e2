//! Periodic task scheduler standing in for the OS background scheduler.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use exposure_core::TaskIdentifier;

use crate::orchestrator::BackgroundTaskOrchestrator;
use crate::task::{TaskCompletion, TaskHandle};

/// Scheduler settings.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Delay between runs after a successful run.
    pub interval: Duration,

    /// Wall-clock budget of a single run.
    pub task_budget: Duration,

    /// Upper bound on the delay after repeated failures.
    pub max_backoff: Duration,

    /// Identifier handed to every task; also the notification id.
    pub task_identifier: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60 * 60),
            task_budget: Duration::from_secs(30),
            max_backoff: Duration::from_secs(8 * 60 * 60),
            task_identifier: "exposure.background-refresh".to_string(),
        }
    }
}

/// Hands task handles to the orchestrator and plans the next run.
pub struct TaskScheduler {
    orchestrator: Arc<BackgroundTaskOrchestrator>,
    config: SchedulerConfig,
}

impl TaskScheduler {
    /// Create a new scheduler.
    pub fn new(orchestrator: Arc<BackgroundTaskOrchestrator>, config: SchedulerConfig) -> Self {
        Self {
            orchestrator,
            config,
        }
    }

    /// Issue one task and wait for its completion.
    pub async fn run_once(&self) -> bool {
        let handle = TaskHandle::new(
            TaskIdentifier::new(self.config.task_identifier.clone()),
            self.config.task_budget,
        );
        let (completion, rx) = TaskCompletion::channel(handle.identifier().clone());

        // Expire the task at its deadline like the OS would.
        let watchdog = {
            let token = handle.cancellation();
            let deadline = handle.deadline();
            tokio::spawn(async move {
                tokio::time::sleep_until(deadline).await;
                token.cancel();
            })
        };

        self.orchestrator.run(&handle, completion).await;
        watchdog.abort();

        match rx.await {
            Ok(success) => success,
            Err(_) => {
                error!(task = %handle.identifier(), "Completion channel closed without a result");
                false
            }
        }
    }

    /// Delay before the next run.
    ///
    /// Success resets to the interval; failure doubles the previous delay
    /// up to `max_backoff`.
    pub fn next_delay(&self, previous: Duration, success: bool) -> Duration {
        if success {
            self.config.interval
        } else {
            (previous * 2)
                .max(self.config.interval)
                .min(self.config.max_backoff)
        }
    }

    /// Run tasks until `shutdown` is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut delay = self.config.interval;

        loop {
            let success = self.run_once().await;
            delay = self.next_delay(delay, success);

            info!(
                success,
                delay_secs = delay.as_secs(),
                "Next background run in {} seconds", delay.as_secs()
            );

            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Scheduler shutting down");
                    break;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use exposure_core::{BackgroundRefreshStatus, DetectionSummary};

    use crate::config::OrchestratorConfig;
    use crate::notifier::LogNotifier;
    use crate::risk_provider::{RiskConfiguration, RiskProvider};
    use crate::sim::ScriptedDetector;
    use crate::storage::InMemoryStore;
    use crate::test_result::HttpTestResultService;

    fn scheduler(detection_delay: Duration, task_budget: Duration) -> TaskScheduler {
        let store = Arc::new(InMemoryStore::new());
        let detector =
            ScriptedDetector::new(Ok(DetectionSummary::default())).with_delay(detection_delay);
        let orchestrator = BackgroundTaskOrchestrator::new(
            store.clone(),
            // No token is stored, so the service is never called.
            Arc::new(HttpTestResultService::new(
                reqwest::Client::new(),
                "http://localhost:1",
                store.clone(),
                21,
            )),
            Arc::new(RiskProvider::new(
                Arc::new(detector),
                store,
                RiskConfiguration::default(),
            )),
            Arc::new(LogNotifier::default()),
            Arc::new(BackgroundRefreshStatus::Available),
            OrchestratorConfig {
                fetch_timeout: Duration::from_secs(60),
                detection_timeout: Duration::from_secs(60),
            },
        );

        TaskScheduler::new(
            Arc::new(orchestrator),
            SchedulerConfig {
                interval: Duration::from_secs(60),
                task_budget,
                max_backoff: Duration::from_secs(300),
                task_identifier: "test-task".to_string(),
            },
        )
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let s = scheduler(Duration::ZERO, Duration::from_secs(30));
        let interval = Duration::from_secs(60);

        let d1 = s.next_delay(interval, false);
        assert_eq!(d1, Duration::from_secs(120));
        let d2 = s.next_delay(d1, false);
        assert_eq!(d2, Duration::from_secs(240));
        let d3 = s.next_delay(d2, false);
        assert_eq!(d3, Duration::from_secs(300));

        assert_eq!(s.next_delay(d3, true), interval);
    }

    #[tokio::test]
    async fn test_run_once_reports_success() {
        let s = scheduler(Duration::ZERO, Duration::from_secs(30));
        assert!(s.run_once().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_past_budget_reports_failure() {
        let s = scheduler(Duration::from_secs(45), Duration::from_secs(30));
        assert!(!s.run_once().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown() {
        let s = scheduler(Duration::ZERO, Duration::from_secs(30));
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        // Runs one task, then sees the shutdown instead of sleeping.
        s.run(shutdown).await;
    }
}
