//! Scheduler boundary: task handles and their single-shot completion.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use exposure_core::TaskIdentifier;

/// One scheduler-issued background task.
///
/// Owned by the scheduler; the orchestrator borrows it for one run.
#[derive(Debug)]
pub struct TaskHandle {
    identifier: TaskIdentifier,
    deadline: Instant,
    cancellation: CancellationToken,
}

impl TaskHandle {
    /// Create a handle that must complete within `budget` from now.
    pub fn new(identifier: TaskIdentifier, budget: Duration) -> Self {
        Self {
            identifier,
            deadline: Instant::now() + budget,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn identifier(&self) -> &TaskIdentifier {
        &self.identifier
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Token cancelled when the scheduler expires the task.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Expire the task. In-flight work is abandoned.
    pub fn expire(&self) {
        self.cancellation.cancel();
    }

    pub fn is_expired(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Time left before the deadline.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

/// Single-shot completion for a [`TaskHandle`].
///
/// `complete` consumes the value, so it can fire at most once. Dropping it
/// unfired reports `false` instead of leaving the scheduler waiting.
#[derive(Debug)]
pub struct TaskCompletion {
    identifier: TaskIdentifier,
    tx: Option<oneshot::Sender<bool>>,
}

impl TaskCompletion {
    /// Create a completion and the receiver the scheduler waits on.
    pub fn channel(identifier: TaskIdentifier) -> (Self, oneshot::Receiver<bool>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                identifier,
                tx: Some(tx),
            },
            rx,
        )
    }

    /// Report the run's result to the scheduler.
    pub fn complete(mut self, success: bool) {
        if let Some(tx) = self.tx.take() {
            if tx.send(success).is_err() {
                warn!(task = %self.identifier, success, "Scheduler stopped waiting for completion");
            }
        }
    }
}

impl Drop for TaskCompletion {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            error!(task = %self.identifier, "Task completion dropped without firing, reporting failure");
            let _ = tx.send(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_complete_delivers_value() {
        let (completion, rx) = TaskCompletion::channel(TaskIdentifier::new("t"));
        completion.complete(true);
        assert!(rx.await.unwrap());
    }

    #[tokio::test]
    async fn test_dropped_completion_reports_failure() {
        let (completion, rx) = TaskCompletion::channel(TaskIdentifier::new("t"));
        drop(completion);
        assert!(!rx.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_deadline_and_expiry() {
        let handle = TaskHandle::new(TaskIdentifier::new("t"), Duration::from_secs(30));
        assert_eq!(handle.remaining(), Duration::from_secs(30));
        assert!(!handle.is_expired());

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(handle.remaining(), Duration::from_secs(20));

        handle.expire();
        assert!(handle.is_expired());
        assert!(handle.cancellation().is_cancelled());
    }
}
