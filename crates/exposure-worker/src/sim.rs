//! Scripted collaborators for running the worker without the platform
//! exposure-notification engine.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use exposure_core::{DetectionSummary, PrematureEndReason};

use crate::collaborators::RiskDetector;

/// Detector that replays queued outcomes, then repeats a fallback.
pub struct ScriptedDetector {
    script: Mutex<VecDeque<Result<DetectionSummary, PrematureEndReason>>>,
    fallback: Result<DetectionSummary, PrematureEndReason>,
    delay: Duration,
    calls: AtomicU32,
}

impl ScriptedDetector {
    /// Create a detector that always returns `fallback` once the script runs out.
    pub fn new(fallback: Result<DetectionSummary, PrematureEndReason>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            delay: Duration::ZERO,
            calls: AtomicU32::new(0),
        }
    }

    /// Queue an outcome ahead of the fallback.
    pub fn then(mut self, outcome: Result<DetectionSummary, PrematureEndReason>) -> Self {
        self.script.get_mut().push_back(outcome);
        self
    }

    /// Simulate detection taking `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of detections run so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RiskDetector for ScriptedDetector {
    async fn detect(&self) -> Result<DetectionSummary, PrematureEndReason> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let outcome = self
            .script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        debug!(ok = outcome.is_ok(), "Scripted detection finished");
        outcome
    }
}
