//! Per-phase outcomes and the aggregated pipeline result.

use serde::{Deserialize, Serialize};

/// What one pipeline phase ended with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseOutcome {
    /// Nothing to do (no token, result already received, nothing outdated).
    Skipped,
    /// Ran to the end without anything to tell the user.
    Completed,
    /// Ran to the end and presented a notification.
    Notified,
    /// Failed internally; logged and swallowed.
    Absorbed(String),
    /// Did not finish within its time budget.
    TimedOut,
    /// Abandoned because the task expired or was cancelled.
    Cancelled,
}

impl PhaseOutcome {
    /// Whether this phase counts as successful for the scheduler report.
    ///
    /// Absorbed errors count as success so transient failures do not push
    /// the scheduler into backoff.
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::TimedOut | Self::Cancelled)
    }
}

/// Aggregate of both phase results for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub fetch_ok: bool,
    pub detection_ok: bool,
}

impl PipelineResult {
    /// Build from the two phase outcomes.
    pub fn from_outcomes(fetch: &PhaseOutcome, detection: &PhaseOutcome) -> Self {
        Self {
            fetch_ok: fetch.is_ok(),
            detection_ok: detection.is_ok(),
        }
    }

    /// The single value reported to the scheduler.
    pub fn is_success(&self) -> bool {
        self.fetch_ok && self.detection_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorbed_errors_count_as_success() {
        let fetch = PhaseOutcome::Absorbed("connection reset".to_string());
        let detection = PhaseOutcome::Completed;
        assert!(PipelineResult::from_outcomes(&fetch, &detection).is_success());
    }

    #[test]
    fn test_timeout_fails_the_run() {
        let result = PipelineResult::from_outcomes(&PhaseOutcome::Notified, &PhaseOutcome::TimedOut);
        assert!(result.fetch_ok);
        assert!(!result.detection_ok);
        assert!(!result.is_success());
    }
}
