//! Worker configuration.

use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

use exposure_core::BackgroundRefreshStatus;

use crate::fake_request::FakeRequestConfig;
use crate::scheduler::SchedulerConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid submission URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid duration for {field}: {reason}")]
    InvalidDuration { field: &'static str, reason: String },

    #[error("Invalid fake request range: {0}")]
    InvalidFakeRequestRange(String),
}

/// Per-phase time budgets for one orchestrator run.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Budget for the test-result phase.
    pub fetch_timeout: Duration,

    /// Budget for the exposure detection phase.
    pub detection_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(10),
            detection_timeout: Duration::from_secs(15),
        }
    }
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Base URL of the test-result/submission service.
    pub submission_url: String,

    /// Days a registration stays valid without a result.
    pub test_validity_days: i64,

    /// Background refresh permission reported to the pipeline.
    pub background_status: BackgroundRefreshStatus,

    pub orchestrator: OrchestratorConfig,

    pub fake_requests: FakeRequestConfig,

    pub scheduler: SchedulerConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            submission_url: "http://localhost:8080".to_string(),
            test_validity_days: 21,
            background_status: BackgroundRefreshStatus::Available,
            orchestrator: OrchestratorConfig::default(),
            fake_requests: FakeRequestConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl WorkerConfig {
    /// Check the configuration for values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.submission_url).map_err(|e| ConfigError::InvalidUrl {
            url: self.submission_url.clone(),
            reason: e.to_string(),
        })?;

        if self.scheduler.interval.is_zero() {
            return Err(ConfigError::InvalidDuration {
                field: "interval",
                reason: "must be greater than zero".to_string(),
            });
        }

        let fake = &self.fake_requests;
        let mut stages = self.orchestrator.fetch_timeout + self.orchestrator.detection_timeout;
        if fake.enabled {
            stages += fake.timeout;
        }
        if stages > self.scheduler.task_budget {
            return Err(ConfigError::InvalidDuration {
                field: "task_budget",
                reason: format!(
                    "{:?} is shorter than the stage timeouts combined ({:?})",
                    self.scheduler.task_budget, stages
                ),
            });
        }

        if fake.min_requests > fake.max_requests {
            return Err(ConfigError::InvalidFakeRequestRange(format!(
                "requests {}..={}",
                fake.min_requests, fake.max_requests
            )));
        }

        Ok(())
    }
}
