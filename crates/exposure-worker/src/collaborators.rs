//! Narrow interfaces to the collaborators the pipeline coordinates.
//!
//! Implement these traits to plug in real platform services. The worker
//! ships simple implementations in [`crate::storage`], [`crate::notifier`],
//! [`crate::test_result`], [`crate::risk_provider`] and [`crate::sim`].

use async_trait::async_trait;
use tracing::warn;

use exposure_core::{
    Alert, BackgroundRefreshStatus, DetectionSummary, Notification, PipelineError,
    PrematureEndReason, RegistrationState, Risk, TestResult,
};

use crate::risk_provider::RiskConfiguration;

/// Presents local notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Present a notification. Presentations sharing an identifier may be
    /// coalesced by the implementation.
    async fn present(&self, notification: Notification);
}

/// Durable registration state.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn registration_state(&self) -> RegistrationState;

    /// Replace the stored state. Concurrent writers: last write wins.
    async fn set_registration_state(&self, state: RegistrationState);
}

/// Durable previous-risk value.
#[async_trait]
pub trait RiskStore: Send + Sync {
    async fn previous_risk(&self) -> Option<Risk>;

    async fn store_risk(&self, risk: Risk);
}

/// Queries the status of a submitted test.
#[async_trait]
pub trait TestResultFetcher: Send + Sync {
    /// Returns true when the registration expired and was cleaned up.
    async fn is_outdated_and_cleaned(&self) -> bool;

    async fn get_test_result(&self) -> Result<TestResult, PipelineError>;
}

/// Runs one exposure-key comparison.
#[async_trait]
pub trait RiskDetector: Send + Sync {
    async fn detect(&self) -> Result<DetectionSummary, PrematureEndReason>;
}

/// Turns detections into risk values.
#[async_trait]
pub trait RiskEvaluator: Send + Sync {
    /// Shared configuration, including the detection mode.
    fn configuration(&self) -> &RiskConfiguration;

    /// Evaluate the current risk, surfacing why detection stopped early.
    ///
    /// `Ok(None)` means no risk is known and none was computed.
    async fn evaluate(&self, user_initiated: bool) -> Result<Option<Risk>, PrematureEndReason>;

    /// Evaluate and swallow detection failures.
    async fn request_risk(&self, user_initiated: bool) -> Option<Risk> {
        match self.evaluate(user_initiated).await {
            Ok(risk) => risk,
            Err(reason) => {
                warn!(reason = %reason, user_initiated, "Exposure detection ended prematurely");
                None
            }
        }
    }
}

/// Presents alerts on top of the current UI.
#[async_trait]
pub trait AlertPresenter: Send + Sync {
    /// The alert currently shown, if any.
    async fn current_alert(&self) -> Option<Alert>;

    async fn dismiss(&self);

    async fn present(&self, alert: Alert);
}

/// Source of the OS background refresh permission.
pub trait BackgroundStatusSource: Send + Sync {
    fn background_refresh_status(&self) -> BackgroundRefreshStatus;
}

impl BackgroundStatusSource for BackgroundRefreshStatus {
    fn background_refresh_status(&self) -> BackgroundRefreshStatus {
        *self
    }
}
