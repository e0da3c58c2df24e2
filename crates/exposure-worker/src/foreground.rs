//! User-initiated exposure detection and its failure alerts.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use exposure_core::{Alert, PipelineError, Risk};

use crate::collaborators::{AlertPresenter, RiskEvaluator};

/// Presenter that shows at most one alert at a time.
#[derive(Debug, Default)]
pub struct AlertSlot {
    current: RwLock<Option<Alert>>,
}

impl AlertSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AlertPresenter for AlertSlot {
    async fn current_alert(&self) -> Option<Alert> {
        self.current.read().await.clone()
    }

    async fn dismiss(&self) {
        if let Some(alert) = self.current.write().await.take() {
            debug!(title = %alert.title, "Alert dismissed");
        }
    }

    async fn present(&self, alert: Alert) {
        info!(title = %alert.title, message = %alert.message, "Presenting alert");
        *self.current.write().await = Some(alert);
    }
}

/// Runs detection on the user's request and maps premature ends to alerts.
pub struct ForegroundDetection {
    evaluator: Arc<dyn RiskEvaluator>,
    presenter: Arc<dyn AlertPresenter>,
}

impl ForegroundDetection {
    /// Create a new foreground detection coordinator.
    pub fn new(evaluator: Arc<dyn RiskEvaluator>, presenter: Arc<dyn AlertPresenter>) -> Self {
        Self {
            evaluator,
            presenter,
        }
    }

    /// Run a user-initiated detection.
    ///
    /// If detection ends prematurely, any alert already on screen is
    /// dismissed and replaced by the one mapped from the reason.
    pub async fn detect_now(&self) -> Result<Option<Risk>, PipelineError> {
        match self.evaluator.evaluate(true).await {
            Ok(risk) => Ok(risk),
            Err(reason) => {
                warn!(reason = %reason, "User-initiated exposure detection ended prematurely");

                let alert = Alert::from(&reason);
                if self.presenter.current_alert().await.is_some() {
                    self.presenter.dismiss().await;
                }
                self.presenter.present(alert).await;

                Err(reason.into())
            }
        }
    }
}
