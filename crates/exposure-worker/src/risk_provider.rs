//! Minimal risk provider: runs detection, classifies it and tracks changes.
//!
//! The scoring here is a plain threshold on the summary's maximum risk
//! score. What matters to the pipeline is the change flag, which is
//! computed against the last stored risk.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info};

use exposure_core::{DetectionMode, DetectionSummary, PrematureEndReason, Risk, RiskLevel};

use crate::collaborators::{RiskDetector, RiskEvaluator, RiskStore};

/// Shared, mutable risk configuration.
///
/// `set_mode` and `mode` are the only way to touch the detection mode, so
/// background and foreground callers never write the field directly.
#[derive(Debug)]
pub struct RiskConfiguration {
    mode: RwLock<DetectionMode>,
    high_risk_threshold: u32,
}

impl RiskConfiguration {
    /// Create a configuration.
    pub fn new(mode: DetectionMode, high_risk_threshold: u32) -> Self {
        Self {
            mode: RwLock::new(mode),
            high_risk_threshold,
        }
    }

    pub async fn mode(&self) -> DetectionMode {
        *self.mode.read().await
    }

    /// Set the detection mode. Last writer wins.
    pub async fn set_mode(&self, mode: DetectionMode) {
        let mut current = self.mode.write().await;
        let previous = *current;
        if previous != mode {
            debug!(from = ?previous, to = ?mode, "Detection mode changed");
        }
        *current = mode;
    }

    /// Minimum maximum-risk-score classified as high risk.
    pub fn high_risk_threshold(&self) -> u32 {
        self.high_risk_threshold
    }
}

impl Default for RiskConfiguration {
    fn default() -> Self {
        Self::new(DetectionMode::default(), 15)
    }
}

/// Risk evaluator backed by a detector and a risk store.
pub struct RiskProvider {
    detector: Arc<dyn RiskDetector>,
    store: Arc<dyn RiskStore>,
    configuration: RiskConfiguration,
    /// Serializes detections; the mode is read once under this lock.
    run_lock: Mutex<()>,
    updates: broadcast::Sender<Risk>,
}

impl RiskProvider {
    /// Create a new provider.
    pub fn new(
        detector: Arc<dyn RiskDetector>,
        store: Arc<dyn RiskStore>,
        configuration: RiskConfiguration,
    ) -> Self {
        let (updates, _) = broadcast::channel(16);
        Self {
            detector,
            store,
            configuration,
            run_lock: Mutex::new(()),
            updates,
        }
    }

    /// Receive every risk this provider computes.
    pub fn subscribe(&self) -> broadcast::Receiver<Risk> {
        self.updates.subscribe()
    }

    fn classify(&self, summary: &DetectionSummary) -> RiskLevel {
        if summary.matched_key_count > 0
            && summary.maximum_risk_score >= self.configuration.high_risk_threshold()
        {
            RiskLevel::High
        } else {
            RiskLevel::Low
        }
    }
}

#[async_trait]
impl RiskEvaluator for RiskProvider {
    fn configuration(&self) -> &RiskConfiguration {
        &self.configuration
    }

    async fn evaluate(&self, user_initiated: bool) -> Result<Option<Risk>, PrematureEndReason> {
        let _running = self.run_lock.lock().await;

        let mode = self.configuration.mode().await;
        let previous = self.store.previous_risk().await;

        if mode == DetectionMode::Manual && !user_initiated {
            debug!("Manual detection mode, reusing stored risk");
            return Ok(previous.map(|mut risk| {
                risk.risk_level_has_changed = false;
                risk
            }));
        }

        let summary = self.detector.detect().await?;
        let level = self.classify(&summary);

        // A first evaluation only counts as a change when it is high risk.
        let changed = match &previous {
            Some(previous) => previous.level != level,
            None => level == RiskLevel::High,
        };

        let risk = Risk::new(level, &summary, changed);
        self.store.store_risk(risk.clone()).await;

        info!(
            level = ?risk.level,
            matched_keys = summary.matched_key_count,
            changed,
            user_initiated,
            "Risk evaluated"
        );

        // No subscribers is fine.
        let _ = self.updates.send(risk.clone());
        Ok(Some(risk))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use crate::sim::ScriptedDetector;
    use crate::storage::InMemoryStore;

    /// Slow detector that records when each run starts and ends and fails
    /// if it is entered twice.
    #[derive(Default)]
    struct RecordingDetector {
        running: AtomicBool,
        events: std::sync::Mutex<Vec<&'static str>>,
    }

    impl RecordingDetector {
        fn events(&self) -> Vec<&'static str> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RiskDetector for RecordingDetector {
        async fn detect(&self) -> Result<DetectionSummary, PrematureEndReason> {
            assert!(
                !self.running.swap(true, Ordering::SeqCst),
                "detection entered while another was running"
            );
            self.events.lock().unwrap().push("start");
            tokio::time::sleep(Duration::from_secs(10)).await;
            self.events.lock().unwrap().push("end");
            self.running.store(false, Ordering::SeqCst);
            Ok(high())
        }
    }

    fn high() -> DetectionSummary {
        DetectionSummary {
            matched_key_count: 3,
            maximum_risk_score: 40,
            days_since_last_exposure: Some(2),
        }
    }

    fn low() -> DetectionSummary {
        DetectionSummary::default()
    }

    fn provider(detector: ScriptedDetector, mode: DetectionMode) -> (RiskProvider, Arc<ScriptedDetector>) {
        let detector = Arc::new(detector);
        let provider = RiskProvider::new(
            detector.clone(),
            Arc::new(InMemoryStore::new()),
            RiskConfiguration::new(mode, 15),
        );
        (provider, detector)
    }

    #[tokio::test]
    async fn test_change_flag_follows_stored_level() {
        let (provider, _) = provider(
            ScriptedDetector::new(Ok(high())).then(Ok(high())),
            DetectionMode::Automatic,
        );

        let first = provider.request_risk(false).await.unwrap();
        assert_eq!(first.level, RiskLevel::High);
        assert!(first.risk_level_has_changed);

        let second = provider.request_risk(false).await.unwrap();
        assert!(!second.risk_level_has_changed);
    }

    #[tokio::test]
    async fn test_first_low_risk_is_not_a_change() {
        let (provider, _) = provider(ScriptedDetector::new(Ok(low())), DetectionMode::Automatic);

        let risk = provider.request_risk(false).await.unwrap();
        assert_eq!(risk.level, RiskLevel::Low);
        assert!(!risk.risk_level_has_changed);
    }

    #[tokio::test]
    async fn test_manual_mode_skips_background_detection() {
        let (provider, detector) =
            provider(ScriptedDetector::new(Ok(high())), DetectionMode::Manual);

        assert!(provider.request_risk(false).await.is_none());
        assert_eq!(detector.calls(), 0);

        // User-initiated detection runs regardless of mode.
        let risk = provider.request_risk(true).await.unwrap();
        assert_eq!(detector.calls(), 1);
        assert!(risk.risk_level_has_changed);

        let cached = provider.request_risk(false).await.unwrap();
        assert_eq!(cached.level, RiskLevel::High);
        assert!(!cached.risk_level_has_changed);
        assert_eq!(detector.calls(), 1);
    }

    #[tokio::test]
    async fn test_premature_end_is_surfaced_by_evaluate() {
        let (provider, _) = provider(
            ScriptedDetector::new(Err(PrematureEndReason::NoSummary(None))),
            DetectionMode::Automatic,
        );

        assert_eq!(
            provider.evaluate(true).await,
            Err(PrematureEndReason::NoSummary(None))
        );
        assert!(provider.request_risk(false).await.is_none());
    }

    #[tokio::test]
    async fn test_subscribers_receive_updates() {
        let (provider, _) = provider(ScriptedDetector::new(Ok(high())), DetectionMode::Automatic);
        let mut rx = provider.subscribe();

        provider.request_risk(false).await;

        let update = rx.recv().await.unwrap();
        assert_eq!(update.level, RiskLevel::High);
    }

    #[tokio::test]
    async fn test_set_mode_is_visible() {
        let configuration = RiskConfiguration::default();
        assert_eq!(configuration.mode().await, DetectionMode::Manual);

        configuration.set_mode(DetectionMode::Automatic).await;
        assert_eq!(configuration.mode().await, DetectionMode::Automatic);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mode_switch_during_detection_keeps_runs_sequential() {
        let detector = Arc::new(RecordingDetector::default());
        let provider = Arc::new(RiskProvider::new(
            detector.clone(),
            Arc::new(InMemoryStore::new()),
            RiskConfiguration::new(DetectionMode::Automatic, 15),
        ));

        let background = tokio::spawn({
            let provider = provider.clone();
            async move { provider.evaluate(false).await }
        });
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(detector.events(), vec!["start"]);

        provider.configuration().set_mode(DetectionMode::Manual).await;
        let foreground = tokio::spawn({
            let provider = provider.clone();
            async move { provider.evaluate(true).await }
        });

        // The background run read Automatic before the switch and still detects.
        let background = background.await.unwrap().unwrap().unwrap();
        assert_eq!(background.level, RiskLevel::High);
        assert!(background.risk_level_has_changed);

        let foreground = foreground.await.unwrap().unwrap().unwrap();
        assert!(!foreground.risk_level_has_changed);

        assert_eq!(detector.events(), vec!["start", "end", "start", "end"]);

        // Manual mode now holds for later background runs.
        let cached = provider.evaluate(false).await.unwrap().unwrap();
        assert_eq!(cached.level, RiskLevel::High);
        assert_eq!(detector.events().len(), 4);
    }
}
