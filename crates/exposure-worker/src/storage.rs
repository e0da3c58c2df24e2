//! In-memory stand-in for the app's durable key-value storage.

use async_trait::async_trait;
use tokio::sync::RwLock;

use exposure_core::{RegistrationState, Risk};

use crate::collaborators::{RegistrationStore, RiskStore};

/// Registration state and previous risk behind async locks.
///
/// Safe to share between overlapping background and foreground runs.
/// Concurrent writes resolve as last-write-wins.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    registration: RwLock<RegistrationState>,
    previous_risk: RwLock<Option<Risk>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with a registration.
    pub fn with_registration(state: RegistrationState) -> Self {
        Self {
            registration: RwLock::new(state),
            previous_risk: RwLock::new(None),
        }
    }
}

#[async_trait]
impl RegistrationStore for InMemoryStore {
    async fn registration_state(&self) -> RegistrationState {
        self.registration.read().await.clone()
    }

    async fn set_registration_state(&self, state: RegistrationState) {
        *self.registration.write().await = state;
    }
}

#[async_trait]
impl RiskStore for InMemoryStore {
    async fn previous_risk(&self) -> Option<Risk> {
        self.previous_risk.read().await.clone()
    }

    async fn store_risk(&self, risk: Risk) {
        *self.previous_risk.write().await = Some(risk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;
    use exposure_core::{DetectionSummary, RegistrationToken, RiskLevel};

    #[tokio::test]
    async fn test_registration_roundtrip() {
        let store = InMemoryStore::new();
        assert_eq!(store.registration_state().await, RegistrationState::default());

        let state = RegistrationState::registered(RegistrationToken::new("tok"), Utc::now());
        store.set_registration_state(state.clone()).await;
        assert_eq!(store.registration_state().await, state);
    }

    #[tokio::test]
    async fn test_concurrent_risk_writes_leave_one_value() {
        let store = Arc::new(InMemoryStore::new());
        let summary = DetectionSummary::default();

        let mut handles = Vec::new();
        for level in [RiskLevel::Low, RiskLevel::High, RiskLevel::Low, RiskLevel::High] {
            let store = store.clone();
            let risk = Risk::new(level, &summary, false);
            handles.push(tokio::spawn(async move { store.store_risk(risk).await }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stored = store.previous_risk().await.unwrap();
        assert!(matches!(stored.level, RiskLevel::Low | RiskLevel::High));
    }
}
