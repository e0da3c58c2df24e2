//! Registration state held in durable storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::RegistrationToken;

/// Snapshot of the device's test registration.
///
/// The orchestrator only reads it; collaborators mutate it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationState {
    /// Token received when the test was registered.
    pub token: Option<RegistrationToken>,

    /// When the token was received.
    pub token_received_at: Option<DateTime<Utc>>,

    /// When a resolved test result was retrieved.
    pub test_result_received_at: Option<DateTime<Utc>>,
}

impl RegistrationState {
    /// State right after a test was registered.
    pub fn registered(token: RegistrationToken, received_at: DateTime<Utc>) -> Self {
        Self {
            token: Some(token),
            token_received_at: Some(received_at),
            test_result_received_at: None,
        }
    }

    /// A fetch only makes sense with a token and no result yet.
    pub fn needs_test_result_fetch(&self) -> bool {
        self.token.is_some() && self.test_result_received_at.is_none()
    }
}
