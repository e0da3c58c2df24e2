//! HTTP client for the test-result service.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use exposure_core::{PipelineError, RegistrationState, TestResult};

use crate::collaborators::{RegistrationStore, TestResultFetcher};
use crate::lookup::{lookup_endpoint, lookup_request};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TestResultResponse {
    test_result: i64,
}

/// Parse a test-result response body.
fn parse_response(body: &str) -> Result<TestResult, PipelineError> {
    let response: TestResultResponse = serde_json::from_str(body)
        .map_err(|e| PipelineError::InvalidServerResponse(e.to_string()))?;
    TestResult::from_server_code(response.test_result)
}

/// Fetches test results for the stored registration token.
///
/// Stamps `test_result_received_at` once a result resolves, which stops
/// later background runs from fetching again.
pub struct HttpTestResultService {
    client: reqwest::Client,
    endpoint: String,
    store: Arc<dyn RegistrationStore>,
    validity: Duration,
}

impl HttpTestResultService {
    /// Create a client for the service under `base_url`.
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        store: Arc<dyn RegistrationStore>,
        validity_days: i64,
    ) -> Self {
        Self {
            client,
            endpoint: lookup_endpoint(base_url),
            store,
            validity: Duration::days(validity_days),
        }
    }
}

#[async_trait]
impl TestResultFetcher for HttpTestResultService {
    async fn is_outdated_and_cleaned(&self) -> bool {
        let state = self.store.registration_state().await;

        match (state.token_received_at, state.test_result_received_at) {
            (Some(registered_at), None) if Utc::now() - registered_at > self.validity => {
                info!(
                    registered_at = %registered_at,
                    validity_days = self.validity.num_days(),
                    "Registration outdated, removing it"
                );
                self.store
                    .set_registration_state(RegistrationState::default())
                    .await;
                true
            }
            _ => false,
        }
    }

    async fn get_test_result(&self) -> Result<TestResult, PipelineError> {
        let mut state = self.store.registration_state().await;
        let token = state.token.clone().ok_or_else(|| {
            PipelineError::UnexpectedClient("no registration token stored".to_string())
        })?;

        let response = lookup_request(&self.client, &self.endpoint, token.as_str(), false)?
            .send()
            .await
            .map_err(|e| PipelineError::TransientNetwork(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::TransientNetwork(format!("HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PipelineError::TransientNetwork(e.to_string()))?;
        let result = parse_response(&body)?;
        debug!(result = ?result, "Test result received");

        if result.is_resolved() {
            state.test_result_received_at = Some(Utc::now());
            self.store.set_registration_state(state).await;
        }

        Ok(result)
    }
}
