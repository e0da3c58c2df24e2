//! Decoy traffic issued before the real pipeline runs.
//!
//! Network observers should not be able to tell a background run that
//! fetches a real test result from one that does not. The gate sends a
//! random number of lookups built exactly like the real test-result call,
//! then lets the pipeline continue. It never fails and never blocks longer than
//! its timeout.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::{debug, warn};

use exposure_core::{PipelineError, RegistrationToken};

use crate::lookup::{lookup_endpoint, lookup_request};

/// Decoy traffic settings.
#[derive(Debug, Clone)]
pub struct FakeRequestConfig {
    /// Whether the gate sends anything at all.
    pub enabled: bool,

    pub min_requests: u32,
    pub max_requests: u32,

    /// Upper bound on the time spent on decoys.
    pub timeout: Duration,
}

impl Default for FakeRequestConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_requests: 1,
            max_requests: 3,
            timeout: Duration::from_secs(5),
        }
    }
}

/// Sends one decoy request.
#[async_trait]
pub trait DecoyTransport: Send + Sync {
    async fn send_decoy(&self) -> Result<(), PipelineError>;
}

/// Sends decoys to the real submission endpoint, flagged as fake.
pub struct HttpDecoyTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpDecoyTransport {
    /// Create a transport targeting the test-result endpoint under `base_url`.
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: lookup_endpoint(base_url),
        }
    }
}

#[async_trait]
impl DecoyTransport for HttpDecoyTransport {
    async fn send_decoy(&self) -> Result<(), PipelineError> {
        let token = RegistrationToken::generate();
        let response = lookup_request(&self.client, &self.endpoint, token.as_str(), true)?
            .send()
            .await
            .map_err(|e| PipelineError::TransientNetwork(e.to_string()))?;

        debug!(status = %response.status(), "Decoy request answered");
        Ok(())
    }
}

/// Leading pipeline stage that issues decoy traffic.
pub struct FakeRequestGate {
    transport: Arc<dyn DecoyTransport>,
    config: FakeRequestConfig,
}

impl FakeRequestGate {
    /// Create a new gate.
    pub fn new(transport: Arc<dyn DecoyTransport>, config: FakeRequestConfig) -> Self {
        Self { transport, config }
    }

    /// Number of decoys for this run.
    fn plan(&self) -> u32 {
        rand::thread_rng().gen_range(self.config.min_requests..=self.config.max_requests)
    }

    /// Send the decoys. Returns when they finish or the timeout hits.
    pub async fn execute(&self) {
        if !self.config.enabled {
            debug!("Fake requests disabled");
            return;
        }

        let count = self.plan();

        let decoys = async {
            for _ in 0..count {
                if let Err(e) = self.transport.send_decoy().await {
                    debug!(error = %e, "Decoy request failed");
                }
            }
        };

        match tokio::time::timeout(self.config.timeout, decoys).await {
            Ok(()) => debug!(count, "Decoy requests finished"),
            Err(_) => warn!(
                count,
                timeout_ms = self.config.timeout.as_millis() as u64,
                "Decoy requests timed out, continuing"
            ),
        }
    }
}
