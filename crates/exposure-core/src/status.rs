//! Status enums for test results, detection mode and risk levels.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Result of a submitted test as reported by the test-result service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestResult {
    /// Lab has not reported a result yet.
    #[default]
    Pending,
    /// Test came back negative.
    Negative,
    /// Test came back positive.
    Positive,
    /// Sample could not be evaluated.
    Invalid,
    /// Validity window elapsed and the result was removed server side.
    ExpiredRemoved,
}

impl TestResult {
    /// Map the numeric code used on the wire.
    pub fn from_server_code(code: i64) -> Result<Self, PipelineError> {
        match code {
            0 => Ok(Self::Pending),
            1 => Ok(Self::Negative),
            2 => Ok(Self::Positive),
            3 => Ok(Self::Invalid),
            4 => Ok(Self::ExpiredRemoved),
            other => Err(PipelineError::InvalidServerResponse(format!(
                "unknown test result code {}",
                other
            ))),
        }
    }

    /// Returns true once the result is anything but pending.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Whether the OS lets the app refresh in the background.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundRefreshStatus {
    #[default]
    Available,
    Denied,
    Restricted,
}

/// How aggressively exposure detection runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    /// Detection runs on every background invocation.
    Automatic,
    /// Detection only runs when the user asks for it.
    #[default]
    Manual,
}

impl DetectionMode {
    /// Derive the mode from the current background refresh permission.
    pub fn from_background_status(status: BackgroundRefreshStatus) -> Self {
        match status {
            BackgroundRefreshStatus::Available => Self::Automatic,
            BackgroundRefreshStatus::Denied | BackgroundRefreshStatus::Restricted => Self::Manual,
        }
    }
}

/// Coarse risk category shown to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// No detection has produced a level yet.
    #[default]
    Unknown,
    /// Exposure logging is switched off.
    Inactive,
    Low,
    High,
}
