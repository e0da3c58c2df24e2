//! Risk and exposure-detection outcome types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::status::RiskLevel;

/// Summary produced by a completed exposure detection.
///
/// Opaque to the orchestrator; only the risk provider looks inside.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionSummary {
    /// Number of diagnosis keys that matched local observations.
    pub matched_key_count: u32,
    /// Highest risk score among the matches.
    pub maximum_risk_score: u32,
    /// Days since the most recent matching exposure.
    pub days_since_last_exposure: Option<u32>,
}

/// Why an exposure detection stopped before producing a usable summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "cause", rename_all = "snake_case")]
pub enum PrematureEndReason {
    NoExposureConfiguration,
    NoSummary(Option<String>),
    UnableToDiagnoseKeys,
    DownloadError(String),
    UnexpectedClientError(String),
    Other(String),
}

impl fmt::Display for PrematureEndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoExposureConfiguration => write!(f, "no exposure configuration"),
            Self::NoSummary(Some(cause)) => write!(f, "no summary: {}", cause),
            Self::NoSummary(None) => write!(f, "no summary"),
            Self::UnableToDiagnoseKeys => write!(f, "unable to diagnose keys"),
            Self::DownloadError(cause) => write!(f, "download error: {}", cause),
            Self::UnexpectedClientError(cause) => write!(f, "unexpected client error: {}", cause),
            Self::Other(cause) => write!(f, "{}", cause),
        }
    }
}

/// Details carried alongside a risk level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskDetails {
    pub matched_key_count: u32,
    pub days_since_last_exposure: Option<u32>,
    pub calculated_at: DateTime<Utc>,
}

/// Risk computed by the risk evaluator.
///
/// The orchestrator only reads `risk_level_has_changed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Risk {
    pub level: RiskLevel,
    pub details: RiskDetails,
    /// True when `level` differs from the previously stored level.
    pub risk_level_has_changed: bool,
}

impl Risk {
    /// Create a risk value computed now.
    pub fn new(level: RiskLevel, summary: &DetectionSummary, risk_level_has_changed: bool) -> Self {
        Self {
            level,
            details: RiskDetails {
                matched_key_count: summary.matched_key_count,
                days_since_last_exposure: summary.days_since_last_exposure,
                calculated_at: Utc::now(),
            },
            risk_level_has_changed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_display() {
        assert_eq!(
            PrematureEndReason::NoSummary(None).to_string(),
            "no summary"
        );
        assert_eq!(
            PrematureEndReason::DownloadError("404".to_string()).to_string(),
            "download error: 404"
        );
    }

    #[test]
    fn test_reason_serialization_is_tagged() {
        let json = serde_json::to_value(PrematureEndReason::UnableToDiagnoseKeys).unwrap();
        assert_eq!(json["reason"], "unable_to_diagnose_keys");
    }
}
