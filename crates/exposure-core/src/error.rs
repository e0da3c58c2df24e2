//! Pipeline error taxonomy.

use thiserror::Error;

use crate::risk::PrematureEndReason;

/// Errors raised inside either phase of the background pipeline.
///
/// On the background path these are logged and absorbed. On the
/// user-initiated path the detection variants are mapped to an alert.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Network failure talking to a remote service.
    #[error("Transient network error: {0}")]
    TransientNetwork(String),

    /// Test result expired and the registration was cleaned up.
    #[error("Test result is outdated")]
    OutdatedTestResult,

    /// No exposure configuration could be obtained.
    #[error("No exposure configuration available")]
    NoExposureConfiguration,

    /// Detection finished without a summary.
    #[error("Exposure detection produced no summary")]
    NoDetectionSummary,

    /// The platform could not diagnose the downloaded keys.
    #[error("Unable to diagnose keys")]
    KeyDiagnosisFailure,

    /// Diagnosis key download failed.
    #[error("Download error: {0}")]
    Download(String),

    /// Unexpected error inside the app.
    #[error("Unexpected client error: {0}")]
    UnexpectedClient(String),

    /// Remote service answered with something we cannot interpret.
    #[error("Invalid server response: {0}")]
    InvalidServerResponse(String),
}

impl From<PrematureEndReason> for PipelineError {
    fn from(reason: PrematureEndReason) -> Self {
        match reason {
            PrematureEndReason::NoExposureConfiguration => Self::NoExposureConfiguration,
            PrematureEndReason::NoSummary(_) => Self::NoDetectionSummary,
            PrematureEndReason::UnableToDiagnoseKeys => Self::KeyDiagnosisFailure,
            PrematureEndReason::DownloadError(cause) => Self::Download(cause),
            PrematureEndReason::UnexpectedClientError(cause) => Self::UnexpectedClient(cause),
            PrematureEndReason::Other(cause) => Self::UnexpectedClient(cause),
        }
    }
}
