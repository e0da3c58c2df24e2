//! User-facing alerts for detections that ended prematurely.

use serde::{Deserialize, Serialize};

use crate::risk::PrematureEndReason;

/// A titled alert shown on top of the current UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    /// Create a new alert.
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

const DETECTION_FAILED_TITLE: &str = "Exposure check failed";

impl From<&PrematureEndReason> for Alert {
    // No wildcard arm: a new reason must get its own message.
    fn from(reason: &PrematureEndReason) -> Self {
        let message = match reason {
            PrematureEndReason::NoExposureConfiguration => {
                "The exposure configuration could not be loaded. Please try again later."
                    .to_string()
            }
            PrematureEndReason::NoSummary(_) => {
                "The exposure check finished without a result. Please try again later."
                    .to_string()
            }
            PrematureEndReason::UnableToDiagnoseKeys => {
                "The downloaded keys could not be checked on this device.".to_string()
            }
            PrematureEndReason::DownloadError(cause) => {
                format!("The diagnosis keys could not be downloaded ({}).", cause)
            }
            PrematureEndReason::UnexpectedClientError(cause) => {
                format!("An unexpected error occurred ({}).", cause)
            }
            PrematureEndReason::Other(cause) => {
                format!("The exposure check could not be completed ({}).", cause)
            }
        };
        Alert::new(DETECTION_FAILED_TITLE, message)
    }
}
