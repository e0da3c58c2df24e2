//! Local notifications presented by the background pipeline.

use serde::{Deserialize, Serialize};

use crate::ids::TaskIdentifier;

pub const TEST_RESULT_TITLE: &str = "Your test result is available";
pub const TEST_RESULT_BODY: &str = "Open the app to see your test result.";
pub const RISK_CHANGED_TITLE: &str = "Your risk status has changed";
pub const RISK_CHANGED_BODY: &str = "Open the app to see your current risk status.";

/// A titled notification identified by a stable id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Dedupe key; presentations with the same id coalesce.
    pub identifier: String,
}

impl Notification {
    /// Create a new notification.
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            identifier: identifier.into(),
        }
    }

    /// Notification for a resolved test result.
    pub fn test_result(task: &TaskIdentifier) -> Self {
        Self::new(TEST_RESULT_TITLE, TEST_RESULT_BODY, task.as_str())
    }

    /// Notification for a changed risk level.
    pub fn risk_changed(task: &TaskIdentifier) -> Self {
        Self::new(RISK_CHANGED_TITLE, RISK_CHANGED_BODY, task.as_str())
    }
}
