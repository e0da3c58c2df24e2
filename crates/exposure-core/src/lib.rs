//! Exposure Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - Storage
//! - Runtime specifics
//!
//! All types here describe what the background pipeline observes and
//! decides: test results, registration state, risk, detection outcomes
//! and the per-phase results aggregated into one scheduler report.

pub mod alert;
pub mod error;
pub mod ids;
pub mod notification;
pub mod pipeline;
pub mod registration;
pub mod risk;
pub mod status;

// Re-export commonly used types
pub use alert::Alert;
pub use error::PipelineError;
pub use ids::{RegistrationToken, TaskIdentifier};
pub use notification::Notification;
pub use pipeline::{PhaseOutcome, PipelineResult};
pub use registration::RegistrationState;
pub use risk::{DetectionSummary, PrematureEndReason, Risk, RiskDetails};
pub use status::{BackgroundRefreshStatus, DetectionMode, RiskLevel, TestResult};
