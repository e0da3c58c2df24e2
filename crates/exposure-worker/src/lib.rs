//! Exposure background worker.
//!
//! Runs the background pipeline an OS-style scheduler hands a task to:
//! decoy traffic first, then the test-result phase, then the exposure
//! detection phase, and finally exactly one completion.

pub mod collaborators;
pub mod config;
pub mod fake_request;
pub mod foreground;
pub mod lookup;
pub mod notifier;
pub mod orchestrator;
pub mod risk_provider;
pub mod scheduler;
pub mod sim;
pub mod storage;
pub mod task;
pub mod test_result;

pub use collaborators::{
    AlertPresenter, BackgroundStatusSource, Notifier, RegistrationStore, RiskDetector,
    RiskEvaluator, RiskStore, TestResultFetcher,
};
pub use config::{ConfigError, OrchestratorConfig, WorkerConfig};
pub use fake_request::{DecoyTransport, FakeRequestConfig, FakeRequestGate, HttpDecoyTransport};
pub use foreground::{AlertSlot, ForegroundDetection};
pub use notifier::LogNotifier;
pub use orchestrator::{BackgroundTaskOrchestrator, RunReport};
pub use risk_provider::{RiskConfiguration, RiskProvider};
pub use scheduler::{SchedulerConfig, TaskScheduler};
pub use storage::InMemoryStore;
pub use task::{TaskCompletion, TaskHandle};
pub use test_result::HttpTestResultService;
