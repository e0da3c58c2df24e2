//! Exposure background worker daemon

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use exposure_core::{BackgroundRefreshStatus, DetectionSummary, RegistrationState, RegistrationToken};
use exposure_worker::sim::ScriptedDetector;
use exposure_worker::{
    AlertSlot, BackgroundTaskOrchestrator, FakeRequestGate, ForegroundDetection,
    HttpDecoyTransport, HttpTestResultService, InMemoryStore, LogNotifier, RiskConfiguration,
    RiskProvider, TaskScheduler, WorkerConfig,
};

/// Background execution coordinator for exposure checks
#[derive(Parser)]
#[command(name = "exposure-worker")]
#[command(about = "Runs test-result and exposure-detection background tasks", long_about = None)]
struct Cli {
    /// Base URL of the test-result service
    #[arg(long, env = "EXPOSURE_SUBMISSION_URL", default_value = "http://localhost:8080")]
    submission_url: String,

    /// Registration token to seed storage with
    #[arg(long, env = "EXPOSURE_REGISTRATION_TOKEN")]
    token: Option<String>,

    /// Seconds between background runs
    #[arg(long, default_value = "3600")]
    interval_secs: u64,

    /// Wall-clock budget of one background run in seconds
    #[arg(long, default_value = "30")]
    budget_secs: u64,

    /// Disable decoy traffic
    #[arg(long)]
    no_fake_requests: bool,

    /// Background refresh permission reported by the platform
    #[arg(long, value_enum, default_value = "available")]
    background_status: BackgroundStatusArg,

    /// Matched keys reported by the simulated detector
    #[arg(long, default_value = "0")]
    matched_keys: u32,

    /// Maximum risk score reported by the simulated detector
    #[arg(long, default_value = "0")]
    risk_score: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackgroundStatusArg {
    Available,
    Denied,
    Restricted,
}

impl From<BackgroundStatusArg> for BackgroundRefreshStatus {
    fn from(arg: BackgroundStatusArg) -> Self {
        match arg {
            BackgroundStatusArg::Available => Self::Available,
            BackgroundStatusArg::Denied => Self::Denied,
            BackgroundStatusArg::Restricted => Self::Restricted,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single background task and exit
    #[command(name = "run-once")]
    RunOnce,

    /// Run background tasks periodically until interrupted
    #[command(name = "schedule")]
    Schedule,

    /// Run a user-initiated exposure detection
    #[command(name = "detect")]
    Detect,
}

impl Cli {
    fn worker_config(&self) -> WorkerConfig {
        let mut config = WorkerConfig {
            submission_url: self.submission_url.clone(),
            background_status: self.background_status.into(),
            ..WorkerConfig::default()
        };
        config.fake_requests.enabled = !self.no_fake_requests;
        config.scheduler.interval = Duration::from_secs(self.interval_secs);
        config.scheduler.task_budget = Duration::from_secs(self.budget_secs);
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("exposure_worker=info,exposure_core=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    // Load config
    let config = cli.worker_config();
    config.validate()?;

    info!(
        submission_url = %config.submission_url,
        background_status = ?config.background_status,
        fake_requests = config.fake_requests.enabled,
        "Starting exposure worker"
    );

    let store = Arc::new(match &cli.token {
        Some(token) => InMemoryStore::with_registration(RegistrationState::registered(
            RegistrationToken::new(token.clone()),
            Utc::now(),
        )),
        None => InMemoryStore::new(),
    });

    let detector = ScriptedDetector::new(Ok(DetectionSummary {
        matched_key_count: cli.matched_keys,
        maximum_risk_score: cli.risk_score,
        days_since_last_exposure: (cli.matched_keys > 0).then_some(1),
    }));
    let provider = Arc::new(RiskProvider::new(
        Arc::new(detector),
        store.clone(),
        RiskConfiguration::default(),
    ));

    match cli.command {
        Commands::Detect => {
            let foreground = ForegroundDetection::new(provider, Arc::new(AlertSlot::new()));
            match foreground.detect_now().await {
                Ok(Some(risk)) => info!(level = ?risk.level, "Detection finished"),
                Ok(None) => info!("Detection finished without a risk"),
                Err(e) => warn!(error = %e, "Detection failed"),
            }
        }
        Commands::RunOnce => {
            let scheduler = build_scheduler(&config, store, provider)?;
            let success = scheduler.run_once().await;
            info!(success, "Background run finished");
        }
        Commands::Schedule => {
            let scheduler = build_scheduler(&config, store, provider)?;

            let shutdown = CancellationToken::new();
            let signal_token = shutdown.clone();
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => info!("Interrupt received"),
                    Err(e) => error!(error = %e, "Failed to listen for interrupt"),
                }
                signal_token.cancel();
            });

            scheduler.run(shutdown).await;
        }
    }

    Ok(())
}

/// Wire the HTTP collaborators and the orchestrator into a scheduler.
fn build_scheduler(
    config: &WorkerConfig,
    store: Arc<InMemoryStore>,
    provider: Arc<RiskProvider>,
) -> Result<TaskScheduler, reqwest::Error> {
    let client = reqwest::Client::builder()
        .timeout(config.orchestrator.fetch_timeout)
        .build()?;

    let fetcher = Arc::new(HttpTestResultService::new(
        client.clone(),
        &config.submission_url,
        store.clone(),
        config.test_validity_days,
    ));

    let mut orchestrator = BackgroundTaskOrchestrator::new(
        store,
        fetcher,
        provider,
        Arc::new(LogNotifier::default()),
        Arc::new(config.background_status),
        config.orchestrator.clone(),
    );
    if config.fake_requests.enabled {
        let transport = Arc::new(HttpDecoyTransport::new(client, &config.submission_url));
        let gate = FakeRequestGate::new(transport, config.fake_requests.clone());
        orchestrator = orchestrator.with_fake_requests(gate);
    }

    Ok(TaskScheduler::new(
        Arc::new(orchestrator),
        config.scheduler.clone(),
    ))
}
