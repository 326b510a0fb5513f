//! Charge service verifier binary
//!
//! Runs two campaigns sequentially — a large trial count against the fast
//! backend deployment, then a small one against the slow deployment — and
//! exits non-zero on the first failed trial or fatal transport error.
//!
//! Endpoints are supplied via flags or environment variables:
//!
//!   charge-verifier \
//!     --fast-charge-url https://fast.example/prod/charge \
//!     --fast-reset-url  https://fast.example/prod/reset \
//!     --slow-charge-url https://slow.example/prod/charge \
//!     --slow-reset-url  https://slow.example/prod/reset

use std::error::Error;
use std::process;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use charge_verifier::{run_campaign, Backend, CampaignConfig, ChargeClient, TrialConfig};

#[derive(Debug, Parser)]
#[command(about = "Concurrency verifier for a rate-limited charge service")]
struct Args {
    /// Charge endpoint of the fast backend deployment
    #[arg(long, env = "FAST_CHARGE_URL")]
    fast_charge_url: String,
    /// Reset endpoint of the fast backend deployment
    #[arg(long, env = "FAST_RESET_URL")]
    fast_reset_url: String,
    /// Charge endpoint of the slow backend deployment
    #[arg(long, env = "SLOW_CHARGE_URL")]
    slow_charge_url: String,
    /// Reset endpoint of the slow backend deployment
    #[arg(long, env = "SLOW_RESET_URL")]
    slow_reset_url: String,
    /// Trials to run against the fast backend
    #[arg(long, default_value_t = 10_000)]
    fast_trials: usize,
    /// Trials to run against the slow backend
    #[arg(long, default_value_t = 100)]
    slow_trials: usize,
    /// Simultaneous charge calls per trial
    #[arg(long, default_value_t = 21)]
    concurrency: usize,
    /// Charge calls the backend must admit per trial
    #[arg(long, default_value_t = 20)]
    expected_authorized: u32,
    /// Per-request timeout in seconds; unbounded when omitted
    #[arg(long)]
    request_timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(args).await {
        error!("{e}");
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let client = ChargeClient::new(args.request_timeout_secs.map(Duration::from_secs))?;

    let trial = TrialConfig {
        concurrency: args.concurrency,
        expected_authorized: args.expected_authorized,
    };

    let campaigns = [
        (
            Backend::new("fast", args.fast_charge_url, args.fast_reset_url),
            args.fast_trials,
        ),
        (
            Backend::new("slow", args.slow_charge_url, args.slow_reset_url),
            args.slow_trials,
        ),
    ];

    for (backend, trials) in campaigns {
        info!(backend = %backend.name, trials, "starting campaign");

        let config = CampaignConfig {
            trials,
            trial: trial.clone(),
            ..CampaignConfig::default()
        };
        let report = run_campaign(&client, &backend, &config).await?;

        info!(
            backend = %backend.name,
            trials = report.trials_run,
            elapsed_ms = report.duration.as_millis() as u64,
            "campaign passed"
        );
    }

    Ok(())
}
