//! Health aggregation service.
//!
//! Probes the platform's dependent subsystems, caches each verdict for its
//! own freshness window and serves the combined verdict on
//! `GET /healthcheck` for orchestrators to poll.
//!
//! ```text
//!     orchestrator ──GET /healthcheck──▶ http ──▶ single-flight ──▶ deadline
//!                                                                     │
//!                                                                     ▼
//!     200 / 503 ◀── response ◀── verdict ◀── aggregator ◀── cache ◀── probes
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use health_aggregator::config::{load_config, HealthConfig};
use health_aggregator::health::Collaborators;
use health_aggregator::lifecycle;
use health_aggregator::observability::logging;

#[derive(Parser)]
#[command(name = "health-aggregator")]
#[command(about = "Aggregated health endpoint for the platform's subsystems", long_about = None)]
struct Args {
    /// Path to the TOML configuration file; defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("failed to load {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => HealthConfig::default(),
    };

    if let Err(e) = logging::init_logging(&config.observability, config.log_format()) {
        eprintln!("failed to initialise logging: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!(
        version = %config.health.version,
        environment = ?config.environment,
        bind_address = %config.listener.bind_address,
        deadline_ms = config.health.deadline_ms,
        "health-aggregator starting"
    );

    // Only host-level collaborators are available to the standalone binary;
    // embedding platforms register the rest through the library.
    match lifecycle::run(config, Collaborators::default()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}
