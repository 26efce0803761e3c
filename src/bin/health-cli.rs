use std::process::ExitCode;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "health-cli")]
#[command(about = "Query and maintain a running health-aggregator", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:5329")]
    url: String,

    /// Bearer token for maintenance endpoints.
    #[arg(short, long)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregated health of every subsystem
    Status,
    /// Liveness only; runs no probes
    Live,
    /// Re-run datastore seeding
    RetrySeeding,
    /// Clear job queue data
    ClearQueue {
        /// Queue to clear; all queues when omitted
        #[arg(long)]
        queue: Option<String>,
    },
    /// Send a test notification
    Notify {
        #[arg(long)]
        user_id: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match execute(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {key}"))?);
    }

    let base = cli.url.trim_end_matches('/');
    let request = match &cli.command {
        Commands::Status => client.get(format!("{base}/healthcheck")),
        Commands::Live => client.get(format!("{base}/healthcheck/live")),
        Commands::RetrySeeding => client.get(format!("{base}/healthcheck/retry-seeding")),
        Commands::ClearQueue { queue } => {
            let request = client.get(format!("{base}/healthcheck/clear-queue-data"));
            match queue {
                Some(queue) => request.query(&[("queue", queue)]),
                None => request,
            }
        }
        Commands::Notify { user_id } => client
            .get(format!("{base}/healthcheck/send-test-notification"))
            .query(&[("userId", user_id)]),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

/// Pretty-print the body; `false` when the server reported failure.
async fn print_response(res: reqwest::Response) -> Result<bool, Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{text}"),
    }

    if status == StatusCode::SERVICE_UNAVAILABLE {
        eprintln!("Service is down ({status})");
    } else if !status.is_success() {
        eprintln!("Request failed ({status})");
    }
    Ok(status.is_success())
}
