//! Startup orchestration.
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::HealthConfig;
use crate::health::Collaborators;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::net::{load_tls_config, TlsError};
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Start the metrics exporter and the HTTP(S) server, and serve until a
/// termination signal arrives.
///
/// Logging must already be initialised.
pub async fn run(config: HealthConfig, collaborators: Collaborators) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let bind_address = config.listener.bind_address.clone();
    let tls = config.listener.tls.clone();
    let server = HttpServer::new(config, collaborators);

    match tls {
        Some(tls) => {
            let addr: SocketAddr = bind_address
                .parse()
                .map_err(|_| StartupError::BindAddress(bind_address.clone()))?;
            let rustls = load_tls_config(&tls).await?;
            server.run_tls(addr, rustls, &shutdown).await?;
        }
        None => {
            let listener = TcpListener::bind(&bind_address).await?;
            server.run(listener, &shutdown).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
