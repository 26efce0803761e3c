//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the health handlers
//! - Mount maintenance routes outside production
//! - Wire up middleware (request ID, tracing, timeout)
//! - Serve over plain TCP or TLS with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, response::Response, routing::get, Json, Router};
use axum_server::tls_rustls::RustlsConfig;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin;
use crate::config::HealthConfig;
use crate::health::{Collaborators, HealthService};
use crate::http::request::{make_span, MakeRequestUuid, X_REQUEST_ID};
use crate::http::response::health_response;
use crate::lifecycle::Shutdown;

/// How long in-flight requests get to finish after shutdown on TLS.
const TLS_DRAIN: Duration = Duration::from_secs(10);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub health: HealthService,
    pub collaborators: Collaborators,
    pub config: Arc<HealthConfig>,
}

impl AppState {
    pub fn new(config: HealthConfig, collaborators: Collaborators) -> Self {
        let health = HealthService::from_config(&config, &collaborators);
        Self::with_service(config, collaborators, health)
    }

    /// State around an already constructed service.
    pub fn with_service(config: HealthConfig, collaborators: Collaborators, health: HealthService) -> Self {
        Self {
            health,
            collaborators,
            config: Arc::new(config),
        }
    }
}

/// Build the router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState) -> Router {
    let request_timeout = Duration::from_secs(state.config.timeouts.request_secs);
    let production = state.config.environment.is_production();

    let mut router = Router::new()
        .route("/healthcheck", get(healthcheck))
        .route("/healthcheck/live", get(liveness))
        .with_state(state.clone());

    if !production {
        router = router.merge(admin::maintenance_router(state));
    }

    router
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http().make_span_with(make_span))
        .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
        .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
}

async fn healthcheck(State(state): State<AppState>) -> Response {
    let flight = state.health.check_with_flight().await;
    tracing::info!(
        status = %flight.value.status,
        joined = flight.joined,
        "Health check served"
    );
    health_response(&flight.value)
}

async fn liveness(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "alive",
        "version": state.health.version(),
    }))
}

/// HTTP server for the health endpoints.
pub struct HttpServer {
    router: Router,
    config: Arc<HealthConfig>,
}

impl HttpServer {
    pub fn new(config: HealthConfig, collaborators: Collaborators) -> Self {
        Self::from_state(AppState::new(config, collaborators))
    }

    pub fn from_state(state: AppState) -> Self {
        let config = state.config.clone();
        Self {
            router: build_router(state),
            config,
        }
    }

    /// Serve plain HTTP on `listener` until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: &Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = ?self.config.environment,
            "HTTP server starting"
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS on `addr` until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        shutdown: &Shutdown,
    ) -> Result<(), std::io::Error> {
        tracing::info!(
            address = %addr,
            environment = ?self.config.environment,
            "HTTPS server starting"
        );

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        let stop = shutdown.wait();
        tokio::spawn(async move {
            stop.await;
            drain.graceful_shutdown(Some(TLS_DRAIN));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    pub fn config(&self) -> &HealthConfig {
        &self.config
    }
}
