//! Maintenance endpoints.
//!
//! Thin pass-throughs to collaborators, mounted only outside production.
//! Guarded by a bearer token when `admin.api_key` is set.

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};

use self::auth::admin_auth_middleware;
use self::handlers::{clear_queue_data, retry_seeding, send_test_notification};
use crate::http::server::AppState;

pub fn maintenance_router(state: AppState) -> Router {
    Router::new()
        .route("/healthcheck/retry-seeding", get(retry_seeding))
        .route("/healthcheck/clear-queue-data", get(clear_queue_data))
        .route("/healthcheck/send-test-notification", get(send_test_notification))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
