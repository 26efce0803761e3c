//! Mapping health verdicts onto HTTP responses.
//!
//! The health surface never answers 500 for a subsystem failure: the
//! verdict is either 200 (operational or degraded) or 503 (down), with the
//! details in the JSON body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::health::report::OverallHealth;

pub fn status_code(health: &OverallHealth) -> StatusCode {
    if health.is_down() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}

pub fn health_response(health: &OverallHealth) -> Response {
    (status_code(health), Json(health)).into_response()
}

/// Body of every maintenance endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceOutcome {
    pub success: bool,
    pub message: String,
}

impl MaintenanceOutcome {
    pub fn ok(message: impl Into<String>) -> (StatusCode, Json<Self>) {
        Self::reply(StatusCode::OK, true, message)
    }

    pub fn fail(code: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Self>) {
        Self::reply(code, false, message)
    }

    fn reply(code: StatusCode, success: bool, message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (
            code,
            Json(Self {
                success,
                message: message.into(),
            }),
        )
    }
}
