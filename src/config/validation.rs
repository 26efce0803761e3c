//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: HealthConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::HealthConfig;
use crate::health::probes::CheckKind;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: String },

    #[error("{field} must be within (0, 100], got {value}")]
    Percent { field: String, value: f64 },

    #[error("thresholds.memory_degraded_bytes ({degraded}) must be below thresholds.memory_down_bytes ({down})")]
    MemoryBands { degraded: u64, down: u64 },

    #[error("unknown check '{0}'")]
    UnknownCheck(String),

    #[error("invalid {field} '{value}'")]
    InvalidAddress { field: String, value: String },

    #[error("invalid ssl.url '{0}'")]
    InvalidUrl(String),

    #[error("timeouts.request_secs ({request_secs}s) must exceed health.deadline_ms ({deadline_ms}ms)")]
    RequestTimeoutWithinDeadline { request_secs: u64, deadline_ms: u64 },

    #[error("{field} must be at most {max}, got {value}")]
    TooLarge { field: String, value: u64, max: u64 },
}

/// Upper bound for the cron failure window (ten years).
pub const MAX_CRON_FAILURE_WINDOW_SECS: u64 = 10 * 365 * 24 * 3600;

pub fn validate_config(config: &HealthConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.health.deadline_ms == 0 {
        errors.push(zero("health.deadline_ms"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(zero("timeouts.request_secs"));
    }
    if config.health.deadline_ms > 0
        && config.timeouts.request_secs.saturating_mul(1000) <= config.health.deadline_ms
    {
        errors.push(ValidationError::RequestTimeoutWithinDeadline {
            request_secs: config.timeouts.request_secs,
            deadline_ms: config.health.deadline_ms,
        });
    }

    for (name, check) in &config.checks {
        if CheckKind::from_name(name).is_none() {
            errors.push(ValidationError::UnknownCheck(name.clone()));
        }
        if check.cache_duration_ms == Some(0) {
            errors.push(zero(&format!("checks.{name}.cache_duration_ms")));
        }
    }

    let t = &config.thresholds;
    if t.memory_degraded_bytes >= t.memory_down_bytes {
        errors.push(ValidationError::MemoryBands {
            degraded: t.memory_degraded_bytes,
            down: t.memory_down_bytes,
        });
    }
    for (field, value) in [
        ("thresholds.cpu_degraded_percent", t.cpu_degraded_percent),
        ("thresholds.disk_degraded_percent", t.disk_degraded_percent),
        ("thresholds.cache_memory_degraded_percent", t.cache_memory_degraded_percent),
    ] {
        if !(value > 0.0 && value <= 100.0) {
            errors.push(ValidationError::Percent {
                field: field.to_string(),
                value,
            });
        }
    }
    if t.bus_pending_threshold == 0 {
        errors.push(zero("thresholds.bus_pending_threshold"));
    }
    if t.cron_failure_window_secs > MAX_CRON_FAILURE_WINDOW_SECS {
        errors.push(ValidationError::TooLarge {
            field: "thresholds.cron_failure_window_secs".to_string(),
            value: t.cron_failure_window_secs,
            max: MAX_CRON_FAILURE_WINDOW_SECS,
        });
    }

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if let Some(url) = &config.ssl.url {
        if Url::parse(url).is_err() {
            errors.push(ValidationError::InvalidUrl(url.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn zero(field: &str) -> ValidationError {
    ValidationError::Zero {
        field: field.to_string(),
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}
