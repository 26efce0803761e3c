//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the health
//! service. Every section has defaults so an empty file is a valid config.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::health::report::Criticality;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Root configuration for the health aggregation service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HealthConfig {
    /// Deployment environment; gates maintenance routes and error stacks.
    pub environment: Environment,

    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Aggregation settings (version, deadline).
    pub health: AggregationConfig,

    /// Per-check overrides keyed by check name.
    pub checks: BTreeMap<String, CheckOverride>,

    /// Probe thresholds.
    pub thresholds: ThresholdConfig,

    pub ssl: SslConfig,

    pub billing: BillingConfig,

    pub models: ModelsConfig,

    pub localization: LocalizationConfig,

    pub disk: DiskConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5329").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5329".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Timeout configuration for the HTTP surface.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Aggregation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Version string reported in every overall health body.
    pub version: String,

    /// Hard deadline for one aggregation pass, in milliseconds.
    pub deadline_ms: u64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            deadline_ms: 30_000,
        }
    }
}

/// Override for a single registered check.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CheckOverride {
    pub enabled: bool,

    /// Freshness window in milliseconds; the check's default when unset.
    pub cache_duration_ms: Option<u64>,

    /// Criticality; the check's default when unset.
    pub criticality: Option<Criticality>,
}

impl Default for CheckOverride {
    fn default() -> Self {
        Self {
            enabled: true,
            cache_duration_ms: None,
            criticality: None,
        }
    }
}

/// Thresholds for the resource and backlog probes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Process memory at or above which the memory check is Degraded.
    pub memory_degraded_bytes: u64,

    /// Process memory at or above which the memory check is Down.
    pub memory_down_bytes: u64,

    pub cpu_degraded_percent: f64,

    pub disk_degraded_percent: f64,

    /// Pending messages in one consumer group that degrade the bus.
    pub bus_pending_threshold: u64,

    pub cache_memory_degraded_percent: f64,

    /// How far back a cron failure counts as recent, in seconds.
    pub cron_failure_window_secs: u64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            memory_degraded_bytes: (1.2 * GIB) as u64,
            memory_down_bytes: (1.4 * GIB) as u64,
            cpu_degraded_percent: 85.0,
            disk_degraded_percent: 90.0,
            bus_pending_threshold: 5_000,
            cache_memory_degraded_percent: 90.0,
            cron_failure_window_secs: 3_600,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SslConfig {
    /// Externally visible URL probed with HEAD; the check is skipped when unset.
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BillingConfig {
    pub api_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ModelsConfig {
    /// External model services whose state is reported.
    pub services: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocalizationConfig {
    /// Namespace that must be loaded.
    pub namespace: String,

    /// Key translated on every probe.
    pub probe_key: String,
}

impl Default for LocalizationConfig {
    fn default() -> Self {
        Self {
            namespace: "common".to_string(),
            probe_key: "health.check".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiskConfig {
    /// Mount point inspected by the disk probe.
    pub path: String,
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Log output format; JSON in production when unset.
    pub log_format: Option<LogFormat>,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Prometheus exporter bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: None,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Maintenance endpoint settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AdminConfig {
    /// Bearer token required on maintenance routes when set.
    pub api_key: Option<String>,
}

impl HealthConfig {
    /// Log format after applying the environment default.
    pub fn log_format(&self) -> LogFormat {
        self.observability.log_format.unwrap_or(if self.environment.is_production() {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        })
    }

    /// Override for `check`, or the all-defaults override.
    pub fn check(&self, check: &str) -> CheckOverride {
        self.checks.get(check).cloned().unwrap_or_default()
    }
}
