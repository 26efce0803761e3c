//! Health report types shared by probes, the aggregator and the HTTP layer.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::health::error::ErrorDetail;

/// Ternary health status.
///
/// Variants are declared best-to-worst so `Ord` gives the aggregation
/// precedence directly: `Down > Degraded > Operational`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Status {
    Operational,
    Degraded,
    Down,
}

impl Status {
    pub fn is_healthy(self) -> bool {
        self == Status::Operational
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Operational => "Operational",
            Status::Degraded => "Degraded",
            Status::Down => "Down",
        }
    }

    /// Gauge encoding used by the metrics exporter.
    pub fn as_gauge(self) -> f64 {
        match self {
            Status::Operational => 0.0,
            Status::Degraded => 1.0,
            Status::Down => 2.0,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a check is load-bearing for the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criticality {
    /// A `Down` report forces the overall status to `Down`.
    Critical,
    /// Any non-operational report only degrades the overall status.
    Advisory,
}

/// Result of a single probe. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    healthy: bool,
    status: Status,
    last_checked: DateTime<Utc>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    details: Map<String, Value>,
}

impl HealthReport {
    pub fn new(status: Status, checked_at: DateTime<Utc>) -> Self {
        Self {
            healthy: status.is_healthy(),
            status,
            last_checked: checked_at,
            details: Map::new(),
        }
    }

    pub fn operational(checked_at: DateTime<Utc>) -> Self {
        Self::new(Status::Operational, checked_at)
    }

    pub fn degraded(checked_at: DateTime<Utc>) -> Self {
        Self::new(Status::Degraded, checked_at)
    }

    pub fn down(checked_at: DateTime<Utc>) -> Self {
        Self::new(Status::Down, checked_at)
    }

    /// Attach a detail value, replacing any previous value under `key`.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Attach a normalized error under `details.error`.
    pub fn with_error(self, error: ErrorDetail) -> Self {
        let value = serde_json::to_value(&error).unwrap_or_else(|_| Value::String(error.message));
        self.with_detail("error", value)
    }

    pub fn healthy(&self) -> bool {
        self.healthy
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn last_checked(&self) -> DateTime<Utc> {
        self.last_checked
    }

    pub fn details(&self) -> &Map<String, Value> {
        &self.details
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }

    /// Message of the attached error, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.details
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
    }
}

/// Aggregated verdict for the whole process. Recomputed on every
/// non-shared aggregation pass and never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct OverallHealth {
    pub status: Status,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub services: BTreeMap<String, Arc<HealthReport>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OverallHealth {
    pub fn is_down(&self) -> bool {
        self.status == Status::Down
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_precedence() {
        assert!(Status::Down > Status::Degraded);
        assert!(Status::Degraded > Status::Operational);
        assert_eq!(
            [Status::Degraded, Status::Operational, Status::Down].iter().max(),
            Some(&Status::Down)
        );
    }

    #[test]
    fn test_healthy_tracks_status() {
        let now = Utc::now();
        assert!(HealthReport::operational(now).healthy());
        assert!(!HealthReport::degraded(now).healthy());
        assert!(!HealthReport::down(now).healthy());
    }

    #[test]
    fn test_report_serialization_shape() {
        let report = HealthReport::degraded(Utc::now()).with_detail("queueLength", 12);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["healthy"], false);
        assert_eq!(json["status"], "Degraded");
        assert_eq!(json["details"]["queueLength"], 12);
        assert!(json["lastChecked"].is_string());
    }

    #[test]
    fn test_empty_details_omitted() {
        let json = serde_json::to_value(HealthReport::operational(Utc::now())).unwrap();
        assert!(json.get("details").is_none());
    }
}
