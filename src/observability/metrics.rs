//! Metrics collection and exposition.
//!
//! # Metrics
//! - `health_check_status` (gauge): 0 operational, 1 degraded, 2 down, by check
//! - `health_check_duration_seconds` (histogram): probe latency by check
//! - `health_aggregations_total` (counter): completed aggregations by status
//! - `health_aggregation_duration_seconds` (histogram)
//! - `health_single_flight_joins_total` (counter): requests that reused an
//!   in-flight aggregation
//! - `health_deadline_exceeded_total` (counter)
//! - `health_cache_hits_total` / `health_cache_misses_total` (counter), by check

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::health::report::Status;

/// Install the Prometheus recorder and its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_check(check: &str, status: Status, elapsed: Duration) {
    gauge!("health_check_status", "check" => check.to_owned()).set(status.as_gauge());
    histogram!("health_check_duration_seconds", "check" => check.to_owned())
        .record(elapsed.as_secs_f64());
}

pub fn record_aggregation(status: Status, elapsed: Duration) {
    counter!("health_aggregations_total", "status" => status.as_str()).increment(1);
    histogram!("health_aggregation_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_single_flight_join() {
    counter!("health_single_flight_joins_total").increment(1);
}

pub fn record_deadline_exceeded() {
    counter!("health_deadline_exceeded_total").increment(1);
}

pub fn record_cache_hit(check: &str) {
    counter!("health_cache_hits_total", "check" => check.to_owned()).increment(1);
}

pub fn record_cache_miss(check: &str) {
    counter!("health_cache_misses_total", "check" => check.to_owned()).increment(1);
}
