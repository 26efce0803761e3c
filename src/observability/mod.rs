//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Health subsystem produces:
//!     → logging.rs (structured log events: check, status, request_id)
//!     → metrics.rs (per-check gauges, aggregation counters, cache hits)
//!
//! Consumers:
//!     → Log aggregation (stdout, JSON in production)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Metric updates are no-ops until an exporter is installed, so tests
//!   never need one

pub mod logging;
pub mod metrics;
