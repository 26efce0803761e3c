//! Health aggregation subsystem.
//!
//! # Data Flow
//! ```text
//! GET /healthcheck
//!     → service.rs (single-flight: join a pass already running)
//!     → resilience::with_deadline (hard cap on the whole pass)
//!     → aggregator.rs (one task per check, wait for all)
//!     → cache.rs (fresh report? return it : run the probe)
//!     → probes/ (inspect one subsystem via collaborators.rs)
//!     → error.rs (any failure becomes a normalized error detail)
//! ```
//!
//! # Design Decisions
//! - Probes never fail; failures are reports
//! - Criticality decides whether a check can take the process Down
//! - The service is an explicit value, not a global, so tests build their own

pub mod aggregator;
pub mod cache;
pub mod clock;
pub mod collaborators;
pub mod error;
pub mod platform;
pub mod probes;
pub mod report;
pub mod service;
pub mod single_flight;

pub use aggregator::{overall_status, StatusAggregator};
pub use cache::TtlCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use collaborators::Collaborators;
pub use error::{ErrorDetail, ErrorNormalizer, ErrorPayload, ProbeError};
pub use probes::{CheckDescriptor, CheckKind, Probe, ProbeSet};
pub use report::{Criticality, HealthReport, OverallHealth, Status};
pub use service::HealthService;
