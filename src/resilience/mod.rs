//! Resilience subsystem.
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; the aggregation always has a deadline
//! - A deadline produces a result, it does not cancel spawned work
//!   (probe tasks keep running and still fill the cache)

pub mod timeouts;

pub use timeouts::{with_deadline, DeadlineExceeded};
