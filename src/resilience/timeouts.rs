//! Deadline enforcement.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Health check timed out after {}ms", .0.as_millis())]
pub struct DeadlineExceeded(pub Duration);

/// Run `fut` to completion unless `deadline` elapses first.
///
/// On timeout the future is dropped. Work it already spawned onto the
/// runtime is not cancelled.
pub async fn with_deadline<F>(deadline: Duration, fut: F) -> Result<F::Output, DeadlineExceeded>
where
    F: Future,
{
    tokio::time::timeout(deadline, fut).await.map_err(|_| {
        metrics::record_deadline_exceeded();
        tracing::warn!(deadline_ms = deadline.as_millis() as u64, "Deadline exceeded");
        DeadlineExceeded(deadline)
    })
}
