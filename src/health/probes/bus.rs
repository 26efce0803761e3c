//! Message bus consumer-group backlog.

use std::sync::Arc;

use serde_json::json;

use crate::health::collaborators::MessageBus;
use crate::health::error::ProbeError;
use crate::health::probes::ProbeContext;
use crate::health::report::{HealthReport, Status};

pub struct BusProbe {
    bus: Arc<dyn MessageBus>,
    pending_threshold: u64,
}

impl BusProbe {
    pub fn new(bus: Arc<dyn MessageBus>, pending_threshold: u64) -> Self {
        Self {
            bus,
            pending_threshold,
        }
    }

    pub async fn evaluate(&self, ctx: &ProbeContext) -> HealthReport {
        let snapshot = match self.bus.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => return ctx.down(&*e),
        };
        if !snapshot.connected {
            return ctx
                .down(&ProbeError::Connectivity("message bus is disconnected".into()))
                .with_detail("connected", false);
        }

        let backlogged: Vec<_> = snapshot
            .groups
            .iter()
            .filter(|g| g.pending >= self.pending_threshold)
            .collect();
        let status = if backlogged.is_empty() {
            Status::Operational
        } else {
            Status::Degraded
        };

        let groups: Vec<_> = snapshot
            .groups
            .iter()
            .map(|g| {
                json!({
                    "stream": g.stream,
                    "group": g.group,
                    "pending": g.pending,
                    "consumers": g.consumers,
                })
            })
            .collect();
        let total_pending: u64 = snapshot.groups.iter().map(|g| g.pending).sum();

        let mut report = HealthReport::new(status, ctx.now())
            .with_detail("connected", true)
            .with_detail("totalPending", total_pending)
            .with_detail("groups", groups);

        if let Some(worst) = backlogged.iter().max_by_key(|g| g.pending) {
            report = report.with_error(ctx.normalizer.error(&ProbeError::ThresholdExceeded {
                metric: format!("{}/{} pending", worst.stream, worst.group),
                value: worst.pending as f64,
                threshold: self.pending_threshold as f64,
            }));
        }
        report
    }
}
