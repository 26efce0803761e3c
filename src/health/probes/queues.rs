//! Job queues: one sub-report per registered queue.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::future::join_all;
use serde_json::{Map, Value};

use crate::health::collaborators::{JobQueue, QueueStatus};
use crate::health::probes::ProbeContext;
use crate::health::report::{HealthReport, Status};

fn map_status(status: QueueStatus) -> Status {
    match status {
        QueueStatus::Healthy => Status::Operational,
        QueueStatus::Degraded => Status::Degraded,
        QueueStatus::Down => Status::Down,
    }
}

pub struct QueuesProbe {
    queues: Vec<Arc<dyn JobQueue>>,
}

impl QueuesProbe {
    pub fn new(queues: Vec<Arc<dyn JobQueue>>) -> Self {
        Self { queues }
    }

    /// Report for every registered queue. An empty registry yields an empty map.
    pub async fn per_queue(&self, ctx: &ProbeContext) -> BTreeMap<String, HealthReport> {
        let checks = self.queues.iter().map(|queue| async move {
            let report = match queue.health().await {
                Ok(health) => HealthReport::new(map_status(health.status), ctx.now())
                    .with_detail("waiting", health.waiting)
                    .with_detail("delayed", health.delayed)
                    .with_detail("active", health.active)
                    .with_detail("failed", health.failed)
                    .with_detail("completed", health.completed)
                    .with_detail("queueLength", health.queue_length()),
                Err(e) => ctx.down(&*e),
            };
            (queue.name().to_string(), report)
        });
        join_all(checks).await.into_iter().collect()
    }

    /// Worst per-queue status, with every queue's report under `details.queues`.
    pub async fn evaluate(&self, ctx: &ProbeContext) -> HealthReport {
        let reports = self.per_queue(ctx).await;
        let status = reports
            .values()
            .map(HealthReport::status)
            .max()
            .unwrap_or(Status::Operational);

        let queues: Map<String, Value> = reports
            .into_iter()
            .map(|(name, report)| {
                let value = serde_json::to_value(&report).unwrap_or(Value::Null);
                (name, value)
            })
            .collect();

        HealthReport::new(status, ctx.now()).with_detail("queues", queues)
    }
}
