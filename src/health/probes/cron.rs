//! Scheduled-job success/failure tracking.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

use crate::health::clock::to_time_delta;
use crate::health::collaborators::{CronJobRecord, CronRegistry};
use crate::health::error::ProbeError;
use crate::health::probes::ProbeContext;
use crate::health::report::{HealthReport, Status};

pub struct CronProbe {
    registry: Arc<dyn CronRegistry>,
    failure_window: Duration,
}

impl CronProbe {
    pub fn new(registry: Arc<dyn CronRegistry>, failure_window: Duration) -> Self {
        Self {
            registry,
            failure_window,
        }
    }

    pub async fn evaluate(&self, ctx: &ProbeContext) -> HealthReport {
        let names = match self.registry.job_names().await {
            Ok(names) => names,
            Err(e) => return ctx.down(&*e),
        };
        if names.is_empty() {
            return ctx.down(&ProbeError::Unknown("No cron jobs registered".into()));
        }

        let cutoff = ctx
            .now()
            .checked_sub_signed(to_time_delta(self.failure_window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let mut overall = Status::Operational;
        let mut jobs = Map::new();

        for name in names {
            let record = match self.registry.job_record(&name).await {
                Ok(record) => record,
                Err(e) => return ctx.down(&*e).with_detail("job", name),
            };
            let recent_failures = record.failures.iter().filter(|at| **at >= cutoff).count();
            let status = job_status(&record, recent_failures);
            overall = overall.max(status);

            jobs.insert(
                name,
                json!({
                    "status": status,
                    "lastSuccess": record.last_success,
                    "recentFailures": recent_failures,
                }),
            );
        }

        HealthReport::new(overall, ctx.now()).with_detail("jobs", Value::Object(jobs))
    }
}

/// A job failing without ever having succeeded is `Down`; one that has
/// succeeded before but is failing now is `Degraded`.
fn job_status(record: &CronJobRecord, recent_failures: usize) -> Status {
    match (recent_failures, record.last_success) {
        (0, _) => Status::Operational,
        (_, None) => Status::Down,
        (_, Some(_)) => Status::Degraded,
    }
}
