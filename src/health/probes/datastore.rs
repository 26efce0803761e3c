//! Primary datastore: connectivity, schema drift, seeding.

use std::sync::Arc;

use serde_json::json;

use crate::health::collaborators::Datastore;
use crate::health::error::ProbeError;
use crate::health::probes::ProbeContext;
use crate::health::report::HealthReport;

pub struct DatastoreProbe {
    datastore: Arc<dyn Datastore>,
}

impl DatastoreProbe {
    pub fn new(datastore: Arc<dyn Datastore>) -> Self {
        Self { datastore }
    }

    pub async fn evaluate(&self, ctx: &ProbeContext) -> HealthReport {
        if !self.datastore.is_connected().await {
            return ctx
                .down(&ProbeError::Connectivity("database is not connected".into()))
                .with_detail("connected", false);
        }

        let pending = match self.datastore.pending_migrations().await {
            Ok(pending) => pending,
            Err(e) => return ctx.down(&*e).with_detail("connected", true),
        };

        // Schema drift is never safe to serve.
        if !pending.is_empty() {
            let err = ProbeError::Unknown(format!("{} pending migration(s)", pending.len()));
            return ctx
                .down(&err)
                .with_detail("connected", true)
                .with_detail("pendingMigrations", pending);
        }

        let seeding = self.datastore.seeding_state();
        let report = if seeding.retry_in_progress {
            HealthReport::degraded(ctx.now())
        } else {
            HealthReport::operational(ctx.now())
        };

        report.with_detail("connected", true).with_detail(
            "seeding",
            json!({
                "retryInProgress": seeding.retry_in_progress,
                "attempts": seeding.attempts,
                "lastError": seeding.last_error,
            }),
        )
    }
}
