//! Fan-out over every registered check and reduction to one verdict.
//!
//! # Design Decisions
//! - Each check runs in its own task so one check's panic cannot take
//!   down its siblings; a panicked task becomes that check's `Down` report
//! - No early exit: every report is collected before the verdict is taken
//! - Critical checks count as reported; advisory checks never count for
//!   more than `Degraded`

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use crate::health::cache::TtlCache;
use crate::health::error::Thrown;
use crate::health::probes::{CheckDescriptor, ProbeContext, ProbeSet};
use crate::health::report::{Criticality, HealthReport, OverallHealth, Status};
use crate::observability::metrics;

/// Worst weighted status across `(criticality, status)` pairs.
pub fn overall_status<I>(checks: I) -> Status
where
    I: IntoIterator<Item = (Criticality, Status)>,
{
    checks
        .into_iter()
        .map(|(criticality, status)| match criticality {
            Criticality::Critical => status,
            Criticality::Advisory => status.min(Status::Degraded),
        })
        .max()
        .unwrap_or(Status::Operational)
}

/// One check's outcome in an aggregation pass.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub criticality: Criticality,
    pub report: Arc<HealthReport>,
}

pub struct StatusAggregator {
    probes: ProbeSet,
    cache: Arc<TtlCache>,
    ctx: ProbeContext,
}

impl StatusAggregator {
    pub fn new(probes: ProbeSet, cache: Arc<TtlCache>, ctx: ProbeContext) -> Self {
        Self { probes, cache, ctx }
    }

    pub fn probes(&self) -> &ProbeSet {
        &self.probes
    }

    /// Run every check through the cache concurrently and wait for all.
    pub async fn collect(&self) -> BTreeMap<&'static str, CheckOutcome> {
        let tasks: Vec<_> = self
            .probes
            .iter()
            .map(|check| {
                let task = tokio::spawn(run_check(
                    Arc::clone(check),
                    Arc::clone(&self.cache),
                    self.ctx.clone(),
                ));
                (check.name(), check.criticality, task)
            })
            .collect();

        let mut outcomes = BTreeMap::new();
        for (name, criticality, task) in tasks {
            let report = match task.await {
                Ok(report) => report,
                Err(join_err) => {
                    tracing::error!(check = name, error = %join_err, "Health check task failed");
                    let detail = if join_err.is_panic() {
                        let payload = join_err.into_panic();
                        self.ctx.normalizer.normalize(Thrown::Panic(&*payload))
                    } else {
                        self.ctx
                            .normalizer
                            .normalize(Thrown::Message("health check task was cancelled"))
                    };
                    Arc::new(HealthReport::down(self.ctx.now()).with_error(detail))
                }
            };
            outcomes.insert(name, CheckOutcome { criticality, report });
        }
        outcomes
    }

    /// Collect all reports and reduce them to the overall verdict.
    pub async fn aggregate(&self, version: &str) -> OverallHealth {
        let outcomes = self.collect().await;

        let status = overall_status(outcomes.values().map(|o| (o.criticality, o.report.status())));
        let error = (status == Status::Down).then(|| {
            let down: Vec<&str> = outcomes
                .iter()
                .filter(|(_, o)| o.criticality == Criticality::Critical && o.report.status() == Status::Down)
                .map(|(name, _)| *name)
                .collect();
            format!("Critical services down: {}", down.join(", "))
        });

        OverallHealth {
            status,
            version: version.to_string(),
            timestamp: self.ctx.now(),
            services: outcomes
                .into_iter()
                .map(|(name, outcome)| (name.to_string(), outcome.report))
                .collect(),
            error,
        }
    }
}

async fn run_check(check: Arc<CheckDescriptor>, cache: Arc<TtlCache>, ctx: ProbeContext) -> Arc<HealthReport> {
    let start = Instant::now();
    let (probe, ctx_ref) = (&check.probe, &ctx);
    let report = cache
        .get_or_refresh(check.name(), check.cache_duration, move || async move {
            probe.evaluate(ctx_ref).await
        })
        .await;

    let elapsed = start.elapsed();
    metrics::record_check(check.name(), report.status(), elapsed);
    tracing::debug!(
        check = check.name(),
        status = %report.status(),
        duration_ms = elapsed.as_millis() as u64,
        "Health check evaluated"
    );
    report
}
