//! The health service: single-flight, then deadline, then aggregation.
//!
//! Constructed once at startup and handed to the HTTP layer by value; clones
//! share the same cache and in-flight slot.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::HealthConfig;
use crate::health::aggregator::StatusAggregator;
use crate::health::cache::TtlCache;
use crate::health::clock::{Clock, SystemClock};
use crate::health::collaborators::Collaborators;
use crate::health::error::ErrorNormalizer;
use crate::health::probes::{ProbeContext, ProbeSet};
use crate::health::report::{OverallHealth, Status};
use crate::health::single_flight::{Flight, SingleFlight};
use crate::observability::metrics;
use crate::resilience::with_deadline;

struct Inner {
    aggregator: StatusAggregator,
    cache: Arc<TtlCache>,
    flight: SingleFlight<Arc<OverallHealth>>,
    clock: Arc<dyn Clock>,
    deadline: Duration,
    version: String,
}

#[derive(Clone)]
pub struct HealthService {
    inner: Arc<Inner>,
}

impl HealthService {
    pub fn new(
        probes: ProbeSet,
        clock: Arc<dyn Clock>,
        normalizer: ErrorNormalizer,
        deadline: Duration,
        version: impl Into<String>,
    ) -> Self {
        let cache = Arc::new(TtlCache::new(clock.clone()));
        let ctx = ProbeContext::new(clock.clone(), normalizer);
        Self {
            inner: Arc::new(Inner {
                aggregator: StatusAggregator::new(probes, cache.clone(), ctx),
                cache,
                flight: SingleFlight::new(),
                clock,
                deadline,
                version: version.into(),
            }),
        }
    }

    /// Service over the checks `config` enables for `collaborators`, on the
    /// system clock. Error stacks are reported outside production only.
    pub fn from_config(config: &HealthConfig, collaborators: &Collaborators) -> Self {
        Self::new(
            ProbeSet::build(config, collaborators),
            Arc::new(SystemClock),
            ErrorNormalizer::new(!config.environment.is_production()),
            Duration::from_millis(config.health.deadline_ms),
            config.health.version.clone(),
        )
    }

    /// Overall health, sharing any aggregation already in progress.
    pub async fn check(&self) -> Arc<OverallHealth> {
        self.check_with_flight().await.value
    }

    /// Like [`check`](Self::check), also reporting whether the result was
    /// shared with an earlier caller.
    pub async fn check_with_flight(&self) -> Flight<Arc<OverallHealth>> {
        self.inner
            .flight
            .run(|| {
                let inner = Arc::clone(&self.inner);
                async move { Arc::new(inner.aggregate_within_deadline().await) }
            })
            .await
    }

    /// Per-check cache, for maintenance resets.
    pub fn cache(&self) -> &TtlCache {
        &self.inner.cache
    }

    pub fn probes(&self) -> &ProbeSet {
        self.inner.aggregator.probes()
    }

    pub fn single_flight_joins(&self) -> u64 {
        self.inner.flight.joins()
    }

    pub fn version(&self) -> &str {
        &self.inner.version
    }

    pub fn deadline(&self) -> Duration {
        self.inner.deadline
    }
}

impl Inner {
    async fn aggregate_within_deadline(&self) -> OverallHealth {
        let start = Instant::now();
        let overall = match with_deadline(self.deadline, self.aggregator.aggregate(&self.version)).await {
            Ok(overall) => overall,
            Err(exceeded) => OverallHealth {
                status: Status::Down,
                version: self.version.clone(),
                timestamp: self.clock.now(),
                services: Default::default(),
                error: Some(exceeded.to_string()),
            },
        };

        let elapsed = start.elapsed();
        metrics::record_aggregation(overall.status, elapsed);
        if overall.is_down() {
            tracing::warn!(
                status = %overall.status,
                error = overall.error.as_deref().unwrap_or_default(),
                duration_ms = elapsed.as_millis() as u64,
                "Health aggregation completed"
            );
        } else {
            tracing::debug!(
                status = %overall.status,
                duration_ms = elapsed.as_millis() as u64,
                "Health aggregation completed"
            );
        }
        overall
    }
}
