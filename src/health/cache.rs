//! Per-check report cache with independently tuned freshness windows.
//!
//! # Design Decisions
//! - One entry per check name; only that check's refresh path writes it
//! - Entries are replaced whole, never mutated in place
//! - Entries hold `Arc<HealthReport>` so cache hits hand out the same report
//! - Status changes between consecutive refreshes are logged

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::health::clock::{to_time_delta, Clock};
use crate::health::report::HealthReport;
use crate::observability::metrics;

/// A cached report and the instant it stops being fresh.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub report: Arc<HealthReport>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Returns the entry's report if the entry exists and has not expired.
pub fn get_cached_if_valid(
    entry: Option<&CacheEntry>,
    now: DateTime<Utc>,
) -> Option<Arc<HealthReport>> {
    entry
        .filter(|e| e.is_valid_at(now))
        .map(|e| Arc::clone(&e.report))
}

/// Get-or-refresh cache keyed by check name.
pub struct TtlCache {
    entries: DashMap<String, CacheEntry>,
    clock: Arc<dyn Clock>,
}

impl TtlCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Return the fresh report for `name`, or run `compute` and store its
    /// result for `ttl`.
    ///
    /// `compute` is expected to catch its own failures; it always yields a
    /// report.
    pub async fn get_or_refresh<F, Fut>(&self, name: &str, ttl: Duration, compute: F) -> Arc<HealthReport>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = HealthReport>,
    {
        // The map guard must not live across the await below.
        let cached = {
            let entry = self.entries.get(name);
            get_cached_if_valid(entry.as_deref(), self.clock.now())
        };
        if let Some(report) = cached {
            metrics::record_cache_hit(name);
            return report;
        }
        metrics::record_cache_miss(name);

        let report = Arc::new(compute().await);
        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(to_time_delta(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let previous = self.entries.insert(
            name.to_string(),
            CacheEntry {
                report: Arc::clone(&report),
                expires_at,
            },
        );

        if let Some(previous) = previous {
            let (before, after) = (previous.report.status(), report.status());
            if before != after {
                tracing::warn!(check = %name, from = %before, to = %after, "Health check status changed");
            }
        }

        report
    }

    /// Copy of the current entry for `name`, fresh or not.
    pub fn peek(&self, name: &str) -> Option<CacheEntry> {
        self.entries.get(name).map(|e| e.value().clone())
    }

    /// Drop the entry for `name` so the next read refreshes it.
    pub fn invalidate(&self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    pub fn invalidate_all(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::clock::ManualClock;
    use crate::health::report::Status;
    use std::future::ready;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn setup() -> (Arc<ManualClock>, TtlCache) {
        let clock = Arc::new(ManualClock::default());
        let cache = TtlCache::new(clock.clone());
        (clock, cache)
    }

    #[tokio::test]
    async fn test_hit_within_ttl_reuses_report() {
        let (clock, cache) = setup();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(10);

        let probe = || {
            calls.fetch_add(1, Ordering::SeqCst);
            ready(HealthReport::operational(clock.now()))
        };

        let first = cache.get_or_refresh("database", ttl, probe).await;
        clock.advance(Duration::from_secs(9));
        let second = cache.get_or_refresh("database", ttl, probe).await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refreshed() {
        let (clock, cache) = setup();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(10);

        let probe = || {
            calls.fetch_add(1, Ordering::SeqCst);
            ready(HealthReport::operational(clock.now()))
        };

        let first = cache.get_or_refresh("database", ttl, probe).await;
        clock.advance(Duration::from_secs(10));
        let second = cache.get_or_refresh("database", ttl, probe).await;

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_durations_are_independent() {
        let (clock, cache) = setup();

        cache
            .get_or_refresh("memory", Duration::from_secs(5), || ready(HealthReport::operational(clock.now())))
            .await;
        cache
            .get_or_refresh("ssl", Duration::from_secs(3600), || ready(HealthReport::operational(clock.now())))
            .await;

        clock.advance(Duration::from_secs(6));
        let now = clock.now();
        assert!(get_cached_if_valid(cache.peek("memory").as_ref(), now).is_none());
        assert!(get_cached_if_valid(cache.peek("ssl").as_ref(), now).is_some());
    }

    #[tokio::test]
    async fn test_invalidate_forces_refresh() {
        let (clock, cache) = setup();
        let ttl = Duration::from_secs(60);

        cache
            .get_or_refresh("queues", ttl, || ready(HealthReport::operational(clock.now())))
            .await;
        assert!(cache.invalidate("queues"));
        assert!(!cache.invalidate("queues"));

        let refreshed = cache
            .get_or_refresh("queues", ttl, || ready(HealthReport::degraded(clock.now())))
            .await;
        assert_eq!(refreshed.status(), Status::Degraded);
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let (clock, cache) = setup();
        for name in ["a", "b", "c"] {
            cache
                .get_or_refresh(name, Duration::from_secs(60), || {
                    ready(HealthReport::operational(clock.now()))
                })
                .await;
        }
        assert_eq!(cache.len(), 3);
        cache.invalidate_all();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_get_cached_if_valid_edges() {
        let now = Utc::now();
        assert!(get_cached_if_valid(None, now).is_none());

        let expired = CacheEntry {
            report: Arc::new(HealthReport::operational(now)),
            expires_at: now - chrono::TimeDelta::seconds(1),
        };
        assert!(get_cached_if_valid(Some(&expired), now).is_none());

        let boundary = CacheEntry {
            report: Arc::new(HealthReport::operational(now)),
            expires_at: now,
        };
        assert!(get_cached_if_valid(Some(&boundary), now).is_none());
    }
}
