//! Shared fakes and helpers for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;
use url::Url;

use health_aggregator::config::HealthConfig;
use health_aggregator::health::collaborators::{
    CpuTimes, Datastore, DiskStats, DiskUsage, HeapUsage, HttpProber, JobQueue, Notifier,
    NotifyError, QueueHealth, QueueStatus, SeedingState, SystemSampler,
};
use health_aggregator::health::error::BoxError;
use health_aggregator::health::Collaborators;

/// Host with plenty of headroom.
pub struct IdleHost;

impl SystemSampler for IdleHost {
    fn memory(&self) -> Result<HeapUsage, BoxError> {
        Ok(HeapUsage {
            used_bytes: 256 * 1024 * 1024,
            total_bytes: 1024 * 1024 * 1024,
        })
    }

    fn cpu_times(&self) -> Result<Vec<CpuTimes>, BoxError> {
        Ok(vec![CpuTimes {
            user: 10,
            idle: 90,
            ..Default::default()
        }])
    }

    fn load_average(&self) -> Option<[f64; 3]> {
        Some([0.1, 0.1, 0.1])
    }

    fn uptime(&self) -> Option<Duration> {
        Some(Duration::from_secs(60))
    }
}

#[async_trait]
impl DiskUsage for IdleHost {
    async fn usage(&self, _path: &str) -> Result<DiskStats, BoxError> {
        Ok(DiskStats {
            total_bytes: 1000,
            used_bytes: 100,
        })
    }
}

#[async_trait]
impl HttpProber for IdleHost {
    async fn head(&self, _url: &Url) -> Result<u16, BoxError> {
        Ok(200)
    }
}

/// Scriptable datastore that counts its probes.
pub struct FakeDatastore {
    pub connected: AtomicBool,
    pub delay: Duration,
    pub explode: bool,
    pub probes: AtomicUsize,
    pub seed_retries: AtomicUsize,
}

impl FakeDatastore {
    pub fn connected() -> Arc<Self> {
        Self::build(true, Duration::ZERO, false)
    }

    pub fn disconnected() -> Arc<Self> {
        Self::build(false, Duration::ZERO, false)
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Self::build(true, delay, false)
    }

    pub fn exploding() -> Arc<Self> {
        Self::build(true, Duration::ZERO, true)
    }

    fn build(connected: bool, delay: Duration, explode: bool) -> Arc<Self> {
        Arc::new(Self {
            connected: AtomicBool::new(connected),
            delay,
            explode,
            probes: AtomicUsize::new(0),
            seed_retries: AtomicUsize::new(0),
        })
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Datastore for FakeDatastore {
    async fn is_connected(&self) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if self.explode {
            panic!("datastore driver exploded");
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.connected.load(Ordering::SeqCst)
    }

    async fn pending_migrations(&self) -> Result<Vec<String>, BoxError> {
        Ok(Vec::new())
    }

    fn seeding_state(&self) -> SeedingState {
        SeedingState::default()
    }

    async fn retry_seeding(&self) -> Result<(), BoxError> {
        self.seed_retries.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FakeQueue {
    pub name: String,
    pub waiting: u64,
    pub cleared: AtomicBool,
}

impl FakeQueue {
    pub fn new(name: &str, waiting: u64) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            waiting,
            cleared: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl JobQueue for FakeQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn health(&self) -> Result<QueueHealth, BoxError> {
        Ok(QueueHealth {
            status: QueueStatus::Healthy,
            waiting: self.waiting,
            delayed: 0,
            active: 0,
            failed: 0,
            completed: 0,
        })
    }

    async fn clear(&self) -> Result<u64, BoxError> {
        self.cleared.store(true, Ordering::SeqCst);
        Ok(self.waiting)
    }
}

/// Notifier that knows a single user.
pub struct FakeNotifier {
    pub known_user: String,
    pub sent: Mutex<Vec<String>>,
}

impl FakeNotifier {
    pub fn new(known_user: &str) -> Arc<Self> {
        Arc::new(Self {
            known_user: known_user.to_string(),
            sent: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn send_test(&self, user_id: &str) -> Result<(), NotifyError> {
        if user_id != self.known_user {
            return Err(NotifyError::UserNotFound(user_id.to_string()));
        }
        self.sent.lock().unwrap().push(user_id.to_string());
        Ok(())
    }
}

/// Host-level collaborators only.
pub fn host() -> Collaborators {
    let host = Arc::new(IdleHost);
    Collaborators::new(host.clone(), host.clone(), host)
}

/// Test configuration: no metrics exporter, short deadline.
pub fn test_config() -> HealthConfig {
    let mut config = HealthConfig::default();
    config.observability.metrics_enabled = false;
    config.health.version = "9.9.9-test".to_string();
    config.health.deadline_ms = 2_000;
    config
}

/// Issue a GET against the router and decode the JSON body.
pub async fn get(router: Router, uri: &str) -> (StatusCode, Value) {
    get_with(router, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn get_with(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}
