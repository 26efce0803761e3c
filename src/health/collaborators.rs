//! Interfaces of the subsystems the probes inspect.
//!
//! None of these are implemented here apart from the process-level samplers
//! in `platform.rs`; the embedding platform supplies the rest when it builds
//! [`Collaborators`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use url::Url;

use crate::health::error::BoxError;
use crate::health::platform::{DfDiskUsage, ProcSampler, ReqwestProber};

// --- Datastore ---

/// Seeding progress reported by the datastore.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedingState {
    pub retry_in_progress: bool,
    pub attempts: u32,
    pub last_error: Option<String>,
}

#[async_trait]
pub trait Datastore: Send + Sync {
    async fn is_connected(&self) -> bool;
    /// Names of migrations not yet applied.
    async fn pending_migrations(&self) -> Result<Vec<String>, BoxError>;
    fn seeding_state(&self) -> SeedingState;
    async fn retry_seeding(&self) -> Result<(), BoxError>;
}

// --- Cache server ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheMemoryInfo {
    pub used_bytes: u64,
    /// Zero when the server has no memory limit.
    pub max_bytes: u64,
    pub connected_clients: u64,
}

#[async_trait]
pub trait CacheClient: Send + Sync {
    async fn ping(&self) -> Result<(), BoxError>;
    async fn memory_info(&self) -> Result<CacheMemoryInfo, BoxError>;
}

// --- Message bus ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerGroupStats {
    pub stream: String,
    pub group: String,
    pub pending: u64,
    pub consumers: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusSnapshot {
    pub connected: bool,
    pub groups: Vec<ConsumerGroupStats>,
}

#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn snapshot(&self) -> Result<BusSnapshot, BoxError>;
}

// --- Job queues ---

/// A queue's own verdict about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStatus {
    Healthy,
    Degraded,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueHealth {
    pub status: QueueStatus,
    pub waiting: u64,
    pub delayed: u64,
    pub active: u64,
    pub failed: u64,
    pub completed: u64,
}

impl QueueHealth {
    pub fn queue_length(&self) -> u64 {
        self.waiting + self.delayed
    }
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    fn name(&self) -> &str;
    async fn health(&self) -> Result<QueueHealth, BoxError>;
    /// Remove all jobs, returning how many were dropped.
    async fn clear(&self) -> Result<u64, BoxError>;
}

// --- External model services ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelServiceState {
    Active,
    Cooldown,
    Disabled,
}

/// In-memory registry of external model service states.
pub trait ModelRegistry: Send + Sync {
    fn state(&self, service: &str) -> Option<ModelServiceState>;
}

// --- Scheduled jobs ---

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CronJobRecord {
    pub last_success: Option<DateTime<Utc>>,
    pub failures: Vec<DateTime<Utc>>,
}

#[async_trait]
pub trait CronRegistry: Send + Sync {
    async fn job_names(&self) -> Result<Vec<String>, BoxError>;
    async fn job_record(&self, name: &str) -> Result<CronJobRecord, BoxError>;
}

// --- Outbound HTTP ---

#[async_trait]
pub trait HttpProber: Send + Sync {
    /// Issue a HEAD request and return the status code.
    async fn head(&self, url: &Url) -> Result<u16, BoxError>;
}

// --- Localization ---

pub trait Localizer: Send + Sync {
    fn has_namespace(&self, namespace: &str) -> bool;
    fn translate(&self, namespace: &str, key: &str) -> Result<String, BoxError>;
}

// --- Object storage ---

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    fn is_initialized(&self) -> bool;
    async fn check_bucket(&self) -> Result<(), BoxError>;
    async fn check_moderation(&self) -> Result<(), BoxError>;
    async fn check_image_transform(&self) -> Result<(), BoxError>;
}

// --- Billing ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingBalance {
    pub available: i64,
    pub pending: i64,
    pub currency: String,
}

/// Rejections carrying the provider's error body should be returned as
/// [`ErrorPayload`](crate::health::error::ErrorPayload).
#[async_trait]
pub trait BillingApi: Send + Sync {
    async fn balance(&self, api_secret: &str) -> Result<BillingBalance, BoxError>;
}

// --- Delegated service health ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddingHealth {
    pub reachable: bool,
    pub cache_available: bool,
}

#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn health(&self) -> Result<EmbeddingHealth, BoxError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolRuntimeHealth {
    pub transport_connected: bool,
    pub registered_tools: usize,
    pub expected_tools: usize,
}

#[async_trait]
pub trait ToolRuntime: Send + Sync {
    async fn health(&self) -> Result<ToolRuntimeHealth, BoxError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketServerHealth {
    pub running: bool,
    pub adapter_connected: bool,
    pub connected_clients: usize,
}

#[async_trait]
pub trait SocketServer: Send + Sync {
    async fn health(&self) -> Result<SocketServerHealth, BoxError>;
}

// --- Process and host ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapUsage {
    pub used_bytes: u64,
    pub total_bytes: u64,
}

/// Cumulative per-core tick counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub irq: u64,
}

impl CpuTimes {
    pub fn total(&self) -> u64 {
        self.user + self.nice + self.system + self.idle + self.irq
    }

    /// Busy share of this core in percent.
    pub fn usage_percent(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (total - self.idle) as f64 / total as f64 * 100.0
    }
}

pub trait SystemSampler: Send + Sync {
    fn memory(&self) -> Result<HeapUsage, BoxError>;
    fn cpu_times(&self) -> Result<Vec<CpuTimes>, BoxError>;
    fn load_average(&self) -> Option<[f64; 3]>;
    fn uptime(&self) -> Option<Duration>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskStats {
    pub total_bytes: u64,
    pub used_bytes: u64,
}

#[async_trait]
pub trait DiskUsage: Send + Sync {
    async fn usage(&self, path: &str) -> Result<DiskStats, BoxError>;
}

// --- Notifications (maintenance only) ---

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("user {0} not found")]
    UserNotFound(String),

    #[error(transparent)]
    Failed(BoxError),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_test(&self, user_id: &str) -> Result<(), NotifyError>;
}

/// Everything the probe set and the maintenance endpoints consume.
///
/// Optional collaborators that are absent simply have no check registered.
#[derive(Clone)]
pub struct Collaborators {
    pub datastore: Option<Arc<dyn Datastore>>,
    pub cache: Option<Arc<dyn CacheClient>>,
    pub bus: Option<Arc<dyn MessageBus>>,
    pub queues: Vec<Arc<dyn JobQueue>>,
    pub models: Option<Arc<dyn ModelRegistry>>,
    pub cron: Option<Arc<dyn CronRegistry>>,
    pub localizer: Option<Arc<dyn Localizer>>,
    pub storage: Option<Arc<dyn ObjectStorage>>,
    pub billing: Option<Arc<dyn BillingApi>>,
    pub embedding: Option<Arc<dyn EmbeddingService>>,
    pub tool_runtime: Option<Arc<dyn ToolRuntime>>,
    pub socket_server: Option<Arc<dyn SocketServer>>,
    pub notifier: Option<Arc<dyn Notifier>>,
    pub http: Arc<dyn HttpProber>,
    pub system: Arc<dyn SystemSampler>,
    pub disk: Arc<dyn DiskUsage>,
}

impl Collaborators {
    /// Only the host-level collaborators, which every process has.
    pub fn new(
        system: Arc<dyn SystemSampler>,
        disk: Arc<dyn DiskUsage>,
        http: Arc<dyn HttpProber>,
    ) -> Self {
        Self {
            datastore: None,
            cache: None,
            bus: None,
            queues: Vec::new(),
            models: None,
            cron: None,
            localizer: None,
            storage: None,
            billing: None,
            embedding: None,
            tool_runtime: None,
            socket_server: None,
            notifier: None,
            http,
            system,
            disk,
        }
    }

    pub fn with_datastore(mut self, datastore: Arc<dyn Datastore>) -> Self {
        self.datastore = Some(datastore);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn CacheClient>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_bus(mut self, bus: Arc<dyn MessageBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn with_queue(mut self, queue: Arc<dyn JobQueue>) -> Self {
        self.queues.push(queue);
        self
    }

    pub fn with_models(mut self, models: Arc<dyn ModelRegistry>) -> Self {
        self.models = Some(models);
        self
    }

    pub fn with_cron(mut self, cron: Arc<dyn CronRegistry>) -> Self {
        self.cron = Some(cron);
        self
    }

    pub fn with_localizer(mut self, localizer: Arc<dyn Localizer>) -> Self {
        self.localizer = Some(localizer);
        self
    }

    pub fn with_storage(mut self, storage: Arc<dyn ObjectStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_billing(mut self, billing: Arc<dyn BillingApi>) -> Self {
        self.billing = Some(billing);
        self
    }

    pub fn with_embedding(mut self, embedding: Arc<dyn EmbeddingService>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_tool_runtime(mut self, runtime: Arc<dyn ToolRuntime>) -> Self {
        self.tool_runtime = Some(runtime);
        self
    }

    pub fn with_socket_server(mut self, server: Arc<dyn SocketServer>) -> Self {
        self.socket_server = Some(server);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Look up a registered queue by name.
    pub fn queue(&self, name: &str) -> Option<&Arc<dyn JobQueue>> {
        self.queues.iter().find(|q| q.name() == name)
    }
}

impl Default for Collaborators {
    /// Host collaborators backed by `/proc`, `df` and reqwest.
    fn default() -> Self {
        Self::new(
            Arc::new(ProcSampler::default()),
            Arc::new(DfDiskUsage),
            Arc::new(ReqwestProber::default()),
        )
    }
}
