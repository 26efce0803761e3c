//! The probe set: one variant per monitored subsystem.
//!
//! # Design Decisions
//! - The set of subsystems is closed, so probes are an enum rather than
//!   trait objects; collaborators behind each probe are still trait objects
//! - A probe never fails: every error becomes a `Down` or `Degraded` report
//! - Descriptors are built once at startup and never change afterwards

pub mod billing;
pub mod bus;
pub mod cache_client;
pub mod cron;
pub mod datastore;
pub mod delegates;
pub mod localization;
pub mod models;
pub mod queues;
pub mod resources;
pub mod ssl;
pub mod storage;

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::HealthConfig;
use crate::health::clock::Clock;
use crate::health::collaborators::Collaborators;
use crate::health::error::ErrorNormalizer;
use crate::health::report::{Criticality, HealthReport, Status};

pub use billing::BillingProbe;
pub use bus::BusProbe;
pub use cache_client::CacheClientProbe;
pub use cron::CronProbe;
pub use datastore::DatastoreProbe;
pub use delegates::{EmbeddingProbe, SocketServerProbe, ToolRuntimeProbe};
pub use localization::LocalizationProbe;
pub use models::ModelsProbe;
pub use queues::QueuesProbe;
pub use resources::{CpuProbe, DiskProbe, MemoryProbe};
pub use ssl::SslProbe;
pub use storage::StorageProbe;

/// Shared inputs every probe evaluates against.
#[derive(Clone)]
pub struct ProbeContext {
    pub clock: Arc<dyn Clock>,
    pub normalizer: ErrorNormalizer,
}

impl ProbeContext {
    pub fn new(clock: Arc<dyn Clock>, normalizer: ErrorNormalizer) -> Self {
        Self { clock, normalizer }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// `Down` report carrying the normalized error.
    pub fn down(&self, err: &(dyn StdError + 'static)) -> HealthReport {
        self.failed(Status::Down, err)
    }

    /// `Degraded` report carrying the normalized error.
    pub fn degraded(&self, err: &(dyn StdError + 'static)) -> HealthReport {
        self.failed(Status::Degraded, err)
    }

    fn failed(&self, status: Status, err: &(dyn StdError + 'static)) -> HealthReport {
        HealthReport::new(status, self.now()).with_error(self.normalizer.error(err))
    }
}

#[cfg(test)]
pub(crate) fn test_context() -> ProbeContext {
    use crate::health::clock::ManualClock;

    let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default();
    ProbeContext::new(Arc::new(ManualClock::new(start)), ErrorNormalizer::new(true))
}

/// Every check the service knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckKind {
    Database,
    Cache,
    Bus,
    Memory,
    Cpu,
    Disk,
    Queues,
    Models,
    Cron,
    Ssl,
    Localization,
    Storage,
    Billing,
    Embedding,
    ToolRuntime,
    Websocket,
}

impl CheckKind {
    pub const ALL: [CheckKind; 16] = [
        CheckKind::Database,
        CheckKind::Cache,
        CheckKind::Bus,
        CheckKind::Memory,
        CheckKind::Cpu,
        CheckKind::Disk,
        CheckKind::Queues,
        CheckKind::Models,
        CheckKind::Cron,
        CheckKind::Ssl,
        CheckKind::Localization,
        CheckKind::Storage,
        CheckKind::Billing,
        CheckKind::Embedding,
        CheckKind::ToolRuntime,
        CheckKind::Websocket,
    ];

    /// Name used as the cache key and the `services` key in responses.
    pub fn name(self) -> &'static str {
        match self {
            CheckKind::Database => "database",
            CheckKind::Cache => "cache",
            CheckKind::Bus => "bus",
            CheckKind::Memory => "memory",
            CheckKind::Cpu => "cpu",
            CheckKind::Disk => "disk",
            CheckKind::Queues => "queues",
            CheckKind::Models => "models",
            CheckKind::Cron => "cron",
            CheckKind::Ssl => "ssl",
            CheckKind::Localization => "localization",
            CheckKind::Storage => "storage",
            CheckKind::Billing => "billing",
            CheckKind::Embedding => "embedding",
            CheckKind::ToolRuntime => "tool_runtime",
            CheckKind::Websocket => "websocket",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn default_criticality(self) -> Criticality {
        match self {
            CheckKind::Database | CheckKind::Cache | CheckKind::Bus | CheckKind::Memory => {
                Criticality::Critical
            }
            _ => Criticality::Advisory,
        }
    }

    pub fn default_cache_duration(self) -> Duration {
        let ms = match self {
            CheckKind::Database | CheckKind::Cache => 10_000,
            CheckKind::Bus | CheckKind::Queues | CheckKind::Websocket => 15_000,
            CheckKind::Memory | CheckKind::Cpu | CheckKind::Models => 5_000,
            CheckKind::Disk | CheckKind::Cron | CheckKind::Storage => 60_000,
            CheckKind::Ssl => 3_600_000,
            CheckKind::Localization | CheckKind::Billing => 300_000,
            CheckKind::Embedding | CheckKind::ToolRuntime => 30_000,
        };
        Duration::from_millis(ms)
    }
}

/// A subsystem probe.
pub enum Probe {
    Datastore(DatastoreProbe),
    Cache(CacheClientProbe),
    Bus(BusProbe),
    Memory(MemoryProbe),
    Cpu(CpuProbe),
    Disk(DiskProbe),
    Queues(QueuesProbe),
    Models(ModelsProbe),
    Cron(CronProbe),
    Ssl(SslProbe),
    Localization(LocalizationProbe),
    Storage(StorageProbe),
    Billing(BillingProbe),
    Embedding(EmbeddingProbe),
    ToolRuntime(ToolRuntimeProbe),
    Websocket(SocketServerProbe),
}

impl Probe {
    pub fn kind(&self) -> CheckKind {
        match self {
            Probe::Datastore(_) => CheckKind::Database,
            Probe::Cache(_) => CheckKind::Cache,
            Probe::Bus(_) => CheckKind::Bus,
            Probe::Memory(_) => CheckKind::Memory,
            Probe::Cpu(_) => CheckKind::Cpu,
            Probe::Disk(_) => CheckKind::Disk,
            Probe::Queues(_) => CheckKind::Queues,
            Probe::Models(_) => CheckKind::Models,
            Probe::Cron(_) => CheckKind::Cron,
            Probe::Ssl(_) => CheckKind::Ssl,
            Probe::Localization(_) => CheckKind::Localization,
            Probe::Storage(_) => CheckKind::Storage,
            Probe::Billing(_) => CheckKind::Billing,
            Probe::Embedding(_) => CheckKind::Embedding,
            Probe::ToolRuntime(_) => CheckKind::ToolRuntime,
            Probe::Websocket(_) => CheckKind::Websocket,
        }
    }

    pub async fn evaluate(&self, ctx: &ProbeContext) -> HealthReport {
        match self {
            Probe::Datastore(p) => p.evaluate(ctx).await,
            Probe::Cache(p) => p.evaluate(ctx).await,
            Probe::Bus(p) => p.evaluate(ctx).await,
            Probe::Memory(p) => p.evaluate(ctx),
            Probe::Cpu(p) => p.evaluate(ctx),
            Probe::Disk(p) => p.evaluate(ctx).await,
            Probe::Queues(p) => p.evaluate(ctx).await,
            Probe::Models(p) => p.evaluate(ctx),
            Probe::Cron(p) => p.evaluate(ctx).await,
            Probe::Ssl(p) => p.evaluate(ctx).await,
            Probe::Localization(p) => p.evaluate(ctx),
            Probe::Storage(p) => p.evaluate(ctx).await,
            Probe::Billing(p) => p.evaluate(ctx).await,
            Probe::Embedding(p) => p.evaluate(ctx).await,
            Probe::ToolRuntime(p) => p.evaluate(ctx).await,
            Probe::Websocket(p) => p.evaluate(ctx).await,
        }
    }
}

/// A registered check: what to run, how long its result stays fresh and
/// how much it weighs in the overall verdict.
pub struct CheckDescriptor {
    pub cache_duration: Duration,
    pub criticality: Criticality,
    pub probe: Probe,
}

impl CheckDescriptor {
    /// Descriptor with the check's default freshness and criticality.
    pub fn new(probe: Probe) -> Self {
        let kind = probe.kind();
        Self {
            cache_duration: kind.default_cache_duration(),
            criticality: kind.default_criticality(),
            probe,
        }
    }

    pub fn with_cache_duration(mut self, cache_duration: Duration) -> Self {
        self.cache_duration = cache_duration;
        self
    }

    pub fn with_criticality(mut self, criticality: Criticality) -> Self {
        self.criticality = criticality;
        self
    }

    pub fn kind(&self) -> CheckKind {
        self.probe.kind()
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }
}

/// Registered checks, fixed for the lifetime of the process.
#[derive(Clone, Default)]
pub struct ProbeSet {
    checks: Vec<Arc<CheckDescriptor>>,
}

impl ProbeSet {
    /// Register descriptors as given. A later descriptor of the same kind
    /// replaces an earlier one.
    pub fn new(descriptors: Vec<CheckDescriptor>) -> Self {
        let mut checks: Vec<Arc<CheckDescriptor>> = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            checks.retain(|c| c.kind() != descriptor.kind());
            checks.push(Arc::new(descriptor));
        }
        Self { checks }
    }

    /// Register every check whose collaborator is available and which the
    /// configuration does not disable, applying per-check overrides.
    pub fn build(config: &HealthConfig, collaborators: &Collaborators) -> Self {
        let t = &config.thresholds;
        let mut probes = vec![
            Probe::Memory(MemoryProbe::new(
                collaborators.system.clone(),
                t.memory_degraded_bytes,
                t.memory_down_bytes,
            )),
            Probe::Cpu(CpuProbe::new(collaborators.system.clone(), t.cpu_degraded_percent)),
            Probe::Disk(DiskProbe::new(
                collaborators.disk.clone(),
                config.disk.path.clone(),
                t.disk_degraded_percent,
            )),
            Probe::Queues(QueuesProbe::new(collaborators.queues.clone())),
            Probe::Ssl(SslProbe::new(collaborators.http.clone(), config.ssl.url.clone())),
        ];

        if let Some(datastore) = &collaborators.datastore {
            probes.push(Probe::Datastore(DatastoreProbe::new(datastore.clone())));
        }
        if let Some(cache) = &collaborators.cache {
            probes.push(Probe::Cache(CacheClientProbe::new(
                cache.clone(),
                t.cache_memory_degraded_percent,
            )));
        }
        if let Some(bus) = &collaborators.bus {
            probes.push(Probe::Bus(BusProbe::new(bus.clone(), t.bus_pending_threshold)));
        }
        if let Some(models) = &collaborators.models {
            probes.push(Probe::Models(ModelsProbe::new(
                models.clone(),
                config.models.services.clone(),
            )));
        }
        if let Some(cron) = &collaborators.cron {
            probes.push(Probe::Cron(CronProbe::new(
                cron.clone(),
                Duration::from_secs(t.cron_failure_window_secs),
            )));
        }
        if let Some(localizer) = &collaborators.localizer {
            probes.push(Probe::Localization(LocalizationProbe::new(
                localizer.clone(),
                config.localization.namespace.clone(),
                config.localization.probe_key.clone(),
            )));
        }
        if let Some(storage) = &collaborators.storage {
            probes.push(Probe::Storage(StorageProbe::new(storage.clone())));
        }
        if let Some(billing) = &collaborators.billing {
            probes.push(Probe::Billing(BillingProbe::new(
                billing.clone(),
                config.billing.api_secret.clone(),
            )));
        }
        if let Some(embedding) = &collaborators.embedding {
            probes.push(Probe::Embedding(EmbeddingProbe::new(embedding.clone())));
        }
        if let Some(runtime) = &collaborators.tool_runtime {
            probes.push(Probe::ToolRuntime(ToolRuntimeProbe::new(runtime.clone())));
        }
        if let Some(server) = &collaborators.socket_server {
            probes.push(Probe::Websocket(SocketServerProbe::new(server.clone())));
        }

        let descriptors = probes
            .into_iter()
            .filter_map(|probe| {
                let overrides = config.check(probe.kind().name());
                if !overrides.enabled {
                    tracing::info!(check = probe.kind().name(), "Health check disabled by configuration");
                    return None;
                }
                let mut descriptor = CheckDescriptor::new(probe);
                if let Some(ms) = overrides.cache_duration_ms {
                    descriptor = descriptor.with_cache_duration(Duration::from_millis(ms));
                }
                if let Some(criticality) = overrides.criticality {
                    descriptor = descriptor.with_criticality(criticality);
                }
                Some(descriptor)
            })
            .collect();

        let set = Self::new(descriptors);
        tracing::info!(checks = ?set.names(), "Health checks registered");
        set
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    pub fn get(&self, kind: CheckKind) -> Option<&Arc<CheckDescriptor>> {
        self.checks.iter().find(|c| c.kind() == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<CheckDescriptor>> {
        self.checks.iter()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}
