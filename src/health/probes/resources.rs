//! Process and host resources: memory, CPU, disk.

use std::sync::Arc;

use serde_json::json;

use crate::health::collaborators::{CpuTimes, DiskUsage, SystemSampler};
use crate::health::error::ProbeError;
use crate::health::probes::ProbeContext;
use crate::health::report::{HealthReport, Status};

/// Rounded percentage, zero when the denominator is zero.
fn percent(part: u64, whole: u64) -> u64 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u64
}

/// Process memory against absolute byte thresholds.
pub struct MemoryProbe {
    system: Arc<dyn SystemSampler>,
    degraded_bytes: u64,
    down_bytes: u64,
}

impl MemoryProbe {
    pub fn new(system: Arc<dyn SystemSampler>, degraded_bytes: u64, down_bytes: u64) -> Self {
        Self {
            system,
            degraded_bytes,
            down_bytes,
        }
    }

    pub fn evaluate(&self, ctx: &ProbeContext) -> HealthReport {
        let usage = match self.system.memory() {
            Ok(usage) => usage,
            Err(e) => return ctx.down(&*e),
        };

        let used = usage.used_bytes;
        let (status, threshold) = if used >= self.down_bytes {
            (Status::Down, Some(self.down_bytes))
        } else if used >= self.degraded_bytes {
            (Status::Degraded, Some(self.degraded_bytes))
        } else {
            (Status::Operational, None)
        };

        let mut report = HealthReport::new(status, ctx.now())
            .with_detail("heapUsed", used)
            .with_detail("heapTotal", usage.total_bytes)
            .with_detail("heapUsedPercent", percent(used, usage.total_bytes));

        if let Some(threshold) = threshold {
            report = report.with_error(ctx.normalizer.error(&ProbeError::ThresholdExceeded {
                metric: "heapUsed".into(),
                value: used as f64,
                threshold: threshold as f64,
            }));
        }
        report
    }
}

/// Mean busy percentage across cores, rounded. `None` without samples.
pub fn average_usage(cores: &[CpuTimes]) -> Option<u64> {
    if cores.is_empty() {
        return None;
    }
    let sum: f64 = cores.iter().map(CpuTimes::usage_percent).sum();
    Some((sum / cores.len() as f64).round() as u64)
}

pub struct CpuProbe {
    system: Arc<dyn SystemSampler>,
    degraded_percent: f64,
}

impl CpuProbe {
    pub fn new(system: Arc<dyn SystemSampler>, degraded_percent: f64) -> Self {
        Self {
            system,
            degraded_percent,
        }
    }

    pub fn evaluate(&self, ctx: &ProbeContext) -> HealthReport {
        let cores = match self.system.cpu_times() {
            Ok(cores) => cores,
            Err(e) => return ctx.down(&*e),
        };
        let Some(usage) = average_usage(&cores) else {
            return ctx.down(&ProbeError::Unknown("no CPU samples available".into()));
        };

        let status = if usage as f64 >= self.degraded_percent {
            Status::Degraded
        } else {
            Status::Operational
        };

        let mut report = HealthReport::new(status, ctx.now())
            .with_detail("usage", usage)
            .with_detail("cores", cores.len());
        if let Some(load) = self.system.load_average() {
            report = report.with_detail("loadAverage", json!(load));
        }
        if let Some(uptime) = self.system.uptime() {
            report = report.with_detail("uptimeSeconds", uptime.as_secs());
        }
        if status == Status::Degraded {
            report = report.with_error(ctx.normalizer.error(&ProbeError::ThresholdExceeded {
                metric: "cpuUsage".into(),
                value: usage as f64,
                threshold: self.degraded_percent,
            }));
        }
        report
    }
}

pub struct DiskProbe {
    disk: Arc<dyn DiskUsage>,
    path: String,
    degraded_percent: f64,
}

impl DiskProbe {
    pub fn new(disk: Arc<dyn DiskUsage>, path: impl Into<String>, degraded_percent: f64) -> Self {
        Self {
            disk,
            path: path.into(),
            degraded_percent,
        }
    }

    pub async fn evaluate(&self, ctx: &ProbeContext) -> HealthReport {
        let stats = match self.disk.usage(&self.path).await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!(path = %self.path, error = %e, "Disk usage command failed");
                let err = ProbeError::Unknown(format!("Failed to check system resources: {e}"));
                return ctx.down(&err);
            }
        };

        let used_percent = percent(stats.used_bytes, stats.total_bytes);
        let status = if used_percent as f64 >= self.degraded_percent {
            Status::Degraded
        } else {
            Status::Operational
        };

        HealthReport::new(status, ctx.now())
            .with_detail("path", self.path.clone())
            .with_detail("totalBytes", stats.total_bytes)
            .with_detail("usedBytes", stats.used_bytes)
            .with_detail("usedPercent", used_percent)
    }
}
