//! Cache server: ping and memory pressure.

use std::sync::Arc;
use std::time::Instant;

use crate::health::collaborators::CacheClient;
use crate::health::error::ProbeError;
use crate::health::probes::ProbeContext;
use crate::health::report::HealthReport;

pub struct CacheClientProbe {
    client: Arc<dyn CacheClient>,
    degraded_memory_percent: f64,
}

impl CacheClientProbe {
    pub fn new(client: Arc<dyn CacheClient>, degraded_memory_percent: f64) -> Self {
        Self {
            client,
            degraded_memory_percent,
        }
    }

    pub async fn evaluate(&self, ctx: &ProbeContext) -> HealthReport {
        let start = Instant::now();
        if let Err(e) = self.client.ping().await {
            return ctx.down(&*e);
        }
        let latency_ms = start.elapsed().as_millis() as u64;

        let info = match self.client.memory_info().await {
            Ok(info) => info,
            Err(e) => return ctx.degraded(&*e).with_detail("pingLatencyMs", latency_ms),
        };

        let mut report = HealthReport::operational(ctx.now());
        if info.max_bytes > 0 {
            let used_percent = info.used_bytes as f64 / info.max_bytes as f64 * 100.0;
            if used_percent >= self.degraded_memory_percent {
                report = ctx.degraded(&ProbeError::ThresholdExceeded {
                    metric: "cacheMemoryPercent".into(),
                    value: used_percent.round(),
                    threshold: self.degraded_memory_percent,
                });
            }
            report = report.with_detail("memoryUsedPercent", used_percent.round() as u64);
        }

        report
            .with_detail("pingLatencyMs", latency_ms)
            .with_detail("usedMemory", info.used_bytes)
            .with_detail("connectedClients", info.connected_clients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::collaborators::CacheMemoryInfo;
    use crate::health::error::BoxError;
    use crate::health::probes::test_context;
    use crate::health::report::Status;
    use async_trait::async_trait;

    struct FakeCache {
        ping_ok: bool,
        info: CacheMemoryInfo,
    }

    #[async_trait]
    impl CacheClient for FakeCache {
        async fn ping(&self) -> Result<(), BoxError> {
            if self.ping_ok {
                Ok(())
            } else {
                Err("ECONNREFUSED".into())
            }
        }

        async fn memory_info(&self) -> Result<CacheMemoryInfo, BoxError> {
            Ok(self.info)
        }
    }

    async fn evaluate(ping_ok: bool, used: u64, max: u64) -> HealthReport {
        let client = FakeCache {
            ping_ok,
            info: CacheMemoryInfo {
                used_bytes: used,
                max_bytes: max,
                connected_clients: 3,
            },
        };
        CacheClientProbe::new(Arc::new(client), 90.0)
            .evaluate(&test_context())
            .await
    }

    #[tokio::test]
    async fn test_ping_failure_is_down() {
        assert_eq!(evaluate(false, 0, 0).await.status(), Status::Down);
    }

    #[tokio::test]
    async fn test_memory_pressure_is_degraded() {
        let report = evaluate(true, 95, 100).await;
        assert_eq!(report.status(), Status::Degraded);
        assert_eq!(report.detail("memoryUsedPercent").unwrap(), 95);
    }

    #[tokio::test]
    async fn test_unbounded_memory_is_operational() {
        assert_eq!(evaluate(true, 10_000, 0).await.status(), Status::Operational);
    }
}
