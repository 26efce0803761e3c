//! Services that report their own health: embeddings, tool runtime, sockets.
//!
//! All three follow the same rule: full failure is `Down`, partial loss of
//! capability is `Degraded`, otherwise `Operational`.

use std::sync::Arc;

use crate::health::collaborators::{EmbeddingService, SocketServer, ToolRuntime};
use crate::health::error::ProbeError;
use crate::health::probes::ProbeContext;
use crate::health::report::HealthReport;

pub struct EmbeddingProbe {
    service: Arc<dyn EmbeddingService>,
}

impl EmbeddingProbe {
    pub fn new(service: Arc<dyn EmbeddingService>) -> Self {
        Self { service }
    }

    pub async fn evaluate(&self, ctx: &ProbeContext) -> HealthReport {
        let health = match self.service.health().await {
            Ok(health) => health,
            Err(e) => return ctx.down(&*e),
        };
        let report = if !health.reachable {
            ctx.down(&ProbeError::Connectivity("embedding service is unreachable".into()))
        } else if !health.cache_available {
            ctx.degraded(&ProbeError::Connectivity("embedding cache is unavailable".into()))
        } else {
            HealthReport::operational(ctx.now())
        };
        report
            .with_detail("reachable", health.reachable)
            .with_detail("cacheAvailable", health.cache_available)
    }
}

pub struct ToolRuntimeProbe {
    runtime: Arc<dyn ToolRuntime>,
}

impl ToolRuntimeProbe {
    pub fn new(runtime: Arc<dyn ToolRuntime>) -> Self {
        Self { runtime }
    }

    pub async fn evaluate(&self, ctx: &ProbeContext) -> HealthReport {
        let health = match self.runtime.health().await {
            Ok(health) => health,
            Err(e) => return ctx.down(&*e),
        };
        let report = if !health.transport_connected {
            ctx.down(&ProbeError::Connectivity("tool transport is disconnected".into()))
        } else if health.registered_tools < health.expected_tools {
            ctx.degraded(&ProbeError::Unknown(format!(
                "{} of {} tools registered",
                health.registered_tools, health.expected_tools
            )))
        } else {
            HealthReport::operational(ctx.now())
        };
        report
            .with_detail("transportConnected", health.transport_connected)
            .with_detail("registeredTools", health.registered_tools)
            .with_detail("expectedTools", health.expected_tools)
    }
}

pub struct SocketServerProbe {
    server: Arc<dyn SocketServer>,
}

impl SocketServerProbe {
    pub fn new(server: Arc<dyn SocketServer>) -> Self {
        Self { server }
    }

    pub async fn evaluate(&self, ctx: &ProbeContext) -> HealthReport {
        let health = match self.server.health().await {
            Ok(health) => health,
            Err(e) => return ctx.down(&*e),
        };
        let report = if !health.running {
            ctx.down(&ProbeError::Connectivity("websocket server is not running".into()))
        } else if !health.adapter_connected {
            ctx.degraded(&ProbeError::Connectivity("websocket pub/sub adapter is disconnected".into()))
        } else {
            HealthReport::operational(ctx.now())
        };
        report
            .with_detail("running", health.running)
            .with_detail("connectedClients", health.connected_clients)
    }
}
