//! External model services, read from the in-memory state registry.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::health::collaborators::{ModelRegistry, ModelServiceState};
use crate::health::probes::ProbeContext;
use crate::health::report::{HealthReport, Status};

fn map_state(state: ModelServiceState) -> Status {
    match state {
        ModelServiceState::Active => Status::Operational,
        ModelServiceState::Cooldown => Status::Degraded,
        ModelServiceState::Disabled => Status::Down,
    }
}

pub struct ModelsProbe {
    registry: Arc<dyn ModelRegistry>,
    services: Vec<String>,
}

impl ModelsProbe {
    pub fn new(registry: Arc<dyn ModelRegistry>, services: Vec<String>) -> Self {
        Self { registry, services }
    }

    /// Every known service disabled is `Down`; any service not active is
    /// `Degraded`. Services missing from the registry are left out.
    pub fn evaluate(&self, ctx: &ProbeContext) -> HealthReport {
        let known: Vec<(&str, Status)> = self
            .services
            .iter()
            .filter_map(|name| {
                self.registry
                    .state(name)
                    .map(|state| (name.as_str(), map_state(state)))
            })
            .collect();

        let status = if !known.is_empty() && known.iter().all(|(_, s)| *s == Status::Down) {
            Status::Down
        } else if known.iter().any(|(_, s)| *s != Status::Operational) {
            Status::Degraded
        } else {
            Status::Operational
        };

        let services: Map<String, Value> = known
            .iter()
            .map(|(name, s)| (name.to_string(), Value::from(s.as_str())))
            .collect();

        HealthReport::new(status, ctx.now()).with_detail("services", services)
    }
}
