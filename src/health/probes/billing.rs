//! Third-party billing API.

use std::sync::Arc;

use crate::health::collaborators::BillingApi;
use crate::health::error::ProbeError;
use crate::health::probes::ProbeContext;
use crate::health::report::HealthReport;

pub struct BillingProbe {
    api: Arc<dyn BillingApi>,
    api_secret: Option<String>,
}

impl BillingProbe {
    pub fn new(api: Arc<dyn BillingApi>, api_secret: Option<String>) -> Self {
        Self { api, api_secret }
    }

    pub async fn evaluate(&self, ctx: &ProbeContext) -> HealthReport {
        let Some(secret) = self.api_secret.as_deref().filter(|s| !s.is_empty()) else {
            return ctx.down(&ProbeError::ConfigurationMissing("billing API secret".into()));
        };

        match self.api.balance(secret).await {
            Ok(balance) => HealthReport::operational(ctx.now())
                .with_detail("available", balance.available)
                .with_detail("pending", balance.pending)
                .with_detail("currency", balance.currency),
            Err(e) => ctx.down(&*e),
        }
    }
}
