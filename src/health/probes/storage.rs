//! Object storage with its content-moderation and image-transform helpers.

use std::sync::Arc;

use serde_json::json;

use crate::health::collaborators::ObjectStorage;
use crate::health::error::ProbeError;
use crate::health::probes::ProbeContext;
use crate::health::report::{HealthReport, Status};

pub struct StorageProbe {
    storage: Arc<dyn ObjectStorage>,
}

impl StorageProbe {
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self { storage }
    }

    pub async fn evaluate(&self, ctx: &ProbeContext) -> HealthReport {
        if !self.storage.is_initialized() {
            return ctx.down(&ProbeError::ConfigurationMissing("object storage client".into()));
        }
        if let Err(e) = self.storage.check_bucket().await {
            return ctx.down(&*e).with_detail("bucket", Status::Down.as_str());
        }

        // Reads and writes still work when either helper fails.
        let (moderation, transform) = tokio::join!(
            self.storage.check_moderation(),
            self.storage.check_image_transform()
        );
        let sub_status = |r: &Result<(), _>| match r {
            Ok(()) => Status::Operational,
            Err(_) => Status::Degraded,
        };
        let subsystems = json!({
            "bucket": Status::Operational,
            "moderation": sub_status(&moderation),
            "imageTransform": sub_status(&transform),
        });

        match moderation.and(transform) {
            Ok(()) => HealthReport::operational(ctx.now()).with_detail("subsystems", subsystems),
            Err(e) => ctx.degraded(&*e).with_detail("subsystems", subsystems),
        }
    }
}
