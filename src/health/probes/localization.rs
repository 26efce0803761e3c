//! Localization engine: namespace presence and a translation round-trip.

use std::sync::Arc;

use crate::health::collaborators::Localizer;
use crate::health::error::ProbeError;
use crate::health::probes::ProbeContext;
use crate::health::report::HealthReport;

pub struct LocalizationProbe {
    localizer: Arc<dyn Localizer>,
    namespace: String,
    probe_key: String,
}

impl LocalizationProbe {
    pub fn new(localizer: Arc<dyn Localizer>, namespace: impl Into<String>, probe_key: impl Into<String>) -> Self {
        Self {
            localizer,
            namespace: namespace.into(),
            probe_key: probe_key.into(),
        }
    }

    pub fn evaluate(&self, ctx: &ProbeContext) -> HealthReport {
        if !self.localizer.has_namespace(&self.namespace) {
            let err = ProbeError::ConfigurationMissing(format!("translation namespace '{}'", self.namespace));
            return ctx.down(&err).with_detail("namespace", self.namespace.clone());
        }

        // Translation problems never stop the process from serving.
        match self.localizer.translate(&self.namespace, &self.probe_key) {
            Ok(text) if text == self.probe_key => {
                let err = ProbeError::Unknown(format!("key '{}' came back untranslated", self.probe_key));
                ctx.degraded(&err).with_detail("namespace", self.namespace.clone())
            }
            Ok(_) => HealthReport::operational(ctx.now()).with_detail("namespace", self.namespace.clone()),
            Err(e) => ctx.degraded(&*e).with_detail("namespace", self.namespace.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::error::BoxError;
    use crate::health::probes::test_context;
    use crate::health::report::Status;

    enum Mode {
        Translated,
        Untranslated,
        Failing,
        MissingNamespace,
    }

    struct FakeLocalizer(Mode);

    impl Localizer for FakeLocalizer {
        fn has_namespace(&self, _namespace: &str) -> bool {
            !matches!(self.0, Mode::MissingNamespace)
        }

        fn translate(&self, _namespace: &str, key: &str) -> Result<String, BoxError> {
            match self.0 {
                Mode::Translated => Ok("Health check".into()),
                Mode::Untranslated | Mode::MissingNamespace => Ok(key.to_string()),
                Mode::Failing => Err("interpolation failed".into()),
            }
        }
    }

    fn evaluate(mode: Mode) -> HealthReport {
        LocalizationProbe::new(Arc::new(FakeLocalizer(mode)), "common", "health.title")
            .evaluate(&test_context())
    }

    #[test]
    fn test_statuses() {
        assert_eq!(evaluate(Mode::Translated).status(), Status::Operational);
        assert_eq!(evaluate(Mode::Untranslated).status(), Status::Degraded);
        assert_eq!(evaluate(Mode::Failing).status(), Status::Degraded);
        assert_eq!(evaluate(Mode::MissingNamespace).status(), Status::Down);
    }
}
