//! Externally configured HTTPS endpoint reachability.

use std::sync::Arc;

use url::Url;

use crate::health::collaborators::HttpProber;
use crate::health::error::ProbeError;
use crate::health::probes::ProbeContext;
use crate::health::report::HealthReport;

pub struct SslProbe {
    http: Arc<dyn HttpProber>,
    url: Option<String>,
}

impl SslProbe {
    pub fn new(http: Arc<dyn HttpProber>, url: Option<String>) -> Self {
        Self { http, url }
    }

    pub async fn evaluate(&self, ctx: &ProbeContext) -> HealthReport {
        let Some(raw) = self.url.as_deref() else {
            return HealthReport::operational(ctx.now())
                .with_detail("note", "SSL check skipped: no URL configured");
        };
        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(e) => return ctx.down(&e).with_detail("url", raw),
        };
        if url.scheme() != "https" {
            return HealthReport::operational(ctx.now())
                .with_detail("url", raw)
                .with_detail("note", "SSL check skipped: URL is not HTTPS");
        }

        match self.http.head(&url).await {
            Ok(code) if (200..300).contains(&code) => HealthReport::operational(ctx.now())
                .with_detail("url", raw)
                .with_detail("statusCode", code),
            Ok(code) => ctx
                .down(&ProbeError::Connectivity(format!("HEAD {raw} returned {code}")))
                .with_detail("url", raw)
                .with_detail("statusCode", code),
            Err(e) => ctx.down(&*e).with_detail("url", raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::error::BoxError;
    use crate::health::probes::test_context;
    use crate::health::report::Status;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeHttp {
        response: Result<u16, &'static str>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HttpProber for FakeHttp {
        async fn head(&self, _url: &Url) -> Result<u16, BoxError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.map_err(Into::into)
        }
    }

    fn http(response: Result<u16, &'static str>) -> Arc<FakeHttp> {
        Arc::new(FakeHttp {
            response,
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_non_https_is_skipped() {
        let fake = http(Ok(500));
        let report = SslProbe::new(fake.clone(), Some("http://localhost:3000".into()))
            .evaluate(&test_context())
            .await;
        assert_eq!(report.status(), Status::Operational);
        assert!(report.detail("note").unwrap().as_str().unwrap().contains("SSL check skipped"));
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success_status() {
        let report = SslProbe::new(http(Ok(204)), Some("https://example.com".into()))
            .evaluate(&test_context())
            .await;
        assert_eq!(report.status(), Status::Operational);
    }

    #[tokio::test]
    async fn test_error_status_is_down() {
        let report = SslProbe::new(http(Ok(502)), Some("https://example.com".into()))
            .evaluate(&test_context())
            .await;
        assert_eq!(report.status(), Status::Down);
        assert_eq!(report.detail("statusCode").unwrap(), 502);
    }

    #[tokio::test]
    async fn test_network_failure_is_down() {
        let report = SslProbe::new(http(Err("certificate expired")), Some("https://example.com".into()))
            .evaluate(&test_context())
            .await;
        assert_eq!(report.status(), Status::Down);
        assert_eq!(report.error_message(), Some("certificate expired"));
    }
}
