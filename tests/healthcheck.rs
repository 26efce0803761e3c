//! End-to-end tests for `GET /healthcheck` driven through the axum router.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use health_aggregator::config::schema::CheckOverride;
use health_aggregator::config::{validate_config, ValidationError};
use health_aggregator::health::Criticality;
use health_aggregator::http::{build_router, AppState};

mod common;
use common::{get, host, test_config, FakeDatastore, FakeQueue};

#[tokio::test]
async fn test_operational_returns_200() {
    let datastore = FakeDatastore::connected();
    let state = AppState::new(test_config(), host().with_datastore(datastore));

    let (status, body) = get(build_router(state), "/healthcheck").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Operational");
    assert_eq!(body["version"], "9.9.9-test");
    assert_eq!(body["services"]["database"]["healthy"], true);
    assert_eq!(body["services"]["memory"]["status"], "Operational");
    assert!(body["services"]["database"]["lastChecked"].is_string());
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_datastore_down_returns_503() {
    let state = AppState::new(test_config(), host().with_datastore(FakeDatastore::disconnected()));

    let (status, body) = get(build_router(state), "/healthcheck").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "Down");
    assert_eq!(body["services"]["database"]["healthy"], false);
    assert_eq!(body["services"]["database"]["status"], "Down");
    assert_eq!(body["error"], "Critical services down: database");
}

#[tokio::test]
async fn test_advisory_failure_degrades_but_serves() {
    let mut config = test_config();
    config.checks.insert(
        "database".into(),
        CheckOverride {
            criticality: Some(Criticality::Advisory),
            ..Default::default()
        },
    );
    let state = AppState::new(config, host().with_datastore(FakeDatastore::disconnected()));

    let (status, body) = get(build_router(state), "/healthcheck").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Degraded");
    assert_eq!(body["services"]["database"]["status"], "Down");
}

#[tokio::test]
async fn test_concurrent_requests_share_one_aggregation() {
    let datastore = FakeDatastore::slow(Duration::from_millis(200));
    let state = AppState::new(test_config(), host().with_datastore(datastore.clone()));
    let health = state.health.clone();
    let router = build_router(state);

    let (first, second) = tokio::join!(
        get(router.clone(), "/healthcheck"),
        get(router.clone(), "/healthcheck")
    );

    assert_eq!(first.0, StatusCode::OK);
    assert_eq!(second.0, StatusCode::OK);
    assert_eq!(first.1["timestamp"], second.1["timestamp"]);
    assert_eq!(health.single_flight_joins(), 1);
    assert_eq!(datastore.probe_count(), 1);
}

#[tokio::test]
async fn test_cached_reports_within_freshness_window() {
    let datastore = FakeDatastore::connected();
    let state = AppState::new(test_config(), host().with_datastore(datastore.clone()));
    let router = build_router(state);

    get(router.clone(), "/healthcheck").await;
    get(router.clone(), "/healthcheck").await;

    assert_eq!(datastore.probe_count(), 1);
}

#[tokio::test]
async fn test_deadline_exceeded_returns_503() {
    let mut config = test_config();
    config.health.deadline_ms = 50;
    let state = AppState::new(
        config,
        host().with_datastore(FakeDatastore::slow(Duration::from_secs(2))),
    );

    let (status, body) = get(build_router(state), "/healthcheck").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "Down");
    assert_eq!(body["error"], "Health check timed out after 50ms");
    assert_eq!(body["version"], "9.9.9-test");
}

#[tokio::test]
async fn test_request_timeout_shorter_than_deadline_is_rejected() {
    let mut config = test_config();
    config.timeouts.request_secs = 1;
    config.health.deadline_ms = 3_000;
    let errors = validate_config(&config).unwrap_err();
    assert!(matches!(
        errors.as_slice(),
        [ValidationError::RequestTimeoutWithinDeadline { .. }]
    ));

    // With the deadline inside the request timeout, a stalled datastore still
    // yields the structured 503 instead of a bare timeout page.
    config.timeouts.request_secs = 2;
    config.health.deadline_ms = 200;
    validate_config(&config).unwrap();
    let state = AppState::new(
        config,
        host().with_datastore(FakeDatastore::slow(Duration::from_secs(10))),
    );

    let (status, body) = get(build_router(state), "/healthcheck").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "Down");
    assert_eq!(body["error"], "Health check timed out after 200ms");
}

#[tokio::test]
async fn test_panicking_probe_is_reported_down() {
    let state = AppState::new(test_config(), host().with_datastore(FakeDatastore::exploding()));

    let (status, body) = get(build_router(state), "/healthcheck").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let error = &body["services"]["database"]["details"]["error"];
    assert_eq!(error["kind"], "string");
    assert_eq!(error["message"], "datastore driver exploded");
    assert_eq!(error["details"], "Non-Error object thrown");
    // Siblings still report.
    assert_eq!(body["services"]["cpu"]["status"], "Operational");
}

#[tokio::test]
async fn test_queue_reports_are_nested() {
    let collaborators = host()
        .with_queue(FakeQueue::new("emails", 3))
        .with_queue(FakeQueue::new("exports", 0));
    let state = AppState::new(test_config(), collaborators);

    let (status, body) = get(build_router(state), "/healthcheck").await;

    assert_eq!(status, StatusCode::OK);
    let queues = &body["services"]["queues"]["details"]["queues"];
    assert_eq!(queues["emails"]["details"]["queueLength"], 3);
    assert_eq!(queues["exports"]["status"], "Operational");
}

#[tokio::test]
async fn test_liveness_runs_no_probes() {
    let datastore = FakeDatastore::disconnected();
    let state = AppState::new(test_config(), host().with_datastore(datastore.clone()));

    let (status, body) = get(build_router(state), "/healthcheck/live").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "alive");
    assert_eq!(body["version"], "9.9.9-test");
    assert_eq!(datastore.probe_count(), 0);
}

#[tokio::test]
async fn test_request_id_is_assigned_and_propagated() {
    let router = build_router(AppState::new(test_config(), host()));

    let response = router
        .clone()
        .oneshot(Request::get("/healthcheck/live").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let generated = response.headers().get("x-request-id").unwrap();
    assert_eq!(generated.to_str().unwrap().len(), 36);

    let response = router
        .oneshot(
            Request::get("/healthcheck/live")
                .header("x-request-id", "probe-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers().get("x-request-id").unwrap(), "probe-42");
}
