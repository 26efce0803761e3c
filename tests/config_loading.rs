//! Tests for loading configuration files from disk.

use std::io::Write;
use std::time::Duration;

use health_aggregator::config::{load_config, ConfigError, Environment};
use health_aggregator::health::{CheckKind, Collaborators, Criticality, ProbeSet};
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_full_config() {
    let file = write_config(
        r#"
environment = "production"

[listener]
bind_address = "127.0.0.1:8443"

[health]
version = "2.4.1"
deadline_ms = 5000

[checks.disk]
cache_duration_ms = 1000
criticality = "critical"

[checks.cpu]
enabled = false

[thresholds]
bus_pending_threshold = 100
cpu_degraded_percent = 75.0

[ssl]
url = "https://status.example.com"

[observability]
log_level = "debug"
metrics_enabled = false
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.environment, Environment::Production);
    assert_eq!(config.health.version, "2.4.1");
    assert_eq!(config.health.deadline_ms, 5000);
    assert_eq!(config.thresholds.bus_pending_threshold, 100);
    assert_eq!(config.ssl.url.as_deref(), Some("https://status.example.com"));
    assert!(!config.check("cpu").enabled);

    let probes = ProbeSet::build(&config, &Collaborators::default());
    assert!(probes.get(CheckKind::Cpu).is_none());
    let disk = probes.get(CheckKind::Disk).unwrap();
    assert_eq!(disk.cache_duration, Duration::from_millis(1000));
    assert_eq!(disk.criticality, Criticality::Critical);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_config(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_unknown_environment_is_a_parse_error() {
    let file = write_config("environment = \"staging\"\n");
    assert!(matches!(load_config(file.path()), Err(ConfigError::Parse(_))));
}

#[test]
fn test_semantic_errors_are_all_reported() {
    let file = write_config(
        r#"
[health]
deadline_ms = 0

[thresholds]
disk_degraded_percent = 0.0

[checks.mainframe]
enabled = true
"#,
    );

    match load_config(file.path()) {
        Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 3),
        other => panic!("expected validation failure, got {other:?}"),
    }
}
