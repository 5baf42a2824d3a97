//! Tests for configuration loading and validation

use std::time::Duration;

use broker_task_engine::config::scheduler::{ENV_IDLE_DELAY_MS, ENV_WORKER_COUNT};
use broker_task_engine::config::SchedulerConfig;

#[test]
fn test_scheduler_config_validation() {
    let valid = SchedulerConfig::new().with_worker_count(2);
    assert!(valid.validate().is_ok());
}

#[test]
fn test_scheduler_config_invalid_worker_count() {
    let invalid = SchedulerConfig::new().with_worker_count(0);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_scheduler_config_invalid_prefix() {
    let invalid = SchedulerConfig::new().with_thread_name_prefix("  ");
    assert!(invalid.validate().is_err());
}

#[test]
fn test_scheduler_config_invalid_stack_size() {
    let invalid = SchedulerConfig::new().with_thread_stack_size(0);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_scheduler_config_from_json() {
    let cfg = SchedulerConfig::from_json_str(
        r#"{"worker_count": 2, "idle_delay_ms": 50, "thread_name_prefix": "broker"}"#,
    )
    .unwrap();
    assert_eq!(cfg.worker_count, 2);
    assert_eq!(cfg.idle_delay(), Duration::from_millis(50));
    assert_eq!(cfg.thread_name_prefix, "broker");
    assert_eq!(cfg.thread_stack_size, None);
}

#[test]
fn test_scheduler_config_json_defaults() {
    let cfg = SchedulerConfig::from_json_str("{}").unwrap();
    assert_eq!(cfg, SchedulerConfig::new());
}

#[test]
fn test_scheduler_config_json_rejects_invalid() {
    assert!(SchedulerConfig::from_json_str(r#"{"worker_count": 0}"#).is_err());
    assert!(SchedulerConfig::from_json_str("not json").is_err());
}

#[test]
fn test_scheduler_config_lookup_parse_error_names_key() {
    let err = SchedulerConfig::from_lookup(|key| (key == ENV_IDLE_DELAY_MS).then(|| "soon".to_string()))
        .unwrap_err();
    assert!(err.contains(ENV_IDLE_DELAY_MS), "unexpected message: {err}");
}

#[test]
fn test_scheduler_config_lookup_validates() {
    let result = SchedulerConfig::from_lookup(|key| (key == ENV_WORKER_COUNT).then(|| "0".to_string()));
    assert!(result.is_err());
}
