//! Tests for error types

use broker_task_engine::core::{EngineError, TaskFailure};

#[test]
fn test_invalid_config_error() {
    let err = EngineError::InvalidConfig("worker_count must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: worker_count must be greater than 0"
    );
}

#[test]
fn test_thread_spawn_error() {
    let err = EngineError::ThreadSpawn("sequencer: resource unavailable".to_string());
    assert_eq!(format!("{}", err), "thread spawn failed: sequencer: resource unavailable");
}

#[test]
fn test_runtime_error() {
    let err = EngineError::Runtime("no reactor".to_string());
    assert_eq!(format!("{}", err), "runtime error: no reactor");
}

#[test]
fn test_task_failure_from_error_keeps_context() {
    let source = anyhow::anyhow!("connection refused").context("store flush failed");
    let failure = TaskFailure::from(source);
    assert!(!failure.is_panic());
    assert_eq!(
        format!("{}", failure),
        "task error: store flush failed: connection refused"
    );
}

#[test]
fn test_task_failure_panic_display() {
    let failure = TaskFailure::Panic("index out of bounds".to_string());
    assert!(failure.is_panic());
    assert_eq!(format!("{}", failure), "task panicked: index out of bounds");
}
