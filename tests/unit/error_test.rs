//! Tests for error types

use std::time::Duration;

use mine_search::config::ConfigError;
use mine_search::core::{PoolError, TaskError};
use mine_search::service::ServiceError;

#[test]
fn test_capacity_exceeded_error() {
    let err = PoolError::CapacityExceeded;
    assert_eq!(format!("{err}"), "capacity exceeded: task queue is full");
}

#[test]
fn test_pool_shutdown_error() {
    let err = PoolError::PoolShutdown;
    assert_eq!(format!("{err}"), "pool has been shut down");
}

#[test]
fn test_invalid_config_error() {
    let err = PoolError::InvalidConfig("worker_count must be greater than 0".into());
    assert!(format!("{err}").contains("worker_count"));
}

#[test]
fn test_task_timeout_error_names_topic() {
    let err = TaskError::Timeout {
        topic: "stag-mine".into(),
        payload_bytes: 512,
        deadline: Duration::from_secs(3),
    };
    let msg = format!("{err}");
    assert!(msg.contains("stag-mine"));
    assert!(msg.contains("512"));
}

#[test]
fn test_task_serialize_error_from_serde() {
    let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: TaskError = serde_err.into();
    assert!(matches!(err, TaskError::Serialize(_)));
}

#[test]
fn test_config_invalid_value_error() {
    let err = ConfigError::InvalidValue {
        key: "AUDIT_WORKER_COUNT",
        value: "many".into(),
        reason: "invalid digit found in string".into(),
    };
    assert_eq!(
        format!("{err}"),
        "invalid value `many` for AUDIT_WORKER_COUNT: invalid digit found in string"
    );
}

#[test]
fn test_service_status_error() {
    let err = ServiceError::Status { status: 503 };
    assert_eq!(format!("{err}"), "search backend returned HTTP 503");
}
