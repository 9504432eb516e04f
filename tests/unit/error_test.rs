//! Tests for error types

use batch_dispatcher::core::{ConfigError, DispatchError, ItemFailure};

#[test]
fn test_config_error_messages() {
    assert_eq!(
        ConfigError::EmptyTargets.to_string(),
        "at least one target must be provided"
    );
    assert_eq!(
        ConfigError::EmptyTargetName { position: 2 }.to_string(),
        "target name at position 2 is empty"
    );
    assert_eq!(
        ConfigError::ZeroInterval.to_string(),
        "interval must be greater than 0"
    );
    assert_eq!(
        ConfigError::InvalidRange("5,1".into()).to_string(),
        "invalid target range: 5,1"
    );
    assert_eq!(
        ConfigError::Env {
            var: "DISPATCH_TOTAL".into(),
            reason: "not a number".into(),
        }
        .to_string(),
        "environment variable DISPATCH_TOTAL is invalid: not a number"
    );
}

#[test]
fn test_config_error_converts() {
    let err: DispatchError = ConfigError::ZeroBatchSize.into();
    assert_eq!(
        err.to_string(),
        "invalid configuration: batch_size must be greater than 0"
    );
}

#[test]
fn test_item_failed_message() {
    let err = DispatchError::ItemFailed(ItemFailure {
        index: 7,
        target: "testns-2".into(),
        name: "svc-7".into(),
        attempt: 1,
        reason: "timed out".into(),
    });
    assert_eq!(err.to_string(), "item 7 (testns-2/svc-7) failed: timed out");
}

#[test]
fn test_run_errors() {
    assert_eq!(
        DispatchError::WorkersExited {
            settled: 3,
            total: 10,
        }
        .to_string(),
        "all workers exited after settling 3 of 10 items"
    );
    assert_eq!(
        DispatchError::AlreadyRunning.to_string(),
        "dispatcher is already running"
    );
}

#[test]
fn test_spawn_error_keeps_source() {
    use std::error::Error;

    let err = DispatchError::Spawn {
        name: "dispatch-worker-0".into(),
        source: std::io::Error::other("no threads left"),
    };
    assert!(err.to_string().starts_with("failed to spawn dispatch-worker-0"));
    assert!(err.source().is_some());
}

#[test]
fn test_item_failure_serializes() {
    let failure = ItemFailure {
        index: 1,
        target: "a".into(),
        name: "svc-1".into(),
        attempt: 2,
        reason: "boom".into(),
    };
    let json = serde_json::to_value(&failure).expect("serialize");
    assert_eq!(json["attempt"], 2);
    assert_eq!(json["target"], "a");
}
