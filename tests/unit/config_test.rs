//! Tests for configuration validation and loading

use std::collections::HashMap;
use std::time::Duration;

use batch_dispatcher::config::{
    DispatchSettings, TargetSpec, DEFAULT_CONCURRENCY, DEFAULT_QUEUE_DEPTH_MULTIPLIER,
    DEFAULT_SHUTDOWN_GRACE_MS,
};
use batch_dispatcher::core::ConfigError;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn test_defaults() {
    let cfg = DispatchSettings::default();
    assert_eq!(cfg.interval_ms, 1_000);
    assert_eq!(cfg.total_count, 0);
    assert_eq!(cfg.batch_size, 1);
    assert_eq!(cfg.concurrency, DEFAULT_CONCURRENCY);
    assert_eq!(cfg.queue_depth_multiplier, DEFAULT_QUEUE_DEPTH_MULTIPLIER);
    assert_eq!(cfg.shutdown_grace_ms, DEFAULT_SHUTDOWN_GRACE_MS);
    assert_eq!(cfg.targets, TargetSpec::Default);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_builder_and_derived_values() {
    let cfg = DispatchSettings::new()
        .with_total_count(500)
        .with_interval(Duration::from_secs(20))
        .with_batch_size(20)
        .with_queue_depth_multiplier(3)
        .with_shutdown_grace_ms(500);
    assert_eq!(cfg.interval_ms, 20_000);
    assert_eq!(cfg.interval(), Duration::from_secs(20));
    assert_eq!(cfg.queue_capacity(), 60);
    assert_eq!(cfg.shutdown_grace(), Duration::from_millis(500));
}

#[test]
fn test_sub_millisecond_interval_rounds_up() {
    let cfg = DispatchSettings::new().with_interval(Duration::from_micros(500));
    assert_eq!(cfg.interval_ms, 1);
    assert!(cfg.validate().is_ok());

    let cfg = DispatchSettings::new().with_interval(Duration::from_micros(1_500));
    assert_eq!(cfg.interval_ms, 2);

    let cfg = DispatchSettings::new().with_interval(Duration::ZERO);
    assert_eq!(cfg.validate(), Err(ConfigError::ZeroInterval));
}

#[test]
fn test_queue_capacity_capped_by_total() {
    let cfg = DispatchSettings::new()
        .with_total_count(3)
        .with_batch_size(usize::MAX / 2);
    assert_eq!(cfg.queue_capacity(), 3);

    let cfg = DispatchSettings::new().with_batch_size(usize::MAX);
    assert_eq!(cfg.total_count, 0);
    assert_eq!(cfg.queue_capacity(), 1);

    let cfg = DispatchSettings::new()
        .with_total_count(1_000)
        .with_batch_size(4)
        .with_queue_depth_multiplier(5);
    assert_eq!(cfg.queue_capacity(), 20);
}

#[test]
fn test_zero_values_rejected() {
    let base = DispatchSettings::new().with_total_count(5);
    assert_eq!(
        base.clone().with_interval_ms(0).validate(),
        Err(ConfigError::ZeroInterval)
    );
    assert_eq!(
        base.clone().with_batch_size(0).validate(),
        Err(ConfigError::ZeroBatchSize)
    );
    assert_eq!(
        base.clone().with_concurrency(0).validate(),
        Err(ConfigError::ZeroConcurrency)
    );
    assert_eq!(
        base.with_queue_depth_multiplier(0).validate(),
        Err(ConfigError::ZeroQueueMultiplier)
    );
}

#[test]
fn test_empty_target_list_rejected() {
    let cfg = DispatchSettings::new().with_targets(TargetSpec::List { names: vec![] });
    assert_eq!(cfg.validate(), Err(ConfigError::EmptyTargets));
}

#[test]
fn test_from_json_str() {
    let cfg = DispatchSettings::from_json_str(
        r#"{
            "interval_ms": 20000,
            "total_count": 500,
            "batch_size": 20,
            "targets": { "kind": "prefix_range", "prefix": "testns", "start": 1, "end": 10 }
        }"#,
    )
    .expect("valid settings");

    assert_eq!(cfg.total_count, 500);
    assert_eq!(cfg.batch_size, 20);
    assert_eq!(cfg.concurrency, DEFAULT_CONCURRENCY);
    assert_eq!(
        cfg.targets,
        TargetSpec::PrefixRange {
            prefix: "testns".into(),
            start: 1,
            end: 10,
        }
    );
}

#[test]
fn test_from_json_str_errors() {
    assert!(matches!(
        DispatchSettings::from_json_str("{ not json"),
        Err(ConfigError::Parse(_))
    ));
    assert_eq!(
        DispatchSettings::from_json_str(r#"{ "batch_size": 0 }"#),
        Err(ConfigError::ZeroBatchSize)
    );
}

#[test]
fn test_json_round_trip() {
    let cfg = DispatchSettings::new()
        .with_total_count(7)
        .with_targets(TargetSpec::Single { name: "ns".into() });
    let json = serde_json::to_string(&cfg).expect("serialize");
    assert_eq!(DispatchSettings::from_json_str(&json), Ok(cfg));
}

#[test]
fn test_from_lookup_empty_uses_defaults() {
    let cfg = DispatchSettings::from_lookup(lookup(&[])).expect("defaults are valid");
    assert_eq!(cfg, DispatchSettings::default());
}

#[test]
fn test_from_lookup_numbers_and_list() {
    let cfg = DispatchSettings::from_lookup(lookup(&[
        ("DISPATCH_TOTAL", "500"),
        ("DISPATCH_INTERVAL_MS", "20000"),
        ("DISPATCH_BATCH", " 20 "),
        ("DISPATCH_CONCURRENCY", "4"),
        ("DISPATCH_QUEUE_MULTIPLIER", "2"),
        ("DISPATCH_SHUTDOWN_GRACE_MS", "100"),
        ("DISPATCH_TARGETS", "ns1, ns2,ns3"),
    ]))
    .expect("valid env");

    assert_eq!(cfg.total_count, 500);
    assert_eq!(cfg.interval_ms, 20_000);
    assert_eq!(cfg.batch_size, 20);
    assert_eq!(cfg.concurrency, 4);
    assert_eq!(cfg.queue_depth_multiplier, 2);
    assert_eq!(cfg.shutdown_grace_ms, 100);
    assert_eq!(
        cfg.targets,
        TargetSpec::List {
            names: vec!["ns1".into(), "ns2".into(), "ns3".into()],
        }
    );
}

#[test]
fn test_from_lookup_prefix_range() {
    let cfg = DispatchSettings::from_lookup(lookup(&[
        ("DISPATCH_TARGET_PREFIX", "testns"),
        ("DISPATCH_TARGET_RANGE", "1,3"),
    ]))
    .expect("valid env");
    let names = cfg.targets.resolve().expect("resolves").names().to_vec();
    assert_eq!(names, vec!["testns-1", "testns-2", "testns-3"]);
}

#[test]
fn test_from_lookup_errors() {
    assert!(matches!(
        DispatchSettings::from_lookup(lookup(&[("DISPATCH_TOTAL", "lots")])),
        Err(ConfigError::Env { var, .. }) if var == "DISPATCH_TOTAL"
    ));
    assert!(matches!(
        DispatchSettings::from_lookup(lookup(&[("DISPATCH_TARGET_PREFIX", "testns")])),
        Err(ConfigError::Env { var, .. }) if var == "DISPATCH_TARGET_RANGE"
    ));
    assert!(matches!(
        DispatchSettings::from_lookup(lookup(&[
            ("DISPATCH_TARGETS", "a,b"),
            ("DISPATCH_TARGET_PREFIX", "testns"),
            ("DISPATCH_TARGET_RANGE", "1,2"),
        ])),
        Err(ConfigError::Env { .. })
    ));
    assert!(matches!(
        DispatchSettings::from_lookup(lookup(&[
            ("DISPATCH_TARGET_PREFIX", "testns"),
            ("DISPATCH_TARGET_RANGE", "5,1"),
        ])),
        Err(ConfigError::InvalidRange(_))
    ));
    assert_eq!(
        DispatchSettings::from_lookup(lookup(&[("DISPATCH_TARGETS", "a,,b")])),
        Err(ConfigError::EmptyTargetName { position: 1 })
    );
    assert_eq!(
        DispatchSettings::from_lookup(lookup(&[("DISPATCH_BATCH", "0")])),
        Err(ConfigError::ZeroBatchSize)
    );
}
