//! Tests for target specs and round-robin assignment

use batch_dispatcher::config::{parse_range, TargetSet, TargetSpec, DEFAULT_TARGET};
use batch_dispatcher::core::ConfigError;

#[test]
fn test_parse_range() {
    assert_eq!(parse_range("1,500"), Ok((1, 500)));
    assert_eq!(parse_range(" 3 , 3 "), Ok((3, 3)));
}

#[test]
fn test_parse_range_rejects_bad_input() {
    for input in ["", "1", "1,2,3", "a,2", "0,5", "5,0", "6,5", "-1,2"] {
        assert!(
            matches!(parse_range(input), Err(ConfigError::InvalidRange(_))),
            "{input:?} should be rejected"
        );
    }
}

#[test]
fn test_prefix_range_expands_inclusive() {
    let spec = TargetSpec::prefix_range("testns", "2,4").expect("valid range");
    let set = spec.resolve().expect("resolves");
    assert_eq!(set.names(), ["testns-2", "testns-3", "testns-4"]);
    assert_eq!(set.len(), 3);
    assert!(!set.is_empty());
}

#[test]
fn test_prefix_range_checked_on_resolve() {
    let spec = TargetSpec::PrefixRange {
        prefix: "ns".into(),
        start: 4,
        end: 2,
    };
    assert!(matches!(spec.resolve(), Err(ConfigError::InvalidRange(_))));
}

#[test]
fn test_single_and_default() {
    let single = TargetSpec::Single { name: "prod".into() }.resolve().expect("resolves");
    assert_eq!(single.assign(0), "prod");
    assert_eq!(single.assign(41), "prod");

    let default = TargetSpec::default().resolve().expect("resolves");
    assert_eq!(default.names(), [DEFAULT_TARGET]);
}

#[test]
fn test_list_rejects_empty_name() {
    let spec = TargetSpec::List {
        names: vec!["a".into(), String::new()],
    };
    assert_eq!(
        spec.resolve(),
        Err(ConfigError::EmptyTargetName { position: 1 })
    );
}

#[test]
fn test_assignment_wraps() {
    let set = TargetSet::new(vec!["a".into(), "b".into()]).expect("non-empty");
    let assigned: Vec<&str> = (0..5).map(|i| set.assign(i)).collect();
    assert_eq!(assigned, ["a", "b", "a", "b", "a"]);
}

#[test]
fn test_spec_serde_tagging() {
    let spec: TargetSpec =
        serde_json::from_str(r#"{ "kind": "list", "names": ["x", "y"] }"#).expect("parses");
    assert_eq!(
        spec,
        TargetSpec::List {
            names: vec!["x".into(), "y".into()],
        }
    );
    let default: TargetSpec = serde_json::from_str(r#"{ "kind": "default" }"#).expect("parses");
    assert_eq!(default, TargetSpec::Default);
}
