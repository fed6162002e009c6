//! Metric sink tests
//!
//! Gauge, enum and info families as exposed in the text format.

mod common;

use common::{find, value};
use std::collections::BTreeMap;
use vsa_exporter::error::ExporterError;
use vsa_exporter::metrics::MetricsRegistry;

/// Helper to create a test metrics instance
fn create_test_metrics() -> MetricsRegistry {
    MetricsRegistry::new().expect("Failed to create metrics")
}

fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[test]
fn test_process_metrics_registered() {
    // Given: A fresh registry
    let metrics = create_test_metrics();
    metrics.up.set(1.0);

    // When: Rendering
    let rendered = metrics.render().unwrap();

    // Then: The scalar up gauge is always present
    assert!(rendered.contains("# HELP vsa_up"));
    assert!(rendered.contains("# TYPE vsa_up gauge"));
    assert_eq!(value(&rendered, "vsa_up", &[]), Some(1.0));
}

#[test]
fn test_gauge_set_overwrites() {
    // Given: A gauge family
    let metrics = create_test_metrics();
    let gauge = metrics
        .define_gauge("vsa_test_bytes", "Test bytes", &labels(&["node_name", "disk_id"]))
        .unwrap();

    // When: Setting the same series twice
    gauge.set(&["n1", "d1"], 10.0).unwrap();
    gauge.set(&["n1", "d1"], 20.0).unwrap();

    // Then: Last write wins
    let rendered = metrics.render().unwrap();
    assert_eq!(find(&rendered, "vsa_test_bytes", &[]).len(), 1);
    assert_eq!(
        value(&rendered, "vsa_test_bytes", &[("node_name", "n1"), ("disk_id", "d1")]),
        Some(20.0)
    );
}

#[test]
fn test_gauge_rejects_wrong_label_count() {
    // Given: A gauge with two labels
    let metrics = create_test_metrics();
    let gauge = metrics
        .define_gauge("vsa_test_arity", "Test arity", &labels(&["a", "b"]))
        .unwrap();

    // When: Setting with one or three values
    let missing = gauge.set(&["x"], 1.0);
    let extra = gauge.set(&["x", "y", "z"], 1.0);

    // Then: Both are label mismatches, nothing is exposed
    assert!(matches!(
        missing,
        Err(ExporterError::LabelMismatch { expected: 2, got: 1, .. })
    ));
    assert!(matches!(
        extra,
        Err(ExporterError::LabelMismatch { expected: 2, got: 3, .. })
    ));
    assert!(find(&metrics.render().unwrap(), "vsa_test_arity", &[]).is_empty());
}

#[test]
fn test_duplicate_definition_is_rejected() {
    let metrics = create_test_metrics();
    metrics
        .define_gauge("vsa_test_dup", "First", &labels(&["a"]))
        .unwrap();

    let result = metrics.define_gauge("vsa_test_dup", "Second", &labels(&["a"]));

    assert!(matches!(result, Err(ExporterError::Metrics(_))));
}

#[test]
fn test_enum_exposes_one_sample_per_state() {
    // Given: An enum with three states
    let metrics = create_test_metrics();
    let state = metrics
        .define_enum(
            "vsa_test_state",
            "Test state",
            &labels(&["pool_name"]),
            &["online", "offline", "degraded"],
        )
        .unwrap();

    // When: Setting a state
    state.set_state(&["p1"], "offline").unwrap();

    // Then: One sample per declared state, only the current one is 1
    let rendered = metrics.render().unwrap();
    assert_eq!(find(&rendered, "vsa_test_state", &[("pool_name", "p1")]).len(), 3);
    assert_eq!(
        value(&rendered, "vsa_test_state", &[("vsa_test_state", "offline")]),
        Some(1.0)
    );
    assert_eq!(
        value(&rendered, "vsa_test_state", &[("vsa_test_state", "online")]),
        Some(0.0)
    );
    assert_eq!(
        value(&rendered, "vsa_test_state", &[("vsa_test_state", "degraded")]),
        Some(0.0)
    );
}

#[test]
fn test_enum_rejects_undeclared_state() {
    // Given: An enum already in a valid state
    let metrics = create_test_metrics();
    let state = metrics
        .define_enum("vsa_test_kind", "Test kind", &labels(&["id"]), &["zfs"])
        .unwrap();
    state.set_state(&["x"], "zfs").unwrap();

    // When: Setting an undeclared state
    let result = state.set_state(&["x"], "btrfs");

    // Then: It is reported and the series keeps its state
    match result {
        Err(ExporterError::UnknownState { metric, state }) => {
            assert_eq!(metric, "vsa_test_kind");
            assert_eq!(state, "btrfs");
        }
        other => panic!("expected UnknownState, got {:?}", other),
    }
    let rendered = metrics.render().unwrap();
    assert_eq!(
        value(&rendered, "vsa_test_kind", &[("vsa_test_kind", "zfs")]),
        Some(1.0)
    );
    assert!(find(&rendered, "vsa_test_kind", &[("vsa_test_kind", "btrfs")]).is_empty());
}

#[test]
fn test_enum_needs_states() {
    let metrics = create_test_metrics();
    let result = metrics.define_enum("vsa_test_empty", "Empty", &labels(&["id"]), &[]);
    assert!(matches!(result, Err(ExporterError::Config(_))));
}

#[test]
fn test_info_exposes_fields_as_labels() {
    // Given: An info family keyed by session
    let metrics = create_test_metrics();
    let info = metrics
        .define_info("vsa_test_session", "Test session", &labels(&["name", "session_id"]))
        .unwrap();
    assert_eq!(info.name(), "vsa_test_session_info");

    // When: Setting fields, including one that collides and one that needs sanitizing
    let mut fields = BTreeMap::new();
    fields.insert("initiator".to_string(), "host-a".to_string());
    fields.insert("target-ip".to_string(), "10.0.0.1".to_string());
    fields.insert("name".to_string(), "shadow".to_string());
    info.set_fields(&["vd1", "s1"], &fields).unwrap();

    // Then: One sample with value 1, sanitized keys and no overridden base label
    let rendered = metrics.render().unwrap();
    assert!(rendered.contains("# TYPE vsa_test_session_info gauge"));
    let found = find(&rendered, "vsa_test_session_info", &[("session_id", "s1")]);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].value, 1.0);
    assert_eq!(found[0].labels["name"], "vd1");
    assert_eq!(found[0].labels["initiator"], "host-a");
    assert_eq!(found[0].labels["target_ip"], "10.0.0.1");
}

#[test]
fn test_info_set_fields_replaces_mapping() {
    let metrics = create_test_metrics();
    let info = metrics
        .define_info("vsa_test_replace", "Test replace", &labels(&["id"]))
        .unwrap();

    let mut first = BTreeMap::new();
    first.insert("state".to_string(), "login".to_string());
    first.insert("old".to_string(), "x".to_string());
    info.set_fields(&["1"], &first).unwrap();

    let mut second = BTreeMap::new();
    second.insert("state".to_string(), "active".to_string());
    info.set_fields(&["1"], &second).unwrap();

    assert_eq!(info.len(), 1);
    let rendered = metrics.render().unwrap();
    let found = find(&rendered, "vsa_test_replace_info", &[("id", "1")]);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].labels["state"], "active");
    assert!(!found[0].labels.contains_key("old"));
}

#[test]
fn test_info_rejects_wrong_label_count() {
    let metrics = create_test_metrics();
    let info = metrics
        .define_info("vsa_test_info_arity", "Arity", &labels(&["a", "b"]))
        .unwrap();

    let result = info.set_fields(&["only-one"], &BTreeMap::new());

    assert!(matches!(result, Err(ExporterError::LabelMismatch { .. })));
    assert!(info.is_empty());
}
