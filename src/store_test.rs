use super::*;
use serde_json::json;

use crate::property::Direction;

fn leaflet_like_schema() -> Vec<PropertySpec> {
    vec![
        PropertySpec::new("center", PropertyKind::LatLng, Direction::Bidirectional, json!([40, -100])),
        PropertySpec::new("zoom", PropertyKind::Int, Direction::Bidirectional, json!(4)),
        PropertySpec::new("height", PropertyKind::Str, Direction::HostToPeer, json!("600px")),
        PropertySpec::new(
            "clicked_latlng",
            PropertyKind::LatLng,
            Direction::PeerToHost,
            json!([null, null]),
        ),
        PropertySpec::new("loaded", PropertyKind::Bool, Direction::PeerToHost, json!(false)),
    ]
}

fn store() -> StateStore {
    StateStore::from_schema(leaflet_like_schema())
}

#[test]
fn defaults_are_visible() {
    let store = store();
    assert_eq!(store.get("center"), Some(&json!([40, -100])));
    assert_eq!(store.get("zoom"), Some(&json!(4)));
    assert_eq!(store.get("loaded"), Some(&json!(false)));
}

#[test]
fn accepted_set_reflects_and_yields_one_state_body() {
    let mut store = store();
    let body = store.set("zoom", json!(10)).expect("set should succeed");

    assert_eq!(store.get("zoom"), Some(&json!(10)));
    assert_eq!(body, Body::State { name: "zoom".into(), value: json!(10) });
}

#[test]
fn type_mismatch_rejects_and_retains_prior_value() {
    let mut store = store();
    let err = store.set("zoom", json!("ten")).expect_err("string zoom must be rejected");

    assert!(matches!(err, StoreError::TypeMismatch { .. }));
    assert_eq!(err.error_code(), "E_PROP_TYPE");
    assert_eq!(store.get("zoom"), Some(&json!(4)));
}

#[test]
fn unknown_property_is_rejected() {
    let mut store = store();
    let err = store.set("bearingg", json!(0)).expect_err("typo must be rejected");
    assert!(matches!(err, StoreError::UnknownProperty(_)));
}

#[test]
fn host_cannot_write_peer_owned_property() {
    let mut store = store();
    let err = store
        .set("clicked_latlng", json!([1.0, 2.0]))
        .expect_err("clicked_latlng is peer-owned");
    assert!(matches!(err, StoreError::NotWritable { writer: Writer::Host, .. }));
    assert_eq!(store.get("clicked_latlng"), Some(&json!([null, null])));
}

#[test]
fn peer_cannot_write_host_owned_property() {
    let mut store = store();
    let err = store
        .apply_peer("height", json!("300px"))
        .expect_err("height is host-owned");
    assert!(matches!(err, StoreError::NotWritable { writer: Writer::Peer, .. }));
}

#[test]
fn peer_update_is_applied_and_visible() {
    let mut store = store();
    store
        .apply_peer("clicked_latlng", json!([51.5, -0.09]))
        .expect("peer update should apply");
    assert_eq!(store.get("clicked_latlng"), Some(&json!([51.5, -0.09])));
}

#[test]
fn peer_type_mismatch_retains_prior_value() {
    let mut store = store();
    store
        .apply_peer("loaded", json!("yes"))
        .expect_err("string loaded must be rejected");
    assert_eq!(store.get("loaded"), Some(&json!(false)));
}

#[test]
fn observer_fires_on_accepted_change_only() {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    let mut store = store();
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    store.observe("loaded", Box::new(move |_, value| {
        if value == &json!(true) {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }));

    store.apply_peer("loaded", json!(true)).expect("apply");
    store.apply_peer("loaded", json!("bad")).expect_err("reject");
    store.apply_peer("clicked_latlng", json!([0.0, 0.0])).expect("other property");

    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[test]
fn snapshot_lists_every_declared_property() {
    let store = store();
    let snapshot = store.snapshot();
    assert_eq!(snapshot.len(), 5);
    // BTreeMap ordering: lexicographic by name.
    assert_eq!(snapshot[0].0, "center");
    assert!(snapshot.iter().any(|(name, value)| *name == "zoom" && value == &json!(4)));
}
