use std::collections::BTreeMap;

use serde_json::json;
use tessera::node::{NodeError, NodeSettings, NodeStore, WriteOptions};
use tessera::value::Value;
use tessera::Error;

use crate::helpers::*;

fn with_undefined() -> Value {
    let mut map = BTreeMap::new();
    map.insert("kept".to_string(), Value::from(1));
    map.insert("missing".to_string(), Value::Undefined);
    Value::Object(map)
}

#[test]
fn test_array_gap_is_rejected() {
    let mut store = setup_store_with("list", json!(["a", "b"]));
    let before: Vec<_> = store.records().cloned().collect();

    let err = store
        .update_node("list", Value::from(json!({ "5": "x" })))
        .unwrap_err();
    assert!(err.is_type_conflict());
    assert_eq!(err.module(), "node");

    let err = store.set_node("list[4]", Value::from("x"), None).unwrap_err();
    assert!(err.is_type_conflict());
    assert_eq!(store.records().cloned().collect::<Vec<_>>(), before);
}

#[test]
fn test_removing_array_head_is_rejected() {
    let mut store = setup_store_with("list", json!(["a", "b", "c"]));
    let err = store.set_node("list[0]", Value::Null, None).unwrap_err();
    assert!(err.is_type_conflict());
}

#[test]
fn test_array_object_merge_conflicts() {
    let mut store = setup_store_with("obj", json!({ "a": 1 }));
    let err = store.update_node("obj", Value::from(json!(["x"]))).unwrap_err();
    assert!(err.is_type_conflict());

    let mut store = setup_store_with("list", json!(["a"]));
    let err = store
        .update_node("list", Value::from(json!({ "name": "x" })))
        .unwrap_err();
    assert!(err.is_type_conflict());
}

#[test]
fn test_revision_conflict() {
    let mut store = setup_store_with("a", json!({ "x": 1, "text": long_text("t") }));
    let revision = store.get_info_by("a", false).unwrap().revision;

    let err = store
        .set_node("a", Value::from(json!({ "x": 2 })), Some("stale"))
        .unwrap_err();
    assert!(err.is_revision_conflict());
    assert!(matches!(
        &err,
        Error::Node(NodeError::RevisionConflict { expected, .. }) if expected == "stale"
    ));

    store
        .set_node("a", Value::from(json!({ "x": 2 })), Some(&revision))
        .unwrap();
    assert_eq!(record(&store, "a").content.revision_nr, 2);
    assert!(store.get("a/text").is_none());

    let text_revision = store.get_info_by("a/x", false).unwrap().revision;
    store
        .set_node("a/x", Value::from(3), Some(&text_revision))
        .unwrap();
    assert_eq!(record(&store, "a").content.value, json!({ "x": 3.0 }));
}

#[test]
fn test_void_values() {
    let mut store = setup_store();
    let err = store.set_node("a", with_undefined(), None).unwrap_err();
    assert!(matches!(err, Error::Node(NodeError::VoidValue { ref path }) if path == "a/missing"));
    assert!(err.is_validation_error());

    let err = store
        .write_node("a", Value::Null, WriteOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::Node(NodeError::NullValue { .. })));

    let settings = NodeSettings::default().with_remove_void_properties(true);
    let mut store = NodeStore::new([], settings).unwrap();
    store.set_node("a", with_undefined(), None).unwrap();
    assert_eq!(record(&store, "a").content.value, json!({ "kept": 1.0 }));
}

#[test]
fn test_invalid_property_names() {
    let mut store = setup_store();
    for name in ["", "a/b", "x[0]", "tab\u{1}"] {
        let mut map = BTreeMap::new();
        map.insert(name.to_string(), Value::from(1));
        let err = store.set_node("item", Value::Object(map), None).unwrap_err();
        assert!(err.is_invalid_key(), "{name:?} should be rejected");
    }
}

#[test]
fn test_invalid_node_values() {
    let mut store = setup_store();

    let err = store.set_node("", Value::from("text"), None).unwrap_err();
    assert!(matches!(err, Error::Node(NodeError::InvalidNodeValue { .. })));

    let err = store
        .write_node("small", Value::from(1), WriteOptions::default())
        .unwrap_err();
    assert!(err.is_validation_error());

    let err = store.update_node("a", Value::from(1)).unwrap_err();
    assert!(err.is_validation_error());

    let err = store
        .write_node("n", Value::from(json!({ "bad": 0 })), WriteOptions::default())
        .and_then(|_| store.set_node("n/bad", Value::Number(f64::NAN), None))
        .unwrap_err();
    assert!(matches!(err, Error::Node(NodeError::UnsupportedNumber { .. })));
}

#[test]
fn test_root_revision_is_asserted() {
    let mut store = setup_store_with("a", json!({ "x": 1 }));
    let before: Vec<_> = store.records().cloned().collect();

    let err = store
        .set_node("", Value::from(json!({ "b": 2 })), Some("stale"))
        .unwrap_err();
    assert!(err.is_revision_conflict());
    assert_eq!(store.records().cloned().collect::<Vec<_>>(), before);

    let revision = store.get_info_by("", false).unwrap().revision;
    store
        .set_node("", Value::from(json!({ "b": 2 })), Some(&revision))
        .unwrap();
    assert_eq!(record_paths(&store), vec![""]);
    assert_eq!(record(&store, "").content.value, json!({ "b": 2.0 }));
}

#[test]
fn test_missing_value_has_no_revision() {
    let mut store = setup_store_with("a", json!({ "x": 1 }));
    let revision = record(&store, "a").content.revision.clone();

    let err = store
        .set_node("a/missing", Value::from(1), Some(&revision))
        .unwrap_err();
    assert!(matches!(
        &err,
        Error::Node(NodeError::RevisionConflict { actual, .. }) if actual.is_empty()
    ));
    assert_eq!(record(&store, "a").content.value, json!({ "x": 1.0 }));
}

#[test]
fn test_asserted_write_below_inline_value() {
    let mut store = setup_store_with("a", json!({ "x": {}, "pad": "p" }));
    let revision = store.get_info_by("a/x/y", false).unwrap().revision;

    store
        .set_node("a/x/y", Value::from(1), Some(&revision))
        .unwrap();
    assert_eq!(record_paths(&store), vec!["", "a", "a/x"]);
    assert_eq!(record(&store, "a").content.value, json!({ "pad": "p" }));
    assert_eq!(
        store.export_json("a", false, true).unwrap().value,
        Value::from(json!({ "x": { "y": 1 }, "pad": "p" }))
    );
}
