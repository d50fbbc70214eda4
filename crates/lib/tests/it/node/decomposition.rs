use serde_json::json;
use tessera::node::{NodeSettings, NodeStore, StorageNode, ValueType};
use tessera::path::Key;
use tessera::value::Value;

use crate::helpers::*;

#[test]
fn test_inline_dedicated_boundary() {
    let mut store = setup_store();
    let value = Value::from(json!({ "a": 1, "b": { "c": "short" }, "d": "x".repeat(200) }));
    store.set_node("", value, None).unwrap();

    assert_eq!(record_paths(&store), vec!["", "b", "d"]);

    let root = record(&store, "");
    assert_eq!(root.content.value_type, ValueType::Object);
    assert_eq!(root.content.value, json!({ "a": 1.0 }));

    let b = record(&store, "b");
    assert_eq!(b.content.value, json!({ "c": "short" }));

    let d = record(&store, "d");
    assert_eq!(d.content.value_type, ValueType::String);
    assert_eq!(d.content.value, json!("x".repeat(200)));
}

#[test]
fn test_inline_threshold_is_exclusive() {
    let settings = NodeSettings::default().with_max_inline_value_size(10);
    let value = Value::from(json!({ "fits": "123456789", "too_long": "1234567890" }));
    let records = NodeStore::parse("item", value, settings).unwrap();

    let paths: Vec<&str> = records.iter().map(|record| record.path.path()).collect();
    assert_eq!(paths, vec!["item", "item/too_long"]);
    assert_eq!(records[0].content.value, json!({ "fits": "123456789" }));
}

#[test]
fn test_arrays_are_stored_with_index_keys() {
    let records = NodeStore::parse(
        "list",
        Value::from(json!(["a", { "b": 1 }, long_text("c")])),
        NodeSettings::default(),
    )
    .unwrap();

    let paths: Vec<&str> = records.iter().map(|record| record.path.path()).collect();
    assert_eq!(paths, vec!["list", "list[1]", "list[2]"]);
    assert_eq!(records[0].content.value_type, ValueType::Array);
    assert_eq!(records[0].content.value, json!({ "0": "a" }));
}

#[test]
fn test_typed_values_are_tagged_inline() {
    let mut value = Value::object();
    value.set_child(&Key::from("when"), Value::datetime_millis(1_700_000_000_000).unwrap());
    value.set_child(&Key::from("ref"), Value::reference("users/ewout"));
    value.set_child(&Key::from("bytes"), Value::binary(b"Man ".to_vec()));
    value.set_child(&Key::from("big"), Value::BigInt(12));
    let records = NodeStore::parse("typed", value, NodeSettings::default()).unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].content.value,
        json!({
            "big": { "type": 7, "value": "12" },
            "bytes": { "type": 8, "value": "9jqo^" },
            "ref": { "type": 9, "value": "users/ewout" },
            "when": { "type": 6, "value": 1_700_000_000_000i64 },
        })
    );
}

#[test]
fn test_large_scalars_get_their_own_typed_record() {
    let mut value = Value::object();
    value.set_child(&Key::from("blob"), Value::binary(vec![9u8; 64]));
    value.set_child(&Key::from("link"), Value::reference(long_text("target/")));
    let records = NodeStore::parse("files", value, NodeSettings::default()).unwrap();

    let types: Vec<(&str, ValueType)> = records
        .iter()
        .map(|record| (record.path.path(), record.content.value_type))
        .collect();
    assert_eq!(
        types,
        vec![
            ("files", ValueType::Object),
            ("files/blob", ValueType::Binary),
            ("files/link", ValueType::Reference),
        ]
    );
}

#[test]
fn test_one_revision_per_write() {
    let mut store = setup_store();
    let changes = store.set_node("post", sample_value(), None).unwrap();

    let revisions: Vec<&str> = changes
        .inserted()
        .map(|record| record.content.revision.as_str())
        .collect();
    assert!(revisions.len() > 3);
    assert!(revisions.iter().all(|revision| *revision == revisions[0]));
    assert_eq!(record(&store, "").content.revision, revisions[0]);
}

#[test]
fn test_storage_node_serializes_type_code() {
    let store = setup_store_with("a", json!({ "b": 1 }));
    let content = &record(&store, "a").content;
    let json = serde_json::to_value(content).unwrap();
    assert_eq!(json["type"], json!(1));
    assert_eq!(json["revision_nr"], json!(1));

    let back: StorageNode = serde_json::from_value(json).unwrap();
    assert_eq!(*content, back);
}
