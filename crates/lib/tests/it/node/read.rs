use serde_json::json;
use tessera::node::ValueType;
use tessera::path::Key;
use tessera::value::Value;

use crate::helpers::*;

#[test]
fn test_info_of_inline_value() {
    let store = setup_store_with("users/ewout", json!({ "name": "Ewout", "age": 40 }));
    let info = store.get_info_by("users/ewout/name", false).unwrap();

    assert!(info.exists);
    assert_eq!(info.key.as_deref(), Some("name"));
    assert_eq!(info.value_type, ValueType::String);
    assert_eq!(info.value, Value::from("Ewout"));
    assert_eq!(info.address.as_ref().map(|path| path.path()), Some("users/ewout"));
    assert!(!info.is_dedicated());
    assert_eq!(info.revision, record(&store, "users/ewout").content.revision);
}

#[test]
fn test_info_of_dedicated_value() {
    let store = setup_store_with("users/ewout", json!({ "name": "Ewout", "bio": long_text("bio") }));
    let info = store.get_info_by("users/ewout", true).unwrap();

    assert!(info.exists);
    assert!(info.is_dedicated());
    assert_eq!(info.value_type, ValueType::Object);
    assert_eq!(info.value, Value::from(json!({ "name": "Ewout" })));
    assert_eq!(info.child_count, Some(2));
}

#[test]
fn test_info_of_array_element() {
    let store = setup_store_with("list", json!(["a", { "b": 1 }]));
    let info = store.get_info_by("list[0]", false).unwrap();
    assert_eq!(info.index, Some(0));
    assert_eq!(info.key, None);
    assert_eq!(info.value, Value::from("a"));

    let info = store.get_info_by("list", true).unwrap();
    assert_eq!(info.value_type, ValueType::Array);
    assert_eq!(info.child_count, Some(2));
}

#[test]
fn test_info_of_missing_value() {
    let store = setup_store_with("a", json!({ "b": 1 }));
    for path in ["a/c", "a/b/c", "x/y"] {
        let info = store.get_info_by(path, true).unwrap();
        assert!(!info.exists, "{path} should not exist");
        assert_eq!(info.value, Value::Null);
        assert_eq!(info.value_type, ValueType::Empty);
        assert_eq!(info.address, None);
    }
}

#[test]
fn test_lookup_helpers() {
    let store = setup_store_with(
        "chats",
        json!({ "general": { "topic": "x" }, "random": { "topic": "y" }, "count": 2 }),
    );

    assert_eq!(
        store.get_keys_by("chats"),
        vec![Key::from("general"), Key::from("random")]
    );
    assert_eq!(store.get_nodes_by("chats").len(), 3);
    assert_eq!(store.get_node_parent_by("chats/count").unwrap().path.path(), "chats");
    assert_eq!(
        store.get_node_parent_by("chats/general/topic").unwrap().path.path(),
        "chats/general"
    );
    assert!(store.is_path_exists("chats/general/anything"));
    assert!(store.is_path_exists("chats"));
}

#[test]
fn test_export_only_children() {
    let store = setup_store_with(
        "forum",
        json!({ "name": "f", "threads": { "t1": { "title": "a" } }, "tags": ["x"] }),
    );
    let exported = store.export_json("forum", true, true).unwrap();
    assert_eq!(
        exported.value,
        Value::from(json!({ "name": "f", "threads": {}, "tags": [] }))
    );

    let shallow = store.export_json("forum", false, false).unwrap();
    assert_eq!(shallow.value, Value::from(json!({ "name": "f" })));
}

#[test]
fn test_export_metadata() {
    let store = setup_store_with("forum", json!({ "threads": { "t1": { "title": "a" } } }));
    let exported = store.export_json("forum/threads", false, true).unwrap();
    let threads = record(&store, "forum/threads");

    assert_eq!(exported.value_type, ValueType::Object);
    assert_eq!(exported.revision, threads.content.revision);
    assert_eq!(exported.created, threads.content.created);
    assert_eq!(exported.value, Value::from(json!({ "t1": { "title": "a" } })));
}

#[test]
fn test_implicit_container_metadata_matches_export() {
    let mut store = setup_store_with("x", json!({ "a": { "k": 1 }, "b": { "k": 2 } }));
    store.delete_node("x", true);
    store.set_node("x/a/k", Value::from(3), None).unwrap();

    let info = store.get_info_by("x", false).unwrap();
    let exported = store.export_json("x", false, true).unwrap();
    let source = record(&store, "x/a");
    assert_eq!(info.address, None);
    assert_eq!(info.revision, source.content.revision);
    assert_eq!(info.revision_nr, 2);
    assert_ne!(info.revision, record(&store, "").content.revision);
    assert_eq!(exported.revision, info.revision);
    assert_eq!(exported.created, info.created);
    assert_eq!(exported.modified, info.modified);
    assert_eq!(exported.value, Value::from(json!({ "a": { "k": 3 }, "b": { "k": 2 } })));
}
