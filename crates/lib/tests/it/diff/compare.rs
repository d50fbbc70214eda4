use serde_json::json;
use tessera::diff::{CompareResult, compare_values};
use tessera::path::Key;
use tessera::value::Value;

use crate::helpers::sample_value;

#[test]
fn test_compare_with_self_is_identical() {
    let values = [
        sample_value(),
        Value::from(json!([1, "two", { "three": [3] }])),
        Value::from("text"),
        Value::binary(vec![0u8, 255, 7]),
        Value::BigInt(-5),
    ];
    for value in &values {
        assert_eq!(compare_values(value, value, false), CompareResult::Identical);
        assert_eq!(compare_values(value, &value.clone(), true), CompareResult::Identical);
    }
}

#[test]
fn test_void_sides() {
    let value = Value::from(json!({ "a": 1 }));
    assert_eq!(compare_values(&Value::Null, &value, false), CompareResult::Added);
    assert_eq!(compare_values(&value, &Value::Null, false), CompareResult::Removed);
    assert_eq!(compare_values(&Value::Undefined, &value, false), CompareResult::Added);
    assert_eq!(compare_values(&Value::Null, &Value::Undefined, false), CompareResult::Identical);
}

#[test]
fn test_kind_changes() {
    let cases = [
        (Value::from(1), Value::from("1")),
        (Value::from(json!({})), Value::from(json!([]))),
        (Value::from(json!({ "0": "a" })), Value::from(json!(["a"]))),
        (Value::binary(vec![1u8, 2]), Value::binary(vec![1u8, 3])),
        (Value::binary(vec![1u8, 2]), Value::binary(vec![1u8, 2, 3])),
        (Value::reference("a/b"), Value::reference("a/c")),
        (
            Value::datetime_millis(1_000).unwrap(),
            Value::datetime_millis(1_001).unwrap(),
        ),
    ];
    for (old, new) in &cases {
        assert_eq!(compare_values(old, new, false), CompareResult::Changed, "{old:?} -> {new:?}");
    }
}

#[test]
fn test_references_compare_by_normalized_path() {
    assert!(compare_values(&Value::reference("/a/b/"), &Value::reference("a/b"), false).is_identical());
}

#[test]
fn test_nested_differences() {
    let old = Value::from(json!({ "user": { "name": "a", "age": 1 }, "gone": true, "same": [1] }));
    let new = Value::from(json!({ "user": { "name": "b", "age": 1 }, "fresh": 0, "same": [1] }));

    let result = compare_values(&old, &new, false);
    let diff = result.as_differences().expect("object differences");
    assert_eq!(diff.added, vec![Key::from("fresh")]);
    assert_eq!(diff.removed, vec![Key::from("gone")]);
    assert_eq!(diff.changed.len(), 1);
    assert!(diff.for_child(&Key::from("same")).is_identical());
    assert_eq!(diff.for_child(&Key::from("fresh")), &CompareResult::Added);
    assert_eq!(diff.for_child(&Key::from("gone")), &CompareResult::Removed);

    let user = diff.for_child(&Key::from("user")).as_differences().expect("nested differences");
    assert_eq!(user.changed[0].key, Key::from("name"));
    assert_eq!(user.changed[0].change, CompareResult::Changed);
}

#[test]
fn test_array_children_keyed_by_index() {
    let old = Value::from(json!(["a", "b"]));
    let new = Value::from(json!(["a", "c", "d"]));
    let result = compare_values(&old, &new, false);
    let diff = result.as_differences().expect("array differences");
    assert_eq!(diff.added, vec![Key::Index(2)]);
    assert_eq!(diff.changed[0].key, Key::Index(1));
}

#[test]
fn test_sorted_orders_changed_keys() {
    let old = Value::from(json!({ "b": 1, "a": { "y": 1, "x": 1 } }));
    let new = Value::from(json!({ "b": 2, "a": { "y": 2, "x": 2 } }));
    let result = compare_values(&old, &new, true);
    let diff = result.as_differences().unwrap();
    let keys: Vec<&Key> = diff.changed.iter().map(|changed| &changed.key).collect();
    assert_eq!(keys, vec![&Key::from("a"), &Key::from("b")]);

    let nested = diff.changed[0].change.as_differences().unwrap();
    let keys: Vec<&Key> = nested.changed.iter().map(|changed| &changed.key).collect();
    assert_eq!(keys, vec![&Key::from("x"), &Key::from("y")]);
}

#[test]
fn test_array_compared_with_index_keyed_object() {
    let old = Value::from(json!(["a", { "b": 1 }]));
    let same = Value::from(json!({ "0": "a", "1": { "b": 1 } }));
    assert!(compare_values(&old, &same, false).is_identical());

    let changed = Value::from(json!({ "1": { "b": 2 } }));
    let result = compare_values(&old, &changed, false);
    let diff = result.as_differences().expect("index differences");
    assert_eq!(diff.removed, vec![Key::Index(0)]);
    assert!(diff.for_child(&Key::Index(1)).as_differences().is_some());
}
