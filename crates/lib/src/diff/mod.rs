//! Structural comparison of value trees.
//!
//! [`compare_values`] classifies the difference between two values as a
//! scalar verdict or, for objects and arrays, a keyed [`ObjectDifferences`]
//! that recurses into changed children. [`get_mutations`] flattens such a
//! result into the leaf-level [`Mutation`]s that change subscribers consume.
//!
//! ```
//! use serde_json::json;
//! use tessera::diff::{CompareResult, compare_values, get_mutations};
//! use tessera::value::Value;
//!
//! let old = Value::from(json!({ "name": "a", "age": 1 }));
//! let new = Value::from(json!({ "name": "b", "age": 1, "tag": "x" }));
//!
//! let CompareResult::Differences(diff) = compare_values(&old, &new, false) else {
//!     panic!("expected differences");
//! };
//! assert_eq!(diff.added, vec!["tag".into()]);
//! assert_eq!(get_mutations(&old, &new, false).len(), 2);
//! ```

use crate::path::Key;
use crate::value::Value;

/// Result of comparing two values.
#[derive(Debug, Clone, PartialEq)]
pub enum CompareResult {
    /// Both values are equal
    Identical,
    /// The old value was void
    Added,
    /// The new value is void
    Removed,
    /// The values differ and cannot be compared key by key
    Changed,
    /// Both values are composites that differ in some keys
    Differences(ObjectDifferences),
}

static IDENTICAL: CompareResult = CompareResult::Identical;
static ADDED: CompareResult = CompareResult::Added;
static REMOVED: CompareResult = CompareResult::Removed;

impl CompareResult {
    /// Returns true if the compared values were equal
    pub fn is_identical(&self) -> bool {
        matches!(self, CompareResult::Identical)
    }

    /// The keyed differences, if both values were composites
    pub fn as_differences(&self) -> Option<&ObjectDifferences> {
        match self {
            CompareResult::Differences(diff) => Some(diff),
            _ => None,
        }
    }
}

/// A changed child key and how it changed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangedKey {
    pub key: Key,
    pub change: CompareResult,
}

/// Keyed differences between two objects or two arrays.
///
/// Array children are keyed by [`Key::Index`], object children by
/// [`Key::Name`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectDifferences {
    pub added: Vec<Key>,
    pub removed: Vec<Key>,
    pub changed: Vec<ChangedKey>,
}

impl ObjectDifferences {
    /// Verdict for a single child key.
    pub fn for_child(&self, key: &Key) -> &CompareResult {
        if self.added.contains(key) {
            return &ADDED;
        }
        if self.removed.contains(key) {
            return &REMOVED;
        }
        self.changed
            .iter()
            .find(|changed| &changed.key == key)
            .map(|changed| &changed.change)
            .unwrap_or(&IDENTICAL)
    }

    /// Returns true if no key was added, removed or changed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Collapses an empty diff into [`CompareResult::Identical`].
    pub fn into_result(self) -> CompareResult {
        if self.is_empty() {
            CompareResult::Identical
        } else {
            CompareResult::Differences(self)
        }
    }
}

/// Compares two values.
///
/// Void values (`Null` and `Undefined`) are interchangeable. Values of
/// different kinds are `Changed`; objects and arrays are compared key by key
/// over their non-void children. An array compared with a non-empty object
/// whose property names are all indices is compared by index, the way array
/// records receive merges. With `sorted`, changed keys are ordered by key at
/// every level.
pub fn compare_values(old: &Value, new: &Value, sorted: bool) -> CompareResult {
    match (old.is_void(), new.is_void()) {
        (true, true) => return CompareResult::Identical,
        (true, false) => return CompareResult::Added,
        (false, true) => return CompareResult::Removed,
        (false, false) => {}
    }
    match (old, new) {
        (Value::Bool(a), Value::Bool(b)) => verdict(a == b),
        (Value::Number(a), Value::Number(b)) => verdict(a == b),
        (Value::BigInt(a), Value::BigInt(b)) => verdict(a == b),
        (Value::String(a), Value::String(b)) => verdict(a == b),
        (Value::Binary(a), Value::Binary(b)) => {
            verdict(a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y))
        }
        (Value::DateTime(a), Value::DateTime(b)) => {
            verdict(a.timestamp_millis() == b.timestamp_millis())
        }
        (Value::Reference(a), Value::Reference(b)) => verdict(a.path() == b.path()),
        (Value::Object(_), Value::Object(_)) | (Value::Array(_), Value::Array(_)) => {
            compare_children(old, new, false, sorted)
        }
        (Value::Array(_), Value::Object(map))
            if !map.is_empty() && map.keys().all(|name| Key::from_property(name, true).is_index()) =>
        {
            compare_children(old, new, true, sorted)
        }
        _ => CompareResult::Changed,
    }
}

fn verdict(equal: bool) -> CompareResult {
    if equal {
        CompareResult::Identical
    } else {
        CompareResult::Changed
    }
}

fn compare_children(old: &Value, new: &Value, as_index: bool, sorted: bool) -> CompareResult {
    let old_keys = old.child_keys();
    let mut new_keys = new.child_keys();
    if as_index {
        new_keys = new_keys
            .iter()
            .map(|key| Key::from_property(&key.to_property(), true))
            .collect();
    }

    let removed: Vec<Key> = old_keys
        .iter()
        .filter(|key| !new_keys.contains(key))
        .cloned()
        .collect();
    let mut added = Vec::new();
    let mut changed = Vec::new();
    for key in new_keys {
        if !old_keys.contains(&key) {
            added.push(key);
            continue;
        }
        let (Some(a), Some(b)) = (old.child(&key), new.child(&key)) else {
            continue;
        };
        let change = compare_values(a, b, sorted);
        if !change.is_identical() {
            changed.push(ChangedKey { key, change });
        }
    }
    if sorted {
        changed.sort_by(|a, b| a.key.cmp(&b.key));
    }

    ObjectDifferences {
        added,
        removed,
        changed,
    }
    .into_result()
}

/// One leaf-level change between two value trees.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    /// Keys from the compared root to the changed value
    pub target: Vec<Key>,
    /// Previous value, `Null` for additions
    pub prev: Value,
    /// New value, `Null` for removals
    pub val: Value,
}

impl Mutation {
    /// Applies this mutation to `value`.
    ///
    /// A void `val` removes the target. Returns false if the parent of the
    /// target does not exist in `value` or cannot hold the target key.
    pub fn apply_to(&self, value: &mut Value) -> bool {
        let Some((last, parents)) = self.target.split_last() else {
            *value = self.val.clone();
            return true;
        };
        let mut current = value;
        for key in parents {
            match current.child_mut(key) {
                Some(child) => current = child,
                None => return false,
            }
        }
        if self.val.is_void() {
            current.remove_child(last);
            true
        } else {
            current.set_child(last, self.val.clone())
        }
    }
}

/// Flattens the comparison of `old` and `new` into leaf mutations, in
/// added, removed, changed order at every level.
pub fn get_mutations(old: &Value, new: &Value, sorted: bool) -> Vec<Mutation> {
    let result = compare_values(old, new, sorted);
    let mut mutations = Vec::new();
    collect_mutations(&mut mutations, Vec::new(), &result, old, new);
    mutations
}

fn collect_mutations(
    out: &mut Vec<Mutation>,
    target: Vec<Key>,
    result: &CompareResult,
    prev: &Value,
    val: &Value,
) {
    match result {
        CompareResult::Identical => {}
        CompareResult::Changed => out.push(Mutation {
            target,
            prev: prev.clone(),
            val: val.clone(),
        }),
        CompareResult::Added => out.push(Mutation {
            target,
            prev: Value::Null,
            val: val.clone(),
        }),
        CompareResult::Removed => out.push(Mutation {
            target,
            prev: prev.clone(),
            val: Value::Null,
        }),
        CompareResult::Differences(diff) => {
            for key in &diff.added {
                out.push(Mutation {
                    target: child_target(&target, key),
                    prev: Value::Null,
                    val: val.child(key).cloned().unwrap_or_default(),
                });
            }
            for key in &diff.removed {
                out.push(Mutation {
                    target: child_target(&target, key),
                    prev: prev.child(key).cloned().unwrap_or_default(),
                    val: Value::Null,
                });
            }
            for changed in &diff.changed {
                let prev_child = prev.child(&changed.key).unwrap_or(&Value::Null);
                let val_child = val.child(&changed.key).unwrap_or(&Value::Null);
                collect_mutations(
                    out,
                    child_target(&target, &changed.key),
                    &changed.change,
                    prev_child,
                    val_child,
                );
            }
        }
    }
}

fn child_target(target: &[Key], key: &Key) -> Vec<Key> {
    let mut child = target.to_vec();
    child.push(key.clone());
    child
}
