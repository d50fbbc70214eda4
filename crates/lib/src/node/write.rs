//! Write planning: turning a value into record inserts and deletes.

use std::collections::BTreeSet;

use serde_json::{Map, Value as Json};
use tracing::{debug, trace, warn};

use crate::Result;
use crate::diff::{CompareResult, compare_values};
use crate::path::{Key, PathInfo};
use crate::value::Value;

use super::{NodeChange, NodeChanges, NodeError, NodeStore, Record, StorageNode, ValueType, WriteOptions, codec};

/// Revision and time shared by every record of one top-level write.
struct WriteContext {
    revision: String,
    now: u64,
}

impl NodeStore {
    /// Writes `value` as the record at `path` and applies the result.
    ///
    /// Returns the applied record operations; an empty batch means the value
    /// was unchanged.
    pub fn write_node(
        &mut self,
        path: impl AsRef<str>,
        value: Value,
        options: WriteOptions,
    ) -> Result<NodeChanges> {
        let changes = self.plan_write(path, value, options)?;
        self.apply(&changes);
        Ok(changes)
    }

    /// Plans a [`write_node`](Self::write_node) without applying it.
    ///
    /// The value at `path` is validated: a value that fits inline can only
    /// be written at the root, the root must be an object, and merges need
    /// an object or array. Dedicated children are written recursively with
    /// the same revision, skipping children the diff reports as unchanged.
    pub fn plan_write(
        &self,
        path: impl AsRef<str>,
        value: Value,
        options: WriteOptions,
    ) -> Result<NodeChanges> {
        let now = self.clock.now_millis();
        let ctx = WriteContext {
            revision: options
                .revision
                .unwrap_or_else(|| self.new_revision(now)),
            now,
        };
        let mut changes = NodeChanges::default();
        self.plan_node(
            &ctx,
            &PathInfo::get(path),
            value,
            options.merge,
            options.current_value,
            options.diff,
            &mut changes,
        )?;
        Ok(changes)
    }

    #[allow(clippy::too_many_arguments)]
    fn plan_node(
        &self,
        ctx: &WriteContext,
        path: &PathInfo,
        value: Value,
        merge: bool,
        current_value: Option<Value>,
        diff: Option<CompareResult>,
        out: &mut NodeChanges,
    ) -> std::result::Result<(), NodeError> {
        self.validate(path, &value, merge)?;

        let current_value = match current_value {
            None if merge && self.is_path_exists_at(path) => Some(self.export_at(path, false, true)?.value),
            other => other,
        };
        let diff = match (diff, &current_value) {
            (None, Some(current)) => Some(match compare_values(current, &value, false) {
                CompareResult::Differences(mut differences) if merge => {
                    // a merge only removes what it explicitly sets to null
                    differences
                        .removed
                        .retain(|key| value.child(key).is_some_and(Value::is_null));
                    differences.into_result()
                }
                other => other,
            }),
            (diff, _) => diff,
        };
        if matches!(diff, Some(CompareResult::Identical)) {
            debug!(path = %path, "Value unchanged, skipping write");
            return Ok(());
        }

        let current_row = self.records.get(path.path());
        // an implicit container takes its type from the exported value
        let current_type = current_row.map(|row| row.content.value_type).or(match &current_value {
            Some(current @ (Value::Object(_) | Value::Array(_))) if merge => Some(ValueType::of(current)),
            _ => None,
        });
        if merge && let Some(current_type) = current_type {
            self.check_merge_types(path, current_type, &value)?;
        }

        let (value_type, scalar) = match &value {
            Value::Array(_) => (ValueType::Array, None),
            Value::Object(_) if merge && current_type == Some(ValueType::Array) => (ValueType::Array, None),
            Value::Object(_) => (ValueType::Object, None),
            other => {
                let (value_type, payload) = codec::encode_record(path, other)?;
                (value_type, Some(payload))
            }
        };
        let is_array = value_type == ValueType::Array;

        let mut main = Map::new();
        if merge
            && let Some(row) = current_row
            && row.content.value_type.is_composite()
            && let Some(existing) = row.content.value.as_object()
        {
            main = existing.clone();
        }

        let mut assigned = BTreeSet::new();
        let mut removed = BTreeSet::new();
        let mut child_values = Vec::new();
        if scalar.is_none() {
            for (key, child) in properties(value, is_array) {
                let prop = key.to_property();
                main.remove(&prop);
                let child_path = path.property(&key)?;
                match child {
                    Value::Null => {
                        removed.insert(key);
                        continue;
                    }
                    Value::Undefined if self.settings.remove_void_properties => continue,
                    Value::Undefined => {
                        return Err(NodeError::VoidValue {
                            path: child_path.to_string(),
                        });
                    }
                    _ => {}
                }
                assigned.insert(key.clone());
                if self.value_fits_inline(&child) {
                    main.insert(prop, codec::encode_inline(&child_path, &child)?);
                } else {
                    child_values.push((key, child_path, child));
                }
            }
        }
        let inline_keys: BTreeSet<Key> = main
            .keys()
            .map(|name| Key::from_property(name, is_array))
            .collect();
        let payload = scalar.unwrap_or(Json::Object(main));

        let Some(row) = current_row else {
            debug!(path = %path, children = child_values.len(), "Writing new record");
            // records left below a path without a record of its own
            let written: BTreeSet<&Key> = child_values.iter().map(|(key, _, _)| key).collect();
            for key in self.descendant_keys(path) {
                let stale = if merge {
                    removed.contains(&key) || inline_keys.contains(&key)
                } else {
                    !written.contains(&key)
                };
                if stale {
                    out.push(NodeChange::Delete {
                        path: path.property(&key)?,
                        subtree: true,
                    });
                }
            }
            for (_, child_path, child) in child_values {
                self.plan_node(ctx, &child_path, child, false, Some(Value::Null), None, out)?;
            }
            out.push(NodeChange::Insert(Record {
                path: path.clone(),
                content: StorageNode {
                    value_type,
                    value: payload,
                    revision: ctx.revision.clone(),
                    revision_nr: 1,
                    created: ctx.now,
                    modified: ctx.now,
                },
            }));
            return Ok(());
        };

        if row.content.value_type.is_composite() || value_type.is_composite() {
            let dedicated = self.descendant_keys(path);
            let mut current_keys = dedicated.clone();
            if row.content.value_type.is_composite()
                && let Some(existing) = row.content.value.as_object()
            {
                let current_is_array = row.content.value_type == ValueType::Array;
                current_keys.extend(
                    existing
                        .keys()
                        .map(|name| Key::from_property(name, current_is_array)),
                );
            }
            let deleted: BTreeSet<Key> = if merge {
                removed
            } else {
                current_keys.difference(&assigned).cloned().collect()
            };

            if is_array && merge {
                let inserted = assigned.difference(&current_keys).next().is_some();
                if inserted || !deleted.is_empty() {
                    let remaining: BTreeSet<&Key> = current_keys
                        .iter()
                        .chain(assigned.iter())
                        .filter(|key| !deleted.contains(key))
                        .collect();
                    let exhaustive = remaining
                        .iter()
                        .enumerate()
                        .all(|(index, key)| **key == Key::Index(index));
                    if !exhaustive {
                        warn!(path = %path, "Rejected array merge that leaves gaps or shifts indices");
                        return Err(NodeError::TypeConflict {
                            path: path.to_string(),
                            reason: "elements cannot be inserted beyond, or removed before the end of an array; rewrite the whole array or use an object collection".to_string(),
                        });
                    }
                }
            }

            let child_diffs = diff.as_ref().and_then(CompareResult::as_differences);
            for (key, child_path, child) in child_values {
                let child_diff = child_diffs.map(|differences| differences.for_child(&key).clone());
                if matches!(child_diff, Some(CompareResult::Identical)) {
                    trace!(path = %child_path, "Child unchanged, skipping");
                    continue;
                }
                let current_child = current_value
                    .as_ref()
                    .map(|current| current.child(&key).cloned().unwrap_or(Value::Null));
                self.plan_node(ctx, &child_path, child, false, current_child, child_diff, out)?;
            }

            let moved_inline = dedicated.iter().filter(|key| inline_keys.contains(key));
            for key in deleted.iter().chain(moved_inline) {
                let child_path = path.property(key)?;
                if self.records_within(&child_path).next().is_some() {
                    debug!(path = %child_path, "Deleting dedicated child records");
                    out.push(NodeChange::Delete {
                        path: child_path,
                        subtree: true,
                    });
                }
            }
        }

        let revision_nr = row.content.revision_nr.saturating_add(1);
        debug!(path = %path, revision_nr, "Overwriting record");
        out.push(NodeChange::Insert(Record {
            path: path.clone(),
            content: StorageNode {
                value_type,
                value: payload,
                revision: ctx.revision.clone(),
                revision_nr,
                created: row.content.created,
                modified: ctx.now,
            },
        }));
        Ok(())
    }

    fn validate(&self, path: &PathInfo, value: &Value, merge: bool) -> std::result::Result<(), NodeError> {
        let invalid = |reason: &str| NodeError::InvalidNodeValue {
            path: path.to_string(),
            reason: reason.to_string(),
        };
        match value {
            Value::Null => Err(NodeError::NullValue {
                path: path.to_string(),
            }),
            Value::Undefined => Err(NodeError::VoidValue {
                path: path.to_string(),
            }),
            Value::Object(_) | Value::Array(_) if merge => Ok(()),
            _ if merge => Err(invalid("only objects and arrays can be merged")),
            Value::Object(_) if path.is_root() => Ok(()),
            _ if path.is_root() => Err(invalid("root value must be an object")),
            _ if self.value_fits_inline(value) => {
                Err(invalid("value fits inline and cannot be stored in its own record"))
            }
            _ => Ok(()),
        }
    }

    fn check_merge_types(
        &self,
        path: &PathInfo,
        current_type: ValueType,
        value: &Value,
    ) -> std::result::Result<(), NodeError> {
        let conflict = |reason: &str| NodeError::TypeConflict {
            path: path.to_string(),
            reason: reason.to_string(),
        };
        match value {
            Value::Object(map)
                if current_type == ValueType::Array
                    && map.keys().any(|name| Key::from_property(name, true).as_index().is_none()) =>
            {
                warn!(path = %path, "Rejected merge of an object into an array");
                Err(conflict("cannot merge existing array with an object"))
            }
            Value::Array(_) if current_type != ValueType::Array => {
                warn!(path = %path, "Rejected merge of an array into an object");
                Err(conflict("cannot merge existing object with an array"))
            }
            _ => Ok(()),
        }
    }
}

/// Own properties of an object or array. Array holes are skipped.
fn properties(value: Value, as_index: bool) -> Vec<(Key, Value)> {
    match value {
        Value::Object(map) => map
            .into_iter()
            .map(|(name, child)| (Key::from_property(&name, as_index), child))
            .collect(),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter(|(_, child)| !child.is_undefined())
            .map(|(index, child)| (Key::Index(index), child))
            .collect(),
        _ => Vec::new(),
    }
}
