//! Reassembly of values from their records.

use std::sync::Arc;

use tracing::trace;

use crate::Result;
use crate::clock::SystemClock;
use crate::path::{Key, PathInfo};
use crate::value::Value;

use super::{ExportedNode, NodeError, NodeSettings, NodeStore, Record, ValueType, WriteOptions, codec};

impl NodeStore {
    /// Reconstructs the value at `path` from its records.
    ///
    /// With `include_children_dedicated` unset only the inline children of
    /// the target record are returned. With `only_children`, dedicated
    /// children that are objects or arrays are returned as empty containers.
    /// A value stored inline in an ancestor is exported as it is stored
    /// there; a missing path exports as `Null`.
    pub fn export_json(
        &self,
        path: impl AsRef<str>,
        only_children: bool,
        include_children_dedicated: bool,
    ) -> Result<ExportedNode> {
        Ok(self.export_at(
            &PathInfo::get(path),
            only_children,
            include_children_dedicated,
        )?)
    }

    pub(crate) fn export_at(
        &self,
        path: &PathInfo,
        only_children: bool,
        include_dedicated: bool,
    ) -> std::result::Result<ExportedNode, NodeError> {
        let mut records: Vec<&Record> = self.records_within(path).collect();
        records.sort_by(|a, b| {
            a.path
                .len()
                .cmp(&b.path.len())
                .then_with(|| a.path.keys().cmp(b.path.keys()))
        });

        let mut exported = match records.first() {
            Some(record) if record.path.path() == path.path() => exported_record(record)?,
            // an implicit container or a value held by an ancestor
            _ => {
                let info = self.info_at(path, false)?;
                let exported = ExportedNode {
                    path: info.path,
                    value_type: info.value_type,
                    value: info.value,
                    revision: info.revision,
                    revision_nr: info.revision_nr,
                    created: info.created,
                    modified: info.modified,
                };
                if records.is_empty() {
                    return Ok(exported);
                }
                exported
            }
        };
        if !include_dedicated || !exported.value_type.is_composite() {
            return Ok(exported);
        }

        for record in records
            .iter()
            .filter(|record| record.path.path() != path.path())
        {
            let keys = record.path.keys_below(path);
            trace!(path = %record.path, "Attaching dedicated record");
            if only_children {
                match keys {
                    [_] => {
                        let value = match record.content.value_type {
                            ValueType::Object | ValueType::Array => record.content.value_type.default_value(),
                            _ => codec::decode_record(record)?,
                        };
                        attach(&mut exported.value, keys, value);
                    }
                    [first, next, ..] => {
                        if exported.value.child(first).is_none_or(|child| !child.is_composite()) {
                            exported.value.set_child(first, container_for(next));
                        }
                    }
                    [] => {}
                }
                continue;
            }
            attach(&mut exported.value, keys, codec::decode_record(record)?);
        }
        Ok(exported)
    }

    /// Reconstructs the value of a set of records, rooted at the shallowest
    /// record.
    pub fn to_json(
        records: impl IntoIterator<Item = Record>,
        only_children: bool,
        settings: NodeSettings,
    ) -> Result<ExportedNode> {
        let mut store = Self::detached(settings, Arc::new(SystemClock));
        store.push(records);
        let Some(top) = store
            .records()
            .min_by_key(|record| record.path.len())
            .map(|record| record.path.clone())
        else {
            return Err(NodeError::InvalidRecord {
                path: String::new(),
                reason: "no records to convert".to_string(),
            }
            .into());
        };
        Ok(store.export_at(&top, only_children, true)?)
    }

    /// Decomposes `value` into the records it would be stored as at `path`,
    /// without any existing records.
    pub fn parse(path: impl AsRef<str>, value: Value, settings: NodeSettings) -> Result<Vec<Record>> {
        let mut store = Self::detached(settings, Arc::new(SystemClock));
        store.write_node(path, value, WriteOptions::default().with_current_value(Value::Null))?;
        Ok(store.into_records())
    }
}

fn exported_record(record: &Record) -> std::result::Result<ExportedNode, NodeError> {
    Ok(ExportedNode {
        path: record.path.clone(),
        value_type: record.content.value_type,
        value: codec::decode_record(record)?,
        revision: record.content.revision.clone(),
        revision_nr: record.content.revision_nr,
        created: record.content.created,
        modified: record.content.modified,
    })
}

fn container_for(next: &Key) -> Value {
    if next.is_index() {
        Value::array()
    } else {
        Value::object()
    }
}

/// Places `value` at `keys` below `target`, creating missing containers.
fn attach(target: &mut Value, keys: &[Key], value: Value) {
    let Some((last, parents)) = keys.split_last() else {
        return;
    };
    let mut current = target;
    for (depth, key) in parents.iter().enumerate() {
        if current.child(key).is_none_or(|child| !child.is_composite()) {
            current.set_child(key, container_for(&keys[depth + 1]));
        }
        current = match current.child_mut(key) {
            Some(child) => child,
            None => return,
        };
    }

    if let Some(existing) = current.child_mut(last)
        && existing.is_composite()
        && ValueType::of(existing) == ValueType::of(&value)
    {
        for (key, child) in value.child_keys().into_iter().zip(into_children(value)) {
            existing.set_child(&key, child);
        }
        return;
    }
    current.set_child(last, value);
}

/// Non-void children of an object or array, in [`Value::child_keys`] order.
fn into_children(value: Value) -> Vec<Value> {
    match value {
        Value::Object(map) => map.into_values().filter(|child| !child.is_void()).collect(),
        Value::Array(items) => items.into_iter().filter(|child| !child.is_void()).collect(),
        _ => Vec::new(),
    }
}
