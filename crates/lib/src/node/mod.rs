//! Decomposition of value trees into typed records.
//!
//! A [`NodeStore`] holds the records of one value tree. Every object or array
//! with children, and every string, reference or binary value too large to
//! inline, lives in its own [`Record`]; smaller values are embedded in the
//! record of their nearest stored ancestor. A value is never stored both
//! ways.
//!
//! Writes are planned against the current records as an ordered batch of
//! [`NodeChange`]s and then applied, so a backend can persist exactly the
//! batch a write produced.
//!
//! ```
//! use serde_json::json;
//! use tessera::node::{NodeSettings, NodeStore};
//! use tessera::value::Value;
//!
//! let mut store = NodeStore::new([], NodeSettings::default())?;
//! store.set_node("users/ewout", Value::from(json!({ "name": "Ewout", "bio": "x".repeat(80) })), None)?;
//!
//! let info = store.get_info_by("users/ewout/name", false)?;
//! assert!(info.exists);
//! assert_eq!(info.value, Value::from("Ewout"));
//! assert!(store.get_info_by("users/ewout/bio", false)?.is_dedicated());
//! # Ok::<(), tessera::Error>(())
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, warn};
use uuid::{NoContext, Timestamp, Uuid};

use crate::Result;
use crate::clock::{Clock, SystemClock};
use crate::path::{Key, PathInfo};
use crate::value::Value;

pub mod codec;
mod errors;
mod export;
mod types;
mod write;

pub use errors::NodeError;
pub use types::{
    ExportedNode, NodeChange, NodeChanges, NodeInfo, NodeSettings, Record, StorageNode, ValueType,
    WriteOptions,
};

/// The records of one decomposed value tree.
///
/// The store is synchronous and performs no I/O. Callers serialize writes to
/// a subtree and persist the [`NodeChanges`] each write returns.
#[derive(Debug, Clone)]
pub struct NodeStore {
    records: BTreeMap<String, Record>,
    settings: NodeSettings,
    clock: Arc<dyn Clock>,
}

impl NodeStore {
    /// Creates a store over existing records using the system clock.
    ///
    /// An empty root object record is written if there are no records.
    pub fn new(records: impl IntoIterator<Item = Record>, settings: NodeSettings) -> Result<Self> {
        Self::with_clock(records, settings, Arc::new(SystemClock))
    }

    /// Creates a store over existing records with a custom clock for record
    /// timestamps and revision ids.
    pub fn with_clock(
        records: impl IntoIterator<Item = Record>,
        settings: NodeSettings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let mut store = Self::detached(settings, clock);
        store.push(records);
        if !store.is_path_exists("") {
            debug!("No records, writing empty root record");
            store.write_node("", Value::object(), WriteOptions::default())?;
        }
        Ok(store)
    }

    /// A store without the root record.
    pub(crate) fn detached(settings: NodeSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: BTreeMap::new(),
            settings,
            clock,
        }
    }

    pub fn settings(&self) -> &NodeSettings {
        &self.settings
    }

    /// All records, ordered by path.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if there are no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The record stored exactly at `path`.
    pub fn get(&self, path: impl AsRef<str>) -> Option<&Record> {
        self.records.get(PathInfo::get(path).path())
    }

    /// Consumes the store, returning its records ordered by path.
    pub fn into_records(self) -> Vec<Record> {
        self.records.into_values().collect()
    }

    /// Adds existing records, replacing records at the same paths.
    pub fn push(&mut self, records: impl IntoIterator<Item = Record>) -> &mut Self {
        for record in records {
            self.records.insert(record.path.path().to_string(), record);
        }
        self
    }

    /// Checks if any record lies on the trail of `path`: at the path itself,
    /// above it or below it.
    pub fn is_path_exists(&self, path: impl AsRef<str>) -> bool {
        self.is_path_exists_at(&PathInfo::get(path))
    }

    pub(crate) fn is_path_exists_at(&self, path: &PathInfo) -> bool {
        self.records
            .values()
            .any(|record| path.is_on_trail_of(&record.path))
    }

    /// Records at `path` and below it.
    pub fn get_nodes_by(&self, path: impl AsRef<str>) -> Vec<&Record> {
        self.records_within(&PathInfo::get(path)).collect()
    }

    pub(crate) fn records_within<'a>(&'a self, path: &PathInfo) -> impl Iterator<Item = &'a Record> {
        self.records.values().filter(move |record| {
            record.path.path() == path.path() || path.is_ancestor_of(&record.path)
        })
    }

    /// The deepest record at `path` or above it: the record that holds the
    /// value of `path`, either as its own value or inline.
    pub fn get_node_parent_by(&self, path: impl AsRef<str>) -> Option<&Record> {
        self.holding_record(&PathInfo::get(path))
    }

    fn holding_record(&self, path: &PathInfo) -> Option<&Record> {
        self.records
            .values()
            .filter(|record| record.path.path() == path.path() || record.path.is_ancestor_of(path))
            .max_by_key(|record| record.path.len())
    }

    /// Keys of the records that are direct children of `path`.
    pub fn get_keys_by(&self, path: impl AsRef<str>) -> Vec<Key> {
        self.child_record_keys(&PathInfo::get(path))
    }

    pub(crate) fn child_record_keys(&self, path: &PathInfo) -> Vec<Key> {
        self.records
            .values()
            .filter(|record| path.is_parent_of(&record.path))
            .filter_map(|record| record.path.key().cloned())
            .collect()
    }

    /// First keys below `path` of every record within it, including records
    /// that are deeper than a direct child.
    pub(crate) fn descendant_keys(&self, path: &PathInfo) -> BTreeSet<Key> {
        self.records_within(path)
            .filter_map(|record| record.path.keys_below(path).first().cloned())
            .collect()
    }

    /// The record an implicit container at `path` takes its type and
    /// metadata from: its shallowest descendant.
    pub(crate) fn implicit_source(&self, path: &PathInfo) -> Option<&Record> {
        self.records
            .values()
            .filter(|record| path.is_ancestor_of(&record.path))
            .min_by_key(|record| record.path.len())
    }

    /// Looks up the value at `path`.
    ///
    /// The value is read from the holding record, so dedicated children of
    /// the value are not included. With `include_child_count`, the number
    /// of inline and dedicated children is counted.
    pub fn get_info_by(&self, path: impl AsRef<str>, include_child_count: bool) -> Result<NodeInfo> {
        Ok(self.info_at(&PathInfo::get(path), include_child_count)?)
    }

    pub(crate) fn info_at(&self, path: &PathInfo, include_child_count: bool) -> std::result::Result<NodeInfo, NodeError> {
        let mut info = NodeInfo::missing(path.clone());
        let holder = self.holding_record(path);
        let mut value = match holder {
            Some(record) => Some(codec::decode_record(record)?),
            None => None,
        };
        if let Some(record) = holder {
            for key in path.keys_below(&record.path) {
                value = value
                    .as_ref()
                    .and_then(|parent| parent.child(key))
                    .filter(|child| !child.is_void())
                    .cloned();
            }
        }

        let source = match (&value, holder) {
            (Some(_), Some(record)) => Some(record),
            _ => self.implicit_source(path),
        };
        let Some(source) = source else {
            return Ok(info);
        };
        info.exists = true;
        info.value_type = match &value {
            Some(value) => ValueType::of(value),
            None => match source.path.keys_below(path).first() {
                Some(Key::Index(_)) => ValueType::Array,
                _ => ValueType::Object,
            },
        };
        let value_type = info.value_type;
        info.address = value.is_some().then(|| source.path.clone());
        info.value = value.unwrap_or_else(|| value_type.default_value());
        info.revision = source.content.revision.clone();
        info.revision_nr = source.content.revision_nr;
        info.created = source.content.created;
        info.modified = source.content.modified;

        if include_child_count {
            let mut keys: BTreeSet<Key> = BTreeSet::new();
            if info.value_type.is_composite() {
                keys.extend(info.value.child_keys());
                keys.extend(self.descendant_keys(path));
            }
            info.child_count = Some(keys.len());
        }
        Ok(info)
    }

    /// Checks if `value` is stored inside its parent record rather than in
    /// its own record.
    ///
    /// Numbers, booleans and dates always fit. Strings, references, binary
    /// values and big integers fit when their encoded length is below
    /// [`NodeSettings::max_inline_value_size`]. Objects and arrays fit only
    /// when empty.
    pub fn value_fits_inline(&self, value: &Value) -> bool {
        let max = self.settings.max_inline_value_size;
        match value {
            Value::Number(_) | Value::Bool(_) | Value::DateTime(_) => true,
            Value::String(s) => s.len() < max,
            Value::Reference(reference) => reference.path().len() < max,
            Value::Binary(bytes) => bytes.len() < max,
            Value::BigInt(n) => n.to_string().len() < max,
            Value::Object(_) | Value::Array(_) => value.is_empty_composite(),
            Value::Null | Value::Undefined => false,
        }
    }

    /// Applies a planned batch of record operations.
    pub fn apply(&mut self, changes: &NodeChanges) {
        for change in changes.iter() {
            match change {
                NodeChange::Insert(record) => {
                    self.records
                        .insert(record.path.path().to_string(), record.clone());
                }
                NodeChange::Delete {
                    path,
                    subtree: false,
                } => {
                    self.records.remove(path.path());
                }
                NodeChange::Delete {
                    path,
                    subtree: true,
                } => {
                    self.records.retain(|_, record| {
                        record.path.path() != path.path() && !path.is_ancestor_of(&record.path)
                    });
                }
            }
        }
    }

    /// Deletes the record at `path`, and unless `specific_node` is set,
    /// every record below it.
    pub fn delete_node(&mut self, path: impl AsRef<str>, specific_node: bool) -> NodeChanges {
        let path = PathInfo::get(path);
        let mut changes = NodeChanges::default();
        let affected = if specific_node {
            self.records.contains_key(path.path())
        } else {
            self.records_within(&path).next().is_some()
        };
        if affected {
            debug!(path = %path, specific_node, "Deleting records");
            changes.push(NodeChange::Delete {
                path,
                subtree: !specific_node,
            });
        }
        self.apply(&changes);
        changes
    }

    /// Sets the value at `path`.
    ///
    /// Writing to the root replaces the whole tree and requires an object.
    /// Otherwise the write is delegated to the parent as a merge of
    /// `{ key: value }`, so `Null` removes the value. With
    /// `assert_revision`, the write fails with
    /// [`NodeError::RevisionConflict`] unless the value at `path` currently
    /// carries that revision.
    pub fn set_node(
        &mut self,
        path: impl AsRef<str>,
        value: Value,
        assert_revision: Option<&str>,
    ) -> Result<NodeChanges> {
        let path = PathInfo::get(path);
        let asserted = match assert_revision {
            Some(expected) => Some(self.assert_revision(&path, expected)?),
            None => None,
        };

        let Some((parent, key)) = split_last(&path) else {
            if !matches!(value, Value::Object(_)) {
                return Err(NodeError::InvalidNodeValue {
                    path: String::new(),
                    reason: "root value must be an object".to_string(),
                }
                .into());
            }
            return self.write_node(&path, value, WriteOptions::default());
        };

        if let Some(info) = asserted
            && info.is_dedicated()
            && !value.is_void()
            && !self.value_fits_inline(&value)
        {
            return self.write_node(&path, value, WriteOptions::default());
        }
        self.update_node(&parent, wrap(&key, value))
    }

    fn assert_revision(&self, path: &PathInfo, expected: &str) -> std::result::Result<NodeInfo, NodeError> {
        let info = self.info_at(path, false)?;
        if info.revision != expected {
            warn!(path = %path, expected, actual = %info.revision, "Revision assertion failed");
            return Err(NodeError::RevisionConflict {
                path: path.to_string(),
                expected: expected.to_string(),
                actual: info.revision,
            });
        }
        Ok(info)
    }

    /// Merges the properties of `updates` into the value at `path`.
    ///
    /// Properties set to `Null` are removed. A value that only exists as the
    /// container of dedicated descendants is merged in place. If the value
    /// at `path` is stored inline, or does not exist yet, the update is
    /// delegated to the parent.
    pub fn update_node(&mut self, path: impl AsRef<str>, updates: Value) -> Result<NodeChanges> {
        let path = PathInfo::get(path);
        if !updates.is_composite() {
            return Err(NodeError::InvalidNodeValue {
                path: path.to_string(),
                reason: format!("updates must be an object or array, got {}", updates.type_name()),
            }
            .into());
        }
        if updates.properties().is_empty() {
            return Ok(NodeChanges::default());
        }

        let info = self.info_at(&path, false)?;
        let Some((parent, key)) = split_last(&path) else {
            return self.write_node(&path, updates, WriteOptions::merge());
        };
        if info.exists && (info.is_dedicated() || info.address.is_none()) {
            self.write_node(&path, updates, WriteOptions::merge())
        } else if info.exists {
            self.write_node(&parent, wrap(&key, updates), WriteOptions::merge())
        } else {
            self.update_node(&parent, wrap(&key, updates))
        }
    }

    /// Imports a value at `path`, like [`set_node`](Self::set_node).
    pub fn import_json(&mut self, path: impl AsRef<str>, value: Value) -> Result<NodeChanges> {
        self.set_node(path, value, None)
    }

    fn new_revision(&self, now: u64) -> String {
        let timestamp = Timestamp::from_unix(NoContext, now / 1000, ((now % 1000) * 1_000_000) as u32);
        Uuid::new_v7(timestamp).simple().to_string()
    }
}

fn split_last(path: &PathInfo) -> Option<(PathInfo, Key)> {
    Some((path.parent()?, path.key()?.clone()))
}

fn wrap(key: &Key, value: Value) -> Value {
    let mut map = BTreeMap::new();
    map.insert(key.to_property(), value);
    Value::Object(map)
}
