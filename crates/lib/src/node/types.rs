//! Record, settings and result types of the node store.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MAX_INLINE_VALUE_SIZE;
use crate::diff::CompareResult;
use crate::path::PathInfo;
use crate::value::Value;

use super::NodeError;

/// Discriminant of a stored value, persisted as its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ValueType {
    Empty,
    Object,
    Array,
    Number,
    Boolean,
    String,
    DateTime,
    BigInt,
    Binary,
    Reference,
    /// Inline placeholder for a value that lives in its own record
    DedicatedRecord,
}

impl ValueType {
    /// Numeric code of this type.
    pub fn code(self) -> u8 {
        match self {
            ValueType::Empty => 0,
            ValueType::Object => 1,
            ValueType::Array => 2,
            ValueType::Number => 3,
            ValueType::Boolean => 4,
            ValueType::String => 5,
            ValueType::DateTime => 6,
            ValueType::BigInt => 7,
            ValueType::Binary => 8,
            ValueType::Reference => 9,
            ValueType::DedicatedRecord => 99,
        }
    }

    /// Human readable name of this type.
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Empty => "empty",
            ValueType::Object => "object",
            ValueType::Array => "array",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::String => "string",
            ValueType::DateTime => "date",
            ValueType::BigInt => "bigint",
            ValueType::Binary => "binary",
            ValueType::Reference => "reference",
            ValueType::DedicatedRecord => "dedicated_record",
        }
    }

    /// The value a dedicated marker of this type resolves to.
    ///
    /// Dates default to the Unix epoch; references and empty values have no
    /// default and resolve to `Null` and `Undefined`.
    pub fn default_value(self) -> Value {
        match self {
            ValueType::Object => Value::object(),
            ValueType::Array => Value::array(),
            ValueType::Number => Value::Number(0.0),
            ValueType::Boolean => Value::Bool(false),
            ValueType::String => Value::String(String::new()),
            ValueType::BigInt => Value::BigInt(0),
            ValueType::DateTime => Value::datetime_millis(0).unwrap_or_default(),
            ValueType::Binary => Value::Binary(Vec::new()),
            ValueType::Reference => Value::Null,
            ValueType::Empty | ValueType::DedicatedRecord => Value::Undefined,
        }
    }

    /// Returns true for objects and arrays.
    pub fn is_composite(self) -> bool {
        matches!(self, ValueType::Object | ValueType::Array)
    }

    /// The type of a value. Void values are `Empty`.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Undefined | Value::Null => ValueType::Empty,
            Value::Bool(_) => ValueType::Boolean,
            Value::Number(_) => ValueType::Number,
            Value::BigInt(_) => ValueType::BigInt,
            Value::String(_) => ValueType::String,
            Value::DateTime(_) => ValueType::DateTime,
            Value::Binary(_) => ValueType::Binary,
            Value::Reference(_) => ValueType::Reference,
            Value::Array(_) => ValueType::Array,
            Value::Object(_) => ValueType::Object,
        }
    }
}

impl From<ValueType> for u8 {
    fn from(value_type: ValueType) -> Self {
        value_type.code()
    }
}

impl TryFrom<u8> for ValueType {
    type Error = NodeError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => ValueType::Empty,
            1 => ValueType::Object,
            2 => ValueType::Array,
            3 => ValueType::Number,
            4 => ValueType::Boolean,
            5 => ValueType::String,
            6 => ValueType::DateTime,
            7 => ValueType::BigInt,
            8 => ValueType::Binary,
            9 => ValueType::Reference,
            99 => ValueType::DedicatedRecord,
            code => return Err(NodeError::UnknownValueType { code }),
        })
    }
}

/// Stored content of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageNode {
    #[serde(rename = "type")]
    pub value_type: ValueType,
    /// Encoded payload: inline children for objects and arrays (arrays keyed
    /// by index), the text form for strings, binary, references and big
    /// integers
    pub value: serde_json::Value,
    /// Time-sortable id shared by every record written in one operation
    pub revision: String,
    /// Starts at 1, incremented on every overwrite of this path
    pub revision_nr: u32,
    /// Creation time in milliseconds since the Unix epoch
    pub created: u64,
    /// Last modification time in milliseconds since the Unix epoch
    pub modified: u64,
}

/// A stored record: a path and its content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub path: PathInfo,
    pub content: StorageNode,
}

/// Settings of a [`NodeStore`](super::NodeStore).
///
/// Missing fields deserialize to their defaults, so settings can be loaded
/// from a partial JSON document.
///
/// ```
/// use tessera::node::NodeSettings;
///
/// let settings: NodeSettings = serde_json::from_str(r#"{ "max_inline_value_size": 20 }"#).unwrap();
/// assert_eq!(settings.max_inline_value_size, 20);
/// assert!(!settings.remove_void_properties);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSettings {
    /// Strings, references and binary values whose encoded byte length is at
    /// least this size move to their own record
    pub max_inline_value_size: usize,
    /// Silently drop undefined properties instead of failing the write
    pub remove_void_properties: bool,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            max_inline_value_size: DEFAULT_MAX_INLINE_VALUE_SIZE,
            remove_void_properties: false,
        }
    }
}

impl NodeSettings {
    /// Set the inline size threshold.
    pub fn with_max_inline_value_size(mut self, size: usize) -> Self {
        self.max_inline_value_size = size;
        self
    }

    /// Set whether undefined properties are removed.
    pub fn with_remove_void_properties(mut self, remove: bool) -> Self {
        self.remove_void_properties = remove;
        self
    }
}

/// Options of a single [`write_node`](super::NodeStore::write_node) call.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Merge the value's properties into the existing value
    pub merge: bool,
    /// Revision id to use instead of minting a new one
    pub revision: Option<String>,
    /// The value currently stored at the path, `Some(Value::Null)` if absent.
    /// Enables skipping unchanged children.
    pub current_value: Option<Value>,
    /// A precomputed comparison of the current and new value
    pub diff: Option<CompareResult>,
}

impl WriteOptions {
    /// Options for a merge write.
    pub fn merge() -> Self {
        Self {
            merge: true,
            ..Self::default()
        }
    }

    /// Use a fixed revision id.
    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    /// Supply the currently stored value.
    pub fn with_current_value(mut self, value: Value) -> Self {
        self.current_value = Some(value);
        self
    }

    /// Supply a precomputed comparison.
    pub fn with_diff(mut self, diff: CompareResult) -> Self {
        self.diff = Some(diff);
        self
    }
}

/// Information about the value at a path, as returned by
/// [`get_info_by`](super::NodeStore::get_info_by).
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    pub path: PathInfo,
    /// Last key of the path if it is a property name
    pub key: Option<String>,
    /// Last key of the path if it is an array index
    pub index: Option<usize>,
    pub exists: bool,
    pub value_type: ValueType,
    /// The value as far as it is stored in the holding record: dedicated
    /// children are not included
    pub value: Value,
    pub revision: String,
    pub revision_nr: u32,
    pub created: u64,
    pub modified: u64,
    /// Path of the record holding the value
    pub address: Option<PathInfo>,
    /// Number of children, when requested
    pub child_count: Option<usize>,
}

impl NodeInfo {
    pub(crate) fn missing(path: PathInfo) -> Self {
        let key = path.key().and_then(|key| key.as_name()).map(str::to_string);
        let index = path.key().and_then(|key| key.as_index());
        Self {
            path,
            key,
            index,
            exists: false,
            value_type: ValueType::Empty,
            value: Value::Null,
            revision: String::new(),
            revision_nr: 0,
            created: 0,
            modified: 0,
            address: None,
            child_count: None,
        }
    }

    /// Returns true if the value is stored in its own record.
    pub fn is_dedicated(&self) -> bool {
        self.address.as_ref().is_some_and(|address| address == &self.path)
    }
}

/// A value reconstructed from records by
/// [`export_json`](super::NodeStore::export_json).
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedNode {
    pub path: PathInfo,
    pub value_type: ValueType,
    pub value: Value,
    pub revision: String,
    pub revision_nr: u32,
    pub created: u64,
    pub modified: u64,
}

/// One record operation of a write.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeChange {
    /// Insert a record, replacing any record at the same path
    Insert(Record),
    /// Delete the record at `path`, and with `subtree` every record below it
    Delete { path: PathInfo, subtree: bool },
}

/// The ordered record operations of one store operation.
///
/// Applying them in order, atomically, moves a record set from the state it
/// was planned against to the state after the operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeChanges {
    changes: Vec<NodeChange>,
}

impl NodeChanges {
    pub(crate) fn push(&mut self, change: NodeChange) {
        self.changes.push(change);
    }

    /// Returns true if the operation touched no record.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of record operations.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Iterate the operations in application order.
    pub fn iter(&self) -> impl Iterator<Item = &NodeChange> {
        self.changes.iter()
    }

    /// Records inserted by the operation.
    pub fn inserted(&self) -> impl Iterator<Item = &Record> {
        self.changes.iter().filter_map(|change| match change {
            NodeChange::Insert(record) => Some(record),
            NodeChange::Delete { .. } => None,
        })
    }

    /// Paths deleted by the operation.
    pub fn deleted(&self) -> impl Iterator<Item = &PathInfo> {
        self.changes.iter().filter_map(|change| match change {
            NodeChange::Insert(_) => None,
            NodeChange::Delete { path, .. } => Some(path),
        })
    }
}

impl IntoIterator for NodeChanges {
    type Item = NodeChange;
    type IntoIter = std::vec::IntoIter<NodeChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}
