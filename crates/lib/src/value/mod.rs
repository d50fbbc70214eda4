//! The hierarchical value model.
//!
//! [`Value`] covers JSON-compatible data plus the scalar types a real-time
//! database needs on top of JSON: dates, big integers, binary buffers and
//! references to other paths. Both `Null` and `Undefined` are "void": a
//! property holding either is treated as absent when diffing, and writing
//! `Null` to a property removes it.
//!
//! ```
//! use tessera::value::Value;
//! use serde_json::json;
//!
//! let value = Value::from(json!({ "name": "Ewout", "tags": ["a", "b"] }));
//! assert_eq!(value.type_name(), "object");
//! assert_eq!(value.child(&"tags".into()).and_then(|tags| tags.child(&1usize.into())), Some(&Value::from("b")));
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};

use crate::constants::MAX_ARRAY_GAP;
use crate::path::{Key, PathReference};

pub mod ascii85;

/// A value that can be stored in the tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value; rejected on write unless void properties are removed
    Undefined,
    /// Explicit null; removes a property when written
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// IEEE-754 double, like a JSON number
    Number(f64),
    /// Integer beyond the exact range of a double
    BigInt(i128),
    /// UTF-8 text
    String(String),
    /// Point in time, compared at millisecond precision
    DateTime(DateTime<Utc>),
    /// Raw bytes
    Binary(Vec<u8>),
    /// Pointer to another path
    Reference(PathReference),
    /// Ordered list; `Undefined` entries are holes
    Array(Vec<Value>),
    /// Keyed properties
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Creates an empty object.
    pub fn object() -> Self {
        Value::Object(BTreeMap::new())
    }

    /// Creates an empty array.
    pub fn array() -> Self {
        Value::Array(Vec::new())
    }

    /// Creates a binary value.
    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Binary(bytes.into())
    }

    /// Creates a reference to `path`.
    pub fn reference(path: impl AsRef<str>) -> Self {
        Value::Reference(PathReference::new(path))
    }

    /// Creates a date from milliseconds since the Unix epoch.
    ///
    /// Out-of-range timestamps yield `None`.
    pub fn datetime_millis(millis: i64) -> Option<Self> {
        Utc.timestamp_millis_opt(millis).single().map(Value::DateTime)
    }

    /// Returns true for `Null` and `Undefined`.
    pub fn is_void(&self) -> bool {
        matches!(self, Value::Null | Value::Undefined)
    }

    /// Returns true for `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for `Undefined`
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns true for objects and arrays.
    pub fn is_composite(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Array(_))
    }

    /// Returns true for an object or array without non-void entries.
    pub fn is_empty_composite(&self) -> bool {
        match self {
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Returns the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::BigInt(_) => "bigint",
            Value::String(_) => "string",
            Value::DateTime(_) => "date",
            Value::Binary(_) => "binary",
            Value::Reference(_) => "reference",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Attempts to convert to a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to convert to a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to convert to a string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to convert to a byte slice
    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Value::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Attempts to convert to an object map
    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Attempts to convert to a mutable object map
    pub fn as_object_mut(&mut self) -> Option<&mut BTreeMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Attempts to convert to an array slice
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Looks up a direct child. Arrays accept indices and all-digit names;
    /// objects accept names and indices (as their decimal property name).
    pub fn child(&self, key: &Key) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(&key.to_property()),
            Value::Array(items) => array_index(key).and_then(|index| items.get(index)),
            _ => None,
        }
    }

    /// Keys of all non-void children, in storage order.
    pub fn child_keys(&self) -> Vec<Key> {
        match self {
            Value::Object(map) => map
                .iter()
                .filter(|(_, value)| !value.is_void())
                .map(|(name, _)| Key::Name(name.clone()))
                .collect(),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .filter(|(_, value)| !value.is_void())
                .map(|(index, _)| Key::Index(index))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Property view of an object or array: arrays are listed as
    /// integer-keyed properties, skipping holes.
    pub fn properties(&self) -> Vec<(String, &Value)> {
        match self {
            Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .filter(|(_, value)| !value.is_undefined())
                .map(|(index, value)| (index.to_string(), value))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Sets a direct child, growing arrays with holes as needed.
    ///
    /// Returns false if this value cannot hold `key`, or if reaching an
    /// array index would take more than [`MAX_ARRAY_GAP`] holes.
    pub fn set_child(&mut self, key: &Key, value: Value) -> bool {
        match self {
            Value::Object(map) => {
                map.insert(key.to_property(), value);
                true
            }
            Value::Array(items) => match array_index(key) {
                Some(index) if index > items.len() + MAX_ARRAY_GAP => false,
                Some(index) => {
                    if index >= items.len() {
                        items.resize(index + 1, Value::Undefined);
                    }
                    items[index] = value;
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    /// Mutable access to a direct child.
    pub fn child_mut(&mut self, key: &Key) -> Option<&mut Value> {
        match self {
            Value::Object(map) => map.get_mut(&key.to_property()),
            Value::Array(items) => array_index(key).and_then(move |index| items.get_mut(index)),
            _ => None,
        }
    }

    /// Removes a direct child. Removing from an array leaves a hole, and
    /// trailing holes are trimmed.
    pub fn remove_child(&mut self, key: &Key) -> Option<Value> {
        match self {
            Value::Object(map) => map.remove(&key.to_property()),
            Value::Array(items) => {
                let index = array_index(key)?;
                let slot = items.get_mut(index)?;
                let removed = std::mem::replace(slot, Value::Undefined);
                while items.last().is_some_and(Value::is_undefined) {
                    items.pop();
                }
                Some(removed)
            }
            _ => None,
        }
    }

    /// Lossy conversion to JSON: dates become epoch milliseconds, binary
    /// becomes ASCII85 text, references become their path, big integers
    /// become decimal strings and `Undefined` becomes `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Undefined | Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::BigInt(n) => Json::String(n.to_string()),
            Value::String(s) => Json::String(s.clone()),
            Value::DateTime(date) => Json::from(date.timestamp_millis()),
            Value::Binary(bytes) => Json::String(ascii85::encode(bytes)),
            Value::Reference(reference) => Json::String(reference.path().to_string()),
            Value::Array(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Object(map) => Json::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

fn array_index(key: &Key) -> Option<usize> {
    match key {
        Key::Index(index) => Some(*index),
        Key::Name(name) => match Key::from_property(name, true) {
            Key::Index(index) => Some(index),
            Key::Name(_) => None,
        },
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(date: DateTime<Utc>) -> Self {
        Value::DateTime(date)
    }
}

impl From<PathReference> for Value {
    fn from(reference: PathReference) -> Self {
        Value::Reference(reference)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Object(map)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Object(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}
