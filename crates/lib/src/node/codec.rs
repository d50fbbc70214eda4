//! Typed-value codec for stored payloads.
//!
//! Strings, numbers and booleans are stored as plain JSON. Dates, references,
//! binary values and big integers are stored inline as tagged objects,
//! `{"type": <code>, "value": <payload>}`, with dates as epoch milliseconds,
//! binary as ASCII85 text and big integers as decimal text. Empty objects and
//! arrays are stored as they are, so any object carrying a `type` tag is a
//! typed value.

use std::collections::BTreeMap;

use serde_json::{Map, Value as Json, json};

use crate::constants::{TYPE_TAG, VALUE_TAG};
use crate::path::{Key, PathInfo, PathReference};
use crate::value::{Value, ascii85};

use super::{NodeError, Record, ValueType};

/// Encodes a value that is stored inside its parent record.
pub fn encode_inline(path: &PathInfo, value: &Value) -> Result<Json, NodeError> {
    Ok(match value {
        Value::Null => {
            return Err(NodeError::NullValue {
                path: path.to_string(),
            });
        }
        Value::Undefined => {
            return Err(NodeError::VoidValue {
                path: path.to_string(),
            });
        }
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(n) => serde_json::Number::from_f64(*n)
            .map(Json::Number)
            .ok_or_else(|| NodeError::UnsupportedNumber {
                path: path.to_string(),
                value: *n,
            })?,
        Value::String(s) => Json::String(s.clone()),
        Value::DateTime(date) => tagged(ValueType::DateTime, json!(date.timestamp_millis())),
        Value::BigInt(n) => tagged(ValueType::BigInt, json!(n.to_string())),
        Value::Binary(bytes) => tagged(ValueType::Binary, json!(ascii85::encode(bytes))),
        Value::Reference(reference) => tagged(ValueType::Reference, json!(reference.path())),
        Value::Object(map) if map.is_empty() => Json::Object(Map::new()),
        Value::Array(items) if items.is_empty() => Json::Array(Vec::new()),
        Value::Object(_) | Value::Array(_) => {
            return Err(NodeError::InvalidNodeValue {
                path: path.to_string(),
                reason: "only empty objects and arrays can be stored in a parent record".to_string(),
            });
        }
    })
}

fn tagged(value_type: ValueType, payload: Json) -> Json {
    let mut map = Map::new();
    map.insert(TYPE_TAG.to_string(), json!(value_type.code()));
    map.insert(VALUE_TAG.to_string(), payload);
    Json::Object(map)
}

/// Decodes a value stored inside a parent record.
pub fn decode_inline(path: &PathInfo, json: &Json) -> Result<Value, NodeError> {
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| decode_inline(path, item))
                .collect::<Result<_, _>>()?,
        ),
        Json::Object(map) => match map.get(TYPE_TAG) {
            Some(tag) => decode_tagged(path, tag, map.get(VALUE_TAG).unwrap_or(&Json::Null))?,
            None => Value::Object(
                map.iter()
                    .map(|(key, value)| decode_inline(path, value).map(|value| (key.clone(), value)))
                    .collect::<Result<_, NodeError>>()?,
            ),
        },
    })
}

fn decode_tagged(path: &PathInfo, tag: &Json, payload: &Json) -> Result<Value, NodeError> {
    let value_type = type_code(path, tag)?;
    match value_type {
        ValueType::DateTime => payload
            .as_i64()
            .and_then(Value::datetime_millis)
            .ok_or_else(|| invalid(path, "date payload is not a valid timestamp")),
        ValueType::Reference => payload
            .as_str()
            .map(Value::reference)
            .ok_or_else(|| invalid(path, "reference payload is not a string")),
        ValueType::Binary => decode_binary(path, payload),
        ValueType::BigInt => decode_bigint(path, payload),
        ValueType::DedicatedRecord => Ok(type_code(path, payload)?.default_value()),
        other => Err(invalid(
            path,
            &format!("unhandled inline value type {}", other.name()),
        )),
    }
}

fn type_code(path: &PathInfo, json: &Json) -> Result<ValueType, NodeError> {
    let code = json
        .as_u64()
        .and_then(|code| u8::try_from(code).ok())
        .ok_or_else(|| invalid(path, "type tag is not a type code"))?;
    ValueType::try_from(code)
}

fn decode_binary(path: &PathInfo, payload: &Json) -> Result<Value, NodeError> {
    let text = payload
        .as_str()
        .ok_or_else(|| invalid(path, "binary payload is not a string"))?;
    ascii85::decode(text)
        .map(Value::Binary)
        .map_err(|err| invalid(path, &err.to_string()))
}

fn decode_bigint(path: &PathInfo, payload: &Json) -> Result<Value, NodeError> {
    payload
        .as_str()
        .and_then(|digits| digits.parse::<i128>().ok())
        .map(Value::BigInt)
        .ok_or_else(|| invalid(path, "bigint payload is not a decimal string"))
}

fn invalid(path: &PathInfo, reason: &str) -> NodeError {
    NodeError::InvalidRecord {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

/// Encodes the payload of a scalar that is stored in its own record.
pub fn encode_record(path: &PathInfo, value: &Value) -> Result<(ValueType, Json), NodeError> {
    match value {
        Value::String(s) => Ok((ValueType::String, json!(s))),
        Value::Binary(bytes) => Ok((ValueType::Binary, json!(ascii85::encode(bytes)))),
        Value::Reference(reference) => Ok((ValueType::Reference, json!(reference.path()))),
        Value::BigInt(n) => Ok((ValueType::BigInt, json!(n.to_string()))),
        other => Err(NodeError::InvalidNodeValue {
            path: path.to_string(),
            reason: format!("a {} cannot be stored in its own record", other.type_name()),
        }),
    }
}

/// Decodes the full value of a record. Object and array records only
/// contain their inline children.
pub fn decode_record(record: &Record) -> Result<Value, NodeError> {
    let path = &record.path;
    let payload = &record.content.value;
    match record.content.value_type {
        ValueType::Object => {
            let map = as_map(path, payload)?;
            let mut value = Value::object();
            for (key, item) in map {
                value.set_child(&Key::Name(key.clone()), decode_inline(path, item)?);
            }
            Ok(value)
        }
        ValueType::Array => {
            let map = as_map(path, payload)?;
            let mut items = BTreeMap::new();
            for (key, item) in map {
                match Key::from_property(key, true) {
                    Key::Index(index) => items.insert(index, item),
                    Key::Name(_) => return Err(invalid(path, "array record has a non-index key")),
                };
            }
            let mut value = Value::array();
            for (index, item) in items {
                if !value.set_child(&Key::Index(index), decode_inline(path, item)?) {
                    return Err(invalid(path, "array record index is out of range"));
                }
            }
            Ok(value)
        }
        ValueType::String => payload
            .as_str()
            .map(Value::from)
            .ok_or_else(|| invalid(path, "string record payload is not a string")),
        ValueType::Binary => decode_binary(path, payload),
        ValueType::Reference => payload
            .as_str()
            .map(|text| Value::Reference(PathReference::new(text)))
            .ok_or_else(|| invalid(path, "reference record payload is not a string")),
        ValueType::BigInt => decode_bigint(path, payload),
        other => Err(invalid(
            path,
            &format!("a {} cannot be stored in its own record", other.name()),
        )),
    }
}

fn as_map<'a>(path: &PathInfo, payload: &'a Json) -> Result<&'a Map<String, Json>, NodeError> {
    payload
        .as_object()
        .ok_or_else(|| invalid(path, "composite record payload is not an object"))
}
