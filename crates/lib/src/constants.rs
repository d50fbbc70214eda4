//! Constants used throughout the Tessera library.
//!
//! Central definitions for storage limits and reserved type tags.

/// Default number of bytes below which a scalar is stored inline in its
/// parent record instead of in a dedicated record.
pub const DEFAULT_MAX_INLINE_VALUE_SIZE: usize = 50;

/// Maximum length of a single path key, in characters.
pub const MAX_KEY_LENGTH: usize = 128;

/// Property name carrying the type tag of a typed inline value.
pub const TYPE_TAG: &str = "type";

/// Property name carrying the payload of a typed inline value.
pub const VALUE_TAG: &str = "value";

/// Largest number of holes [`Value::set_child`](crate::value::Value::set_child)
/// inserts when growing an array to reach an index.
pub const MAX_ARRAY_GAP: usize = 65_536;
