//!
//! Tessera: a storage-node engine for hierarchical real-time databases.
//! This library decomposes JSON-like value trees into addressable records and reassembles them.
//!
//! ## Core Concepts
//!
//! Tessera is built around three components:
//!
//! * **Paths (`path::PathInfo`)**: Slash-and-bracket paths such as `users/ewout/posts[3]`, with
//!   wildcard (`*`) and named (`$id`) variables for matching and filling templates.
//! * **Diffs (`diff::compare_values`)**: Structural comparison of two value trees, flattened into
//!   leaf-level mutations (`diff::get_mutations`) for change subscribers.
//! * **Node store (`node::NodeStore`)**: Splits a value tree into typed records. Small values are
//!   stored inline in their parent's record, large strings and every non-empty object or array get
//!   a record of their own. Writes are planned as ordered record operations (`node::NodeChanges`)
//!   that a persistence layer can apply atomically.
//!
//! Values (`value::Value`) are richer than JSON: they carry dates, big integers, binary data and
//! path references, and distinguish an explicit `Null` from an `Undefined` property.

pub mod clock;
pub mod constants;
pub mod diff;
pub mod node;
pub mod path;
pub mod value;

pub use clock::{Clock, SystemClock};

#[cfg(any(test, feature = "testing"))]
pub use clock::FixedClock;

/// Re-export the main entry points for easier access.
pub use node::{NodeSettings, NodeStore};
pub use path::PathInfo;
pub use value::Value;

/// Result type used throughout the Tessera library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Tessera library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured path errors from the path module
    #[error(transparent)]
    Path(path::PathError),

    /// Structured node store errors from the node module
    #[error(transparent)]
    Node(node::NodeError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Serialize(_) => "serialize",
            Error::Path(_) => "path",
            Error::Node(_) => "node",
        }
    }

    /// Check if this error was caused by a malformed path key.
    pub fn is_invalid_key(&self) -> bool {
        match self {
            Error::Path(path_err) => path_err.is_invalid_key(),
            Error::Node(node_err) => node_err.is_invalid_key(),
            _ => false,
        }
    }

    /// Check if this error is an array/object conflict.
    pub fn is_type_conflict(&self) -> bool {
        match self {
            Error::Node(node_err) => node_err.is_type_conflict(),
            _ => false,
        }
    }

    /// Check if this error indicates the stored revision changed underneath the caller.
    pub fn is_revision_conflict(&self) -> bool {
        match self {
            Error::Node(node_err) => node_err.is_revision_conflict(),
            _ => false,
        }
    }

    /// Check if this error rejected a written value or path.
    pub fn is_validation_error(&self) -> bool {
        match self {
            Error::Path(_) => true,
            Error::Node(node_err) => node_err.is_validation_error(),
            _ => false,
        }
    }

    /// Check if this error indicates a data integrity issue.
    pub fn is_integrity_error(&self) -> bool {
        match self {
            Error::Node(node_err) => node_err.is_integrity_error(),
            _ => false,
        }
    }

    /// Check if this error is serialization-related.
    pub fn is_serialization_error(&self) -> bool {
        matches!(self, Error::Serialize(_))
    }
}
