//! Error types for node decomposition, writes and reads.

use thiserror::Error;

use crate::path::PathError;

/// Errors raised by [`NodeStore`](super::NodeStore) operations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NodeError {
    /// A property name cannot be used as a path key
    #[error(transparent)]
    InvalidKey(#[from] PathError),

    /// An array and an object were mixed in a merge, or an array merge would
    /// leave gaps or shift indices
    #[error("Type conflict at path \"{path}\": {reason}")]
    TypeConflict { path: String, reason: String },

    /// A `null` value was about to be stored instead of removing the property
    #[error("Cannot store null at path \"{path}\", remove the property instead")]
    NullValue { path: String },

    /// An undefined value was found while void properties are not removed
    #[error(
        "Property at path \"{path}\" has an undefined value. Enable remove_void_properties to remove undefined properties automatically"
    )]
    VoidValue { path: String },

    /// The stored revision differs from the one the caller expected
    #[error("Revision '{actual}' of path \"{path}\" does not match requested revision '{expected}'")]
    RevisionConflict {
        path: String,
        expected: String,
        actual: String,
    },

    /// A value cannot be written as requested at this path
    #[error("Invalid value for path \"{path}\": {reason}")]
    InvalidNodeValue { path: String, reason: String },

    /// A stored record could not be decoded
    #[error("Invalid record at path \"{path}\": {reason}")]
    InvalidRecord { path: String, reason: String },

    /// A stored type code is not known
    #[error("Unknown value type code {code}")]
    UnknownValueType { code: u8 },

    /// NaN and infinities have no stored representation
    #[error("Cannot store non-finite number {value} at path \"{path}\"")]
    UnsupportedNumber { path: String, value: f64 },
}

impl NodeError {
    /// Check if this error was caused by a malformed key
    pub fn is_invalid_key(&self) -> bool {
        matches!(self, NodeError::InvalidKey(err) if err.is_invalid_key())
    }

    /// Check if this error is an array/object conflict
    pub fn is_type_conflict(&self) -> bool {
        matches!(self, NodeError::TypeConflict { .. })
    }

    /// Check if this error is an optimistic concurrency failure
    pub fn is_revision_conflict(&self) -> bool {
        matches!(self, NodeError::RevisionConflict { .. })
    }

    /// Check if this error rejected the written value itself
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            NodeError::InvalidKey(_)
                | NodeError::TypeConflict { .. }
                | NodeError::NullValue { .. }
                | NodeError::VoidValue { .. }
                | NodeError::InvalidNodeValue { .. }
                | NodeError::UnsupportedNumber { .. }
        )
    }

    /// Check if this error indicates corrupt stored data
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            NodeError::InvalidRecord { .. } | NodeError::UnknownValueType { .. }
        )
    }
}

impl From<NodeError> for crate::Error {
    fn from(err: NodeError) -> Self {
        crate::Error::Node(err)
    }
}
