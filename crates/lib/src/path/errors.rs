//! Error types for path parsing and variable handling.

use thiserror::Error;

/// Errors raised by [`PathInfo`](super::PathInfo) operations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A child key was empty, too long, or contained a forbidden character.
    #[error("Invalid child key \"{key}\" for path \"{path}\": {reason}")]
    InvalidKey {
        /// The offending key
        key: String,
        /// The path the key was being appended to
        path: String,
        /// Why the key was rejected
        reason: String,
    },

    /// A concrete path does not match the variable path it should fill.
    #[error("Path \"{full_path}\" cannot be used to fill variables of path \"{var_path}\" because they do not match")]
    VariableMismatch {
        /// The path containing `*` or `$name` segments
        var_path: String,
        /// The concrete path
        full_path: String,
    },

    /// Not enough captured values to fill every variable of a path.
    #[error("No value for variable #{index} of path \"{var_path}\"")]
    MissingVariable {
        /// The path containing `*` or `$name` segments
        var_path: String,
        /// Position of the variable without a value
        index: usize,
    },
}

impl PathError {
    /// Check if this error was caused by a malformed key
    pub fn is_invalid_key(&self) -> bool {
        matches!(self, PathError::InvalidKey { .. })
    }

    /// Check if this error comes from variable filling
    pub fn is_variable_error(&self) -> bool {
        matches!(
            self,
            PathError::VariableMismatch { .. } | PathError::MissingVariable { .. }
        )
    }
}

impl From<PathError> for crate::Error {
    fn from(err: PathError) -> Self {
        crate::Error::Path(err)
    }
}
