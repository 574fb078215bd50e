//! Error types for the core crate.

use thiserror::Error;

use crate::types::DbId;

/// Errors that can occur in the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No object with this identifier is stored.
    #[error("object {0} not found")]
    NotFound(DbId),

    /// The identifier is already assigned to a live object.
    #[error("identifier {0} is already in use")]
    AlreadyExists(DbId),

    /// An operation was attempted in a state that does not allow it.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A feature vector has no components.
    #[error("invalid dimension: expected at least {expected}, got {actual}")]
    InvalidDimension {
        /// The minimum expected dimension.
        expected: usize,
        /// The actual dimension.
        actual: usize,
    },

    /// Invalid value in a feature vector (NaN, Infinity).
    #[error("invalid value at index {index}: {value} - {reason}")]
    InvalidValue {
        /// The index of the invalid value.
        index: usize,
        /// The invalid value.
        value: f64,
        /// The reason the value is invalid.
        reason: &'static str,
    },

    /// A value type mismatch occurred.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The expected type.
        expected: String,
        /// The actual type.
        actual: String,
    },

    /// A bundle's columns disagree with its metadata or with each other.
    #[error("malformed bundle: {0}")]
    MalformedBundle(String),

    /// A required value was missing.
    #[error("null value in column {column}, row {row}")]
    NullObject {
        /// The column index of the missing value.
        column: usize,
        /// The row (object) index of the missing value.
        row: usize,
    },
}

impl CoreError {
    /// Create a type mismatch error from anything displayable.
    #[must_use]
    pub fn type_mismatch(expected: impl ToString, actual: impl ToString) -> Self {
        Self::TypeMismatch { expected: expected.to_string(), actual: actual.to_string() }
    }

    /// Create a malformed bundle error.
    #[must_use]
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedBundle(msg.into())
    }
}
