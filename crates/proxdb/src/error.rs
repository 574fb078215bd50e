//! Error types for `ProxDB`.
//!
//! This module provides the [`enum@Error`] type that represents all possible
//! errors when using a [`Database`](crate::Database).

use thiserror::Error;

use proxdb_core::{CoreError, DbId};
use proxdb_vector::VectorError;

/// Errors that can occur when using `ProxDB`.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration error: a malformed bundle, or an index attached to a
    /// database that already holds objects.
    #[error("configuration error: {0}")]
    Config(String),

    /// No object with this identifier is stored.
    #[error("object {0} not found")]
    NotFound(DbId),

    /// A caller-assigned identifier collides with a live object.
    #[error("identifier {0} is already in use")]
    AlreadyExists(DbId),

    /// No relation satisfies the requested type.
    #[error("no relation of type {requested}; available: [{}]", .available.join(", "))]
    UnsupportedType {
        /// The requested type restriction.
        requested: String,
        /// The types of the relations that exist.
        available: Vec<String>,
    },

    /// An invalid argument was provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation is not allowed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A required value was missing from an inserted bundle.
    #[error("null value in column {column}, row {row}")]
    NullObject {
        /// The column index of the missing value.
        column: usize,
        /// The row (object) index of the missing value.
        row: usize,
    },

    /// A value had the wrong type.
    #[error("type error: {0}")]
    Type(String),

    /// A vector operation error occurred.
    #[error("vector error: {0}")]
    Vector(String),
}

impl Error {
    /// Returns `true` if this is a configuration error.
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::NullObject { .. })
    }

    /// Returns `true` if the identifier was not found.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an invalid state error.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}

impl From<CoreError> for Error {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(id) => Self::NotFound(id),
            CoreError::AlreadyExists(id) => Self::AlreadyExists(id),
            CoreError::InvalidState(msg) => Self::InvalidState(msg),
            CoreError::MalformedBundle(msg) => Self::Config(msg),
            CoreError::NullObject { column, row } => Self::NullObject { column, row },
            CoreError::TypeMismatch { .. } => Self::Type(err.to_string()),
            CoreError::InvalidDimension { .. } | CoreError::InvalidValue { .. } => {
                Self::InvalidArgument(err.to_string())
            }
        }
    }
}

impl From<VectorError> for Error {
    fn from(err: VectorError) -> Self {
        match err {
            VectorError::Core(core) => core.into(),
            VectorError::InvalidParameter(msg) => Self::InvalidArgument(msg),
            VectorError::RelationMismatch { .. } => Self::InvalidState(err.to_string()),
            VectorError::DimensionMismatch { .. } => Self::Vector(err.to_string()),
        }
    }
}

/// Result type alias for `ProxDB` operations.
pub type Result<T> = std::result::Result<T, Error>;
