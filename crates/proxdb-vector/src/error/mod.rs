//! Error types for the vector crate.

use thiserror::Error;

use proxdb_core::CoreError;

/// Errors that can occur in distance computations, queries and indexes.
#[derive(Debug, Error)]
pub enum VectorError {
    /// Dimension mismatch between two vectors.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The expected dimension.
        expected: usize,
        /// The actual dimension.
        actual: usize,
    },

    /// A query or index parameter is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// An index was asked to maintain a relation it is not bound to.
    #[error("index '{index}' is bound to relation '{expected}', not '{actual}'")]
    RelationMismatch {
        /// The index name.
        index: String,
        /// The relation the index was built for.
        expected: String,
        /// The relation that was passed.
        actual: String,
    },

    /// Error from the underlying storage primitives.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl VectorError {
    /// Create an invalid parameter error.
    #[must_use]
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Check a pair of dimensionalities for equality.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::DimensionMismatch`] if they differ.
    pub fn check_dimension(expected: usize, actual: usize) -> Result<(), Self> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::DimensionMismatch { expected, actual })
        }
    }
}
