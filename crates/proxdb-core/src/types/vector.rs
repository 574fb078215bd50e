//! Feature vectors, the primary object type of a relation.

use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A dense feature vector of finite f64 values.
///
/// # Example
///
/// ```
/// use proxdb_core::NumberVector;
///
/// let v = NumberVector::new(vec![1.0, 2.0, 3.0]).unwrap();
/// assert_eq!(v.dimensionality(), 3);
/// assert_eq!(v.as_slice(), &[1.0, 2.0, 3.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberVector {
    data: Vec<f64>,
}

impl NumberVector {
    /// Create a new vector from its components.
    ///
    /// # Errors
    ///
    /// Returns an error if the vector is empty or contains NaN/Infinite values.
    pub fn new(data: Vec<f64>) -> Result<Self, CoreError> {
        if data.is_empty() {
            return Err(CoreError::InvalidDimension { expected: 1, actual: 0 });
        }

        for (i, &value) in data.iter().enumerate() {
            if !value.is_finite() {
                return Err(CoreError::InvalidValue {
                    index: i,
                    value,
                    reason: if value.is_nan() {
                        "NaN values are not allowed"
                    } else {
                        "Infinite values are not allowed"
                    },
                });
            }
        }

        Ok(Self { data })
    }

    /// Number of components.
    #[inline]
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.data.len()
    }

    /// Get the components as a slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Get one component, or `None` past the end.
    #[inline]
    #[must_use]
    pub fn get(&self, dim: usize) -> Option<f64> {
        self.data.get(dim).copied()
    }

    /// Consume the vector and return its components.
    #[inline]
    #[must_use]
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Calculate the L2 (Euclidean) norm.
    #[inline]
    #[must_use]
    pub fn l2_norm(&self) -> f64 {
        self.data.iter().map(|x| x * x).sum::<f64>().sqrt()
    }
}

impl Deref for NumberVector {
    type Target = [f64];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl AsRef<[f64]> for NumberVector {
    #[inline]
    fn as_ref(&self) -> &[f64] {
        &self.data
    }
}

impl TryFrom<Vec<f64>> for NumberVector {
    type Error = CoreError;

    fn try_from(data: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(data)
    }
}
