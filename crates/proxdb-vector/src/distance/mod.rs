//! Distance functions over feature vectors.
//!
//! A [`DistanceFunction`] maps two vectors to a non-negative dissimilarity.
//! Queries and indexes are bound to one function; two functions are treated
//! as the same when their [`name`](DistanceFunction::name)s are equal, which
//! is how an index decides whether it can serve a query.

mod scalar;

pub use scalar::{
    chebyshev_distance, cosine_distance, cosine_similarity, dot_product, euclidean_distance,
    euclidean_distance_squared, l2_norm, manhattan_distance,
};

use std::fmt;

use serde::{Deserialize, Serialize};

use proxdb_core::TypeInformation;

use crate::error::VectorError;

/// A dissimilarity measure between two feature vectors.
pub trait DistanceFunction: fmt::Debug + Send + Sync {
    /// A stable name identifying this function and its parameters.
    fn name(&self) -> &str;

    /// The relation type this function accepts.
    fn input_type(&self) -> TypeInformation {
        TypeInformation::any_vector()
    }

    /// Whether the function satisfies the triangle inequality.
    fn is_metric(&self) -> bool {
        false
    }

    /// Compute the distance between two vectors of equal dimensionality.
    fn distance(&self, a: &[f64], b: &[f64]) -> f64;
}

/// Returns `true` if both functions compute the same distance.
#[must_use]
pub fn same_function(a: &dyn DistanceFunction, b: &dyn DistanceFunction) -> bool {
    a.name() == b.name()
}

/// Built-in distance metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistanceMetric {
    /// Euclidean (L2) distance.
    Euclidean,
    /// Squared Euclidean distance.
    SquaredEuclidean,
    /// Manhattan (L1) distance.
    Manhattan,
    /// Chebyshev (L∞) distance.
    Chebyshev,
    /// Cosine distance (1 - cosine similarity).
    Cosine,
}

impl DistanceMetric {
    /// Calculate the distance between two vectors using this metric.
    #[inline]
    #[must_use]
    pub fn calculate(&self, a: &[f64], b: &[f64]) -> f64 {
        match self {
            Self::Euclidean => euclidean_distance(a, b),
            Self::SquaredEuclidean => euclidean_distance_squared(a, b),
            Self::Manhattan => manhattan_distance(a, b),
            Self::Chebyshev => chebyshev_distance(a, b),
            Self::Cosine => cosine_distance(a, b),
        }
    }

    /// All built-in metrics.
    pub const ALL: [Self; 5] =
        [Self::Euclidean, Self::SquaredEuclidean, Self::Manhattan, Self::Chebyshev, Self::Cosine];
}

impl DistanceFunction for DistanceMetric {
    fn name(&self) -> &str {
        match self {
            Self::Euclidean => "euclidean",
            Self::SquaredEuclidean => "squared-euclidean",
            Self::Manhattan => "manhattan",
            Self::Chebyshev => "chebyshev",
            Self::Cosine => "cosine",
        }
    }

    fn is_metric(&self) -> bool {
        matches!(self, Self::Euclidean | Self::Manhattan | Self::Chebyshev)
    }

    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        self.calculate(a, b)
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Minkowski (Lp) distance for an arbitrary exponent `p >= 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct MinkowskiDistance {
    p: f64,
    name: String,
}

impl MinkowskiDistance {
    /// Create an Lp distance.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::InvalidParameter`] if `p` is below 1 or not finite.
    pub fn new(p: f64) -> Result<Self, VectorError> {
        if !p.is_finite() || p < 1.0 {
            return Err(VectorError::invalid_parameter(format!(
                "minkowski exponent must be finite and >= 1, got {p}"
            )));
        }
        Ok(Self { p, name: format!("minkowski(p={p})") })
    }

    /// The exponent.
    #[must_use]
    pub const fn p(&self) -> f64 {
        self.p
    }
}

impl DistanceFunction for MinkowskiDistance {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_metric(&self) -> bool {
        true
    }

    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        debug_assert_eq!(a.len(), b.len(), "vectors must have same dimension");
        a.iter().zip(b).map(|(x, y)| (x - y).abs().powf(self.p)).sum::<f64>().powf(self.p.recip())
    }
}
