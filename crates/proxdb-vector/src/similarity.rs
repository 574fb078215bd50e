//! Similarity functions over feature vectors.
//!
//! Larger values mean more similar. Unlike distances, similarity queries
//! have no index acceleration path and are always answered by a scan.

use std::fmt;

use serde::{Deserialize, Serialize};

use proxdb_core::TypeInformation;

use crate::distance::{cosine_similarity, dot_product};

/// A similarity measure between two feature vectors.
pub trait SimilarityFunction: fmt::Debug + Send + Sync {
    /// A stable name identifying this function.
    fn name(&self) -> &str;

    /// The relation type this function accepts.
    fn input_type(&self) -> TypeInformation {
        TypeInformation::any_vector()
    }

    /// Compute the similarity between two vectors of equal dimensionality.
    fn similarity(&self, a: &[f64], b: &[f64]) -> f64;
}

/// Built-in similarity measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimilarityMeasure {
    /// Cosine of the angle between the vectors.
    Cosine,
    /// Inner product.
    DotProduct,
}

impl SimilarityFunction for SimilarityMeasure {
    fn name(&self) -> &str {
        match self {
            Self::Cosine => "cosine-similarity",
            Self::DotProduct => "dot-product",
        }
    }

    fn similarity(&self, a: &[f64], b: &[f64]) -> f64 {
        match self {
            Self::Cosine => cosine_similarity(a, b),
            Self::DotProduct => dot_product(a, b),
        }
    }
}
