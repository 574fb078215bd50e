//! `ProxDB` Vector
//!
//! This crate provides the query side of `ProxDB`: distance and similarity
//! functions, query objects bound to a relation, exhaustive fallback
//! implementations, and the capability traits indexes implement to take
//! part in query resolution.
//!
//! # Modules
//!
//! - [`distance`] - Distance functions and the built-in [`DistanceMetric`]s
//! - [`similarity`] - Similarity functions
//! - [`query`] - Query traits, [`QueryHints`] and linear-scan implementations
//! - [`index`] - Index capability traits, factories and reference indexes
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```ignore
//! use proxdb_vector::distance::DistanceMetric;
//! use proxdb_vector::query::{KnnQuery, LinearScanDistanceQuery, LinearScanKnnQuery};
//!
//! let metric = DistanceMetric::Euclidean;
//! let knn = LinearScanKnnQuery::new(Box::new(LinearScanDistanceQuery::new(&relation, &metric)));
//! for neighbor in knn.knn_for_id(id, 10)? {
//!     println!("{} at distance {}", neighbor.id, neighbor.distance);
//! }
//! ```

#![deny(clippy::unwrap_used)]

pub mod distance;
pub mod error;
pub mod index;
pub mod query;
pub mod similarity;

pub use distance::{DistanceFunction, DistanceMetric, MinkowskiDistance};
pub use error::VectorError;
pub use index::{
    DistanceIndex, Index, IndexFactory, KnnIndex, MaterializedKnnIndex, MaterializedKnnIndexFactory,
    PrecomputedDistanceIndex, PrecomputedDistanceIndexFactory, RangeIndex, RknnIndex,
};
pub use query::{
    DistanceQuery, KnnQuery, Neighbor, QueryHints, RangeQuery, RknnQuery, SimilarityQuery,
};
pub use similarity::{SimilarityFunction, SimilarityMeasure};
