//! Query objects bound to one function and one relation.
//!
//! A query is obtained once and evaluated many times. Each capability has
//! its own trait so that indexes and scans can serve any subset of them:
//!
//! - [`DistanceQuery`] - pairwise distances between stored objects
//! - [`SimilarityQuery`] - pairwise similarities between stored objects
//! - [`KnnQuery`] - the k nearest neighbors of an object
//! - [`RangeQuery`] - all objects within a radius
//! - [`RknnQuery`] - objects that have the query among their own k nearest neighbors
//!
//! Neighbor lists are ordered by ascending distance, ties broken by
//! ascending identifier, and include the query object itself when it is
//! stored. This total order makes index answers and scan answers identical.

mod linear;

pub use linear::{
    LinearScanDistanceQuery, LinearScanKnnQuery, LinearScanRangeQuery, LinearScanRknnQuery,
    LinearScanSimilarityQuery,
};

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use proxdb_core::{DbId, NumberVector, Relation};

use crate::distance::DistanceFunction;
use crate::error::VectorError;
use crate::similarity::SimilarityFunction;

/// One entry of a neighbor list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// The neighbor.
    pub id: DbId,
    /// Its distance to the query.
    pub distance: f64,
}

impl Neighbor {
    /// Create a new neighbor entry.
    #[must_use]
    pub const fn new(id: DbId, distance: f64) -> Self {
        Self { id, distance }
    }

    /// Total order by distance, then identifier.
    #[must_use]
    pub fn cmp_by_distance(&self, other: &Self) -> Ordering {
        self.distance.total_cmp(&other.distance).then_with(|| self.id.cmp(&other.id))
    }
}

/// Resolution hints.
///
/// Hints never change the answer of a query, only how it is obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryHints {
    /// Return no query rather than fall back to a linear scan.
    pub optimized_only: bool,
    /// Many queries will follow; batched access is worthwhile.
    pub bulk: bool,
    /// The largest k that will be requested.
    pub max_neighbors: Option<usize>,
}

impl QueryHints {
    /// No hints.
    pub const NONE: Self = Self { optimized_only: false, bulk: false, max_neighbors: None };

    /// Only index-backed queries.
    pub const OPTIMIZED_ONLY: Self = Self { optimized_only: true, bulk: false, max_neighbors: None };

    /// Create empty hints.
    #[must_use]
    pub const fn new() -> Self {
        Self::NONE
    }

    /// Suppress the linear-scan fallback.
    #[must_use]
    pub const fn with_optimized_only(mut self) -> Self {
        self.optimized_only = true;
        self
    }

    /// Announce bulk usage.
    #[must_use]
    pub const fn with_bulk(mut self) -> Self {
        self.bulk = true;
        self
    }

    /// Announce the largest k that will be requested.
    #[must_use]
    pub const fn with_max_neighbors(mut self, k: usize) -> Self {
        self.max_neighbors = Some(k);
        self
    }

    /// These hints with the fallback allowed.
    #[must_use]
    pub const fn allow_fallback(mut self) -> Self {
        self.optimized_only = false;
        self
    }
}

/// Pairwise distances over one relation.
pub trait DistanceQuery: Send + Sync {
    /// The relation this query reads.
    fn relation(&self) -> &Relation<NumberVector>;

    /// The bound distance function.
    fn distance_function(&self) -> &dyn DistanceFunction;

    /// Distance between two vectors.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::DimensionMismatch`] if the dimensionalities differ.
    fn distance_objects(&self, a: &NumberVector, b: &NumberVector) -> Result<f64, VectorError> {
        checked_distance(self.distance_function(), a, b)
    }

    /// Distance between a stored object and an arbitrary vector.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `id` is not stored, or a dimension mismatch.
    fn distance_to_object(&self, id: DbId, object: &NumberVector) -> Result<f64, VectorError> {
        self.distance_objects(self.relation().get(id)?, object)
    }

    /// Distance between two stored objects.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if either identifier is not stored.
    fn distance(&self, a: DbId, b: DbId) -> Result<f64, VectorError> {
        let relation = self.relation();
        self.distance_objects(relation.get(a)?, relation.get(b)?)
    }
}

/// Pairwise similarities over one relation.
pub trait SimilarityQuery: Send + Sync {
    /// The relation this query reads.
    fn relation(&self) -> &Relation<NumberVector>;

    /// The bound similarity function.
    fn similarity_function(&self) -> &dyn SimilarityFunction;

    /// Similarity between two vectors.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::DimensionMismatch`] if the dimensionalities differ.
    fn similarity_objects(&self, a: &NumberVector, b: &NumberVector) -> Result<f64, VectorError> {
        VectorError::check_dimension(a.dimensionality(), b.dimensionality())?;
        Ok(self.similarity_function().similarity(a, b))
    }

    /// Similarity between a stored object and an arbitrary vector.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `id` is not stored, or a dimension mismatch.
    fn similarity_to_object(&self, id: DbId, object: &NumberVector) -> Result<f64, VectorError> {
        self.similarity_objects(self.relation().get(id)?, object)
    }

    /// Similarity between two stored objects.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if either identifier is not stored.
    fn similarity(&self, a: DbId, b: DbId) -> Result<f64, VectorError> {
        let relation = self.relation();
        self.similarity_objects(relation.get(a)?, relation.get(b)?)
    }
}

/// k-nearest-neighbor queries.
pub trait KnnQuery: Send + Sync {
    /// The `k` nearest neighbors of a stored object, itself included.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `id` is not stored, or
    /// [`VectorError::InvalidParameter`] if `k` is zero.
    fn knn_for_id(&self, id: DbId, k: usize) -> Result<Vec<Neighbor>, VectorError>;

    /// The `k` nearest stored neighbors of an arbitrary vector.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::InvalidParameter`] if `k` is zero, or a
    /// dimension mismatch.
    fn knn_for_object(&self, object: &NumberVector, k: usize) -> Result<Vec<Neighbor>, VectorError>;

    /// Neighbor lists for many stored objects, in input order.
    ///
    /// # Errors
    ///
    /// Fails on the first identifier that fails.
    fn knn_for_bulk(&self, ids: &[DbId], k: usize) -> Result<Vec<Vec<Neighbor>>, VectorError> {
        ids.iter().map(|&id| self.knn_for_id(id, k)).collect()
    }
}

/// Range (epsilon-neighborhood) queries.
pub trait RangeQuery: Send + Sync {
    /// All stored objects within `radius` of a stored object, itself included.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `id` is not stored, or
    /// [`VectorError::InvalidParameter`] for a negative or NaN radius.
    fn range_for_id(&self, id: DbId, radius: f64) -> Result<Vec<Neighbor>, VectorError>;

    /// All stored objects within `radius` of an arbitrary vector.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::InvalidParameter`] for a negative or NaN
    /// radius, or a dimension mismatch.
    fn range_for_object(&self, object: &NumberVector, radius: f64)
        -> Result<Vec<Neighbor>, VectorError>;
}

/// Reverse k-nearest-neighbor queries.
pub trait RknnQuery: Send + Sync {
    /// All stored objects that have `id` among their own `k` nearest neighbors.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `id` is not stored, or
    /// [`VectorError::InvalidParameter`] if `k` is zero.
    fn rknn_for_id(&self, id: DbId, k: usize) -> Result<Vec<Neighbor>, VectorError>;

    /// All stored objects whose k-distance is at least their distance to `object`.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::InvalidParameter`] if `k` is zero, or a
    /// dimension mismatch.
    fn rknn_for_object(&self, object: &NumberVector, k: usize)
        -> Result<Vec<Neighbor>, VectorError>;

    /// Reverse neighbor lists for many stored objects, in input order.
    ///
    /// # Errors
    ///
    /// Fails on the first identifier that fails.
    fn rknn_for_bulk(&self, ids: &[DbId], k: usize) -> Result<Vec<Vec<Neighbor>>, VectorError> {
        ids.iter().map(|&id| self.rknn_for_id(id, k)).collect()
    }
}

/// Distance between two vectors after a dimension check.
///
/// # Errors
///
/// Returns [`VectorError::DimensionMismatch`] if the dimensionalities differ.
pub fn checked_distance(
    function: &dyn DistanceFunction,
    a: &NumberVector,
    b: &NumberVector,
) -> Result<f64, VectorError> {
    VectorError::check_dimension(a.dimensionality(), b.dimensionality())?;
    Ok(function.distance(a, b))
}

pub(crate) fn check_k(k: usize) -> Result<(), VectorError> {
    if k == 0 {
        return Err(VectorError::invalid_parameter("k must be at least 1"));
    }
    Ok(())
}

pub(crate) fn check_radius(radius: f64) -> Result<(), VectorError> {
    if radius.is_nan() || radius < 0.0 {
        return Err(VectorError::invalid_parameter(format!(
            "radius must be non-negative, got {radius}"
        )));
    }
    Ok(())
}

/// Wrapper for max-heap comparison (we want smallest distances first).
#[derive(Debug)]
struct MaxHeapEntry(Neighbor);

impl PartialEq for MaxHeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MaxHeapEntry {}

impl PartialOrd for MaxHeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MaxHeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Larger (distance, id) pairs come first and are popped.
        self.0.cmp_by_distance(&other.0)
    }
}

/// Select the `k` smallest candidates by distance, then identifier.
///
/// Stops at the first candidate that fails.
///
/// # Errors
///
/// Propagates the first candidate error.
pub fn select_k_nearest<I>(candidates: I, k: usize) -> Result<Vec<Neighbor>, VectorError>
where
    I: IntoIterator<Item = Result<Neighbor, VectorError>>,
{
    let mut heap: BinaryHeap<MaxHeapEntry> =
        BinaryHeap::with_capacity(k.saturating_add(1).min(1024));

    for candidate in candidates {
        let candidate = candidate?;
        if heap.len() < k {
            heap.push(MaxHeapEntry(candidate));
        } else if let Some(worst) = heap.peek() {
            if candidate.cmp_by_distance(&worst.0) == Ordering::Less {
                heap.pop();
                heap.push(MaxHeapEntry(candidate));
            }
        }
    }

    Ok(heap.into_sorted_vec().into_iter().map(|e| e.0).collect())
}

/// Sort a neighbor list into canonical order.
pub fn sort_neighbors(neighbors: &mut [Neighbor]) {
    neighbors.sort_by(Neighbor::cmp_by_distance);
}
