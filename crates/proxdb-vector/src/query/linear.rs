//! Brute-force query implementations.
//!
//! Every query here evaluates its function against every stored object.
//! They are always correct and serve as the fallback when no index can
//! answer a query.

use proxdb_core::{DbId, NumberVector, Relation};

use super::{
    check_k, check_radius, select_k_nearest, sort_neighbors, DistanceQuery, KnnQuery, Neighbor,
    RangeQuery, RknnQuery, SimilarityQuery,
};
use crate::distance::DistanceFunction;
use crate::error::VectorError;
use crate::similarity::SimilarityFunction;

/// Distance query computing every distance on demand.
#[derive(Debug, Clone, Copy)]
pub struct LinearScanDistanceQuery<'a> {
    relation: &'a Relation<NumberVector>,
    function: &'a dyn DistanceFunction,
}

impl<'a> LinearScanDistanceQuery<'a> {
    /// Bind a function to a relation.
    #[must_use]
    pub const fn new(relation: &'a Relation<NumberVector>, function: &'a dyn DistanceFunction) -> Self {
        Self { relation, function }
    }
}

impl DistanceQuery for LinearScanDistanceQuery<'_> {
    fn relation(&self) -> &Relation<NumberVector> {
        self.relation
    }

    fn distance_function(&self) -> &dyn DistanceFunction {
        self.function
    }
}

/// Similarity query computing every similarity on demand.
#[derive(Debug, Clone, Copy)]
pub struct LinearScanSimilarityQuery<'a> {
    relation: &'a Relation<NumberVector>,
    function: &'a dyn SimilarityFunction,
}

impl<'a> LinearScanSimilarityQuery<'a> {
    /// Bind a function to a relation.
    #[must_use]
    pub const fn new(
        relation: &'a Relation<NumberVector>,
        function: &'a dyn SimilarityFunction,
    ) -> Self {
        Self { relation, function }
    }
}

impl SimilarityQuery for LinearScanSimilarityQuery<'_> {
    fn relation(&self) -> &Relation<NumberVector> {
        self.relation
    }

    fn similarity_function(&self) -> &dyn SimilarityFunction {
        self.function
    }
}

/// k-nearest-neighbor search by exhaustive scan.
///
/// # Complexity
///
/// O(n * d) per query where n is the number of stored objects and d the
/// dimensionality.
pub struct LinearScanKnnQuery<'a> {
    dq: Box<dyn DistanceQuery + 'a>,
}

impl<'a> LinearScanKnnQuery<'a> {
    /// Wrap a distance query.
    #[must_use]
    pub fn new(dq: Box<dyn DistanceQuery + 'a>) -> Self {
        Self { dq }
    }
}

impl KnnQuery for LinearScanKnnQuery<'_> {
    fn knn_for_id(&self, id: DbId, k: usize) -> Result<Vec<Neighbor>, VectorError> {
        check_k(k)?;
        let relation = self.dq.relation();
        relation.get(id)?;
        select_k_nearest(
            relation.ids().map(|other| self.dq.distance(id, other).map(|d| Neighbor::new(other, d))),
            k,
        )
    }

    fn knn_for_object(&self, object: &NumberVector, k: usize) -> Result<Vec<Neighbor>, VectorError> {
        check_k(k)?;
        select_k_nearest(
            self.dq
                .relation()
                .iter()
                .map(|(id, v)| self.dq.distance_objects(object, v).map(|d| Neighbor::new(id, d))),
            k,
        )
    }
}

/// Range search by exhaustive scan.
pub struct LinearScanRangeQuery<'a> {
    dq: Box<dyn DistanceQuery + 'a>,
}

impl<'a> LinearScanRangeQuery<'a> {
    /// Wrap a distance query.
    #[must_use]
    pub fn new(dq: Box<dyn DistanceQuery + 'a>) -> Self {
        Self { dq }
    }
}

impl RangeQuery for LinearScanRangeQuery<'_> {
    fn range_for_id(&self, id: DbId, radius: f64) -> Result<Vec<Neighbor>, VectorError> {
        check_radius(radius)?;
        let relation = self.dq.relation();
        relation.get(id)?;
        let mut result = Vec::new();
        for other in relation.ids() {
            let distance = self.dq.distance(id, other)?;
            if distance <= radius {
                result.push(Neighbor::new(other, distance));
            }
        }
        sort_neighbors(&mut result);
        Ok(result)
    }

    fn range_for_object(
        &self,
        object: &NumberVector,
        radius: f64,
    ) -> Result<Vec<Neighbor>, VectorError> {
        check_radius(radius)?;
        let mut result = Vec::new();
        for (id, v) in self.dq.relation().iter() {
            let distance = self.dq.distance_objects(object, v)?;
            if distance <= radius {
                result.push(Neighbor::new(id, distance));
            }
        }
        sort_neighbors(&mut result);
        Ok(result)
    }
}

/// Reverse k-nearest-neighbor search composed from a bulk kNN query.
///
/// Object A is a reverse neighbor of a stored query Q when Q appears in
/// A's own k-nearest-neighbor list. For a vector that is not stored, A
/// qualifies when its distance to the vector does not exceed its k-distance.
pub struct LinearScanRknnQuery<'a> {
    dq: Box<dyn DistanceQuery + 'a>,
    knn: Box<dyn KnnQuery + 'a>,
}

impl<'a> LinearScanRknnQuery<'a> {
    /// Compose a distance query and a kNN query over the same relation.
    #[must_use]
    pub fn new(dq: Box<dyn DistanceQuery + 'a>, knn: Box<dyn KnnQuery + 'a>) -> Self {
        Self { dq, knn }
    }

    /// kNN lists of every stored object, paired with their owner.
    fn all_knn(&self, k: usize) -> Result<Vec<(DbId, Vec<Neighbor>)>, VectorError> {
        let ids: Vec<DbId> = self.dq.relation().ids().collect();
        let lists = self.knn.knn_for_bulk(&ids, k)?;
        Ok(ids.into_iter().zip(lists).collect())
    }
}

/// Reverse neighbors of `query` within precomputed kNN lists.
fn reverse_neighbors(all: &[(DbId, Vec<Neighbor>)], query: DbId) -> Vec<Neighbor> {
    let mut result: Vec<Neighbor> = all
        .iter()
        .filter_map(|(owner, list)| {
            list.iter().find(|n| n.id == query).map(|n| Neighbor::new(*owner, n.distance))
        })
        .collect();
    sort_neighbors(&mut result);
    result
}

impl RknnQuery for LinearScanRknnQuery<'_> {
    fn rknn_for_id(&self, id: DbId, k: usize) -> Result<Vec<Neighbor>, VectorError> {
        check_k(k)?;
        self.dq.relation().get(id)?;
        Ok(reverse_neighbors(&self.all_knn(k)?, id))
    }

    fn rknn_for_object(
        &self,
        object: &NumberVector,
        k: usize,
    ) -> Result<Vec<Neighbor>, VectorError> {
        check_k(k)?;
        let relation = self.dq.relation();
        let mut result = Vec::new();
        for (owner, list) in self.all_knn(k)? {
            let distance = self.dq.distance_objects(relation.get(owner)?, object)?;
            let k_distance = if list.len() < k {
                f64::INFINITY
            } else {
                list.last().map_or(f64::INFINITY, |n| n.distance)
            };
            if distance <= k_distance {
                result.push(Neighbor::new(owner, distance));
            }
        }
        sort_neighbors(&mut result);
        Ok(result)
    }

    fn rknn_for_bulk(&self, ids: &[DbId], k: usize) -> Result<Vec<Vec<Neighbor>>, VectorError> {
        check_k(k)?;
        let relation = self.dq.relation();
        for &id in ids {
            relation.get(id)?;
        }
        let all = self.all_knn(k)?;
        Ok(ids.iter().map(|&id| reverse_neighbors(&all, id)).collect())
    }
}
