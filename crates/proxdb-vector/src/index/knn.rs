//! Materialized k-nearest-neighbor lists.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::debug;

use proxdb_core::{CoreError, DbId, NumberVector, Relation};

use super::{Index, IndexBinding, IndexFactory, KnnIndex, RknnIndex};
use crate::distance::DistanceFunction;
use crate::error::VectorError;
use crate::query::{
    check_k, checked_distance, select_k_nearest, sort_neighbors, KnnQuery, LinearScanDistanceQuery,
    LinearScanKnnQuery, LinearScanRknnQuery, Neighbor, QueryHints, RknnQuery,
};

/// Index holding the `k` nearest neighbors of every stored object.
///
/// Lists are kept exact under insertion and deletion: an insertion merges
/// the new objects into every existing list, a deletion recomputes only the
/// lists that referenced a deleted object. Queries for more than `k`
/// neighbors fall back to a scan; queries whose hints announce more than `k`
/// are declined so a better index (or the database fallback) can serve them.
#[derive(Debug)]
pub struct MaterializedKnnIndex {
    name: String,
    binding: IndexBinding,
    k: usize,
    lists: BTreeMap<DbId, Vec<Neighbor>>,
}

impl MaterializedKnnIndex {
    /// Create an empty index over the named relation.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::InvalidParameter`] if `k` is zero.
    pub fn new(
        relation: impl Into<String>,
        function: Arc<dyn DistanceFunction>,
        k: usize,
    ) -> Result<Self, VectorError> {
        check_k(k)?;
        let binding = IndexBinding::new(relation, function);
        let name = format!("materialized-knn({}, k={k})@{}", binding.function().name(), binding.relation());
        Ok(Self { name, binding, k, lists: BTreeMap::new() })
    }

    /// The materialized neighborhood size.
    #[must_use]
    pub const fn k(&self) -> usize {
        self.k
    }

    /// The materialized neighbor list of an object.
    #[must_use]
    pub fn neighbors(&self, id: DbId) -> Option<&[Neighbor]> {
        self.lists.get(&id).map(Vec::as_slice)
    }

    fn compute_list(
        &self,
        relation: &Relation<NumberVector>,
        id: DbId,
        members: &BTreeSet<DbId>,
    ) -> Result<Vec<Neighbor>, VectorError> {
        let function = self.binding.function();
        let query = relation.get(id)?;
        select_k_nearest(
            members.iter().map(|&other| {
                let v = relation.get(other)?;
                checked_distance(function, query, v).map(|d| Neighbor::new(other, d))
            }),
            self.k,
        )
    }

}

impl Index for MaterializedKnnIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn relation_name(&self) -> &str {
        self.binding.relation()
    }

    fn insert(&mut self, relation: &Relation<NumberVector>, ids: &[DbId]) -> Result<(), VectorError> {
        self.binding.check_relation(&self.name, relation)?;
        let function = self.binding.function();
        let added: BTreeSet<DbId> = ids.iter().copied().collect();

        // Merge the new objects into the existing lists.
        for (&owner, list) in &mut self.lists {
            let owner_vec = relation.get(owner)?;
            for &id in &added {
                let d = checked_distance(function, owner_vec, relation.get(id)?)?;
                list.push(Neighbor::new(id, d));
            }
            sort_neighbors(list);
            list.truncate(self.k);
        }

        let members: BTreeSet<DbId> = self.lists.keys().copied().chain(added.iter().copied()).collect();
        let mut fresh = Vec::with_capacity(added.len());
        for &id in &added {
            fresh.push((id, self.compute_list(relation, id, &members)?));
        }
        self.lists.extend(fresh);
        Ok(())
    }

    fn delete(&mut self, relation: &Relation<NumberVector>, ids: &[DbId]) -> Result<(), VectorError> {
        self.binding.check_relation(&self.name, relation)?;
        let removed: BTreeSet<DbId> = ids.iter().copied().collect();
        for id in &removed {
            self.lists.remove(id);
        }

        let stale: Vec<DbId> = self
            .lists
            .iter()
            .filter(|(_, list)| list.iter().any(|n| removed.contains(&n.id)))
            .map(|(&owner, _)| owner)
            .collect();
        let members: BTreeSet<DbId> = self.lists.keys().copied().collect();
        for owner in stale {
            let list = self.compute_list(relation, owner, &members)?;
            self.lists.insert(owner, list);
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.lists.len()
    }

    fn as_knn_index(&self) -> Option<&dyn KnnIndex> {
        Some(self)
    }

    fn as_rknn_index(&self) -> Option<&dyn RknnIndex> {
        Some(self)
    }
}

impl MaterializedKnnIndex {
    fn accepts(
        &self,
        relation: &Relation<NumberVector>,
        function: &dyn DistanceFunction,
        hints: &QueryHints,
    ) -> bool {
        if !self.binding.serves(relation, function) {
            debug!(index = %self.name, function = function.name(), relation = relation.name(), "declined: not bound to this function and relation");
            return false;
        }
        if let Some(max) = hints.max_neighbors.filter(|&max| max > self.k) {
            debug!(index = %self.name, requested = max, materialized = self.k, "declined: more neighbors requested than materialized");
            return false;
        }
        true
    }
}

impl KnnIndex for MaterializedKnnIndex {
    fn knn_query<'a>(
        &'a self,
        relation: &'a Relation<NumberVector>,
        function: &'a dyn DistanceFunction,
        hints: &QueryHints,
    ) -> Option<Box<dyn KnnQuery + 'a>> {
        self.accepts(relation, function, hints)
            .then(|| Box::new(MaterializedKnnQuery::new(self, relation, function)) as Box<dyn KnnQuery + 'a>)
    }
}

impl RknnIndex for MaterializedKnnIndex {
    fn rknn_query<'a>(
        &'a self,
        relation: &'a Relation<NumberVector>,
        function: &'a dyn DistanceFunction,
        hints: &QueryHints,
    ) -> Option<Box<dyn RknnQuery + 'a>> {
        if !self.accepts(relation, function, hints) {
            return None;
        }
        let fallback = LinearScanRknnQuery::new(
            Box::new(LinearScanDistanceQuery::new(relation, function)),
            Box::new(MaterializedKnnQuery::new(self, relation, function)),
        );
        Some(Box::new(MaterializedRknnQuery { index: self, fallback }))
    }
}

/// kNN query answered from materialized lists.
struct MaterializedKnnQuery<'a> {
    index: &'a MaterializedKnnIndex,
    fallback: LinearScanKnnQuery<'a>,
}

impl<'a> MaterializedKnnQuery<'a> {
    fn new(
        index: &'a MaterializedKnnIndex,
        relation: &'a Relation<NumberVector>,
        function: &'a dyn DistanceFunction,
    ) -> Self {
        let fallback = LinearScanKnnQuery::new(Box::new(LinearScanDistanceQuery::new(relation, function)));
        Self { index, fallback }
    }
}

impl KnnQuery for MaterializedKnnQuery<'_> {
    fn knn_for_id(&self, id: DbId, k: usize) -> Result<Vec<Neighbor>, VectorError> {
        check_k(k)?;
        if k > self.index.k {
            debug!(index = %self.index.name, k, "scan for k above materialized size");
            return self.fallback.knn_for_id(id, k);
        }
        let list = self.index.lists.get(&id).ok_or(CoreError::NotFound(id))?;
        Ok(list.iter().take(k).copied().collect())
    }

    fn knn_for_object(&self, object: &NumberVector, k: usize) -> Result<Vec<Neighbor>, VectorError> {
        self.fallback.knn_for_object(object, k)
    }
}

/// Reverse kNN query answered by inverting materialized lists.
struct MaterializedRknnQuery<'a> {
    index: &'a MaterializedKnnIndex,
    fallback: LinearScanRknnQuery<'a>,
}

impl RknnQuery for MaterializedRknnQuery<'_> {
    fn rknn_for_id(&self, id: DbId, k: usize) -> Result<Vec<Neighbor>, VectorError> {
        check_k(k)?;
        if k > self.index.k {
            return self.fallback.rknn_for_id(id, k);
        }
        if !self.index.lists.contains_key(&id) {
            return Err(CoreError::NotFound(id).into());
        }
        let mut result: Vec<Neighbor> = self
            .index
            .lists
            .iter()
            .filter_map(|(&owner, list)| {
                list.iter().take(k).find(|n| n.id == id).map(|n| Neighbor::new(owner, n.distance))
            })
            .collect();
        sort_neighbors(&mut result);
        Ok(result)
    }

    fn rknn_for_object(&self, object: &NumberVector, k: usize) -> Result<Vec<Neighbor>, VectorError> {
        self.fallback.rknn_for_object(object, k)
    }
}

/// Factory for [`MaterializedKnnIndex`].
#[derive(Debug, Clone)]
pub struct MaterializedKnnIndexFactory {
    function: Arc<dyn DistanceFunction>,
    k: usize,
}

impl MaterializedKnnIndexFactory {
    /// Create a factory materializing `k` neighbors under `function`.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::InvalidParameter`] if `k` is zero.
    pub fn new(function: Arc<dyn DistanceFunction>, k: usize) -> Result<Self, VectorError> {
        check_k(k)?;
        Ok(Self { function, k })
    }
}

impl IndexFactory for MaterializedKnnIndexFactory {
    fn name(&self) -> &str {
        "materialized-knn"
    }

    fn instantiate(&self, relation: &Relation<NumberVector>) -> Result<Box<dyn Index>, VectorError> {
        let mut index = MaterializedKnnIndex::new(relation.name(), Arc::clone(&self.function), self.k)?;
        let ids: Vec<DbId> = relation.ids().collect();
        index.insert(relation, &ids)?;
        Ok(Box::new(index))
    }
}
