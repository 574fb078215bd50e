//! Cached pairwise distances.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::debug;

use proxdb_core::{DbId, NumberVector, Relation};

use super::{DistanceIndex, Index, IndexBinding, IndexFactory, RangeIndex};
use crate::distance::DistanceFunction;
use crate::error::VectorError;
use crate::query::{checked_distance, DistanceQuery, LinearScanRangeQuery, QueryHints, RangeQuery};

/// Index caching the distance between every pair of stored objects.
///
/// Memory grows quadratically with the number of objects. The bound
/// function must be symmetric; each unordered pair is stored once.
#[derive(Debug)]
pub struct PrecomputedDistanceIndex {
    name: String,
    binding: IndexBinding,
    ids: BTreeSet<DbId>,
    distances: HashMap<(DbId, DbId), f64>,
}

fn pair(a: DbId, b: DbId) -> (DbId, DbId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl PrecomputedDistanceIndex {
    /// Create an empty index over the named relation.
    #[must_use]
    pub fn new(relation: impl Into<String>, function: Arc<dyn DistanceFunction>) -> Self {
        let binding = IndexBinding::new(relation, function);
        let name = format!("precomputed-distance({})@{}", binding.function().name(), binding.relation());
        Self { name, binding, ids: BTreeSet::new(), distances: HashMap::new() }
    }

    /// The cached distance between two indexed objects.
    #[must_use]
    pub fn cached(&self, a: DbId, b: DbId) -> Option<f64> {
        self.distances.get(&pair(a, b)).copied()
    }
}

impl Index for PrecomputedDistanceIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn relation_name(&self) -> &str {
        self.binding.relation()
    }

    fn insert(&mut self, relation: &Relation<NumberVector>, ids: &[DbId]) -> Result<(), VectorError> {
        self.binding.check_relation(&self.name, relation)?;
        let function = self.binding.function();
        for &id in ids {
            if !self.ids.insert(id) {
                continue;
            }
            let v = relation.get(id)?;
            for &other in &self.ids {
                let d = checked_distance(function, v, relation.get(other)?)?;
                self.distances.insert(pair(id, other), d);
            }
        }
        Ok(())
    }

    fn delete(&mut self, relation: &Relation<NumberVector>, ids: &[DbId]) -> Result<(), VectorError> {
        self.binding.check_relation(&self.name, relation)?;
        let removed: BTreeSet<DbId> = ids.iter().copied().collect();
        self.ids.retain(|id| !removed.contains(id));
        self.distances.retain(|(a, b), _| !removed.contains(a) && !removed.contains(b));
        Ok(())
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    fn as_distance_index(&self) -> Option<&dyn DistanceIndex> {
        Some(self)
    }

    fn as_range_index(&self) -> Option<&dyn RangeIndex> {
        Some(self)
    }
}

impl PrecomputedDistanceIndex {
    fn cached_query<'a>(
        &'a self,
        relation: &'a Relation<NumberVector>,
        function: &'a dyn DistanceFunction,
    ) -> Option<PrecomputedDistanceQuery<'a>> {
        if self.binding.serves(relation, function) {
            Some(PrecomputedDistanceQuery { index: self, relation, function })
        } else {
            debug!(index = %self.name, function = function.name(), relation = relation.name(), "declined: not bound to this function and relation");
            None
        }
    }
}

impl DistanceIndex for PrecomputedDistanceIndex {
    fn distance_query<'a>(
        &'a self,
        relation: &'a Relation<NumberVector>,
        function: &'a dyn DistanceFunction,
        _hints: &QueryHints,
    ) -> Option<Box<dyn DistanceQuery + 'a>> {
        self.cached_query(relation, function).map(|q| Box::new(q) as Box<dyn DistanceQuery + 'a>)
    }
}

impl RangeIndex for PrecomputedDistanceIndex {
    fn range_query<'a>(
        &'a self,
        relation: &'a Relation<NumberVector>,
        function: &'a dyn DistanceFunction,
        _hints: &QueryHints,
    ) -> Option<Box<dyn RangeQuery + 'a>> {
        self.cached_query(relation, function)
            .map(|q| Box::new(LinearScanRangeQuery::new(Box::new(q))) as Box<dyn RangeQuery + 'a>)
    }
}

/// Distance query reading the cache, computing only for unindexed objects.
struct PrecomputedDistanceQuery<'a> {
    index: &'a PrecomputedDistanceIndex,
    relation: &'a Relation<NumberVector>,
    function: &'a dyn DistanceFunction,
}

impl DistanceQuery for PrecomputedDistanceQuery<'_> {
    fn relation(&self) -> &Relation<NumberVector> {
        self.relation
    }

    fn distance_function(&self) -> &dyn DistanceFunction {
        self.function
    }

    fn distance(&self, a: DbId, b: DbId) -> Result<f64, VectorError> {
        match self.index.cached(a, b) {
            Some(d) => Ok(d),
            None => self.distance_objects(self.relation.get(a)?, self.relation.get(b)?),
        }
    }
}

/// Factory for [`PrecomputedDistanceIndex`].
#[derive(Debug, Clone)]
pub struct PrecomputedDistanceIndexFactory {
    function: Arc<dyn DistanceFunction>,
}

impl PrecomputedDistanceIndexFactory {
    /// Create a factory caching distances under `function`.
    #[must_use]
    pub fn new(function: Arc<dyn DistanceFunction>) -> Self {
        Self { function }
    }
}

impl IndexFactory for PrecomputedDistanceIndexFactory {
    fn name(&self) -> &str {
        "precomputed-distance"
    }

    fn instantiate(&self, relation: &Relation<NumberVector>) -> Result<Box<dyn Index>, VectorError> {
        let mut index = PrecomputedDistanceIndex::new(relation.name(), Arc::clone(&self.function));
        let ids: Vec<DbId> = relation.ids().collect();
        index.insert(relation, &ids)?;
        Ok(Box::new(index))
    }
}
