//! Index capability traits and reference indexes.
//!
//! An [`Index`] is a derived structure over one relation. It declares what it
//! can accelerate by returning `Some` from the matching `as_*_index` method;
//! the database walks its indexes and asks each capable one for a query.
//! An index may decline (return `None`) when it was built for another
//! function or relation, or when the hints ask for more than it holds.
//!
//! # Reference indexes
//!
//! - [`MaterializedKnnIndex`] - precomputed k-nearest-neighbor lists (kNN and reverse kNN)
//! - [`PrecomputedDistanceIndex`] - cached pairwise distances (distance and range)

mod distance;
mod knn;

pub use distance::{PrecomputedDistanceIndex, PrecomputedDistanceIndexFactory};
pub use knn::{MaterializedKnnIndex, MaterializedKnnIndexFactory};

use std::fmt;
use std::sync::Arc;

use proxdb_core::{DbId, NumberVector, Relation, TypeInformation};

use crate::distance::{same_function, DistanceFunction};
use crate::error::VectorError;
use crate::query::{DistanceQuery, KnnQuery, QueryHints, RangeQuery, RknnQuery};

/// A derived, incrementally maintained structure over one vector relation.
pub trait Index: fmt::Debug + Send + Sync {
    /// A unique, descriptive name.
    fn name(&self) -> &str;

    /// The name of the relation this index is built over.
    fn relation_name(&self) -> &str;

    /// Add objects that were just written to `relation`.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::RelationMismatch`] for a foreign relation, or
    /// `NotFound` if an identifier is not stored.
    fn insert(&mut self, relation: &Relation<NumberVector>, ids: &[DbId]) -> Result<(), VectorError>;

    /// Remove objects that are about to be deleted from `relation`.
    ///
    /// The objects are still stored when this is called.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::RelationMismatch`] for a foreign relation.
    fn delete(&mut self, relation: &Relation<NumberVector>, ids: &[DbId]) -> Result<(), VectorError>;

    /// Number of indexed objects.
    fn len(&self) -> usize;

    /// Returns `true` if nothing is indexed.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// This index as a distance index, if it is one.
    fn as_distance_index(&self) -> Option<&dyn DistanceIndex> {
        None
    }

    /// This index as a kNN index, if it is one.
    fn as_knn_index(&self) -> Option<&dyn KnnIndex> {
        None
    }

    /// This index as a range index, if it is one.
    fn as_range_index(&self) -> Option<&dyn RangeIndex> {
        None
    }

    /// This index as a reverse kNN index, if it is one.
    fn as_rknn_index(&self) -> Option<&dyn RknnIndex> {
        None
    }
}

/// Indexes that accelerate pairwise distances.
pub trait DistanceIndex: Send + Sync {
    /// A distance query served by this index, or `None` to decline.
    fn distance_query<'a>(
        &'a self,
        relation: &'a Relation<NumberVector>,
        function: &'a dyn DistanceFunction,
        hints: &QueryHints,
    ) -> Option<Box<dyn DistanceQuery + 'a>>;
}

/// Indexes that accelerate k-nearest-neighbor queries.
pub trait KnnIndex: Send + Sync {
    /// A kNN query served by this index, or `None` to decline.
    fn knn_query<'a>(
        &'a self,
        relation: &'a Relation<NumberVector>,
        function: &'a dyn DistanceFunction,
        hints: &QueryHints,
    ) -> Option<Box<dyn KnnQuery + 'a>>;
}

/// Indexes that accelerate range queries.
pub trait RangeIndex: Send + Sync {
    /// A range query served by this index, or `None` to decline.
    fn range_query<'a>(
        &'a self,
        relation: &'a Relation<NumberVector>,
        function: &'a dyn DistanceFunction,
        hints: &QueryHints,
    ) -> Option<Box<dyn RangeQuery + 'a>>;
}

/// Indexes that accelerate reverse k-nearest-neighbor queries.
pub trait RknnIndex: Send + Sync {
    /// A reverse kNN query served by this index, or `None` to decline.
    fn rknn_query<'a>(
        &'a self,
        relation: &'a Relation<NumberVector>,
        function: &'a dyn DistanceFunction,
        hints: &QueryHints,
    ) -> Option<Box<dyn RknnQuery + 'a>>;
}

/// Builds an index for a newly created relation.
pub trait IndexFactory: fmt::Debug + Send + Sync {
    /// The factory name.
    fn name(&self) -> &str;

    /// The relation type this factory can index.
    fn input_type(&self) -> TypeInformation {
        TypeInformation::any_vector()
    }

    /// Build an index over `relation`, including its current contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the current contents cannot be indexed.
    fn instantiate(&self, relation: &Relation<NumberVector>) -> Result<Box<dyn Index>, VectorError>;
}

/// The relation and distance function an index was built for.
#[derive(Debug, Clone)]
pub struct IndexBinding {
    relation: String,
    function: Arc<dyn DistanceFunction>,
}

impl IndexBinding {
    /// Bind to a relation by name.
    #[must_use]
    pub fn new(relation: impl Into<String>, function: Arc<dyn DistanceFunction>) -> Self {
        Self { relation: relation.into(), function }
    }

    /// The relation name.
    #[must_use]
    pub fn relation(&self) -> &str {
        &self.relation
    }

    /// The distance function.
    #[must_use]
    pub fn function(&self) -> &dyn DistanceFunction {
        self.function.as_ref()
    }

    /// Returns `true` if a query over `relation` with `function` can be served.
    #[must_use]
    pub fn serves(&self, relation: &Relation<NumberVector>, function: &dyn DistanceFunction) -> bool {
        relation.name() == self.relation && same_function(self.function.as_ref(), function)
    }

    /// Fail unless `relation` is the bound relation.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::RelationMismatch`] otherwise.
    pub fn check_relation(&self, index: &str, relation: &Relation<NumberVector>) -> Result<(), VectorError> {
        if relation.name() == self.relation {
            Ok(())
        } else {
            Err(VectorError::RelationMismatch {
                index: index.to_owned(),
                expected: self.relation.clone(),
                actual: relation.name().to_owned(),
            })
        }
    }
}
