//! Query resolution.
//!
//! Each `*_query` method picks the vector relation the function accepts,
//! then asks the attached indexes, most recently attached first, for a
//! query of the requested capability. The first index that returns one
//! wins. If none does, the result is a linear scan, unless the hints ask
//! for index-backed queries only, in which case the result is `None`.

use tracing::debug;

use proxdb_core::{NumberVector, Relation, TypeInformation};
use proxdb_vector::query::{
    LinearScanDistanceQuery, LinearScanKnnQuery, LinearScanRangeQuery, LinearScanRknnQuery,
    LinearScanSimilarityQuery,
};
use proxdb_vector::{
    DistanceFunction, DistanceQuery, Index, KnnQuery, QueryHints, RangeQuery, RknnQuery,
    SimilarityFunction, SimilarityQuery,
};

use crate::database::Database;
use crate::error::Result;

impl Database {
    /// A distance query for `function` over the first matching vector relation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedType`](crate::Error::UnsupportedType) if no
    /// relation satisfies the function's input type.
    pub fn distance_query<'a>(
        &'a self,
        function: &'a dyn DistanceFunction,
        hints: QueryHints,
    ) -> Result<Option<Box<dyn DistanceQuery + 'a>>> {
        let relation = self.query_relation(&function.input_type())?;
        if let Some(query) = self.from_indexes("distance", |index| {
            index.as_distance_index()?.distance_query(relation, function, &hints)
        }) {
            return Ok(Some(query));
        }
        if hints.optimized_only {
            debug!(function = function.name(), "no index serves distance query");
            return Ok(None);
        }
        debug!(function = function.name(), ?hints, "distance query falls back to linear scan");
        Ok(Some(Box::new(LinearScanDistanceQuery::new(relation, function))))
    }

    /// A similarity query for `function`.
    ///
    /// Similarity queries are always answered by a linear scan, so
    /// optimized-only hints yield `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedType`](crate::Error::UnsupportedType) if no
    /// relation satisfies the function's input type.
    pub fn similarity_query<'a>(
        &'a self,
        function: &'a dyn SimilarityFunction,
        hints: QueryHints,
    ) -> Result<Option<Box<dyn SimilarityQuery + 'a>>> {
        let relation = self.query_relation(&function.input_type())?;
        if hints.optimized_only {
            debug!(function = function.name(), "similarity queries have no index path");
            return Ok(None);
        }
        Ok(Some(Box::new(LinearScanSimilarityQuery::new(relation, function))))
    }

    /// A k-nearest-neighbor query for `function`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedType`](crate::Error::UnsupportedType) if no
    /// relation satisfies the function's input type.
    pub fn knn_query<'a>(
        &'a self,
        function: &'a dyn DistanceFunction,
        hints: QueryHints,
    ) -> Result<Option<Box<dyn KnnQuery + 'a>>> {
        let relation = self.query_relation(&function.input_type())?;
        if hints.optimized_only {
            let query = self.indexed_knn(relation, function, &hints);
            if query.is_none() {
                debug!(function = function.name(), "no index serves kNN query");
            }
            return Ok(query);
        }
        Ok(Some(self.best_knn(relation, function, &hints)))
    }

    /// A range query for `function`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedType`](crate::Error::UnsupportedType) if no
    /// relation satisfies the function's input type.
    pub fn range_query<'a>(
        &'a self,
        function: &'a dyn DistanceFunction,
        hints: QueryHints,
    ) -> Result<Option<Box<dyn RangeQuery + 'a>>> {
        let relation = self.query_relation(&function.input_type())?;
        if let Some(query) = self.from_indexes("range", |index| {
            index.as_range_index()?.range_query(relation, function, &hints)
        }) {
            return Ok(Some(query));
        }
        if hints.optimized_only {
            debug!(function = function.name(), "no index serves range query");
            return Ok(None);
        }
        debug!(function = function.name(), ?hints, "range query falls back to linear scan");
        let distances = self.best_distance(relation, function, &hints);
        Ok(Some(Box::new(LinearScanRangeQuery::new(distances))))
    }

    /// A reverse k-nearest-neighbor query for `function`.
    ///
    /// Without a capable index the query is composed from a bulk kNN query
    /// (itself possibly index-backed): an object answers a query point if
    /// the point is among the object's own k nearest neighbors. The
    /// `max_neighbors` hint is passed on to the kNN query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedType`](crate::Error::UnsupportedType) if no
    /// relation satisfies the function's input type.
    pub fn rknn_query<'a>(
        &'a self,
        function: &'a dyn DistanceFunction,
        hints: QueryHints,
    ) -> Result<Option<Box<dyn RknnQuery + 'a>>> {
        let relation = self.query_relation(&function.input_type())?;
        if let Some(query) = self.from_indexes("rknn", |index| {
            index.as_rknn_index()?.rknn_query(relation, function, &hints)
        }) {
            return Ok(Some(query));
        }
        if hints.optimized_only {
            debug!(function = function.name(), "no index serves reverse kNN query");
            return Ok(None);
        }
        debug!(function = function.name(), ?hints, "reverse kNN query composed from bulk kNN");
        let knn_hints = hints.with_bulk();
        let distances = self.best_distance(relation, function, &knn_hints);
        let knn = self.best_knn(relation, function, &knn_hints);
        Ok(Some(Box::new(LinearScanRknnQuery::new(distances, knn))))
    }

    fn query_relation(&self, restriction: &TypeInformation) -> Result<&Relation<NumberVector>> {
        self.relation::<NumberVector>(restriction)
    }

    /// The first query an attached index offers, newest index first.
    fn from_indexes<'a, Q, F>(&'a self, capability: &str, mut serve: F) -> Option<Box<Q>>
    where
        Q: ?Sized + 'a,
        F: FnMut(&'a dyn Index) -> Option<Box<Q>>,
    {
        self.indexes.newest_first().find_map(|index| {
            let query = serve(index)?;
            debug!(index = index.name(), capability, "query served by index");
            Some(query)
        })
    }

    fn indexed_knn<'a>(
        &'a self,
        relation: &'a Relation<NumberVector>,
        function: &'a dyn DistanceFunction,
        hints: &QueryHints,
    ) -> Option<Box<dyn KnnQuery + 'a>> {
        self.from_indexes("knn", |index| index.as_knn_index()?.knn_query(relation, function, hints))
    }

    fn best_knn<'a>(
        &'a self,
        relation: &'a Relation<NumberVector>,
        function: &'a dyn DistanceFunction,
        hints: &QueryHints,
    ) -> Box<dyn KnnQuery + 'a> {
        if let Some(query) = self.indexed_knn(relation, function, hints) {
            return query;
        }
        debug!(function = function.name(), ?hints, "kNN query falls back to linear scan");
        Box::new(LinearScanKnnQuery::new(self.best_distance(relation, function, hints)))
    }

    fn best_distance<'a>(
        &'a self,
        relation: &'a Relation<NumberVector>,
        function: &'a dyn DistanceFunction,
        hints: &QueryHints,
    ) -> Box<dyn DistanceQuery + 'a> {
        let indexed = self.from_indexes("distance", |index| {
            index.as_distance_index()?.distance_query(relation, function, hints)
        });
        match indexed {
            Some(query) => query,
            None => Box::new(LinearScanDistanceQuery::new(relation, function)),
        }
    }
}
