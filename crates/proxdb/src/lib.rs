//! `ProxDB` - An In-Memory Object Database with Proximity Queries
//!
//! ProxDB stores feature vectors and their associations column-wise and
//! answers distance, similarity, k-nearest-neighbor, range and reverse
//! k-nearest-neighbor queries. Each query is served by the most recently
//! attached index able to serve it, or by an exact linear scan.
//!
//! # Features
//!
//! - **Typed relations**: one column per attribute, created on first use
//! - **Index resolution**: newest capable index wins, scans as fallback
//! - **Events**: insertion and removal notifications with batched delivery
//! - **Partitioning**: independent sub-databases that keep object identifiers
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use proxdb::{Database, DistanceMetric, MaterializedKnnIndexFactory, NumberVector, QueryHints};
//!
//! let metric = Arc::new(DistanceMetric::Euclidean);
//! let mut db = Database::builder()
//!     .index(Arc::new(MaterializedKnnIndexFactory::new(metric.clone(), 10)?))
//!     .build();
//!
//! let ids = db.insert_vectors(vec![
//!     NumberVector::new(vec![1.0, 0.0])?,
//!     NumberVector::new(vec![0.0, 1.0])?,
//!     NumberVector::new(vec![5.0, 5.0])?,
//! ])?;
//!
//! if let Some(knn) = db.knn_query(metric.as_ref(), QueryHints::NONE)? {
//!     for neighbor in knn.knn_for_id(ids[0], 2)? {
//!         println!("{} at {}", neighbor.id, neighbor.distance);
//!     }
//! }
//! ```
//!
//! ## Batched events
//!
//! ```ignore
//! db.accumulate_events();
//! for chunk in chunks {
//!     db.insert_vectors(chunk)?;
//! }
//! db.flush_events(); // listeners see one insertion event
//! ```

#![deny(clippy::unwrap_used)]

pub mod config;
pub mod database;
pub mod error;
pub mod events;
pub mod index_registry;
mod resolver;
pub mod weighting;

pub use config::{Config, DatabaseBuilder};
pub use database::Database;
pub use error::{Error, Result};
pub use events::{
    DataStoreEvent, DataStoreEventKind, DataStoreListener, EventManager, ListenerResult, ResultEvent,
    ResultListener,
};
pub use index_registry::IndexRegistry;
pub use weighting::{exhaustive_edge_weights, EdgeWeights};

pub use proxdb_core::{
    AnyRelation, BundleMeta, ClassLabel, DbId, ExternalId, NumberVector, ObjectBundle, ObjectMetadata, Relation,
    SingleObjectBundle, TypeInformation, Value,
};
pub use proxdb_vector::{
    DistanceFunction, DistanceMetric, DistanceQuery, Index, IndexFactory, KnnQuery,
    MaterializedKnnIndex, MaterializedKnnIndexFactory, MinkowskiDistance, Neighbor,
    PrecomputedDistanceIndex, PrecomputedDistanceIndexFactory, QueryHints, RangeQuery, RknnQuery,
    SimilarityFunction, SimilarityMeasure, SimilarityQuery, VectorError,
};
