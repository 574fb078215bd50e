//! Query resolution tests.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use proxdb::{
    exhaustive_edge_weights, Database, DbId, DistanceFunction, DistanceMetric, MaterializedKnnIndex,
    MaterializedKnnIndexFactory, Neighbor, NumberVector, PrecomputedDistanceIndexFactory, QueryHints,
    SimilarityMeasure, TypeInformation,
};

fn vector(data: &[f64]) -> NumberVector {
    NumberVector::new(data.to_vec()).expect("failed to create vector")
}

fn random_vectors(seed: u64, count: usize, dim: usize) -> Vec<NumberVector> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| vector(&(0..dim).map(|_| rng.gen_range(-10.0..10.0)).collect::<Vec<f64>>()))
        .collect()
}

fn ids_of(neighbors: &[Neighbor]) -> Vec<DbId> {
    neighbors.iter().map(|n| n.id).collect()
}

fn triangle() -> (Database, Vec<DbId>) {
    let mut db = Database::in_memory();
    let ids = db
        .insert_vectors(vec![vector(&[1.0, 0.0]), vector(&[0.0, 1.0]), vector(&[5.0, 5.0])])
        .expect("failed to insert");
    (db, ids)
}

// ============================================================================
// Linear scan fallback
// ============================================================================

#[test]
fn test_knn_nearest_other_object() {
    let (db, ids) = triangle();
    let metric = DistanceMetric::Euclidean;
    let knn = db.knn_query(&metric, QueryHints::NONE).expect("resolution failed").expect("no query");

    let neighbors = knn.knn_for_id(ids[0], 2).expect("query failed");
    assert_eq!(ids_of(&neighbors), vec![ids[0], ids[1]]);
    assert_eq!(neighbors[0].distance, 0.0);

    let by_object = knn.knn_for_object(&vector(&[1.0, 0.0]), 1).expect("query failed");
    assert_eq!(ids_of(&by_object), vec![ids[0]]);
}

#[test]
fn test_optimized_only_without_index_is_unavailable() {
    let (db, _) = triangle();
    let metric = DistanceMetric::Euclidean;

    assert!(db.distance_query(&metric, QueryHints::OPTIMIZED_ONLY).expect("resolution failed").is_none());
    assert!(db.knn_query(&metric, QueryHints::OPTIMIZED_ONLY).expect("resolution failed").is_none());
    assert!(db.range_query(&metric, QueryHints::OPTIMIZED_ONLY).expect("resolution failed").is_none());
    assert!(db.rknn_query(&metric, QueryHints::OPTIMIZED_ONLY).expect("resolution failed").is_none());
}

#[test]
fn test_range_query_is_inclusive() {
    let (db, ids) = triangle();
    let metric = DistanceMetric::Euclidean;
    let range = db.range_query(&metric, QueryHints::NONE).expect("resolution failed").expect("no query");

    let within = range.range_for_id(ids[0], 2.0_f64.sqrt()).expect("query failed");
    assert_eq!(ids_of(&within), vec![ids[0], ids[1]]);

    let none = range.range_for_object(&vector(&[100.0, 100.0]), 1.0).expect("query failed");
    assert!(none.is_empty());
}

#[test]
fn test_rknn_fallback_inverts_knn() {
    let (db, ids) = triangle();
    let metric = DistanceMetric::Euclidean;
    let rknn = db.rknn_query(&metric, QueryHints::NONE).expect("resolution failed").expect("no query");

    // 2-NN lists: 0 -> [0, 1], 1 -> [1, 0], 2 -> [2, 0]
    let of_first: BTreeSet<DbId> = ids_of(&rknn.rknn_for_id(ids[0], 2).expect("query failed")).into_iter().collect();
    assert_eq!(of_first, ids.iter().copied().collect());

    let of_far: Vec<DbId> = ids_of(&rknn.rknn_for_id(ids[2], 2).expect("query failed"));
    assert_eq!(of_far, vec![ids[2]]);
}

#[test]
fn test_distance_and_similarity() {
    let (db, ids) = triangle();
    let metric = DistanceMetric::Manhattan;
    let distances = db.distance_query(&metric, QueryHints::NONE).expect("resolution failed").expect("no query");
    assert_eq!(distances.distance(ids[0], ids[2]).expect("query failed"), 9.0);

    let cosine = SimilarityMeasure::Cosine;
    let similarity =
        db.similarity_query(&cosine, QueryHints::NONE).expect("resolution failed").expect("no query");
    assert!(similarity.similarity(ids[0], ids[1]).expect("query failed").abs() < 1e-12);
    assert!((similarity.similarity(ids[2], ids[2]).expect("query failed") - 1.0).abs() < 1e-12);
}

#[test]
fn test_unknown_identifier_is_not_found() {
    let (db, _) = triangle();
    let metric = DistanceMetric::Euclidean;
    let knn = db.knn_query(&metric, QueryHints::NONE).expect("resolution failed").expect("no query");
    assert!(knn.knn_for_id(DbId::new(99), 1).is_err());
}

// ============================================================================
// Index-backed resolution
// ============================================================================

fn indexed_database(metric: &Arc<dyn DistanceFunction>, k: usize) -> Database {
    Database::builder()
        .index(Arc::new(PrecomputedDistanceIndexFactory::new(Arc::clone(metric))))
        .index(Arc::new(MaterializedKnnIndexFactory::new(Arc::clone(metric), k).expect("bad k")))
        .build()
}

#[test]
fn test_index_answers_match_linear_scan() {
    super::init_tracing();
    let metric: Arc<dyn DistanceFunction> = Arc::new(DistanceMetric::Euclidean);
    let data = random_vectors(7, 60, 3);

    let mut indexed = indexed_database(&metric, 5);
    let mut plain = Database::in_memory();
    let ids = indexed.insert_vectors(data.clone()).expect("failed to insert");
    plain.insert_vectors(data).expect("failed to insert");

    for id in ids.iter().step_by(7) {
        indexed.delete(*id).expect("failed to delete");
        plain.delete(*id).expect("failed to delete");
    }

    let fast = indexed.knn_query(metric.as_ref(), QueryHints::OPTIMIZED_ONLY).expect("resolution failed").expect("no index");
    let slow = plain.knn_query(metric.as_ref(), QueryHints::NONE).expect("resolution failed").expect("no query");
    let fast_range = indexed.range_query(metric.as_ref(), QueryHints::OPTIMIZED_ONLY).expect("resolution failed").expect("no index");
    let slow_range = plain.range_query(metric.as_ref(), QueryHints::NONE).expect("resolution failed").expect("no query");
    let fast_rknn = indexed.rknn_query(metric.as_ref(), QueryHints::OPTIMIZED_ONLY).expect("resolution failed").expect("no index");
    let slow_rknn = plain.rknn_query(metric.as_ref(), QueryHints::NONE).expect("resolution failed").expect("no query");

    for id in plain.ids() {
        assert_eq!(
            ids_of(&fast.knn_for_id(id, 5).expect("query failed")),
            ids_of(&slow.knn_for_id(id, 5).expect("query failed"))
        );
        assert_eq!(
            ids_of(&fast_range.range_for_id(id, 6.0).expect("query failed")),
            ids_of(&slow_range.range_for_id(id, 6.0).expect("query failed"))
        );
        let a: BTreeSet<DbId> = ids_of(&fast_rknn.rknn_for_id(id, 5).expect("query failed")).into_iter().collect();
        let b: BTreeSet<DbId> = ids_of(&slow_rknn.rknn_for_id(id, 5).expect("query failed")).into_iter().collect();
        assert_eq!(a, b);
    }
}

#[test]
fn test_index_declines_other_function() {
    let metric: Arc<dyn DistanceFunction> = Arc::new(DistanceMetric::Euclidean);
    let mut db = indexed_database(&metric, 3);
    db.insert_vectors(random_vectors(1, 10, 2)).expect("failed to insert");

    let manhattan = DistanceMetric::Manhattan;
    assert!(db.knn_query(&manhattan, QueryHints::OPTIMIZED_ONLY).expect("resolution failed").is_none());
    assert!(db.knn_query(&manhattan, QueryHints::NONE).expect("resolution failed").is_some());
}

#[test]
fn test_max_neighbors_hint_above_materialized_k() {
    let metric: Arc<dyn DistanceFunction> = Arc::new(DistanceMetric::Euclidean);
    let mut db = indexed_database(&metric, 3);
    db.insert_vectors(random_vectors(2, 10, 2)).expect("failed to insert");

    let within = QueryHints::OPTIMIZED_ONLY.with_max_neighbors(3);
    let beyond = QueryHints::OPTIMIZED_ONLY.with_max_neighbors(4);
    assert!(db.knn_query(metric.as_ref(), within).expect("resolution failed").is_some());
    assert!(db.knn_query(metric.as_ref(), beyond).expect("resolution failed").is_none());

    // the reverse kNN fallback passes the hint on and still answers
    let rknn = db.rknn_query(metric.as_ref(), beyond.allow_fallback()).expect("resolution failed");
    assert!(rknn.is_some());
}

#[test]
fn test_manual_index_requires_empty_database() {
    let metric: Arc<dyn DistanceFunction> = Arc::new(DistanceMetric::Euclidean);
    let mut db = Database::in_memory();
    let index = MaterializedKnnIndex::new("vector", Arc::clone(&metric), 2).expect("bad k");
    db.add_index(Box::new(index)).expect("failed to add index");

    db.insert_vectors(random_vectors(3, 8, 2)).expect("failed to insert");
    assert!(db.knn_query(metric.as_ref(), QueryHints::OPTIMIZED_ONLY).expect("resolution failed").is_some());
    assert_eq!(db.indexes().next().map(|i| i.len()), Some(8));

    let late = MaterializedKnnIndex::new("vector", Arc::clone(&metric), 4).expect("bad k");
    let err = db.add_index(Box::new(late)).expect_err("late index should fail");
    assert!(err.is_configuration_error());
}

#[test]
fn test_removed_index_no_longer_serves() {
    let metric: Arc<dyn DistanceFunction> = Arc::new(DistanceMetric::Euclidean);
    let mut db = indexed_database(&metric, 3);
    db.insert_vectors(random_vectors(4, 10, 2)).expect("failed to insert");

    let name = db
        .indexes()
        .find(|i| i.as_knn_index().is_some())
        .map(|i| i.name().to_owned())
        .expect("no knn index");
    assert!(db.remove_index(&name).is_some());
    assert!(db.remove_index(&name).is_none());
    assert!(db.knn_query(metric.as_ref(), QueryHints::OPTIMIZED_ONLY).expect("resolution failed").is_none());
}

#[test]
fn test_query_restricted_to_function_input_type() {
    let mut db = Database::in_memory();
    db.insert_vectors(random_vectors(5, 4, 2)).expect("failed to insert");
    let relation = db.relation::<NumberVector>(&TypeInformation::any_vector()).expect("no relation");
    assert_eq!(relation.len(), 4);
    assert!(db.similarity_query(&SimilarityMeasure::DotProduct, QueryHints::NONE).expect("resolution failed").is_some());
}

// ============================================================================
// Concurrent readers
// ============================================================================

#[test]
fn test_queries_from_worker_threads() {
    let mut db = Database::in_memory();
    db.insert_vectors(random_vectors(6, 200, 4)).expect("failed to insert");
    let metric = DistanceMetric::Euclidean;
    let knn = db.knn_query(&metric, QueryHints::NONE.with_bulk()).expect("resolution failed").expect("no query");
    let all: Vec<DbId> = db.ids().collect();

    let expected = knn.knn_for_bulk(&all, 3).expect("bulk query failed");
    let results: Vec<Vec<Neighbor>> = thread::scope(|s| {
        let workers: Vec<_> = all
            .chunks(50)
            .map(|chunk| {
                let knn = &knn;
                s.spawn(move || knn.knn_for_bulk(chunk, 3).expect("bulk query failed"))
            })
            .collect();
        workers.into_iter().flat_map(|w| w.join().expect("worker panicked")).collect()
    });
    assert_eq!(results, expected);
}

// ============================================================================
// Edge weighting
// ============================================================================

#[test]
fn test_edge_weights_over_database_relations() {
    super::init_tracing();
    let (db, ids) = triangle();
    let metric = DistanceMetric::Euclidean;
    let distances = db.distance_query(&metric, QueryHints::NONE).expect("resolution failed").expect("no query");
    let attributes = db.relation::<NumberVector>(&TypeInformation::vector(2)).expect("no relation");

    let weights = exhaustive_edge_weights(distances.as_ref(), attributes, 0.5, 1).expect("weighting failed");
    assert_eq!(weights.ids(), ids.as_slice());
    assert_eq!(weights.neighbors(2).map(ids_of), Some(vec![ids[0]]));
    for i in 0..3 {
        let sum: f64 = weights.column(i).sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }
}
