//! Property-based tests for ProxDB invariants.
//!
//! These tests verify that certain properties always hold regardless
//! of the dataset or the order of insertions and deletions.

use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use proxdb::{
    Database, DbId, DistanceFunction, DistanceMetric, MaterializedKnnIndexFactory, Neighbor, NumberVector,
    PrecomputedDistanceIndexFactory, QueryHints, TypeInformation,
};

fn vectors(points: &[(f64, f64)]) -> Vec<NumberVector> {
    points.iter().map(|&(x, y)| NumberVector::new(vec![x, y]).expect("failed")).collect()
}

fn ids_of(neighbors: &[Neighbor]) -> Vec<DbId> {
    neighbors.iter().map(|n| n.id).collect()
}

fn points(max: usize) -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((-100.0..100.0f64, -100.0..100.0f64), 2..max)
}

#[derive(Debug, Clone)]
enum Op {
    Insert(f64, f64),
    Delete(usize),
}

fn operations() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            (-50.0..50.0f64, -50.0..50.0f64).prop_map(|(x, y)| Op::Insert(x, y)),
            any::<usize>().prop_map(Op::Delete),
        ],
        1..60,
    )
}

// ============================================================================
// Identifier Invariants
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// No two live objects share an identifier, whatever the insert/delete order
    #[test]
    fn prop_live_identifiers_unique(ops in operations()) {
        let mut db = Database::in_memory();
        let mut live: Vec<DbId> = Vec::new();

        for op in ops {
            match op {
                Op::Insert(x, y) => {
                    let id = db.insert_vectors(vectors(&[(x, y)])).expect("failed")[0];
                    prop_assert!(!live.contains(&id), "identifier {} handed out twice", id);
                    live.push(id);
                }
                Op::Delete(i) if !live.is_empty() => {
                    let id = live.swap_remove(i % live.len());
                    db.delete(id).expect("failed");
                }
                Op::Delete(_) => {}
            }
        }

        let stored: BTreeSet<DbId> = db.ids().collect();
        prop_assert_eq!(stored, live.iter().copied().collect::<BTreeSet<_>>());
        let relation = db.relation::<NumberVector>(&TypeInformation::any_vector());
        if let Ok(relation) = relation {
            prop_assert_eq!(relation.len(), db.len());
        }
    }

    /// Deleting and reinserting matches a fresh database with the surviving objects
    #[test]
    fn prop_reinsertion_consistent(data in points(30), delete_mask in prop::collection::vec(any::<bool>(), 30)) {
        let mut db = Database::in_memory();
        let ids = db.insert_vectors(vectors(&data)).expect("failed");

        let mut survivors = Vec::new();
        for (i, id) in ids.iter().enumerate() {
            if delete_mask[i] {
                db.delete(*id).expect("failed");
            } else {
                survivors.push(data[i]);
            }
        }
        let added = db.insert_vectors(vectors(&[(0.5, 0.5)])).expect("failed");
        survivors.push((0.5, 0.5));

        let mut fresh = Database::in_memory();
        fresh.insert_vectors(vectors(&survivors)).expect("failed");

        prop_assert_eq!(db.len(), fresh.len());
        prop_assert!(db.contains(added[0]));
        prop_assert_eq!(db.ids().count(), db.len());
    }
}

// ============================================================================
// Query Invariants
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Index-backed kNN and range answers equal the linear scan answers
    #[test]
    fn prop_index_matches_scan(data in points(40), k in 1usize..6, radius in 0.0..80.0f64) {
        let metric: Arc<dyn DistanceFunction> = Arc::new(DistanceMetric::Euclidean);
        let mut indexed = Database::builder()
            .index(Arc::new(PrecomputedDistanceIndexFactory::new(Arc::clone(&metric))))
            .index(Arc::new(MaterializedKnnIndexFactory::new(Arc::clone(&metric), 5).expect("failed")))
            .build();
        let mut plain = Database::in_memory();
        indexed.insert_vectors(vectors(&data)).expect("failed");
        plain.insert_vectors(vectors(&data)).expect("failed");

        let hints = QueryHints::OPTIMIZED_ONLY.with_max_neighbors(k);
        let fast = indexed.knn_query(metric.as_ref(), hints).expect("failed").expect("no index");
        let slow = plain.knn_query(metric.as_ref(), QueryHints::NONE).expect("failed").expect("failed");
        let fast_range = indexed.range_query(metric.as_ref(), hints).expect("failed").expect("no index");
        let slow_range = plain.range_query(metric.as_ref(), QueryHints::NONE).expect("failed").expect("failed");

        for id in plain.ids() {
            let a = fast.knn_for_id(id, k).expect("failed");
            let b = slow.knn_for_id(id, k).expect("failed");
            prop_assert_eq!(ids_of(&a), ids_of(&b));
            prop_assert_eq!(a.len(), k.min(data.len()));
            let a = fast_range.range_for_id(id, radius).expect("failed");
            let b = slow_range.range_for_id(id, radius).expect("failed");
            prop_assert_eq!(ids_of(&a), ids_of(&b));
        }
    }

    /// A is a reverse neighbor of Q exactly when Q is among A's k nearest neighbors
    #[test]
    fn prop_rknn_inverts_knn(data in points(30), k in 1usize..5) {
        let mut db = Database::in_memory();
        db.insert_vectors(vectors(&data)).expect("failed");
        let metric = DistanceMetric::Euclidean;
        let knn = db.knn_query(&metric, QueryHints::NONE).expect("failed").expect("failed");
        let rknn = db.rknn_query(&metric, QueryHints::NONE.with_max_neighbors(k)).expect("failed").expect("failed");

        let lists: BTreeMap<DbId, Vec<DbId>> = db
            .ids()
            .map(|id| (id, ids_of(&knn.knn_for_id(id, k).expect("failed"))))
            .collect();

        for query in db.ids() {
            let reverse: BTreeSet<DbId> = ids_of(&rknn.rknn_for_id(query, k).expect("failed")).into_iter().collect();
            let expected: BTreeSet<DbId> = lists
                .iter()
                .filter(|(_, list)| list.contains(&query))
                .map(|(owner, _)| *owner)
                .collect();
            prop_assert_eq!(reverse, expected);
        }
    }
}

// ============================================================================
// Partition Invariants
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Mutating a partition never changes the source database
    #[test]
    fn prop_partition_isolated(data in points(30), take in 1usize..30, seed in any::<u64>()) {
        let mut db = Database::in_memory();
        db.insert_vectors(vectors(&data)).expect("failed");
        let before: Vec<DbId> = db.ids().collect();

        let chosen: Vec<DbId> = db
            .random_sample(take.min(db.len()), seed)
            .expect("failed")
            .into_iter()
            .collect();
        let mut part = db.partition_one(&chosen).expect("failed");
        for id in &chosen {
            part.delete(*id).expect("failed");
        }
        part.insert_vectors(vectors(&[(1.0, 1.0), (2.0, 2.0)])).expect("failed");

        prop_assert_eq!(db.ids().collect::<Vec<_>>(), before);
        for id in &chosen {
            prop_assert!(db.get_bundle(*id).is_ok());
        }
    }
}
