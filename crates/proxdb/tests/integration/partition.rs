//! Partitioning and sampling tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use proxdb::{
    ClassLabel, Database, DbId, DistanceFunction, DistanceMetric, MaterializedKnnIndexFactory, NumberVector,
    ObjectMetadata, QueryHints,
};

fn vector(data: &[f64]) -> NumberVector {
    NumberVector::new(data.to_vec()).expect("failed to create vector")
}

fn labelled(count: usize) -> Vec<(NumberVector, ObjectMetadata)> {
    (0..count)
        .map(|i| {
            let class = if i % 2 == 0 { "even" } else { "odd" };
            (vector(&[i as f64, 0.0]), ObjectMetadata::new().with_class_label(class))
        })
        .collect()
}

// ============================================================================
// Partitioning
// ============================================================================

#[test]
fn test_partition_by_class_keeps_identifiers_and_associations() {
    let mut db = Database::in_memory();
    let ids = db.insert_with_metadata(labelled(20)).expect("failed to insert");

    let mut groups: BTreeMap<String, Vec<DbId>> = BTreeMap::new();
    for id in &ids {
        let class = db.class_label(*id).expect("lookup failed").expect("unlabelled").as_str().to_owned();
        groups.entry(class).or_default().push(*id);
    }

    let parts = db.partition(&groups).expect("failed to partition");
    assert_eq!(parts.len(), 2);

    let even = &parts["even"];
    assert_eq!(even.len(), 10);
    for id in &groups["even"] {
        assert!(even.contains(*id));
        assert_eq!(even.class_label(*id).expect("lookup failed"), Some(&ClassLabel::new("even")));
        assert_eq!(
            even.get_bundle(*id).expect("missing object").values(),
            db.get_bundle(*id).expect("missing object").values()
        );
    }
}

#[test]
fn test_partitions_are_isolated_from_the_source() {
    let metric: Arc<dyn DistanceFunction> = Arc::new(DistanceMetric::Euclidean);
    let mut db = Database::builder()
        .index(Arc::new(MaterializedKnnIndexFactory::new(Arc::clone(&metric), 2).expect("bad k")))
        .build();
    let ids = db.insert_vectors((0..10).map(|i| vector(&[f64::from(i)])).collect()).expect("failed to insert");

    let mut part = db.partition_one(&ids[..5]).expect("failed to partition");
    part.delete(ids[0]).expect("failed to delete");
    let added = part.insert_vectors(vec![vector(&[100.0])]).expect("failed to insert");

    assert_eq!(db.len(), 10);
    assert!(db.contains(ids[0]));
    assert_eq!(db.indexes().next().map(|i| i.len()), Some(10));

    // the partition got its own index from the shared configuration
    assert_eq!(part.indexes().next().map(|i| i.len()), Some(5));
    assert!(part.knn_query(metric.as_ref(), QueryHints::OPTIMIZED_ONLY).expect("resolution failed").is_some());
    assert_eq!(added, vec![ids[0]]);
}

#[test]
fn test_partition_with_unknown_identifier_fails() {
    let mut db = Database::in_memory();
    db.insert_vectors(vec![vector(&[1.0])]).expect("failed to insert");
    let err = db.partition_one(&[DbId::new(5)]).expect_err("partition should fail");
    assert!(err.is_not_found());
}

#[test]
fn test_empty_partition() {
    let mut db = Database::in_memory();
    db.insert_vectors(vec![vector(&[1.0])]).expect("failed to insert");
    let part = db.partition_one(&[]).expect("failed to partition");
    assert!(part.is_empty());
}

// ============================================================================
// Random sampling
// ============================================================================

#[test]
fn test_random_sample_within_database() {
    let mut db = Database::in_memory();
    let ids = db.insert_vectors((0..30).map(|i| vector(&[f64::from(i)])).collect()).expect("failed to insert");

    let sample = db.random_sample(12, 99).expect("failed to sample");
    assert_eq!(sample.len(), 12);
    assert!(sample.iter().all(|id| ids.contains(id)));
    assert_eq!(sample, db.random_sample(12, 99).expect("failed to sample"));
    assert!(db.random_sample(0, 1).expect("failed to sample").is_empty());
    assert!(db.random_sample(31, 1).is_err());
}
