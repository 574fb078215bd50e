//! Event delivery tests.

use std::sync::{Arc, Mutex};

use proxdb::{
    DataStoreEvent, DataStoreEventKind, DataStoreListener, Database, DbId, DistanceFunction, DistanceMetric,
    Index, ListenerResult, MaterializedKnnIndex, MaterializedKnnIndexFactory, NumberVector, Relation, ResultEvent,
    ResultListener, TypeInformation, VectorError,
};

fn vector(data: &[f64]) -> NumberVector {
    NumberVector::new(data.to_vec()).expect("failed to create vector")
}

/// A shared, ordered log of what indexes and listeners saw.
type Log = Arc<Mutex<Vec<String>>>;

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<DataStoreEvent>>,
    log: Option<Log>,
}

impl Recorder {
    fn with_log(log: Log) -> Self {
        Self { events: Mutex::new(Vec::new()), log: Some(log) }
    }

    fn events(&self) -> Vec<DataStoreEvent> {
        self.events.lock().expect("poisoned").clone()
    }
}

impl DataStoreListener for Recorder {
    fn content_changed(&self, event: &DataStoreEvent) -> ListenerResult {
        if let Some(log) = &self.log {
            log.lock().expect("poisoned").push(format!("event {} {}", event.kind(), event.ids().len()));
        }
        self.events.lock().expect("poisoned").push(event.clone());
        Ok(())
    }
}

#[derive(Default)]
struct ResultRecorder(Mutex<Vec<ResultEvent>>);

impl ResultListener for ResultRecorder {
    fn result_changed(&self, event: &ResultEvent) -> ListenerResult {
        self.0.lock().expect("poisoned").push(event.clone());
        Ok(())
    }
}

struct Refusing;

impl DataStoreListener for Refusing {
    fn content_changed(&self, _event: &DataStoreEvent) -> ListenerResult {
        Err("not interested".into())
    }
}

struct Panicking;

impl DataStoreListener for Panicking {
    fn content_changed(&self, _event: &DataStoreEvent) -> ListenerResult {
        panic!("listener bug")
    }
}

/// Index that only counts its members and logs maintenance calls.
#[derive(Debug)]
struct CountingIndex {
    log: Log,
    members: usize,
}

impl Index for CountingIndex {
    fn name(&self) -> &str {
        "counting"
    }

    fn relation_name(&self) -> &str {
        "vector"
    }

    fn insert(&mut self, _relation: &Relation<NumberVector>, ids: &[DbId]) -> Result<(), VectorError> {
        self.members += ids.len();
        self.log.lock().expect("poisoned").push(format!("index now {}", self.members));
        Ok(())
    }

    fn delete(&mut self, _relation: &Relation<NumberVector>, ids: &[DbId]) -> Result<(), VectorError> {
        self.members -= ids.len();
        self.log.lock().expect("poisoned").push(format!("index now {}", self.members));
        Ok(())
    }

    fn len(&self) -> usize {
        self.members
    }
}

/// Index that refuses vectors with a negative first component.
#[derive(Debug, Default)]
struct NonNegative {
    members: usize,
}

impl Index for NonNegative {
    fn name(&self) -> &str {
        "non-negative"
    }

    fn relation_name(&self) -> &str {
        "vector"
    }

    fn insert(&mut self, relation: &Relation<NumberVector>, ids: &[DbId]) -> Result<(), VectorError> {
        for id in ids {
            if relation.get(*id)?.get(0).is_some_and(|x| x < 0.0) {
                return Err(VectorError::invalid_parameter(format!("negative vector for {id}")));
            }
        }
        self.members += ids.len();
        Ok(())
    }

    fn delete(&mut self, _relation: &Relation<NumberVector>, ids: &[DbId]) -> Result<(), VectorError> {
        self.members -= ids.len();
        Ok(())
    }

    fn len(&self) -> usize {
        self.members
    }
}

// ============================================================================
// Data store events
// ============================================================================

#[test]
fn test_each_insert_fires_one_event() {
    let recorder = Arc::new(Recorder::default());
    let mut db = Database::builder().listener(recorder.clone()).build();

    db.insert_vectors(vec![vector(&[1.0]), vector(&[2.0])]).expect("failed to insert");
    db.insert_vectors(vec![vector(&[3.0])]).expect("failed to insert");

    let events = recorder.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind(), DataStoreEventKind::Inserted);
    assert_eq!(events[0].ids(), &[DbId::new(0), DbId::new(1)]);
}

#[test]
fn test_accumulated_inserts_fire_one_event_after_indexes_are_updated() {
    super::init_tracing();
    let log: Log = Arc::default();
    let recorder = Arc::new(Recorder::with_log(Arc::clone(&log)));
    let mut db = Database::in_memory();
    db.add_listener(recorder.clone());
    db.add_index(Box::new(CountingIndex { log: Arc::clone(&log), members: 0 })).expect("failed to add index");

    db.accumulate_events();
    for i in 0..100 {
        db.insert_vectors(vec![vector(&[f64::from(i)])]).expect("failed to insert");
    }
    assert!(recorder.events().is_empty());
    db.flush_events();

    let events = recorder.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), DataStoreEventKind::Inserted);
    assert_eq!(events[0].ids().len(), 100);

    let log = log.lock().expect("poisoned");
    assert_eq!(log.last().map(String::as_str), Some("event inserted 100"));
    assert_eq!(log[log.len() - 2], "index now 100");
}

#[test]
fn test_kind_change_splits_accumulated_events() {
    let recorder = Arc::new(Recorder::default());
    let mut db = Database::builder().listener(recorder.clone()).build();

    db.accumulate_events();
    let ids = db.insert_vectors(vec![vector(&[1.0]), vector(&[2.0])]).expect("failed to insert");
    db.insert_vectors(vec![vector(&[3.0])]).expect("failed to insert");
    db.delete(ids[0]).expect("failed to delete");
    db.delete(ids[1]).expect("failed to delete");
    db.flush_events();

    let kinds: Vec<(DataStoreEventKind, usize)> =
        recorder.events().iter().map(|e| (e.kind(), e.ids().len())).collect();
    assert_eq!(kinds, vec![(DataStoreEventKind::Inserted, 3), (DataStoreEventKind::Removed, 2)]);
}

#[test]
fn test_update_events_for_associations() {
    let recorder = Arc::new(Recorder::default());
    let mut db = Database::in_memory();
    let ids = db.insert_vectors(vec![vector(&[1.0])]).expect("failed to insert");
    db.add_listener(recorder.clone());

    db.set_object_label(ids[0], "first").expect("failed to set label");

    let events = recorder.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), DataStoreEventKind::Updated);
}

#[test]
fn test_failing_listeners_are_isolated() {
    super::init_tracing();
    let recorder = Arc::new(Recorder::default());
    let mut db = Database::builder()
        .listener(Arc::new(Refusing))
        .listener(Arc::new(Panicking))
        .listener(recorder.clone())
        .build();

    db.insert_vectors(vec![vector(&[1.0])]).expect("insert must survive listener failures");
    assert_eq!(recorder.events().len(), 1);
    assert_eq!(db.len(), 1);
}

#[test]
fn test_listener_registration_is_idempotent() {
    let recorder = Arc::new(Recorder::default());
    let listener: Arc<dyn DataStoreListener> = recorder.clone();
    let mut db = Database::in_memory();
    db.add_listener(Arc::clone(&listener));
    db.add_listener(Arc::clone(&listener));

    db.insert_vectors(vec![vector(&[1.0])]).expect("failed to insert");
    assert_eq!(recorder.events().len(), 1);

    db.remove_listener(&listener);
    db.remove_listener(&listener);
    db.insert_vectors(vec![vector(&[2.0])]).expect("failed to insert");
    assert_eq!(recorder.events().len(), 1);
}

// ============================================================================
// Result events
// ============================================================================

#[test]
fn test_index_and_derived_result_events() {
    let results = Arc::new(ResultRecorder::default());
    let metric: Arc<dyn DistanceFunction> = Arc::new(DistanceMetric::Euclidean);
    let mut db = Database::builder()
        .index(Arc::new(MaterializedKnnIndexFactory::new(metric, 2).expect("bad k")))
        .build();
    db.add_result_listener(results.clone());

    db.insert_vectors(vec![vector(&[1.0]), vector(&[2.0])]).expect("failed to insert");
    let index_name = db.indexes().next().map(|i| i.name().to_owned()).expect("no index");

    db.add_derived_result("outlier-scores");
    assert_eq!(db.derived_results(), ["outlier-scores".to_owned()]);
    assert!(db.remove_derived_result("outlier-scores"));
    assert!(db.derived_results().is_empty());
    assert!(!db.remove_derived_result("outlier-scores"));
    assert!(db.remove_index(&index_name).is_some());

    let events = results.0.lock().expect("poisoned").clone();
    let parent = "database".to_owned();
    assert_eq!(
        events,
        vec![
            ResultEvent::Added { name: index_name.clone(), parent: parent.clone() },
            ResultEvent::Added { name: "outlier-scores".to_owned(), parent: parent.clone() },
            ResultEvent::Removed { name: "outlier-scores".to_owned(), parent: parent.clone() },
            ResultEvent::Removed { name: index_name, parent },
        ]
    );
}

// ============================================================================
// Index failures
// ============================================================================

#[test]
fn test_failed_index_update_rolls_back_insert() {
    super::init_tracing();
    let recorder = Arc::new(Recorder::default());
    let metric: Arc<dyn DistanceFunction> = Arc::new(DistanceMetric::Euclidean);
    let mut db = Database::in_memory();
    db.add_listener(recorder.clone());
    db.add_index(Box::new(MaterializedKnnIndex::new("vector", Arc::clone(&metric), 2).expect("bad k")))
        .expect("failed to add index");
    db.add_index(Box::new(NonNegative::default())).expect("failed to add index");

    let ids = db.insert_vectors(vec![vector(&[1.0]), vector(&[2.0])]).expect("failed to insert");
    let err = db.insert_vectors(vec![vector(&[3.0]), vector(&[-1.0])]).expect_err("insert should fail");
    assert!(matches!(err, proxdb::Error::InvalidArgument(_)));

    assert_eq!(db.len(), 2);
    assert_eq!(db.ids().collect::<Vec<_>>(), ids);
    let vectors = db.relation::<NumberVector>(&TypeInformation::any_vector()).expect("no vector relation");
    assert_eq!(vectors.len(), 2);
    assert_eq!(db.indexes().map(|i| i.len()).collect::<Vec<_>>(), vec![2, 2]);
    assert_eq!(recorder.events().len(), 1);

    // the released identifiers are handed out again
    let again = db.insert_vectors(vec![vector(&[3.0])]).expect("failed to insert");
    assert_eq!(again, vec![DbId::new(2)]);
    let knn = db
        .knn_query(metric.as_ref(), proxdb::QueryHints::OPTIMIZED_ONLY)
        .expect("resolution failed")
        .expect("no index");
    let nearest: Vec<DbId> = knn.knn_for_id(ids[1], 2).expect("query failed").iter().map(|n| n.id).collect();
    assert_eq!(nearest, vec![ids[1], ids[0]]);
}
