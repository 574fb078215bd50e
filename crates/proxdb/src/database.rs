//! The database: identifiers, relations, indexes and events.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;
use tracing::{debug, warn};

use proxdb_core::{
    relation_for, AnyRelation, BundleMeta, ClassLabel, DbId, ExternalId, IdRegistry, NumberVector,
    ObjectBundle, ObjectMetadata, Relation, RelationValue, SingleObjectBundle, TypeInformation, Value,
    ValueKind,
};
use proxdb_vector::Index;

use crate::config::{Config, DatabaseBuilder};
use crate::error::{Error, Result};
use crate::events::{DataStoreListener, EventManager, ResultListener};
use crate::index_registry::IndexRegistry;

/// Name under which the database reports its child results.
pub(crate) const DATABASE_RESULT: &str = "database";

/// An in-memory object database.
///
/// Objects are stored column-wise: one [`Relation`] per attribute. Every
/// object has a value in each mandatory relation (vectors, numbers) and may
/// have a value in the association relations (object label, class label,
/// external id), which are created the first time any object needs them.
///
/// Mutation takes `&mut self`; queries borrow the database immutably, so a
/// query can never observe a half-applied insert or delete.
#[derive(Debug)]
pub struct Database {
    pub(crate) config: Config,
    pub(crate) ids: BTreeSet<DbId>,
    pub(crate) registry: IdRegistry,
    pub(crate) relations: Vec<Box<dyn AnyRelation>>,
    pub(crate) indexes: IndexRegistry,
    pub(crate) events: EventManager,
    derived: Vec<String>,
}

/// Columns mapped onto relations, plus the relations and indexes an
/// insertion has to create.
struct Placement {
    targets: Vec<Option<usize>>,
    relations: Vec<Box<dyn AnyRelation>>,
    indexes: Vec<Box<dyn Index>>,
}

/// What an insertion changed so far.
struct InsertUndo {
    relations_before: usize,
    indexes_before: usize,
    registered: Vec<DbId>,
    indexed: Vec<(usize, Vec<DbId>)>,
}

/// Kinds whose values may be absent for some objects.
const fn is_optional(kind: ValueKind) -> bool {
    matches!(kind, ValueKind::Identifier | ValueKind::Label | ValueKind::ClassLabel | ValueKind::ExternalId)
}

/// The vector relation with the given name, if any.
pub(crate) fn vector_relation<'r>(
    relations: &'r [Box<dyn AnyRelation>],
    name: &str,
) -> Option<&'r Relation<NumberVector>> {
    relations.iter().find(|r| r.name() == name).and_then(|r| r.downcast_ref::<NumberVector>())
}

impl Default for Database {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Database {
    /// Create an empty database.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            registry: IdRegistry::new().with_reuse(config.reuse_identifiers),
            config,
            ids: BTreeSet::new(),
            relations: Vec::new(),
            indexes: IndexRegistry::new(),
            events: EventManager::new(),
            derived: Vec::new(),
        }
    }

    /// Create an empty database with the default configuration.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Start building a database.
    #[must_use]
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    /// The configuration this database was created with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if no object is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns `true` if the object is stored.
    #[must_use]
    pub fn contains(&self, id: DbId) -> bool {
        self.ids.contains(&id)
    }

    /// Identifiers of all stored objects, ascending.
    pub fn ids(&self) -> impl Iterator<Item = DbId> + '_ {
        self.ids.iter().copied()
    }

    // ========================================================================
    // Insertion
    // ========================================================================

    /// Insert the objects of a bundle.
    ///
    /// Rows whose identifier column holds an identifier keep it; all other
    /// rows get a fresh one. Each column is written to the first unused
    /// relation of a compatible type, or to a new relation (which also gets
    /// an index from every matching factory). Indexes are updated before
    /// one insertion event is fired for the whole bundle.
    ///
    /// Nothing is modified if the bundle is rejected. If an index fails to
    /// take the new objects, the insertion is rolled back and no event is
    /// fired.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the bundle has more than one identifier column,
    ///   has no vector or numeric column, or lacks a column for one of the
    ///   database's mandatory relations
    /// - [`Error::NullObject`] if a mandatory value is missing
    /// - [`Error::AlreadyExists`] if a requested identifier is taken or repeated
    /// - any index error, after the rollback
    pub fn insert(&mut self, bundle: ObjectBundle) -> Result<Vec<DbId>> {
        if bundle.is_empty() {
            return Ok(Vec::new());
        }
        let (meta, columns) = bundle.into_parts();

        let id_columns: Vec<usize> = meta
            .iter()
            .enumerate()
            .filter(|(_, ty)| ty.kind() == ValueKind::Identifier)
            .map(|(c, _)| c)
            .collect();
        if id_columns.len() > 1 {
            return Err(Error::config("bundle has more than one identifier column"));
        }
        for (column, (ty, values)) in meta.iter().zip(&columns).enumerate() {
            if is_optional(ty.kind()) {
                continue;
            }
            if let Some(row) = values.iter().position(Value::is_null) {
                return Err(Error::NullObject { column, row });
            }
        }

        let rows = columns.first().map_or(0, Vec::len);
        let requested: Vec<Option<DbId>> = match id_columns.first() {
            Some(&c) => columns[c].iter().map(Value::as_id).collect(),
            None => vec![None; rows],
        };
        let mut claimed = BTreeSet::new();
        for &id in requested.iter().flatten() {
            if self.ids.contains(&id) || !claimed.insert(id) {
                return Err(Error::AlreadyExists(id));
            }
        }

        let placement = self.place_columns(&meta)?;
        self.check_mandatory(&meta, &placement.targets)?;

        let mut undo = InsertUndo {
            relations_before: self.relations.len(),
            indexes_before: self.indexes.len(),
            registered: Vec::with_capacity(rows),
            indexed: Vec::new(),
        };
        let new_indexes: Vec<String> = placement.indexes.iter().map(|i| i.name().to_owned()).collect();
        for relation in placement.relations {
            debug!(relation = relation.name(), ty = %relation.type_information(), "created relation");
            self.relations.push(relation);
        }
        for index in placement.indexes {
            debug!(index = index.name(), relation = index.relation_name(), "attached index");
            self.indexes.add(index);
        }

        let assigned = match self.apply_insert(requested, columns, &placement.targets, &mut undo) {
            Ok(assigned) => assigned,
            Err(err) => {
                self.roll_back(undo);
                return Err(err);
            }
        };

        for name in new_indexes {
            self.events.fire_result_added(name, DATABASE_RESULT);
        }
        debug!(count = assigned.len(), "inserted objects");
        self.events.fire_inserted(assigned.clone());
        Ok(assigned)
    }

    /// Insert feature vectors without associations.
    ///
    /// # Errors
    ///
    /// See [`insert`](Self::insert); vectors of differing dimensionality
    /// are rejected as a type error.
    pub fn insert_vectors(&mut self, vectors: Vec<NumberVector>) -> Result<Vec<DbId>> {
        self.insert(ObjectBundle::from_vectors(vectors)?)
    }

    /// Insert feature vectors with their associations.
    ///
    /// # Errors
    ///
    /// See [`insert`](Self::insert).
    pub fn insert_with_metadata(&mut self, objects: Vec<(NumberVector, ObjectMetadata)>) -> Result<Vec<DbId>> {
        self.insert(ObjectBundle::from_vectors_with_metadata(objects)?)
    }

    /// Map every bundle column onto a relation without touching the database.
    ///
    /// Columns without a compatible unused relation get a new one, built
    /// here together with the indexes the configured factories make for it.
    fn place_columns(&self, meta: &BundleMeta) -> Result<Placement> {
        let mut used = BTreeSet::new();
        let mut relations: Vec<Box<dyn AnyRelation>> = Vec::new();
        let mut targets = Vec::with_capacity(meta.len());

        for ty in meta.iter() {
            if ty.kind() == ValueKind::Identifier {
                targets.push(None);
                continue;
            }
            let existing = self
                .relations
                .iter()
                .enumerate()
                .find(|(r, rel)| !used.contains(r) && rel.type_information().is_assignable_from(ty))
                .map(|(r, _)| r);
            let r = match existing {
                Some(r) => r,
                None => {
                    let name = unique_name(self.relations.iter().chain(&relations), ty);
                    let relation = relation_for(name, *ty)
                        .ok_or_else(|| Error::config(format!("cannot store values of type {ty}")))?;
                    relations.push(relation);
                    self.relations.len() + relations.len() - 1
                }
            };
            used.insert(r);
            targets.push(Some(r));
        }

        let mut indexes: Vec<Box<dyn Index>> = Vec::new();
        for relation in &relations {
            let Some(vectors) = relation.downcast_ref::<NumberVector>() else { continue };
            for factory in &self.config.index_factories {
                if factory.input_type().is_assignable_from(&vectors.type_information()) {
                    indexes.push(factory.instantiate(vectors)?);
                }
            }
        }
        Ok(Placement { targets, relations, indexes })
    }

    /// Every object needs a value in each mandatory relation, so a bundle
    /// must carry a mandatory column and cover the existing mandatory
    /// relations.
    fn check_mandatory(&self, meta: &BundleMeta, targets: &[Option<usize>]) -> Result<()> {
        if meta.iter().all(|ty| is_optional(ty.kind())) {
            return Err(Error::config("bundle has no vector or numeric column"));
        }
        for (r, relation) in self.relations.iter().enumerate() {
            let ty = relation.type_information();
            if !is_optional(ty.kind()) && !targets.contains(&Some(r)) {
                return Err(Error::config(format!(
                    "bundle has no column for relation '{}' of type {ty}",
                    relation.name()
                )));
            }
        }
        Ok(())
    }

    /// Assign identifiers, write the values and update the indexes,
    /// recording each step in `undo`.
    fn apply_insert(
        &mut self,
        requested: Vec<Option<DbId>>,
        columns: Vec<Vec<Value>>,
        targets: &[Option<usize>],
        undo: &mut InsertUndo,
    ) -> Result<Vec<DbId>> {
        for &id in requested.iter().flatten() {
            self.registry.claim(id)?;
            undo.registered.push(id);
        }
        let mut assigned = Vec::with_capacity(requested.len());
        for request in requested {
            let id = match request {
                Some(id) => id,
                None => {
                    let id = self.registry.allocate()?;
                    undo.registered.push(id);
                    id
                }
            };
            assigned.push(id);
        }

        let mut touched = BTreeSet::new();
        for (values, target) in columns.into_iter().zip(targets) {
            let Some(r) = *target else { continue };
            touched.insert(r);
            let relation = &mut self.relations[r];
            for (value, &id) in values.into_iter().zip(&assigned) {
                if !value.is_null() {
                    relation.put_value(id, value)?;
                }
            }
        }
        self.ids.extend(assigned.iter().copied());

        let touched: BTreeSet<&str> = touched.iter().map(|&r| self.relations[r].name()).collect();
        for (position, index) in self.indexes.iter_mut().enumerate() {
            if !touched.contains(index.relation_name()) {
                continue;
            }
            if let Some(relation) = vector_relation(&self.relations, index.relation_name()) {
                let ids: Vec<DbId> = assigned.iter().copied().filter(|&id| relation.contains(id)).collect();
                index.insert(relation, &ids)?;
                undo.indexed.push((position, ids));
            }
        }
        Ok(assigned)
    }

    /// Undo a partially applied insertion.
    fn roll_back(&mut self, undo: InsertUndo) {
        for (position, ids) in &undo.indexed {
            let Some(index) = self.indexes.iter_mut().nth(*position) else { continue };
            if let Some(relation) = vector_relation(&self.relations, index.relation_name()) {
                if let Err(err) = index.delete(relation, ids) {
                    warn!(index = index.name(), %err, "failed to roll back index");
                }
            }
        }
        self.indexes.truncate(undo.indexes_before);
        self.relations.truncate(undo.relations_before);

        for &id in &undo.registered {
            for relation in &mut self.relations {
                if relation.contains(id) {
                    if let Err(err) = relation.delete_value(id) {
                        warn!(relation = relation.name(), %err, "failed to roll back value");
                    }
                }
            }
            self.ids.remove(&id);
            if let Err(err) = self.registry.deallocate(id, self.relations.iter().map(|r| &**r)) {
                warn!(%id, %err, "failed to release identifier");
            }
        }
        debug!(count = undo.registered.len(), "rolled back insertion");
    }

    fn attach(&mut self, index: Box<dyn Index>) {
        let name = index.name().to_owned();
        debug!(index = %name, relation = index.relation_name(), "attached index");
        self.indexes.add(index);
        self.events.fire_result_added(name, DATABASE_RESULT);
    }

    // ========================================================================
    // Deletion and lookup
    // ========================================================================

    /// Delete an object and return its values.
    ///
    /// The object is removed from every index first, then from every
    /// relation; then its identifier is reclaimed and a removal event fired.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the object is not stored.
    pub fn delete(&mut self, id: DbId) -> Result<SingleObjectBundle> {
        if !self.ids.contains(&id) {
            return Err(Error::NotFound(id));
        }

        for index in self.indexes.iter_mut() {
            if let Some(relation) = vector_relation(&self.relations, index.relation_name()) {
                if relation.contains(id) {
                    index.delete(relation, &[id])?;
                }
            }
        }

        let mut removed = SingleObjectBundle::new();
        removed.append(TypeInformation::identifier(), Value::Id(id));
        for relation in &mut self.relations {
            let value = if relation.contains(id) { relation.delete_value(id)? } else { Value::Null };
            removed.append(relation.type_information(), value);
        }
        self.ids.remove(&id);
        self.registry.deallocate(id, self.relations.iter().map(|r| &**r))?;

        self.events.fire_removed(vec![id]);
        Ok(removed)
    }

    /// Delete several objects, firing one removal event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for the first missing object; objects
    /// before it are already deleted.
    pub fn delete_many(&mut self, ids: &[DbId]) -> Result<Vec<SingleObjectBundle>> {
        let was_accumulating = self.events.is_accumulating();
        self.events.accumulate();
        let result = ids.iter().map(|&id| self.delete(id)).collect();
        if !was_accumulating {
            self.events.flush();
        }
        result
    }

    /// All values of one object: its identifier, then one value per
    /// relation ([`Value::Null`] for absent associations).
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the object is not stored.
    pub fn get_bundle(&self, id: DbId) -> Result<SingleObjectBundle> {
        if !self.ids.contains(&id) {
            return Err(Error::NotFound(id));
        }
        let mut bundle = SingleObjectBundle::new();
        bundle.append(TypeInformation::identifier(), Value::Id(id));
        for relation in &self.relations {
            let value = if relation.contains(id) { relation.get_value(id)? } else { Value::Null };
            bundle.append(relation.type_information(), value);
        }
        Ok(bundle)
    }

    /// Bundle several objects with a shared layout, identifiers included.
    fn bundle_of(&self, ids: &[DbId]) -> Result<ObjectBundle> {
        let meta: BundleMeta = std::iter::once(TypeInformation::identifier())
            .chain(self.relations.iter().map(|r| r.type_information()))
            .collect();
        let mut bundle = ObjectBundle::empty(meta);
        for &id in ids {
            let row = self.get_bundle(id)?;
            bundle.append(row.values().to_vec())?;
        }
        Ok(bundle)
    }

    // ========================================================================
    // Partitioning and sampling
    // ========================================================================

    /// Copy groups of objects into new, independent databases.
    ///
    /// Each new database uses this database's configuration and keeps the
    /// objects' identifiers and associations. It shares no storage with this
    /// database.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if a group names an object that is not stored.
    pub fn partition<K: Ord + Clone>(&self, groups: &BTreeMap<K, Vec<DbId>>) -> Result<BTreeMap<K, Self>> {
        let mut partitions = BTreeMap::new();
        for (key, ids) in groups {
            partitions.insert(key.clone(), self.partition_one(ids)?);
        }
        Ok(partitions)
    }

    /// Copy one group of objects into a new, independent database.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if an object is not stored.
    pub fn partition_one(&self, ids: &[DbId]) -> Result<Self> {
        let bundle = self.bundle_of(ids)?;
        let mut db = Self::new(self.config.clone());
        db.insert(bundle)?;
        Ok(db)
    }

    /// A deterministic random sample of `k` distinct identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `k` exceeds the number of objects.
    pub fn random_sample(&self, k: usize, seed: u64) -> Result<BTreeSet<DbId>> {
        if k > self.len() {
            return Err(Error::invalid_argument(format!(
                "illegal sample size {k} for a database of {} objects",
                self.len()
            )));
        }
        let ids: Vec<DbId> = self.ids().collect();
        let mut rng = StdRng::seed_from_u64(seed);
        Ok(sample(&mut rng, ids.len(), k).into_iter().map(|i| ids[i]).collect())
    }

    // ========================================================================
    // Relations and associations
    // ========================================================================

    /// All relations, in creation order.
    pub fn relations(&self) -> impl Iterator<Item = &dyn AnyRelation> + '_ {
        self.relations.iter().map(|r| &**r)
    }

    /// The first relation whose type satisfies `restriction`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedType`] listing the available types if no
    /// relation of value type `T` matches.
    pub fn relation<T: RelationValue>(&self, restriction: &TypeInformation) -> Result<&Relation<T>> {
        self.relations
            .iter()
            .filter(|r| restriction.is_assignable_from(&r.type_information()))
            .find_map(|r| r.downcast_ref::<T>())
            .ok_or_else(|| self.unsupported(restriction))
    }

    pub(crate) fn unsupported(&self, restriction: &TypeInformation) -> Error {
        Error::UnsupportedType {
            requested: restriction.to_string(),
            available: self.relations.iter().map(|r| r.type_information().to_string()).collect(),
        }
    }

    /// Dimensionality of the first vector relation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedType`] if there is no vector relation.
    pub fn dimensionality(&self) -> Result<usize> {
        let relation = self.relation::<NumberVector>(&TypeInformation::any_vector())?;
        match relation.type_information().dimensionality() {
            Some(dim) => Ok(dim),
            None => relation
                .iter()
                .next()
                .map(|(_, v)| v.dimensionality())
                .ok_or_else(|| Error::invalid_state("dimensionality of an empty relation is unknown")),
        }
    }

    fn association<T: RelationValue>(&self, id: DbId, ty: TypeInformation) -> Result<Option<&T>> {
        if !self.ids.contains(&id) {
            return Err(Error::NotFound(id));
        }
        Ok(self.relation::<T>(&ty).ok().and_then(|r| r.get(id).ok()))
    }

    fn set_association<T: RelationValue>(&mut self, id: DbId, ty: TypeInformation, value: T) -> Result<()> {
        if !self.ids.contains(&id) {
            return Err(Error::NotFound(id));
        }
        let position = match self.relations.iter().position(|r| ty.is_assignable_from(&r.type_information())) {
            Some(position) => position,
            None => {
                let name = unique_name(self.relations.iter(), &ty);
                let relation = relation_for(name, ty)
                    .ok_or_else(|| Error::config(format!("cannot store values of type {ty}")))?;
                self.relations.push(relation);
                self.relations.len() - 1
            }
        };
        self.relations[position].put_value(id, value.into_value())?;
        self.events.fire_updated(vec![id]);
        Ok(())
    }

    /// The object label, if the object has one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the object is not stored.
    pub fn object_label(&self, id: DbId) -> Result<Option<&str>> {
        Ok(self.association::<String>(id, TypeInformation::label())?.map(String::as_str))
    }

    /// The class label, if the object has one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the object is not stored.
    pub fn class_label(&self, id: DbId) -> Result<Option<&ClassLabel>> {
        self.association(id, TypeInformation::class_label())
    }

    /// The external identifier, if the object has one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the object is not stored.
    pub fn external_id(&self, id: DbId) -> Result<Option<&ExternalId>> {
        self.association(id, TypeInformation::external_id())
    }

    /// Set the object label, creating the label relation if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the object is not stored.
    pub fn set_object_label(&mut self, id: DbId, label: impl Into<String>) -> Result<()> {
        self.set_association(id, TypeInformation::label(), label.into())
    }

    /// Set the class label, creating the class label relation if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the object is not stored.
    pub fn set_class_label(&mut self, id: DbId, label: ClassLabel) -> Result<()> {
        self.set_association(id, TypeInformation::class_label(), label)
    }

    /// Set the external identifier, creating its relation if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the object is not stored.
    pub fn set_external_id(&mut self, id: DbId, external: ExternalId) -> Result<()> {
        self.set_association(id, TypeInformation::external_id(), external)
    }

    // ========================================================================
    // Indexes and derived results
    // ========================================================================

    /// Attach an index to an empty database.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the database already holds objects.
    pub fn add_index(&mut self, index: Box<dyn Index>) -> Result<()> {
        if !self.ids.is_empty() {
            return Err(Error::config("indexes must be attached before the first insertion"));
        }
        self.attach(index);
        Ok(())
    }

    /// Detach the most recently attached index with this name.
    ///
    /// Returns `None` if no such index is attached.
    pub fn remove_index(&mut self, name: &str) -> Option<Box<dyn Index>> {
        let index = self.indexes.remove(name)?;
        self.events.fire_result_removed(name, DATABASE_RESULT);
        Some(index)
    }

    /// Attached indexes in attachment order.
    pub fn indexes(&self) -> impl Iterator<Item = &dyn Index> + '_ {
        self.indexes.list()
    }

    /// Record a derived result and notify result listeners.
    pub fn add_derived_result(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.events.fire_result_added(name.clone(), DATABASE_RESULT);
        self.derived.push(name);
    }

    /// Forget a derived result. Returns `false` if it was not recorded.
    pub fn remove_derived_result(&mut self, name: &str) -> bool {
        let Some(position) = self.derived.iter().position(|d| d == name) else {
            return false;
        };
        self.derived.remove(position);
        self.events.fire_result_removed(name, DATABASE_RESULT);
        true
    }

    /// Names of the derived results, in the order they were added.
    #[must_use]
    pub fn derived_results(&self) -> &[String] {
        &self.derived
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Register a data store listener. Registering it again has no effect.
    pub fn add_listener(&mut self, listener: Arc<dyn DataStoreListener>) {
        self.events.add_listener(listener);
    }

    /// Unregister a data store listener.
    pub fn remove_listener(&mut self, listener: &Arc<dyn DataStoreListener>) {
        self.events.remove_listener(listener);
    }

    /// Register a result listener. Registering it again has no effect.
    pub fn add_result_listener(&mut self, listener: Arc<dyn ResultListener>) {
        self.events.add_result_listener(listener);
    }

    /// Unregister a result listener.
    pub fn remove_result_listener(&mut self, listener: &Arc<dyn ResultListener>) {
        self.events.remove_result_listener(listener);
    }

    /// Buffer data store events until [`flush_events`](Self::flush_events).
    pub fn accumulate_events(&mut self) {
        self.events.accumulate();
    }

    /// Deliver buffered data store events.
    pub fn flush_events(&mut self) {
        self.events.flush();
    }
}

/// A relation name derived from the value kind, unique among `existing`.
fn unique_name<'a, I>(existing: I, ty: &TypeInformation) -> String
where
    I: Iterator<Item = &'a Box<dyn AnyRelation>>,
{
    let taken: BTreeSet<&str> = existing.map(|r| r.name()).collect();
    let base = ty.kind().to_string();
    if !taken.contains(base.as_str()) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken.contains(candidate.as_str()) {
            return candidate;
        }
        n += 1;
    }
}
