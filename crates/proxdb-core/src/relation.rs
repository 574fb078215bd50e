//! Per-attribute column stores keyed by identifier.
//!
//! A [`Relation<T>`] maps [`DbId`]s to values of one semantic type. It is a
//! pure storage primitive: it validates types but fires no events and knows
//! nothing about indexes. Databases keep heterogeneous relations behind the
//! type-erased [`AnyRelation`] view and recover the typed relation with
//! [`downcast_ref`](trait.AnyRelation.html#method.downcast_ref).

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::CoreError;
use crate::types::{ClassLabel, DbId, ExternalId, NumberVector, TypeInformation, Value};

/// A type that can be stored in a [`Relation`].
pub trait RelationValue: Clone + fmt::Debug + Send + Sync + 'static {
    /// Convert from a bundle value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TypeMismatch`] if the value has another type.
    fn from_value(value: Value) -> Result<Self, CoreError>;

    /// Convert into a bundle value.
    fn into_value(self) -> Value;

    /// Returns `true` if this value satisfies the relation's type.
    fn conforms_to(&self, _ty: &TypeInformation) -> bool {
        true
    }
}

impl RelationValue for NumberVector {
    fn from_value(value: Value) -> Result<Self, CoreError> {
        match value {
            Value::Vector(v) => Ok(v),
            other => Err(CoreError::type_mismatch("vector", other.type_name())),
        }
    }

    fn into_value(self) -> Value {
        Value::Vector(self)
    }

    fn conforms_to(&self, ty: &TypeInformation) -> bool {
        ty.dimensionality().map_or(true, |dim| dim == self.dimensionality())
    }
}

impl RelationValue for String {
    fn from_value(value: Value) -> Result<Self, CoreError> {
        match value {
            Value::Label(s) => Ok(s),
            other => Err(CoreError::type_mismatch("label", other.type_name())),
        }
    }

    fn into_value(self) -> Value {
        Value::Label(self)
    }
}

impl RelationValue for ClassLabel {
    fn from_value(value: Value) -> Result<Self, CoreError> {
        match value {
            Value::ClassLabel(l) => Ok(l),
            other => Err(CoreError::type_mismatch("class-label", other.type_name())),
        }
    }

    fn into_value(self) -> Value {
        Value::ClassLabel(self)
    }
}

impl RelationValue for ExternalId {
    fn from_value(value: Value) -> Result<Self, CoreError> {
        match value {
            Value::ExternalId(id) => Ok(id),
            other => Err(CoreError::type_mismatch("external-id", other.type_name())),
        }
    }

    fn into_value(self) -> Value {
        Value::ExternalId(self)
    }
}

impl RelationValue for f64 {
    fn from_value(value: Value) -> Result<Self, CoreError> {
        match value {
            Value::Double(v) => Ok(v),
            other => Err(CoreError::type_mismatch("double", other.type_name())),
        }
    }

    fn into_value(self) -> Value {
        Value::Double(self)
    }
}

impl RelationValue for i64 {
    fn from_value(value: Value) -> Result<Self, CoreError> {
        match value {
            Value::Integer(v) => Ok(v),
            other => Err(CoreError::type_mismatch("integer", other.type_name())),
        }
    }

    fn into_value(self) -> Value {
        Value::Integer(self)
    }
}

/// A named, typed column of per-object values.
#[derive(Debug, Clone)]
pub struct Relation<T> {
    name: String,
    type_info: TypeInformation,
    data: BTreeMap<DbId, T>,
}

impl<T: RelationValue> Relation<T> {
    /// Create an empty relation.
    #[must_use]
    pub fn new(name: impl Into<String>, type_info: TypeInformation) -> Self {
        Self { name: name.into(), type_info, data: BTreeMap::new() }
    }

    /// The relation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type of the stored values.
    #[must_use]
    pub const fn type_information(&self) -> TypeInformation {
        self.type_info
    }

    /// Get the value stored for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if `id` has no value.
    pub fn get(&self, id: DbId) -> Result<&T, CoreError> {
        self.data.get(&id).ok_or(CoreError::NotFound(id))
    }

    /// Insert or overwrite the value for `id`, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TypeMismatch`] if the value does not satisfy the
    /// relation's type.
    pub fn put(&mut self, id: DbId, value: T) -> Result<Option<T>, CoreError> {
        if !value.conforms_to(&self.type_info) {
            return Err(CoreError::type_mismatch(
                self.type_info,
                value.into_value().type_name(),
            ));
        }
        Ok(self.data.insert(id, value))
    }

    /// Remove and return the value for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if `id` has no value.
    pub fn delete(&mut self, id: DbId) -> Result<T, CoreError> {
        self.data.remove(&id).ok_or(CoreError::NotFound(id))
    }

    /// Returns `true` if a value is stored for `id`.
    #[must_use]
    pub fn contains(&self, id: DbId) -> bool {
        self.data.contains_key(&id)
    }

    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the relation is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over `(id, value)` pairs in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (DbId, &T)> + '_ {
        self.data.iter().map(|(&id, v)| (id, v))
    }

    /// Iterate over the stored identifiers in order.
    pub fn ids(&self) -> impl Iterator<Item = DbId> + '_ {
        self.data.keys().copied()
    }
}

/// Type-erased view of a [`Relation`].
pub trait AnyRelation: fmt::Debug + Send + Sync {
    /// The relation name.
    fn name(&self) -> &str;

    /// The type of the stored values.
    fn type_information(&self) -> TypeInformation;

    /// Returns `true` if a value is stored for `id`.
    fn contains(&self, id: DbId) -> bool;

    /// Number of stored values.
    fn len(&self) -> usize;

    /// Returns `true` if the relation is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get a copy of the value stored for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if `id` has no value.
    fn get_value(&self, id: DbId) -> Result<Value, CoreError>;

    /// Store a bundle value for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TypeMismatch`] if the value has the wrong type.
    fn put_value(&mut self, id: DbId, value: Value) -> Result<(), CoreError>;

    /// Remove the value for `id` and return it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if `id` has no value.
    fn delete_value(&mut self, id: DbId) -> Result<Value, CoreError>;

    /// Upcast for downcasting to the typed relation.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the typed relation.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn AnyRelation {
    /// Recover the typed relation, if the stored type is `T`.
    #[must_use]
    pub fn downcast_ref<T: RelationValue>(&self) -> Option<&Relation<T>> {
        self.as_any().downcast_ref::<Relation<T>>()
    }

    /// Recover the typed relation mutably, if the stored type is `T`.
    pub fn downcast_mut<T: RelationValue>(&mut self) -> Option<&mut Relation<T>> {
        self.as_any_mut().downcast_mut::<Relation<T>>()
    }
}

impl<T: RelationValue> AnyRelation for Relation<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_information(&self) -> TypeInformation {
        self.type_info
    }

    fn contains(&self, id: DbId) -> bool {
        self.data.contains_key(&id)
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn get_value(&self, id: DbId) -> Result<Value, CoreError> {
        self.get(id).map(|v| v.clone().into_value())
    }

    fn put_value(&mut self, id: DbId, value: Value) -> Result<(), CoreError> {
        let value = T::from_value(value)?;
        self.put(id, value).map(|_| ())
    }

    fn delete_value(&mut self, id: DbId) -> Result<Value, CoreError> {
        self.delete(id).map(RelationValue::into_value)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Create an empty relation suitable for values of type `ty`.
///
/// Returns `None` for identifier columns, which are never stored.
#[must_use]
pub fn relation_for(name: impl Into<String>, ty: TypeInformation) -> Option<Box<dyn AnyRelation>> {
    use crate::types::ValueKind;

    let name = name.into();
    let relation: Box<dyn AnyRelation> = match ty.kind() {
        ValueKind::Identifier => return None,
        ValueKind::Vector => Box::new(Relation::<NumberVector>::new(name, ty)),
        ValueKind::Label => Box::new(Relation::<String>::new(name, ty)),
        ValueKind::ClassLabel => Box::new(Relation::<ClassLabel>::new(name, ty)),
        ValueKind::ExternalId => Box::new(Relation::<ExternalId>::new(name, ty)),
        ValueKind::Double => Box::new(Relation::<f64>::new(name, ty)),
        ValueKind::Integer => Box::new(Relation::<i64>::new(name, ty)),
    };
    Some(relation)
}
