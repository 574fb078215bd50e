//! Column-oriented transfer containers.
//!
//! Parsers produce an [`ObjectBundle`]: an ordered list of typed columns,
//! one value per object in each column. Databases consume bundles on
//! insertion and produce a [`SingleObjectBundle`] per object on lookup.

use std::slice;

use crate::error::CoreError;
use crate::types::{NumberVector, ObjectMetadata, TypeInformation, Value};

/// The column types of a bundle, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleMeta(Vec<TypeInformation>);

impl BundleMeta {
    /// Create metadata from column types.
    #[must_use]
    pub fn new(types: Vec<TypeInformation>) -> Self {
        Self(types)
    }

    /// Append a column type.
    pub fn push(&mut self, ty: TypeInformation) {
        self.0.push(ty);
    }

    /// The type of column `i`.
    #[must_use]
    pub fn get(&self, i: usize) -> Option<&TypeInformation> {
        self.0.get(i)
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over column types.
    pub fn iter(&self) -> slice::Iter<'_, TypeInformation> {
        self.0.iter()
    }
}

impl FromIterator<TypeInformation> for BundleMeta {
    fn from_iter<I: IntoIterator<Item = TypeInformation>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Typed columns describing one or many objects awaiting insertion.
///
/// Every column has the same length and every non-null value matches its
/// column type. Null values are allowed in a bundle and rejected when the
/// bundle is inserted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectBundle {
    meta: BundleMeta,
    columns: Vec<Vec<Value>>,
}

impl ObjectBundle {
    /// Create a bundle from metadata and columns.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedBundle`] if the column count differs
    /// from the metadata or the columns differ in length, and
    /// [`CoreError::TypeMismatch`] if a value does not match its column type.
    pub fn new(meta: BundleMeta, columns: Vec<Vec<Value>>) -> Result<Self, CoreError> {
        if columns.len() != meta.len() {
            return Err(CoreError::malformed(format!(
                "metadata declares {} columns but {} were given",
                meta.len(),
                columns.len()
            )));
        }
        if let Some(first) = columns.first() {
            if let Some((i, col)) = columns.iter().enumerate().find(|(_, c)| c.len() != first.len())
            {
                return Err(CoreError::malformed(format!(
                    "column {i} has {} values, column 0 has {}",
                    col.len(),
                    first.len()
                )));
            }
        }
        for (ty, col) in meta.iter().zip(&columns) {
            if let Some(bad) = col.iter().find(|v| !v.is_null() && !ty.accepts(v)) {
                return Err(CoreError::type_mismatch(ty, bad.type_name()));
            }
        }
        Ok(Self { meta, columns })
    }

    /// Create an empty bundle with the given column types.
    #[must_use]
    pub fn empty(meta: BundleMeta) -> Self {
        let columns = meta.iter().map(|_| Vec::new()).collect();
        Self { meta, columns }
    }

    /// Create a single-column bundle of feature vectors.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TypeMismatch`] if the vectors differ in dimensionality.
    pub fn from_vectors(vectors: Vec<NumberVector>) -> Result<Self, CoreError> {
        let ty = vectors
            .first()
            .map_or_else(TypeInformation::any_vector, |v| TypeInformation::vector(v.dimensionality()));
        let column = vectors.into_iter().map(Value::Vector).collect();
        Self::new(BundleMeta::new(vec![ty]), vec![column])
    }

    /// Create a bundle of feature vectors with their associations.
    ///
    /// Association columns are added only for associations that at least one
    /// object carries; objects lacking a present association get
    /// [`Value::Null`] in that column.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TypeMismatch`] if the vectors differ in dimensionality.
    pub fn from_vectors_with_metadata(
        objects: Vec<(NumberVector, ObjectMetadata)>,
    ) -> Result<Self, CoreError> {
        let (vectors, metadata): (Vec<_>, Vec<_>) = objects.into_iter().unzip();
        let mut bundle = Self::from_vectors(vectors)?;

        if metadata.iter().any(|m| m.object_label.is_some()) {
            let col = metadata.iter().map(|m| m.object_label.clone().map_or(Value::Null, Value::Label));
            bundle.push_column(TypeInformation::label(), col.collect())?;
        }
        if metadata.iter().any(|m| m.class_label.is_some()) {
            let col =
                metadata.iter().map(|m| m.class_label.clone().map_or(Value::Null, Value::ClassLabel));
            bundle.push_column(TypeInformation::class_label(), col.collect())?;
        }
        if metadata.iter().any(|m| m.external_id.is_some()) {
            let col =
                metadata.iter().map(|m| m.external_id.clone().map_or(Value::Null, Value::ExternalId));
            bundle.push_column(TypeInformation::external_id(), col.collect())?;
        }
        Ok(bundle)
    }

    /// Append a whole column.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedBundle`] if the column length differs
    /// from the bundle length, or [`CoreError::TypeMismatch`] on a bad value.
    pub fn push_column(&mut self, ty: TypeInformation, column: Vec<Value>) -> Result<(), CoreError> {
        if !self.columns.is_empty() && column.len() != self.len() {
            return Err(CoreError::malformed(format!(
                "new column has {} values, bundle has {}",
                column.len(),
                self.len()
            )));
        }
        if let Some(bad) = column.iter().find(|v| !v.is_null() && !ty.accepts(v)) {
            return Err(CoreError::type_mismatch(ty, bad.type_name()));
        }
        self.meta.push(ty);
        self.columns.push(column);
        Ok(())
    }

    /// Append one object, given one value per column.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedBundle`] if the row has the wrong number
    /// of values, or [`CoreError::TypeMismatch`] on a bad value.
    pub fn append(&mut self, row: Vec<Value>) -> Result<(), CoreError> {
        if row.len() != self.meta.len() {
            return Err(CoreError::malformed(format!(
                "row has {} values, bundle has {} columns",
                row.len(),
                self.meta.len()
            )));
        }
        for (ty, value) in self.meta.iter().zip(&row) {
            if !value.is_null() && !ty.accepts(value) {
                return Err(CoreError::type_mismatch(ty, value.type_name()));
            }
        }
        for (col, value) in self.columns.iter_mut().zip(row) {
            col.push(value);
        }
        Ok(())
    }

    /// The column types.
    #[must_use]
    pub const fn meta(&self) -> &BundleMeta {
        &self.meta
    }

    /// Number of objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// Returns `true` if the bundle holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consume the bundle, returning metadata and columns.
    #[must_use]
    pub fn into_parts(self) -> (BundleMeta, Vec<Vec<Value>>) {
        (self.meta, self.columns)
    }
}

/// All stored values of one object, one per relation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SingleObjectBundle {
    meta: BundleMeta,
    values: Vec<Value>,
}

impl SingleObjectBundle {
    /// Create an empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a typed value.
    pub fn append(&mut self, ty: TypeInformation, value: Value) {
        self.meta.push(ty);
        self.values.push(value);
    }

    /// The value types.
    #[must_use]
    pub const fn meta(&self) -> &BundleMeta {
        &self.meta
    }

    /// The values, in relation order.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// The value at position `i`.
    #[must_use]
    pub fn get(&self, i: usize) -> Option<&Value> {
        self.values.get(i)
    }

    /// The first value whose type satisfies `restriction`.
    #[must_use]
    pub fn find(&self, restriction: &TypeInformation) -> Option<&Value> {
        self.meta
            .iter()
            .zip(&self.values)
            .find(|(ty, _)| restriction.is_assignable_from(ty))
            .map(|(_, v)| v)
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
