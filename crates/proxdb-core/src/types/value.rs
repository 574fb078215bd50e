//! Values stored in relations and the type descriptors that classify them.
//!
//! A [`TypeInformation`] describes one column of an
//! [`ObjectBundle`](crate::ObjectBundle) and one relation of a database.
//! Relations are matched to requests through
//! [`TypeInformation::is_assignable_from`].

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ClassLabel, DbId, ExternalId, NumberVector};

/// The semantic kind of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// A caller-assigned object identifier. Consumed at insertion, never stored.
    Identifier,
    /// A dense feature vector.
    Vector,
    /// A free-text object label.
    Label,
    /// A class label.
    ClassLabel,
    /// A data source identifier.
    ExternalId,
    /// A single floating-point attribute.
    Double,
    /// A single integer attribute.
    Integer,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Identifier => "identifier",
            Self::Vector => "vector",
            Self::Label => "label",
            Self::ClassLabel => "class-label",
            Self::ExternalId => "external-id",
            Self::Double => "double",
            Self::Integer => "integer",
        };
        f.write_str(name)
    }
}

/// Type descriptor of a bundle column or relation.
///
/// Vector types may carry a fixed dimensionality. A descriptor without a
/// dimensionality acts as a restriction matching vectors of any length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeInformation {
    kind: ValueKind,
    dimensionality: Option<usize>,
}

impl TypeInformation {
    /// Create a descriptor of the given kind.
    #[must_use]
    pub const fn new(kind: ValueKind) -> Self {
        Self { kind, dimensionality: None }
    }

    /// Vectors of exactly `dim` components.
    #[must_use]
    pub const fn vector(dim: usize) -> Self {
        Self { kind: ValueKind::Vector, dimensionality: Some(dim) }
    }

    /// Vectors of any length.
    #[must_use]
    pub const fn any_vector() -> Self {
        Self::new(ValueKind::Vector)
    }

    /// Caller-assigned identifiers.
    #[must_use]
    pub const fn identifier() -> Self {
        Self::new(ValueKind::Identifier)
    }

    /// Object labels.
    #[must_use]
    pub const fn label() -> Self {
        Self::new(ValueKind::Label)
    }

    /// Class labels.
    #[must_use]
    pub const fn class_label() -> Self {
        Self::new(ValueKind::ClassLabel)
    }

    /// External ids.
    #[must_use]
    pub const fn external_id() -> Self {
        Self::new(ValueKind::ExternalId)
    }

    /// Floating-point attributes.
    #[must_use]
    pub const fn double() -> Self {
        Self::new(ValueKind::Double)
    }

    /// Integer attributes.
    #[must_use]
    pub const fn integer() -> Self {
        Self::new(ValueKind::Integer)
    }

    /// The value kind.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        self.kind
    }

    /// The fixed dimensionality, if any.
    #[must_use]
    pub const fn dimensionality(&self) -> Option<usize> {
        self.dimensionality
    }

    /// Returns `true` if a relation of type `other` satisfies this restriction.
    #[must_use]
    pub fn is_assignable_from(&self, other: &Self) -> bool {
        if self.kind != other.kind {
            return false;
        }
        match self.dimensionality {
            None => true,
            Some(dim) => other.dimensionality == Some(dim),
        }
    }

    /// Returns `true` if `value` may be stored in a column of this type.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match (value.kind(), self.dimensionality, value) {
            (Some(kind), _, _) if kind != self.kind => false,
            (Some(_), Some(dim), Value::Vector(v)) => v.dimensionality() == dim,
            (Some(_), _, _) => true,
            (None, _, _) => false,
        }
    }
}

impl fmt::Display for TypeInformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dimensionality {
            Some(dim) => write!(f, "{}({dim})", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// A single value in a bundle column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Missing value. Never stored; rejected on insertion.
    Null,
    /// Caller-assigned object identifier.
    Id(DbId),
    /// Feature vector.
    Vector(NumberVector),
    /// Object label.
    Label(String),
    /// Class label.
    ClassLabel(ClassLabel),
    /// External id.
    ExternalId(ExternalId),
    /// Floating-point attribute.
    Double(f64),
    /// Integer attribute.
    Integer(i64),
}

impl Value {
    /// The kind of this value, or `None` for [`Value::Null`].
    #[must_use]
    pub const fn kind(&self) -> Option<ValueKind> {
        match self {
            Self::Null => None,
            Self::Id(_) => Some(ValueKind::Identifier),
            Self::Vector(_) => Some(ValueKind::Vector),
            Self::Label(_) => Some(ValueKind::Label),
            Self::ClassLabel(_) => Some(ValueKind::ClassLabel),
            Self::ExternalId(_) => Some(ValueKind::ExternalId),
            Self::Double(_) => Some(ValueKind::Double),
            Self::Integer(_) => Some(ValueKind::Integer),
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the vector, if this is a vector value.
    #[must_use]
    pub const fn as_vector(&self) -> Option<&NumberVector> {
        match self {
            Self::Vector(v) => Some(v),
            _ => None,
        }
    }

    /// Get the identifier, if this is an identifier value.
    #[must_use]
    pub const fn as_id(&self) -> Option<DbId> {
        match self {
            Self::Id(id) => Some(*id),
            _ => None,
        }
    }

    /// Get the label text, if this is a label value.
    #[must_use]
    pub fn as_label(&self) -> Option<&str> {
        match self {
            Self::Label(s) => Some(s),
            _ => None,
        }
    }

    /// Get the numeric value of a double or integer attribute.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            #[allow(clippy::cast_precision_loss)]
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// A descriptive name of the value's type, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> String {
        match self {
            Self::Null => "null".to_owned(),
            Self::Vector(v) => TypeInformation::vector(v.dimensionality()).to_string(),
            other => other.kind().map_or_else(|| "null".to_owned(), |k| k.to_string()),
        }
    }
}

impl From<NumberVector> for Value {
    fn from(v: NumberVector) -> Self {
        Self::Vector(v)
    }
}

impl From<DbId> for Value {
    fn from(id: DbId) -> Self {
        Self::Id(id)
    }
}

impl From<ClassLabel> for Value {
    fn from(label: ClassLabel) -> Self {
        Self::ClassLabel(label)
    }
}

impl From<ExternalId> for Value {
    fn from(id: ExternalId) -> Self {
        Self::ExternalId(id)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Label(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Label(s)
    }
}
