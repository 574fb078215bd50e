//! Optional side-values attached to objects at insertion time.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A class label, used by evaluation and supervised consumers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassLabel(String);

impl ClassLabel {
    /// Create a new class label.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the label text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An identifier assigned by the data source, unrelated to [`DbId`](super::DbId).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExternalId(String);

impl ExternalId {
    /// Create a new external id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Associations of one object: its label, class label and external id.
///
/// Each present field is written to its own relation, which the database
/// creates the first time any object carries that association.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    /// Free-text object label.
    pub object_label: Option<String>,
    /// Class label.
    pub class_label: Option<ClassLabel>,
    /// Data source identifier.
    pub external_id: Option<ExternalId>,
}

impl ObjectMetadata {
    /// Create empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the object label.
    #[must_use]
    pub fn with_object_label(mut self, label: impl Into<String>) -> Self {
        self.object_label = Some(label.into());
        self
    }

    /// Set the class label.
    #[must_use]
    pub fn with_class_label(mut self, label: impl Into<String>) -> Self {
        self.class_label = Some(ClassLabel::new(label));
        self
    }

    /// Set the external id.
    #[must_use]
    pub fn with_external_id(mut self, id: impl Into<String>) -> Self {
        self.external_id = Some(ExternalId::new(id));
        self
    }

    /// Returns `true` if no association is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.object_label.is_none() && self.class_label.is_none() && self.external_id.is_none()
    }
}
