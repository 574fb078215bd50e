//! Ordered collection of attached indexes.
//!
//! Indexes are kept in the order they were attached. Query resolution walks
//! them from the most recently attached to the oldest, so an index attached
//! later overrides an earlier one that offers the same capability.

use proxdb_vector::Index;

/// The indexes attached to a database.
#[derive(Debug, Default)]
pub struct IndexRegistry {
    indexes: Vec<Box<dyn Index>>,
}

impl IndexRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an index after all existing ones.
    pub fn add(&mut self, index: Box<dyn Index>) {
        self.indexes.push(index);
    }

    /// Detach the most recently attached index with this name.
    ///
    /// Returns `None` if no such index is attached.
    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Index>> {
        let position = self.indexes.iter().rposition(|index| index.name() == name)?;
        Some(self.indexes.remove(position))
    }

    /// Detach every index attached after the first `len`.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.indexes.truncate(len);
    }

    /// Attached indexes in attachment order.
    pub fn list(&self) -> impl Iterator<Item = &dyn Index> + '_ {
        self.indexes.iter().map(|index| &**index)
    }

    /// Attached indexes from the most recently attached to the oldest.
    pub fn newest_first(&self) -> impl Iterator<Item = &dyn Index> + '_ {
        self.indexes.iter().rev().map(|index| &**index)
    }

    /// Mutable access to every index, in attachment order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Index>> + '_ {
        self.indexes.iter_mut()
    }

    /// Number of attached indexes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    /// Returns `true` if no index is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }
}
