//! Database configuration.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use proxdb_vector::IndexFactory;

use crate::database::Database;
use crate::events::DataStoreListener;

/// Configuration options for creating a database.
///
/// Partitions of a database are created with the same configuration, so
/// they get the same kinds of indexes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Whether deleted identifiers are handed out again.
    pub reuse_identifiers: bool,
    /// Factories building an index for each matching relation, in attachment order.
    #[serde(skip)]
    pub index_factories: Vec<Arc<dyn IndexFactory>>,
}

impl Default for Config {
    fn default() -> Self {
        Self { reuse_identifiers: true, index_factories: Vec::new() }
    }
}

impl Config {
    /// Create a default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether deleted identifiers are reused.
    #[must_use]
    pub fn reuse_identifiers(mut self, reuse: bool) -> Self {
        self.reuse_identifiers = reuse;
        self
    }

    /// Add an index factory.
    #[must_use]
    pub fn with_index(mut self, factory: Arc<dyn IndexFactory>) -> Self {
        self.index_factories.push(factory);
        self
    }
}

/// Builder for [`Database`].
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use proxdb::{DatabaseBuilder, DistanceMetric, MaterializedKnnIndexFactory};
///
/// let db = DatabaseBuilder::new()
///     .reuse_identifiers(false)
///     .index(Arc::new(MaterializedKnnIndexFactory::new(Arc::new(DistanceMetric::Euclidean), 10)?))
///     .build();
/// ```
#[derive(Default)]
pub struct DatabaseBuilder {
    config: Config,
    listeners: Vec<Arc<dyn DataStoreListener>>,
}

impl fmt::Debug for DatabaseBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseBuilder")
            .field("config", &self.config)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl DatabaseBuilder {
    /// Create a builder with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Set whether deleted identifiers are reused.
    #[must_use]
    pub fn reuse_identifiers(mut self, reuse: bool) -> Self {
        self.config.reuse_identifiers = reuse;
        self
    }

    /// Add an index factory.
    #[must_use]
    pub fn index(mut self, factory: Arc<dyn IndexFactory>) -> Self {
        self.config.index_factories.push(factory);
        self
    }

    /// Register a data store listener.
    #[must_use]
    pub fn listener(mut self, listener: Arc<dyn DataStoreListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Create the database.
    #[must_use]
    pub fn build(self) -> Database {
        let mut db = Database::new(self.config);
        for listener in self.listeners {
            db.add_listener(listener);
        }
        db
    }
}
