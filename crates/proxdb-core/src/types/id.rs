//! Unique identifiers for stored objects.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique, totally ordered handle to one stored object.
///
/// Identifiers are handed out by an [`IdRegistry`](crate::IdRegistry) owned
/// by a single database; they carry no meaning outside that database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DbId(u64);

impl DbId {
    /// Create a new `DbId` from a raw u64 value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw u64 value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for DbId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for DbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
