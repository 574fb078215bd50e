//! Identifier allocation and reclamation.
//!
//! The [`IdRegistry`] hands out [`DbId`]s from a monotonic counter and keeps
//! a pool of identifiers below the counter that are not currently assigned.
//! The pool is stored as disjoint half-open ranges so that claiming a large
//! caller-assigned identifier does not materialize the gap below it.

use std::collections::BTreeMap;

use tracing::trace;

use crate::error::CoreError;
use crate::relation::AnyRelation;
use crate::types::DbId;

/// Allocates unique identifiers and takes them back after deletion.
///
/// Every raw value below the counter is either assigned or in the free pool.
/// Freed identifiers are handed out again by [`allocate`](Self::allocate)
/// only when reuse is enabled; they can always be claimed explicitly.
#[derive(Debug, Clone)]
pub struct IdRegistry {
    /// Next never-assigned raw value.
    next: u64,
    /// Unassigned ranges below `next`, keyed by start, value is exclusive end.
    free: BTreeMap<u64, u64>,
    /// Whether `allocate` takes identifiers from the free pool.
    reuse: bool,
}

impl Default for IdRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl IdRegistry {
    /// Create a registry that reuses deallocated identifiers.
    #[must_use]
    pub fn new() -> Self {
        Self { next: 0, free: BTreeMap::new(), reuse: true }
    }

    /// Enable or disable reuse of deallocated identifiers.
    #[must_use]
    pub const fn with_reuse(mut self, reuse: bool) -> Self {
        self.reuse = reuse;
        self
    }

    /// Produce an identifier that is not currently assigned.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidState`] when the identifier space is exhausted.
    pub fn allocate(&mut self) -> Result<DbId, CoreError> {
        if self.reuse {
            if let Some((start, end)) = self.free.pop_first() {
                if start + 1 < end {
                    self.free.insert(start + 1, end);
                }
                trace!(id = start, "reusing identifier");
                return Ok(DbId::new(start));
            }
        }
        let id = self.next;
        self.next = id
            .checked_add(1)
            .ok_or_else(|| CoreError::InvalidState("identifier space exhausted".to_owned()))?;
        trace!(id, "allocated identifier");
        Ok(DbId::new(id))
    }

    /// Mark a caller-supplied identifier as assigned.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AlreadyExists`] if the identifier is assigned.
    pub fn claim(&mut self, id: DbId) -> Result<(), CoreError> {
        let raw = id.as_u64();
        if raw >= self.next {
            let next = raw
                .checked_add(1)
                .ok_or_else(|| CoreError::InvalidState("identifier space exhausted".to_owned()))?;
            if raw > self.next {
                self.insert_free(self.next, raw);
            }
            self.next = next;
            trace!(id = raw, "claimed identifier");
            return Ok(());
        }

        let (start, end) = self.free_range_containing(raw).ok_or(CoreError::AlreadyExists(id))?;
        self.free.remove(&start);
        if start < raw {
            self.free.insert(start, raw);
        }
        if raw + 1 < end {
            self.free.insert(raw + 1, end);
        }
        trace!(id = raw, "claimed identifier");
        Ok(())
    }

    /// Return an identifier to the free pool.
    ///
    /// `holders` are the relations that must no longer reference the
    /// identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidState`] if the identifier is still stored
    /// in one of `holders`, or if it is not currently assigned.
    pub fn deallocate<'a, I, R>(&mut self, id: DbId, holders: I) -> Result<(), CoreError>
    where
        I: IntoIterator<Item = &'a R>,
        R: AnyRelation + ?Sized + 'a,
    {
        if let Some(holder) = holders.into_iter().find(|r| r.contains(id)) {
            return Err(CoreError::InvalidState(format!(
                "identifier {id} is still referenced by relation '{}'",
                holder.name()
            )));
        }
        if !self.is_allocated(id) {
            return Err(CoreError::InvalidState(format!("identifier {id} is not allocated")));
        }
        let raw = id.as_u64();
        self.insert_free(raw, raw + 1);
        trace!(id = raw, "deallocated identifier");
        Ok(())
    }

    /// Returns `true` if the identifier is currently assigned.
    #[must_use]
    pub fn is_allocated(&self, id: DbId) -> bool {
        let raw = id.as_u64();
        raw < self.next && self.free_range_containing(raw).is_none()
    }

    #[cfg(test)]
    fn allocated(&self) -> u64 {
        let free: u64 = self.free.iter().map(|(start, end)| end - start).sum();
        self.next - free
    }

    fn free_range_containing(&self, raw: u64) -> Option<(u64, u64)> {
        self.free
            .range(..=raw)
            .next_back()
            .filter(|&(_, &end)| raw < end)
            .map(|(&start, &end)| (start, end))
    }

    /// Insert `[start, end)` into the pool, merging with adjacent ranges.
    fn insert_free(&mut self, mut start: u64, mut end: u64) {
        if let Some((&prev_start, &prev_end)) = self.free.range(..start).next_back() {
            if prev_end == start {
                self.free.remove(&prev_start);
                start = prev_start;
            }
        }
        if let Some(next_end) = self.free.remove(&end) {
            end = next_end;
        }
        self.free.insert(start, end);
    }
}
