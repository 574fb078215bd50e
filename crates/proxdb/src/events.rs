//! Change notification for database listeners.
//!
//! The [`EventManager`] delivers two kinds of notifications:
//!
//! - [`DataStoreEvent`]s when objects are inserted, removed or updated
//! - [`ResultEvent`]s when derived results (indexes included) are attached or detached
//!
//! Data store events are delivered immediately while the manager is idle.
//! Between [`accumulate`](EventManager::accumulate) and
//! [`flush`](EventManager::flush) they are buffered: consecutive events of
//! the same kind merge into one, and a change of kind delivers the pending
//! group before a new one starts. A listener that fails or panics is logged
//! and skipped; the remaining listeners still receive the event.

use std::error::Error as StdError;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::warn;

use proxdb_core::DbId;

/// Result returned by listeners.
pub type ListenerResult = std::result::Result<(), Box<dyn StdError + Send + Sync>>;

/// What happened to the objects of a [`DataStoreEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataStoreEventKind {
    /// Objects were inserted.
    Inserted,
    /// Objects were removed.
    Removed,
    /// Values of existing objects changed.
    Updated,
}

impl fmt::Display for DataStoreEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inserted => f.write_str("inserted"),
            Self::Removed => f.write_str("removed"),
            Self::Updated => f.write_str("updated"),
        }
    }
}

/// A group of objects that changed the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataStoreEvent {
    kind: DataStoreEventKind,
    ids: Vec<DbId>,
}

impl DataStoreEvent {
    /// Create an event.
    #[must_use]
    pub fn new(kind: DataStoreEventKind, ids: Vec<DbId>) -> Self {
        Self { kind, ids }
    }

    /// The kind of change.
    #[must_use]
    pub const fn kind(&self) -> DataStoreEventKind {
        self.kind
    }

    /// The affected objects, in the order the changes happened.
    #[must_use]
    pub fn ids(&self) -> &[DbId] {
        &self.ids
    }
}

/// A derived result was attached to or detached from a parent result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultEvent {
    /// A result was attached.
    Added {
        /// Name of the new result.
        name: String,
        /// Name of its parent.
        parent: String,
    },
    /// A result was detached.
    Removed {
        /// Name of the removed result.
        name: String,
        /// Name of its former parent.
        parent: String,
    },
}

/// Observer of object insertions, removals and updates.
pub trait DataStoreListener: Send + Sync {
    /// Called once per delivered event.
    ///
    /// # Errors
    ///
    /// Errors are logged by the manager and do not stop delivery.
    fn content_changed(&self, event: &DataStoreEvent) -> ListenerResult;
}

/// Observer of derived results.
pub trait ResultListener: Send + Sync {
    /// Called once per attached or detached result.
    ///
    /// # Errors
    ///
    /// Errors are logged by the manager and do not stop delivery.
    fn result_changed(&self, event: &ResultEvent) -> ListenerResult;
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    Accumulating(Option<DataStoreEvent>),
}

/// Buffers and delivers change notifications.
#[derive(Default)]
pub struct EventManager {
    data_listeners: Vec<Arc<dyn DataStoreListener>>,
    result_listeners: Vec<Arc<dyn ResultListener>>,
    state: State,
}

impl fmt::Debug for EventManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventManager")
            .field("data_listeners", &self.data_listeners.len())
            .field("result_listeners", &self.result_listeners.len())
            .field("state", &self.state)
            .finish()
    }
}

fn same_listener<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl EventManager {
    /// Create a manager with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a data store listener. Registering it again has no effect.
    pub fn add_listener(&mut self, listener: Arc<dyn DataStoreListener>) {
        if !self.data_listeners.iter().any(|l| same_listener(l, &listener)) {
            self.data_listeners.push(listener);
        }
    }

    /// Unregister a data store listener. Unknown listeners are ignored.
    pub fn remove_listener(&mut self, listener: &Arc<dyn DataStoreListener>) {
        self.data_listeners.retain(|l| !same_listener(l, listener));
    }

    /// Register a result listener. Registering it again has no effect.
    pub fn add_result_listener(&mut self, listener: Arc<dyn ResultListener>) {
        if !self.result_listeners.iter().any(|l| same_listener(l, &listener)) {
            self.result_listeners.push(listener);
        }
    }

    /// Unregister a result listener. Unknown listeners are ignored.
    pub fn remove_result_listener(&mut self, listener: &Arc<dyn ResultListener>) {
        self.result_listeners.retain(|l| !same_listener(l, listener));
    }

    /// Number of registered data store listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.data_listeners.len()
    }

    /// Returns `true` between [`accumulate`](Self::accumulate) and [`flush`](Self::flush).
    #[must_use]
    pub const fn is_accumulating(&self) -> bool {
        matches!(self.state, State::Accumulating(_))
    }

    /// Start buffering data store events.
    pub fn accumulate(&mut self) {
        if let State::Idle = self.state {
            self.state = State::Accumulating(None);
        }
    }

    /// Deliver buffered events and stop buffering.
    pub fn flush(&mut self) {
        if let State::Accumulating(pending) = std::mem::take(&mut self.state) {
            if let Some(event) = pending {
                self.dispatch(&event);
            }
        }
    }

    /// Notify listeners of inserted objects.
    pub fn fire_inserted(&mut self, ids: Vec<DbId>) {
        self.fire(DataStoreEvent::new(DataStoreEventKind::Inserted, ids));
    }

    /// Notify listeners of removed objects.
    pub fn fire_removed(&mut self, ids: Vec<DbId>) {
        self.fire(DataStoreEvent::new(DataStoreEventKind::Removed, ids));
    }

    /// Notify listeners of updated objects.
    pub fn fire_updated(&mut self, ids: Vec<DbId>) {
        self.fire(DataStoreEvent::new(DataStoreEventKind::Updated, ids));
    }

    fn fire(&mut self, event: DataStoreEvent) {
        if event.ids.is_empty() {
            return;
        }
        if !self.is_accumulating() {
            self.dispatch(&event);
            return;
        }
        let State::Accumulating(pending) = &mut self.state else {
            return;
        };
        if let Some(group) = pending.as_mut().filter(|group| group.kind == event.kind) {
            group.ids.extend(event.ids);
            return;
        }
        if let Some(previous) = pending.replace(event) {
            self.dispatch(&previous);
        }
    }

    fn dispatch(&self, event: &DataStoreEvent) {
        for (position, listener) in self.data_listeners.iter().enumerate() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener.content_changed(event)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(listener = position, kind = %event.kind, error = %e, "data store listener failed");
                }
                Err(_) => {
                    warn!(listener = position, kind = %event.kind, "data store listener panicked");
                }
            }
        }
    }

    /// Notify result listeners that a result was attached.
    pub fn fire_result_added(&self, name: impl Into<String>, parent: impl Into<String>) {
        self.dispatch_result(&ResultEvent::Added { name: name.into(), parent: parent.into() });
    }

    /// Notify result listeners that a result was detached.
    pub fn fire_result_removed(&self, name: impl Into<String>, parent: impl Into<String>) {
        self.dispatch_result(&ResultEvent::Removed { name: name.into(), parent: parent.into() });
    }

    fn dispatch_result(&self, event: &ResultEvent) {
        for (position, listener) in self.result_listeners.iter().enumerate() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener.result_changed(event)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(listener = position, error = %e, "result listener failed"),
                Err(_) => warn!(listener = position, "result listener panicked"),
            }
        }
    }
}
