//! Observable state container.
//!
//! Holds the latest accepted snapshot and an insertion-ordered listener
//! registry. Every replacement fans out synchronously to all listeners in
//! subscription order. The container performs no staleness checks of its own;
//! the poll engine is its single logical writer.

use std::sync::{Arc, Mutex};

/// Listener callback invoked with every accepted state
pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Handle identifying one registration.
///
/// Registration is by handle, not by callback identity: the same closure may
/// be registered twice and each registration fans out independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Observable state container
pub struct ObservableState<T> {
    inner: Mutex<Inner<T>>,
}

struct Inner<T> {
    state: Option<T>,
    next_id: u64,
    listeners: Vec<(ListenerId, Listener<T>)>,
}

impl<T: Clone> ObservableState<T> {
    /// Create an empty container (no state yet, no listeners)
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: None,
                next_id: 0,
                listeners: Vec::new(),
            }),
        }
    }

    /// Replace the held state unconditionally and notify every listener,
    /// in subscription order, on the calling task.
    ///
    /// Listener panics propagate to the caller; the container does not
    /// shield itself.
    pub fn set(&self, value: T) {
        // Snapshot the registry so listeners run outside the lock and may
        // re-enter `get`/`add_listener`/`remove_listener` freely.
        let listeners: Vec<Listener<T>> = {
            let mut inner = self.inner.lock().unwrap();
            inner.state = Some(value.clone());
            inner
                .listeners
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .collect()
        };

        for listener in listeners {
            listener(&value);
        }
    }

    /// Last value set, or `None` if never set
    pub fn get(&self) -> Option<T> {
        self.inner.lock().unwrap().state.clone()
    }

    /// Register a listener; returns the handle used for removal
    pub fn add_listener(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> ListenerId {
        let mut inner = self.inner.lock().unwrap();
        let id = ListenerId(inner.next_id);
        inner.next_id += 1;
        inner.listeners.push((id, Arc::new(listener)));
        id
    }

    /// Deregister by handle; removing an absent handle is a no-op
    pub fn remove_listener(&self, id: ListenerId) {
        let mut inner = self.inner.lock().unwrap();
        inner.listeners.retain(|(listener_id, _)| *listener_id != id);
    }

    /// Number of currently registered listeners
    pub fn listener_count(&self) -> usize {
        self.inner.lock().unwrap().listeners.len()
    }
}

impl<T: Clone> Default for ObservableState<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for ObservableState<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock().unwrap();
        f.debug_struct("ObservableState")
            .field("has_state", &inner.state.is_some())
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}
