//! Build lifecycle listener registry
//!
//! Components that need to act when the build completes register a
//! [`BuildLifecycleListener`] and keep the returned
//! [`ListenerRegistration`]. Dropping the registration (or calling
//! [`ListenerRegistration::remove`]) detaches the listener, so a listener
//! can never outlive the build it was registered for.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use crate::{AppEvent, EventEmitter, EventSender, LifecycleEvent};

/// Receives build lifecycle notifications
pub trait BuildLifecycleListener: Send + Sync {
    /// Called once the build has started
    fn after_start(&self) {}

    /// Called once, right before the build completes
    fn before_complete(&self);
}

/// Identifier handed out for each registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

type Entry = (ListenerId, Arc<dyn BuildLifecycleListener>);

struct Registry {
    next_id: AtomicU64,
    listeners: Mutex<Vec<Entry>>,
    event_sender: Option<EventSender>,
}

impl Registry {
    fn snapshot(&self) -> Vec<Arc<dyn BuildLifecycleListener>> {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    fn remove(&self, id: ListenerId) -> bool {
        let removed = {
            let mut listeners = self
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let before = listeners.len();
            listeners.retain(|(entry_id, _)| *entry_id != id);
            listeners.len() != before
        };
        if removed {
            self.emit(AppEvent::Lifecycle(LifecycleEvent::ListenerRemoved {
                id: id.as_u64(),
            }));
        }
        removed
    }
}

impl EventEmitter for Registry {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

/// Thread-safe registry that dispatches build lifecycle notifications
#[derive(Clone)]
pub struct ListenerManager {
    registry: Arc<Registry>,
}

impl ListenerManager {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create an empty registry that reports lifecycle events
    #[must_use]
    pub fn with_events(event_sender: EventSender) -> Self {
        Self::build(Some(event_sender))
    }

    fn build(event_sender: Option<EventSender>) -> Self {
        Self {
            registry: Arc::new(Registry {
                next_id: AtomicU64::new(1),
                listeners: Mutex::new(Vec::new()),
                event_sender,
            }),
        }
    }

    /// Register a listener until the returned guard is dropped
    #[must_use = "dropping the registration detaches the listener immediately"]
    pub fn add_listener(&self, listener: Arc<dyn BuildLifecycleListener>) -> ListenerRegistration {
        let id = ListenerId(self.registry.next_id.fetch_add(1, Ordering::Relaxed));
        self.registry
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        self.registry
            .emit(AppEvent::Lifecycle(LifecycleEvent::ListenerAdded {
                id: id.as_u64(),
            }));

        ListenerRegistration {
            registry: Arc::downgrade(&self.registry),
            id: Some(id),
        }
    }

    /// Detach a listener by id; returns whether it was registered
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.registry.remove(id)
    }

    /// Number of registered listeners
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Notify every listener that the build started
    pub fn after_start(&self) {
        let listeners = self.registry.snapshot();
        self.registry
            .emit(AppEvent::Lifecycle(LifecycleEvent::BuildStarted {
                listeners: listeners.len(),
            }));
        for listener in listeners {
            listener.after_start();
        }
    }

    /// Notify every listener that the build is about to complete
    ///
    /// Listeners are called outside the registry lock, in registration
    /// order, so they may deregister themselves while being notified.
    pub fn before_complete(&self) {
        let listeners = self.registry.snapshot();
        self.registry
            .emit(AppEvent::Lifecycle(LifecycleEvent::BuildCompleting {
                listeners: listeners.len(),
            }));
        for listener in listeners {
            listener.before_complete();
        }
    }
}

impl Default for ListenerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ListenerManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerManager")
            .field("listeners", &self.len())
            .finish_non_exhaustive()
    }
}

/// RAII guard for a registered listener
///
/// The listener is detached exactly once: on [`remove`](Self::remove) or
/// when the guard is dropped, whichever happens first.
pub struct ListenerRegistration {
    registry: Weak<Registry>,
    id: Option<ListenerId>,
}

impl ListenerRegistration {
    /// Id of the registered listener, `None` once removed
    #[must_use]
    pub fn id(&self) -> Option<ListenerId> {
        self.id
    }

    /// Detach the listener now; returns whether this call detached it
    pub fn remove(&mut self) -> bool {
        let Some(id) = self.id.take() else {
            return false;
        };
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.remove(id))
    }
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        self.remove();
    }
}

impl fmt::Debug for ListenerRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistration")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingListener {
        started: AtomicUsize,
        completed: AtomicUsize,
    }

    impl BuildLifecycleListener for CountingListener {
        fn after_start(&self) {
            self.started.fetch_add(1, Ordering::SeqCst);
        }

        fn before_complete(&self) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn registered_listener_is_notified() {
        let manager = ListenerManager::new();
        let listener = Arc::new(CountingListener::default());
        let _registration = manager.add_listener(listener.clone());

        manager.after_start();
        manager.before_complete();

        assert_eq!(listener.started.load(Ordering::SeqCst), 1);
        assert_eq!(listener.completed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_registration_detaches_listener() {
        let manager = ListenerManager::new();
        let listener = Arc::new(CountingListener::default());
        let registration = manager.add_listener(listener.clone());
        assert_eq!(manager.len(), 1);

        drop(registration);
        assert!(manager.is_empty());

        manager.before_complete();
        assert_eq!(listener.completed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn explicit_remove_happens_once() {
        let manager = ListenerManager::new();
        let mut registration = manager.add_listener(Arc::new(CountingListener::default()));
        let id = registration.id().unwrap();

        assert!(registration.remove());
        assert!(!registration.remove());
        assert!(!manager.remove_listener(id));
        assert!(registration.id().is_none());
    }

    #[test]
    fn registration_outliving_manager_is_harmless() {
        let manager = ListenerManager::new();
        let mut registration = manager.add_listener(Arc::new(CountingListener::default()));
        drop(manager);
        assert!(!registration.remove());
    }
}
