#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Events and build lifecycle notifications for cfgcache
//!
//! Components emit [`AppEvent`]s on an unbounded channel so the CLI can log
//! them or stream them as JSON. The [`ListenerManager`] dispatches build
//! start and completion to registered [`BuildLifecycleListener`]s; each
//! registration is a guard that detaches the listener when dropped.

pub mod meta;
pub use meta::{EventLevel, EventMeta, EventSource};

pub mod events;
pub use events::{AppEvent, ConfigCacheEvent, FailureContext, LifecycleEvent};

pub mod listener;
pub use listener::{BuildLifecycleListener, ListenerId, ListenerManager, ListenerRegistration};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// An event with its envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub meta: EventMeta,
    pub event: AppEvent,
}

pub type EventSender = UnboundedSender<EventMessage>;

pub type EventReceiver = UnboundedReceiver<EventMessage>;

#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// Anything that can put events on the channel
pub trait EventEmitter {
    fn event_sender(&self) -> Option<&EventSender>;

    /// Stamped on every event from this emitter
    fn correlation_id(&self) -> Option<&str> {
        None
    }

    fn emit(&self, event: AppEvent) {
        let Some(sender) = self.event_sender() else {
            return;
        };
        let mut meta = EventMeta::new(event.log_level(), event.event_source());
        if let Some(correlation_id) = self.correlation_id() {
            meta = meta.with_correlation_id(correlation_id);
        }
        // A closed receiver only means nobody is listening any more
        let _ = sender.send(EventMessage { meta, event });
    }

    fn emit_config_cache(&self, event: ConfigCacheEvent) {
        self.emit(AppEvent::ConfigCache(event));
    }
}

impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}
