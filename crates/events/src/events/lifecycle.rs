use serde::{Deserialize, Serialize};

/// Build lifecycle notifications broadcast to registered listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LifecycleEvent {
    /// The build started
    BuildStarted { listeners: usize },

    /// The build is about to complete
    BuildCompleting { listeners: usize },

    /// A listener joined the registry
    ListenerAdded { id: u64 },

    /// A listener left the registry
    ListenerRemoved { id: u64 },
}
