//! Event handling for the CLI

use cfgcache_events::EventMessage;

use crate::logging::log_event_with_tracing;

/// Routes engine events to JSON output or structured logs
pub struct EventHandler {
    json: bool,
}

impl EventHandler {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, message: EventMessage) {
        if self.json {
            match serde_json::to_string(&message) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::debug!(error = %e, "failed to serialize event"),
            }
        } else {
            log_event_with_tracing(&message);
        }
    }
}
