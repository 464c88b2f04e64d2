//! Structured logging integration for events
//!
//! Decisions are logged at their own level where they are made. Events are
//! recorded here with structured fields for debugging and log shipping.

use cfgcache_events::{AppEvent, ConfigCacheEvent, EventMessage, LifecycleEvent};
use tracing::{debug, trace};

/// Log an `AppEvent` using the tracing infrastructure with structured fields
pub fn log_event_with_tracing(message: &EventMessage) {
    let meta = &message.meta;
    match &message.event {
        AppEvent::ConfigCache(event) => match event {
            ConfigCacheEvent::ProblemReported {
                location,
                message,
                forwarded,
            } => {
                trace!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    location = %location,
                    forwarded = forwarded,
                    "Problem reported: {message}"
                );
            }
            ConfigCacheEvent::SerializationFailed => {
                debug!(
                    source = meta.source.as_str(),
                    correlation = ?meta.correlation_id,
                    "Serialization failure flagged"
                );
            }
            ConfigCacheEvent::StoredStateInvalidated {
                action,
                problem_count,
            } => {
                debug!(
                    source = meta.source.as_str(),
                    correlation = ?meta.correlation_id,
                    action = %action,
                    problem_count = problem_count,
                    "Stored state invalidated"
                );
            }
            ConfigCacheEvent::InvalidationFailed { path, message } => {
                debug!(
                    source = meta.source.as_str(),
                    correlation = ?meta.correlation_id,
                    path = %path.display(),
                    error = %message,
                    "Stored state could not be removed"
                );
            }
            ConfigCacheEvent::ReportWritten {
                path,
                problem_count,
            } => {
                debug!(
                    source = meta.source.as_str(),
                    correlation = ?meta.correlation_id,
                    path = %path.display(),
                    problem_count = problem_count,
                    "Report written"
                );
            }
            ConfigCacheEvent::ProblemsWarning { .. } => {
                debug!(
                    source = meta.source.as_str(),
                    correlation = ?meta.correlation_id,
                    "Problems reported as warning"
                );
            }
            ConfigCacheEvent::ProblemsFailed {
                code,
                problem_count,
            } => {
                debug!(
                    source = meta.source.as_str(),
                    correlation = ?meta.correlation_id,
                    code = ?code,
                    problem_count = problem_count,
                    "Problems failed the build"
                );
            }
            ConfigCacheEvent::BuildOutcome { message } => {
                debug!(
                    source = meta.source.as_str(),
                    correlation = ?meta.correlation_id,
                    outcome = %message,
                    "Build outcome"
                );
            }
        },

        AppEvent::Lifecycle(event) => match event {
            LifecycleEvent::BuildStarted { listeners } => {
                trace!(listeners = listeners, "Build started");
            }
            LifecycleEvent::BuildCompleting { listeners } => {
                trace!(listeners = listeners, "Build completing");
            }
            LifecycleEvent::ListenerAdded { id } => trace!(id = id, "Listener added"),
            LifecycleEvent::ListenerRemoved { id } => trace!(id = id, "Listener removed"),
        },
    }
}
