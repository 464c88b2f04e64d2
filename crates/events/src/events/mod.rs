use serde::{Deserialize, Serialize};

use crate::EventSource;
use cfgcache_errors::UserFacingError;

pub mod config_cache;
pub mod lifecycle;

pub use config_cache::*;
pub use lifecycle::*;

/// Serializable rendering of a [`UserFacingError`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    pub retryable: bool,
}

impl FailureContext {
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self {
            code: error.user_code().map(Into::into),
            message: error.user_message().into_owned(),
            hint: error.user_hint().map(Into::into),
            retryable: error.is_retryable(),
        }
    }
}

/// Every event cfgcache emits, tagged by domain
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// Problem collection and outcome decisions
    ConfigCache(ConfigCacheEvent),

    /// Listener registry notifications
    Lifecycle(LifecycleEvent),
}

impl AppEvent {
    #[must_use]
    pub fn event_source(&self) -> EventSource {
        match self {
            Self::ConfigCache(_) => EventSource::ConfigCache,
            Self::Lifecycle(_) => EventSource::Lifecycle,
        }
    }

    /// Level the event is recorded at
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::ConfigCache(event) => match event {
                ConfigCacheEvent::ProblemsFailed { .. } => Level::ERROR,
                ConfigCacheEvent::ProblemsWarning { .. }
                | ConfigCacheEvent::BuildOutcome { .. }
                | ConfigCacheEvent::StoredStateInvalidated { .. }
                | ConfigCacheEvent::InvalidationFailed { .. }
                | ConfigCacheEvent::SerializationFailed => Level::WARN,
                ConfigCacheEvent::ReportWritten { .. } => Level::INFO,
                ConfigCacheEvent::ProblemReported { .. } => Level::DEBUG,
            },
            Self::Lifecycle(
                LifecycleEvent::BuildStarted { .. } | LifecycleEvent::BuildCompleting { .. },
            ) => Level::DEBUG,
            Self::Lifecycle(
                LifecycleEvent::ListenerAdded { .. } | LifecycleEvent::ListenerRemoved { .. },
            ) => Level::TRACE,
        }
    }
}
