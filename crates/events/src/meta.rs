use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::Level;
use uuid::Uuid;

/// Envelope data stamped on every emitted event
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMeta {
    pub event_id: Uuid,
    /// Cache key of the build the event belongs to
    pub correlation_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub level: EventLevel,
    pub source: EventSource,
}

impl EventMeta {
    #[must_use]
    pub fn new(level: impl Into<EventLevel>, source: EventSource) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            correlation_id: None,
            timestamp: Utc::now(),
            level: level.into(),
            source,
        }
    }

    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }
}

/// Severity of an event, mirroring tracing levels
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<Level> for EventLevel {
    fn from(level: Level) -> Self {
        if level == Level::ERROR {
            Self::Error
        } else if level == Level::WARN {
            Self::Warn
        } else if level == Level::INFO {
            Self::Info
        } else if level == Level::DEBUG {
            Self::Debug
        } else {
            Self::Trace
        }
    }
}

/// Subsystem an event originated from
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    ConfigCache,
    Lifecycle,
}

impl EventSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConfigCache => "config_cache",
            Self::Lifecycle => "lifecycle",
        }
    }
}
