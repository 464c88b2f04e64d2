//! Configuration cache problem failures

use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::UserFacingError;
use thiserror::Error;

/// Headline of the failure raised when problems are not allowed
pub const DISALLOWED_HEADLINE: &str = "Configuration cache problems found in this build.";

/// Headline of the failure raised when the problem budget is exhausted
pub const TOO_MANY_HEADLINE: &str =
    "Maximum number of configuration cache problems has been reached.";

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum ProblemsError {
    #[error("{}\n{message}", DISALLOWED_HEADLINE)]
    Disallowed {
        causes: Vec<ProblemCause>,
        message: ConsoleText,
    },

    #[error("{}\n{message}", TOO_MANY_HEADLINE)]
    TooMany {
        causes: Vec<ProblemCause>,
        message: ConsoleText,
    },

    #[error("configuration cache action was not set before the outcome was decided")]
    ActionNotSet,

    #[error("configuration cache action already set to `{action}`")]
    ActionAlreadySet { action: String },

    #[error("no stored state invalidation hook for cache action `{action}`")]
    MissingInvalidation { action: String },

    #[error("failing outcome with {problem_count} problems produced no report")]
    FailedWithoutReport { problem_count: usize },
}

impl ProblemsError {
    /// Causes carried by a build failure, empty for internal errors
    #[must_use]
    pub fn causes(&self) -> &[ProblemCause] {
        match self {
            Self::Disallowed { causes, .. } | Self::TooMany { causes, .. } => causes,
            _ => &[],
        }
    }

    /// Console text carried by a build failure
    #[must_use]
    pub fn console_text(&self) -> Option<&ConsoleText> {
        match self {
            Self::Disallowed { message, .. } | Self::TooMany { message, .. } => Some(message),
            _ => None,
        }
    }
}

impl UserFacingError for ProblemsError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Disallowed { .. } => Some(
                "Fix the reported problems, or set `problems.mode = \"warn\"` to report them as warnings.",
            ),
            Self::TooMany { .. } => Some(
                "Raise `problems.max_problems` (or CFGCACHE_MAX_PROBLEMS) to tolerate more problems.",
            ),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        // Same inputs reproduce the same problems
        false
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Disallowed { .. } => "problems.disallowed",
            Self::TooMany { .. } => "problems.too_many",
            Self::ActionNotSet => "problems.action_not_set",
            Self::ActionAlreadySet { .. } => "problems.action_already_set",
            Self::MissingInvalidation { .. } => "problems.missing_invalidation",
            Self::FailedWithoutReport { .. } => "problems.failed_without_report",
        };
        Some(code)
    }
}

/// Underlying fault attached to one or more problems
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProblemCause {
    pub message: String,
    pub location: Option<String>,
}

impl ProblemCause {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl fmt::Display for ProblemCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{location}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

type Render = Box<dyn Fn() -> String + Send + Sync>;

struct ConsoleTextInner {
    rendered: OnceLock<String>,
    render: Option<Render>,
}

/// Console message rendered on first use and shared by every clone
#[derive(Clone)]
pub struct ConsoleText {
    inner: Arc<ConsoleTextInner>,
}

impl ConsoleText {
    /// Defer rendering until the text is first displayed
    pub fn lazy<F>(render: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(ConsoleTextInner {
                rendered: OnceLock::new(),
                render: Some(Box::new(render)),
            }),
        }
    }

    /// Wrap text that is already rendered
    #[must_use]
    pub fn ready(text: impl Into<String>) -> Self {
        let rendered = OnceLock::new();
        let _ = rendered.set(text.into());
        Self {
            inner: Arc::new(ConsoleTextInner {
                rendered,
                render: None,
            }),
        }
    }

    /// Rendered text, computing it on the first call
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.inner.rendered.get_or_init(|| {
            self.inner
                .render
                .as_ref()
                .map_or_else(String::new, |render| render())
        })
    }

    /// Whether the text has been rendered yet
    #[must_use]
    pub fn is_rendered(&self) -> bool {
        self.inner.rendered.get().is_some()
    }
}

impl fmt::Display for ConsoleText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for ConsoleText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.rendered.get() {
            Some(text) => f.debug_tuple("ConsoleText").field(text).finish(),
            None => f.write_str("ConsoleText(<pending>)"),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ConsoleText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ConsoleText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::ready)
    }
}
