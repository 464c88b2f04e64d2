#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for cfgcache
//!
//! Errors are grouped by the domain that raises them and folded into the
//! crate-wide [`Error`] at crate boundaries. Everything is `Clone`, since a
//! configuration cache failure is shown on the console, sent on the event
//! stream and kept in the build's failure list.

use std::borrow::Cow;
use std::path::PathBuf;

use thiserror::Error;

pub mod config;
pub mod problems;
pub mod report;

pub use config::ConfigError;
pub use problems::{ConsoleText, ProblemCause, ProblemsError};
pub use report::ReportError;

/// Error crossing crate boundaries
#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Problems(#[from] ProblemsError),

    #[error("report error: {0}")]
    Report(#[from] ReportError),

    #[error("{}", io_message(.path.as_ref(), .message))]
    Io {
        path: Option<PathBuf>,
        message: String,
    },
}

fn io_message(path: Option<&PathBuf>, message: &str) -> String {
    match path {
        Some(path) => format!("cannot access {}: {message}", path.display()),
        None => format!("I/O error: {message}"),
    }
}

impl Error {
    /// I/O failure on a known file or directory
    pub fn io_with_path(err: &std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            path: Some(path.into()),
            message: err.to_string(),
        }
    }

    /// Whether this error is one of the two configuration cache build failures
    #[must_use]
    pub fn is_problems_failure(&self) -> bool {
        matches!(
            self,
            Self::Problems(ProblemsError::Disallowed { .. } | ProblemsError::TooMany { .. })
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        ReportError::Serialize {
            message: err.to_string(),
        }
        .into()
    }
}

/// What the CLI needs to present an error to a person
pub trait UserFacingError {
    /// One or more lines shown as the error message
    fn user_message(&self) -> Cow<'_, str>;

    /// Suggested fix, if there is an obvious one
    fn user_hint(&self) -> Option<&'static str> {
        None
    }

    /// Whether running the same command again may succeed
    fn is_retryable(&self) -> bool {
        false
    }

    /// Stable dotted code such as `problems.too_many`
    fn user_code(&self) -> Option<&'static str> {
        None
    }
}

impl UserFacingError for Error {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Error::Config(err) => err.user_message(),
            Error::Problems(err) => err.user_message(),
            Error::Report(err) => err.user_message(),
            Error::Io { .. } => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Error::Config(err) => err.user_hint(),
            Error::Problems(err) => err.user_hint(),
            Error::Report(err) => err.user_hint(),
            Error::Io { .. } => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Error::Report(err) => err.is_retryable(),
            _ => false,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Error::Config(err) => err.user_code(),
            Error::Problems(err) => err.user_code(),
            Error::Report(err) => err.user_code(),
            Error::Io { .. } => Some("error.io"),
        }
    }
}
