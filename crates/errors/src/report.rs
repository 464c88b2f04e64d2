//! Report writing error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum ReportError {
    #[error("cannot create report directory {path}: {message}")]
    OutputDirectory { path: String, message: String },

    #[error("failed to write report {path}: {message}")]
    WriteFailed { path: String, message: String },

    #[error("failed to serialize report: {message}")]
    Serialize { message: String },
}

impl ReportError {
    /// Map a directory creation failure
    #[must_use]
    pub fn output_directory(err: &std::io::Error, path: &std::path::Path) -> Self {
        Self::OutputDirectory {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    /// Map a report file write failure
    #[must_use]
    pub fn write_failed(err: &std::io::Error, path: &std::path::Path) -> Self {
        Self::WriteFailed {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

impl UserFacingError for ReportError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::OutputDirectory { .. } | Self::WriteFailed { .. } => {
                Some("Ensure the reports directory is writable and retry.")
            }
            Self::Serialize { .. } => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::OutputDirectory { .. } | Self::WriteFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::OutputDirectory { .. } => "report.output_directory",
            Self::WriteFailed { .. } => "report.write_failed",
            Self::Serialize { .. } => "report.serialize",
        };
        Some(code)
    }
}
