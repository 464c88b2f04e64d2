//! CLI error handling

use std::fmt;

use cfgcache_errors::UserFacingError;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Error raised by the cfgcache crates
    Check(cfgcache_errors::Error),
    /// Invalid command arguments or input files
    InvalidArguments(String),
    /// Worker task failed to complete
    Internal(String),
}

impl CliError {
    /// Whether the build failed on its configuration cache problems
    pub fn is_problems_failure(&self) -> bool {
        matches!(self, CliError::Check(e) if e.is_problems_failure())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Check(e) => {
                let message = e.user_message();
                write!(f, "{message}")?;
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                if e.is_retryable() {
                    write!(f, "\n  Retry: safe to retry this operation.")?;
                }
                Ok(())
            }
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Check(e) => Some(e),
            _ => None,
        }
    }
}

impl From<cfgcache_errors::Error> for CliError {
    fn from(e: cfgcache_errors::Error) -> Self {
        CliError::Check(e)
    }
}
