use cfgcache_types::CacheAction;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Events raised while deciding the configuration cache outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ConfigCacheEvent {
    /// A problem was accepted by the summarizer
    ProblemReported {
        location: String,
        message: String,
        /// False once the problem was counted but not forwarded to the report
        forwarded: bool,
    },

    /// Build serialization failed; the disallow policy is now suppressed
    SerializationFailed,

    /// Stored state was dropped because the build failed on its problems
    StoredStateInvalidated {
        action: CacheAction,
        problem_count: usize,
    },

    /// The stored entry could not be removed after a failing decision
    InvalidationFailed { path: PathBuf, message: String },

    /// The problems report was written
    ReportWritten {
        path: PathBuf,
        problem_count: usize,
    },

    /// Problems did not fail the build and were surfaced as a warning
    ProblemsWarning { message: String },

    /// Build failed on configuration cache problems
    ProblemsFailed {
        code: Option<String>,
        problem_count: usize,
    },

    /// One-line summary logged when the build completes
    BuildOutcome { message: String },
}
