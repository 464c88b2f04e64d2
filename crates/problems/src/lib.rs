#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration cache problem reporting
//!
//! Problems reported while the configuration cache is loaded, stored or
//! updated are aggregated by a [`ProblemsSummarizer`]. When the cache phase
//! completes, [`ConfigCacheProblems`] turns the counts and flags into a
//! pass, warn or fail decision, writes the report and raises the matching
//! [`ProblemsError`](cfgcache_errors::ProblemsError). When the build
//! completes it logs a single outcome line.

mod engine;
pub mod outcome;
pub mod summary;

pub use engine::ConfigCacheProblems;
pub use outcome::{
    build_outcome_message, counter, CachePhaseDecision, DecisionState, InvalidateStoredState,
    OutcomeInputs, ProblemsPolicy, Verdict,
};
pub use summary::{ProblemsSummarizer, Summary, UniquePropertyProblem};

use std::path::Path;

use cfgcache_errors::Error;
use cfgcache_types::PropertyProblem;

/// Receives problems as they are discovered, possibly from many threads
pub trait ProblemsListener: Send + Sync {
    fn on_problem(&self, problem: PropertyProblem);
}

/// Turns collected problems into a report and, if warranted, a build failure
pub trait ProblemReporter: Send + Sync {
    /// Stable identifier of the reporter
    fn id(&self) -> &'static str;

    /// Decide the outcome of the cache phase
    ///
    /// # Errors
    ///
    /// Returns a [`ProblemsError`](cfgcache_errors::ProblemsError) when the
    /// problems fail the build, or any error raised while writing the report.
    fn report(&self, reports_root: &Path) -> Result<(), Error>;
}
