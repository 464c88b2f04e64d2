#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Problem report writing for cfgcache
//!
//! The decision engine forwards every newly significant problem to a
//! [`ReportWriter`] and, once the cache phase is over, asks it to write a
//! report file. Writers return `None` when they have nothing to report.

mod html;

pub use html::{HtmlReport, ReportDiagnostic, ReportDocument};

use cfgcache_errors::Error;
use cfgcache_types::PropertyProblem;
use std::path::{Path, PathBuf};

/// Collects forwarded problems and renders them to a report file
pub trait ReportWriter: Send + Sync {
    /// Record a problem the summarizer considered significant
    fn on_problem(&self, problem: &PropertyProblem);

    /// Write the report below `output_dir`
    ///
    /// Returns the report file, or `None` when there was nothing to report.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the report
    /// cannot be serialized or written.
    fn write_report_file_to(
        &self,
        output_dir: &Path,
        cache_action: &str,
        requested_tasks: &str,
        problem_count: usize,
    ) -> Result<Option<PathBuf>, Error>;
}
