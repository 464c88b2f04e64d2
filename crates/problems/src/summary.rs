//! Problem aggregation and console summaries

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use cfgcache_config::constants::{MAX_CAUSES, MAX_CONSOLE_PROBLEMS, MAX_REPORTED_PROBLEMS};
use cfgcache_types::{DocumentationSection, ProblemCause, PropertyProblem};

/// A problem reduced to what makes it distinct for the user
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniquePropertyProblem {
    pub user_code_location: String,
    pub message: String,
    pub documentation: Option<DocumentationSection>,
}

impl UniquePropertyProblem {
    #[must_use]
    pub fn of(problem: &PropertyProblem) -> Self {
        Self {
            user_code_location: problem.trace.user_code_location().to_string(),
            message: problem.message.clone(),
            documentation: problem.documentation,
        }
    }
}

#[derive(Debug, Default)]
struct Tally {
    problem_count: usize,
    seen: HashSet<UniquePropertyProblem>,
    unique_problems: Vec<UniquePropertyProblem>,
    causes: Vec<ProblemCause>,
}

/// Thread-safe aggregator of reported problems
///
/// Every problem is counted. The first [`MAX_REPORTED_PROBLEMS`] are also
/// deduplicated and forwarded; later ones only bump the count.
#[derive(Debug, Default)]
pub struct ProblemsSummarizer {
    tally: Mutex<Tally>,
}

impl ProblemsSummarizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a problem; returns whether it should be forwarded to the report
    pub fn on_problem(&self, problem: &PropertyProblem) -> bool {
        let mut tally = self.tally.lock().unwrap_or_else(PoisonError::into_inner);
        tally.problem_count += 1;
        if tally.problem_count > MAX_REPORTED_PROBLEMS {
            return false;
        }

        let unique = UniquePropertyProblem::of(problem);
        if tally.seen.insert(unique.clone()) {
            tally.unique_problems.push(unique);
        }
        if let Some(cause) = &problem.cause {
            if tally.causes.len() < MAX_CAUSES {
                tally.causes.push(cause.clone());
            }
        }
        true
    }

    /// Snapshot of everything reported so far
    #[must_use]
    pub fn get(&self) -> Summary {
        let tally = self.tally.lock().unwrap_or_else(PoisonError::into_inner);
        Summary {
            problem_count: tally.problem_count,
            unique_problems: tally.unique_problems.clone(),
            causes: tally.causes.clone(),
        }
    }
}

/// Immutable snapshot of the aggregated problems
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    problem_count: usize,
    unique_problems: Vec<UniquePropertyProblem>,
    causes: Vec<ProblemCause>,
}

impl Summary {
    /// Total number of problems reported, including ones past the report cap
    #[must_use]
    pub fn problem_count(&self) -> usize {
        self.problem_count
    }

    /// Distinct problems in the order they were first reported
    #[must_use]
    pub fn unique_problems(&self) -> &[UniquePropertyProblem] {
        &self.unique_problems
    }

    /// Underlying causes in report order
    #[must_use]
    pub fn causes(&self) -> &[ProblemCause] {
        &self.causes
    }

    /// Multi-line console summary pointing at the report file
    #[must_use]
    pub fn text_for_console(
        &self,
        cache_action: &str,
        report_file: &Path,
        documentation_url: &str,
    ) -> String {
        let mut text = String::new();
        self.append_header(&mut text, cache_action);
        text.push('\n');

        for problem in self.unique_problems.iter().take(MAX_CONSOLE_PROBLEMS) {
            let _ = writeln!(
                text,
                "- {}: {}",
                capitalized(&problem.user_code_location),
                problem.message
            );
            if let Some(section) = problem.documentation {
                let _ = writeln!(text, "  See {}", section.link(documentation_url));
            }
        }

        let hidden = self.unique_problems.len().saturating_sub(MAX_CONSOLE_PROBLEMS);
        if hidden > 0 {
            let noun = if hidden == 1 { "problem" } else { "problems" };
            let _ = writeln!(
                text,
                "plus {hidden} more {noun}. Please see the report for details."
            );
        }

        let _ = write!(
            text,
            "\nSee the complete report at {}",
            clickable_url(report_file)
        );
        text
    }

    fn append_header(&self, text: &mut String, cache_action: &str) {
        let count = self.problem_count;
        let verb = if count == 1 {
            "problem was found"
        } else {
            "problems were found"
        };
        let _ = write!(text, "{count} {verb} {cache_action} the configuration cache");

        let unique = self.unique_problems.len();
        if count > unique {
            let seem = if unique == 1 { "seems" } else { "seem" };
            let _ = write!(text, ", {unique} of which {seem} unique");
        }
        text.push_str(".\n");
    }
}

fn capitalized(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn clickable_url(path: &Path) -> String {
    let display = path.display().to_string().replace('\\', "/");
    if display.starts_with('/') {
        format!("file://{display}")
    } else {
        format!("file:///{display}")
    }
}
