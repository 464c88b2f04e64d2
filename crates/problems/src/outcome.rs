//! Outcome decisions for the configuration cache
//!
//! Two pure computations live here. [`CachePhaseDecision`] decides whether
//! the cache phase failed on its problems, and [`build_outcome_message`]
//! picks the single line logged when the build completes. The mutable
//! state both of them read is kept in [`DecisionState`].

use std::fmt;

use cfgcache_types::{CacheAction, ProjectStats};

/// Problem policy in force for the rest of the build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemsPolicy {
    /// Configured behaviour
    Normal { fail_on_problems: bool },
    /// A serialization error was flagged; problems alone no longer fail the build
    SuppressedBySerializationError,
}

impl ProblemsPolicy {
    #[must_use]
    pub fn fail_on_problems(self) -> bool {
        matches!(
            self,
            Self::Normal {
                fail_on_problems: true
            }
        )
    }

    #[must_use]
    pub fn failing_due_to_serialization_error(self) -> bool {
        matches!(self, Self::SuppressedBySerializationError)
    }
}

/// Callback dropping the stored cache entry after a failing decision
pub type InvalidateStoredState = Box<dyn FnOnce() + Send>;

/// Mutable decision state shared by both decision points
pub struct DecisionState {
    pub policy: ProblemsPolicy,
    pub action: Option<CacheAction>,
    pub invalidate_stored_state: Option<InvalidateStoredState>,
    pub invalidated: bool,
    pub project_stats: ProjectStats,
}

impl DecisionState {
    #[must_use]
    pub fn new(fail_on_problems: bool) -> Self {
        Self {
            policy: ProblemsPolicy::Normal { fail_on_problems },
            action: None,
            invalidate_stored_state: None,
            invalidated: false,
            project_stats: ProjectStats::default(),
        }
    }

    /// Flag a serialization error; sticky for the rest of the build
    pub fn suppress_by_serialization_error(&mut self) {
        self.policy = ProblemsPolicy::SuppressedBySerializationError;
    }
}

impl fmt::Debug for DecisionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecisionState")
            .field("policy", &self.policy)
            .field("action", &self.action)
            .field(
                "invalidate_stored_state",
                &self.invalidate_stored_state.is_some(),
            )
            .field("invalidated", &self.invalidated)
            .field("project_stats", &self.project_stats)
            .finish()
    }
}

/// Which failure, if any, the cache phase ends with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    ProblemsDisallowed,
    TooManyProblems,
    Warn,
}

/// Result of evaluating the problem count against both thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePhaseDecision {
    pub problem_count: usize,
    pub has_problems: bool,
    pub has_failed_on_problems: bool,
    pub has_too_many_problems: bool,
}

impl CachePhaseDecision {
    #[must_use]
    pub fn decide(problem_count: usize, policy: ProblemsPolicy, max_problems: usize) -> Self {
        let has_problems = problem_count > 0;
        Self {
            problem_count,
            has_problems,
            has_failed_on_problems: has_problems && policy.fail_on_problems(),
            has_too_many_problems: problem_count > max_problems,
        }
    }

    #[must_use]
    pub fn failed(&self) -> bool {
        self.has_failed_on_problems || self.has_too_many_problems
    }

    /// Disallowed problems take precedence over the problem budget
    #[must_use]
    pub fn verdict(&self) -> Verdict {
        if self.has_failed_on_problems {
            Verdict::ProblemsDisallowed
        } else if self.has_too_many_problems {
            Verdict::TooManyProblems
        } else {
            Verdict::Warn
        }
    }
}

/// Everything the end-of-build line depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeInputs {
    pub action: Option<CacheAction>,
    pub policy: ProblemsPolicy,
    pub problem_count: usize,
    pub max_problems: usize,
    pub project_stats: ProjectStats,
}

/// The line logged when the build completes, if any
#[must_use]
pub fn build_outcome_message(inputs: &OutcomeInputs) -> Option<String> {
    let count = inputs.problem_count;
    let has_problems = count > 0;
    let too_many = count > inputs.max_problems;
    let problems = counter(count, "problem");

    if inputs.policy.failing_due_to_serialization_error() {
        return Some(if has_problems {
            format!("Configuration cache entry discarded with {problems}.")
        } else {
            "Configuration cache entry discarded.".to_string()
        });
    }

    let message = match inputs.action {
        Some(CacheAction::Store) => {
            if inputs.policy.fail_on_problems() && has_problems {
                format!("Configuration cache entry discarded with {problems}.")
            } else if too_many {
                format!("Configuration cache entry discarded with too many problems ({problems}).")
            } else if has_problems {
                format!("Configuration cache entry stored with {problems}.")
            } else {
                "Configuration cache entry stored.".to_string()
            }
        }
        Some(CacheAction::Update) => {
            let updated = counter(inputs.project_stats.updated, "project");
            let reused = counter(inputs.project_stats.reused, "project");
            if has_problems {
                format!(
                    "Configuration cache entry updated for {updated} with {problems}, {reused} up-to-date."
                )
            } else {
                format!("Configuration cache entry updated for {updated}, {reused} up-to-date.")
            }
        }
        Some(CacheAction::Load) => {
            if has_problems {
                format!("Configuration cache entry reused with {problems}.")
            } else {
                "Configuration cache entry reused.".to_string()
            }
        }
        None if too_many => format!("Too many configuration cache problems found ({problems})."),
        None if has_problems => format!("Configuration cache problems found ({problems})."),
        None => return None,
    };
    Some(message)
}

/// Pluralized count: "no problems", "1 problem", "3 problems"
#[must_use]
pub fn counter(count: usize, singular: &str) -> String {
    match count {
        0 => format!("no {singular}s"),
        1 => format!("1 {singular}"),
        n => format!("{n} {singular}s"),
    }
}
