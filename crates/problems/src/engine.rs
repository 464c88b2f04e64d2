//! Outcome decision engine
//!
//! [`ConfigCacheProblems`] is created once per build. It collects problems
//! from any thread, decides the outcome when the cache phase completes and
//! logs one summary line when the build completes. The end-of-build hook is
//! registered with the [`ListenerManager`] on construction and detached when
//! the engine is closed or dropped.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cfgcache_config::{report_dir_for, ProblemsConfig};
use cfgcache_errors::{ConsoleText, Error, ProblemsError, UserFacingError};
use cfgcache_events::{
    BuildLifecycleListener, ConfigCacheEvent, EventEmitter, EventSender, ListenerManager,
    ListenerRegistration,
};
use cfgcache_report::ReportWriter;
use cfgcache_types::{CacheAction, CacheKey, ProjectStats, PropertyProblem};

use crate::outcome::{
    build_outcome_message, CachePhaseDecision, DecisionState, InvalidateStoredState,
    OutcomeInputs, Verdict,
};
use crate::summary::{ProblemsSummarizer, Summary};
use crate::{ProblemReporter, ProblemsListener};

type PhaseOutcome = (CacheAction, CachePhaseDecision, Option<InvalidateStoredState>);

/// State shared between the engine and its end-of-build hook
struct ProblemsState {
    config: ProblemsConfig,
    cache_key: CacheKey,
    summarizer: ProblemsSummarizer,
    decision: Mutex<DecisionState>,
    event_sender: Option<EventSender>,
}

impl ProblemsState {
    fn decision(&self) -> MutexGuard<'_, DecisionState> {
        self.decision.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn outcome_message(&self) -> Option<String> {
        let summary = self.summarizer.get();
        let decision = self.decision();
        build_outcome_message(&OutcomeInputs {
            action: decision.action,
            policy: decision.policy,
            problem_count: summary.problem_count(),
            max_problems: self.config.max_problems,
            project_stats: decision.project_stats,
        })
    }
}

impl EventEmitter for ProblemsState {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }

    fn correlation_id(&self) -> Option<&str> {
        Some(self.cache_key.as_str())
    }
}

/// Logs the outcome line once the build completes
struct PostBuildProblemsHandler {
    state: Arc<ProblemsState>,
}

impl BuildLifecycleListener for PostBuildProblemsHandler {
    fn before_complete(&self) {
        if let Some(message) = self.state.outcome_message() {
            tracing::warn!("{message}");
            self.state.emit_config_cache(ConfigCacheEvent::BuildOutcome { message });
        }
    }
}

/// Configuration cache problems of one build
pub struct ConfigCacheProblems {
    state: Arc<ProblemsState>,
    report: Arc<dyn ReportWriter>,
    registration: Mutex<ListenerRegistration>,
}

impl ConfigCacheProblems {
    /// Create the engine and register its end-of-build hook
    #[must_use]
    pub fn new(
        config: &ProblemsConfig,
        report: Arc<dyn ReportWriter>,
        cache_key: CacheKey,
        listeners: &ListenerManager,
        event_sender: Option<EventSender>,
    ) -> Self {
        let state = Arc::new(ProblemsState {
            config: config.clone(),
            cache_key,
            summarizer: ProblemsSummarizer::new(),
            decision: Mutex::new(DecisionState::new(config.fail_on_problems())),
            event_sender,
        });
        let registration = listeners.add_listener(Arc::new(PostBuildProblemsHandler {
            state: Arc::clone(&state),
        }));

        Self {
            state,
            report,
            registration: Mutex::new(registration),
        }
    }

    /// Record what the build does with the cache entry
    ///
    /// The invalidation hook is required for `Store` and `Update` if the
    /// build may fail on its problems; it runs at most once.
    ///
    /// # Errors
    ///
    /// Returns an error if the action was already set.
    pub fn action(
        &self,
        action: CacheAction,
        invalidate_stored_state: Option<InvalidateStoredState>,
    ) -> Result<(), Error> {
        let mut decision = self.state.decision();
        if let Some(current) = decision.action {
            return Err(ProblemsError::ActionAlreadySet {
                action: current.to_string(),
            }
            .into());
        }
        decision.action = Some(action);
        decision.invalidate_stored_state = invalidate_stored_state;
        tracing::debug!(
            %action,
            cache_key = %self.state.cache_key,
            "configuration cache action set"
        );
        Ok(())
    }

    /// Flag that serializing the build state failed
    pub fn failing_build_due_to_serialization_error(&self) {
        self.state.decision().suppress_by_serialization_error();
        tracing::debug!(cache_key = %self.state.cache_key, "problems no longer fail the build");
        self.state.emit_config_cache(ConfigCacheEvent::SerializationFailed);
    }

    /// Record the project counts of an `Update` action
    pub fn project_state_stats(&self, reused: usize, updated: usize) {
        self.state.decision().project_stats = ProjectStats::new(reused, updated);
    }

    /// Current snapshot of reported problems
    #[must_use]
    pub fn summary(&self) -> Summary {
        self.state.summarizer.get()
    }

    /// The line the end-of-build hook logs, if any
    #[must_use]
    pub fn build_outcome_message(&self) -> Option<String> {
        self.state.outcome_message()
    }

    /// Detach the end-of-build hook; returns whether this call detached it
    pub fn close(&self) -> bool {
        self.registration
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove()
    }

    /// Decide the cache phase and take the invalidation hook if it failed
    fn decide(&self, problem_count: usize) -> Result<PhaseOutcome, Error> {
        let mut state = self.state.decision();
        let action = state.action.ok_or(ProblemsError::ActionNotSet)?;
        let decision =
            CachePhaseDecision::decide(problem_count, state.policy, self.state.config.max_problems);
        if action == CacheAction::Load || !decision.failed() || state.invalidated {
            return Ok((action, decision, None));
        }

        let hook = state
            .invalidate_stored_state
            .take()
            .ok_or_else(|| ProblemsError::MissingInvalidation {
                action: action.to_string(),
            })?;
        state.invalidated = true;
        Ok((action, decision, Some(hook)))
    }
}

impl ProblemsListener for ConfigCacheProblems {
    fn on_problem(&self, problem: PropertyProblem) {
        let forwarded = self.state.summarizer.on_problem(&problem);
        if forwarded {
            self.report.on_problem(&problem);
        }
        self.state.emit_config_cache(ConfigCacheEvent::ProblemReported {
            location: problem.trace.user_code_location().to_string(),
            message: problem.message,
            forwarded,
        });
    }
}

impl ProblemReporter for ConfigCacheProblems {
    fn id(&self) -> &'static str {
        "configuration-cache"
    }

    fn report(&self, reports_root: &Path) -> Result<(), Error> {
        let summary = self.state.summarizer.get();
        let problem_count = summary.problem_count();
        let (action, decision, invalidate) = self.decide(problem_count)?;
        if let Some(invalidate) = invalidate {
            // Runs outside the state lock
            invalidate();
            tracing::info!(%action, problem_count, "discarded stored configuration cache state");
            self.state.emit_config_cache(ConfigCacheEvent::StoredStateInvalidated {
                action,
                problem_count,
            });
        }

        let output_dir = report_dir_for(reports_root, &self.state.cache_key);
        let action_text = action.summary_text();
        let requested_tasks = self.state.config.requested_tasks_or_default();
        let Some(report_file) =
            self.report
                .write_report_file_to(&output_dir, action_text, &requested_tasks, problem_count)?
        else {
            if decision.failed() {
                return Err(ProblemsError::FailedWithoutReport { problem_count }.into());
            }
            return Ok(());
        };
        self.state.emit_config_cache(ConfigCacheEvent::ReportWritten {
            path: report_file.clone(),
            problem_count,
        });

        let documentation_url = self.state.config.documentation_url.clone();
        let causes = summary.causes().to_vec();
        let message = ConsoleText::lazy(move || {
            summary.text_for_console(action_text, &report_file, &documentation_url)
        });

        let failure = match decision.verdict() {
            Verdict::ProblemsDisallowed => ProblemsError::Disallowed { causes, message },
            Verdict::TooManyProblems => ProblemsError::TooMany { causes, message },
            Verdict::Warn => {
                tracing::warn!("{message}");
                self.state.emit_config_cache(ConfigCacheEvent::ProblemsWarning {
                    message: message.as_str().to_string(),
                });
                return Ok(());
            }
        };

        tracing::debug!(
            problem_count,
            code = failure.user_code(),
            "configuration cache problems fail the build"
        );
        self.state.emit_config_cache(ConfigCacheEvent::ProblemsFailed {
            code: failure.user_code().map(str::to_string),
            problem_count,
        });
        Err(failure.into())
    }
}

impl std::fmt::Debug for ConfigCacheProblems {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigCacheProblems")
            .field("cache_key", &self.state.cache_key)
            .field("decision", &*self.state.decision())
            .finish_non_exhaustive()
    }
}
