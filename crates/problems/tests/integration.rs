//! Integration tests for the outcome decision engine

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use cfgcache_config::ProblemsConfig;
    use cfgcache_errors::{Error, ProblemsError, UserFacingError};
    use cfgcache_events::{
        channel, AppEvent, ConfigCacheEvent, EventReceiver, ListenerManager,
    };
    use cfgcache_problems::*;
    use cfgcache_report::{HtmlReport, ReportWriter};
    use cfgcache_types::{CacheAction, CacheKey, ProblemCause, PropertyProblem, PropertyTrace};
    use tempfile::TempDir;

    fn config(fail: bool, max_problems: usize) -> ProblemsConfig {
        ProblemsConfig {
            mode: if fail {
                cfgcache_types::ProblemsMode::Fail
            } else {
                cfgcache_types::ProblemsMode::Warn
            },
            max_problems,
            requested_tasks: vec!["assemble".to_string()],
            ..ProblemsConfig::default()
        }
    }

    fn problem(i: usize) -> PropertyProblem {
        PropertyProblem::new(
            PropertyTrace::Task {
                path: format!(":lib{i}:compile"),
                type_name: "Compile".to_string(),
            },
            "cannot serialize object of type 'Thread'",
        )
        .with_cause(ProblemCause::new(format!("Thread {i} is not serializable")))
    }

    fn counting_hook(count: &Arc<AtomicUsize>) -> Option<InvalidateStoredState> {
        let count = Arc::clone(count);
        Some(Box::new(move || {
            count.fetch_add(1, Ordering::SeqCst);
        }))
    }

    struct Build {
        _dir: TempDir,
        reports_root: PathBuf,
        listeners: ListenerManager,
        problems: ConfigCacheProblems,
        invalidations: Arc<AtomicUsize>,
        events: EventReceiver,
    }

    fn build(config: &ProblemsConfig) -> Build {
        let dir = TempDir::new().unwrap();
        let reports_root = dir.path().join("build");
        let listeners = ListenerManager::new();
        let (sender, events) = channel();
        let problems = ConfigCacheProblems::new(
            config,
            Arc::new(HtmlReport::new(config.documentation_url.clone())),
            CacheKey::parse("abc123").unwrap(),
            &listeners,
            Some(sender),
        );
        Build {
            _dir: dir,
            reports_root,
            listeners,
            problems,
            invalidations: Arc::new(AtomicUsize::new(0)),
            events,
        }
    }

    fn drain(events: &mut EventReceiver) -> Vec<ConfigCacheEvent> {
        let mut drained = Vec::new();
        while let Ok(message) = events.try_recv() {
            if let AppEvent::ConfigCache(event) = message.event {
                drained.push(event);
            }
        }
        drained
    }

    fn report_file(build: &Build) -> PathBuf {
        build
            .reports_root
            .join("reports/configuration-cache/abc123/configuration-cache-report.html")
    }

    #[test]
    fn test_store_with_disallowed_problems_fails_and_invalidates() {
        let mut build = build(&config(true, 10));
        build
            .problems
            .action(CacheAction::Store, counting_hook(&build.invalidations))
            .unwrap();
        for i in 0..3 {
            build.problems.on_problem(problem(i));
        }

        let err = build.problems.report(&build.reports_root).unwrap_err();
        let Error::Problems(failure @ ProblemsError::Disallowed { .. }) = &err else {
            panic!("expected disallowed failure, got {err:?}");
        };
        assert_eq!(failure.causes().len(), 3);
        assert_eq!(failure.causes()[0].message, "Thread 0 is not serializable");
        assert_eq!(failure.user_code(), Some("problems.disallowed"));
        assert_eq!(build.invalidations.load(Ordering::SeqCst), 1);
        assert!(report_file(&build).exists());

        let text = failure.console_text().unwrap();
        assert!(!text.is_rendered());
        assert!(err.to_string().starts_with(
            "Configuration cache problems found in this build.\n3 problems were found storing"
        ));
        assert!(text.is_rendered());
        assert!(text.as_str().ends_with(&format!(
            "See the complete report at file://{}",
            report_file(&build).display()
        )));

        build.listeners.before_complete();
        let events = drain(&mut build.events);
        assert!(events.iter().any(|event| matches!(
            event,
            ConfigCacheEvent::BuildOutcome { message }
                if message == "Configuration cache entry discarded with 3 problems."
        )));
        assert!(events.iter().any(|event| matches!(
            event,
            ConfigCacheEvent::StoredStateInvalidated {
                action: CacheAction::Store,
                problem_count: 3,
            }
        )));
    }

    #[test]
    fn test_store_without_problems_succeeds_silently() {
        let mut build = build(&config(false, 10));
        build
            .problems
            .action(CacheAction::Store, counting_hook(&build.invalidations))
            .unwrap();

        build.problems.report(&build.reports_root).unwrap();

        assert_eq!(build.invalidations.load(Ordering::SeqCst), 0);
        assert!(!report_file(&build).exists());
        assert_eq!(
            build.problems.build_outcome_message().as_deref(),
            Some("Configuration cache entry stored.")
        );
        let events = drain(&mut build.events);
        assert!(!events
            .iter()
            .any(|event| matches!(event, ConfigCacheEvent::ProblemsWarning { .. })));
    }

    #[test]
    fn test_update_with_tolerated_problem_warns() {
        let mut build = build(&config(false, 10));
        build
            .problems
            .action(CacheAction::Update, counting_hook(&build.invalidations))
            .unwrap();
        build.problems.project_state_stats(5, 2);
        build.problems.on_problem(problem(0));

        build.problems.report(&build.reports_root).unwrap();

        assert_eq!(build.invalidations.load(Ordering::SeqCst), 0);
        assert!(report_file(&build).exists());
        let events = drain(&mut build.events);
        assert!(events.iter().any(|event| matches!(
            event,
            ConfigCacheEvent::ProblemsWarning { message }
                if message.starts_with("1 problem was found updating the configuration cache.")
        )));
        assert_eq!(
            build.problems.build_outcome_message().as_deref(),
            Some(
                "Configuration cache entry updated for 2 projects with 1 problem, 5 projects up-to-date."
            )
        );
    }

    #[test]
    fn test_too_many_problems_fail_even_when_tolerated() {
        let build = build(&config(false, 10));
        build
            .problems
            .action(CacheAction::Store, counting_hook(&build.invalidations))
            .unwrap();
        for i in 0..15 {
            build.problems.on_problem(problem(i));
        }

        let err = build.problems.report(&build.reports_root).unwrap_err();
        assert!(matches!(err, Error::Problems(ProblemsError::TooMany { .. })));
        assert!(err
            .to_string()
            .starts_with("Maximum number of configuration cache problems has been reached.\n"));
        assert_eq!(build.invalidations.load(Ordering::SeqCst), 1);
        assert_eq!(
            build.problems.build_outcome_message().as_deref(),
            Some("Configuration cache entry discarded with too many problems (15 problems).")
        );
    }

    #[test]
    fn test_serialization_error_without_problems_discards_entry() {
        let build = build(&config(true, 10));
        build
            .problems
            .action(CacheAction::Store, counting_hook(&build.invalidations))
            .unwrap();
        build.problems.failing_build_due_to_serialization_error();

        build.problems.report(&build.reports_root).unwrap();

        assert_eq!(build.invalidations.load(Ordering::SeqCst), 0);
        assert_eq!(
            build.problems.build_outcome_message().as_deref(),
            Some("Configuration cache entry discarded.")
        );
    }

    #[test]
    fn test_serialization_error_suppresses_disallowed_problems() {
        let build = build(&config(true, 10));
        build
            .problems
            .action(CacheAction::Store, counting_hook(&build.invalidations))
            .unwrap();
        build.problems.on_problem(problem(0));
        build.problems.failing_build_due_to_serialization_error();

        build.problems.report(&build.reports_root).unwrap();

        assert_eq!(build.invalidations.load(Ordering::SeqCst), 0);
        assert_eq!(
            build.problems.build_outcome_message().as_deref(),
            Some("Configuration cache entry discarded with 1 problem.")
        );
    }

    #[test]
    fn test_load_never_invalidates() {
        let build = build(&config(true, 1));
        build.problems.action(CacheAction::Load, None).unwrap();
        for i in 0..3 {
            build.problems.on_problem(problem(i));
        }

        let err = build.problems.report(&build.reports_root).unwrap_err();
        assert!(matches!(err, Error::Problems(ProblemsError::Disallowed { .. })));
        assert_eq!(
            build.problems.build_outcome_message().as_deref(),
            Some("Configuration cache entry reused with 3 problems.")
        );
    }

    #[test]
    fn test_invalidation_runs_once_across_reports() {
        let build = build(&config(true, 10));
        build
            .problems
            .action(CacheAction::Update, counting_hook(&build.invalidations))
            .unwrap();
        build.problems.on_problem(problem(0));

        assert!(build.problems.report(&build.reports_root).is_err());
        assert!(build.problems.report(&build.reports_root).is_err());
        assert_eq!(build.invalidations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_problems_reported_from_worker_threads() {
        let build = build(&config(false, 10_000));
        build
            .problems
            .action(CacheAction::Store, counting_hook(&build.invalidations))
            .unwrap();

        std::thread::scope(|scope| {
            for worker in 0..4 {
                let problems = &build.problems;
                scope.spawn(move || {
                    for i in 0..50 {
                        problems.on_problem(problem(worker * 50 + i));
                    }
                });
            }
        });

        let summary = build.problems.summary();
        assert_eq!(summary.problem_count(), 200);
        assert_eq!(summary.causes().len(), 5);
        build.problems.report(&build.reports_root).unwrap();
    }

    #[test]
    fn test_dropping_engine_deregisters_listener() {
        let build = build(&config(true, 10));
        assert_eq!(build.listeners.len(), 1);
        let listeners = build.listeners.clone();
        drop(build.problems);
        assert!(listeners.is_empty());
    }

    struct SilentReport;

    impl ReportWriter for SilentReport {
        fn on_problem(&self, _problem: &PropertyProblem) {}

        fn write_report_file_to(
            &self,
            _output_dir: &Path,
            _cache_action: &str,
            _requested_tasks: &str,
            _problem_count: usize,
        ) -> Result<Option<PathBuf>, Error> {
            Ok(None)
        }
    }

    #[test]
    fn test_failing_decision_without_report_is_an_invariant_breach() {
        let listeners = ListenerManager::new();
        let problems = ConfigCacheProblems::new(
            &config(true, 10),
            Arc::new(SilentReport),
            CacheKey::parse("abc123").unwrap(),
            &listeners,
            None,
        );
        let invalidated = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&invalidated);
        problems
            .action(
                CacheAction::Store,
                Some(Box::new(move || *flag.lock().unwrap() = true)),
            )
            .unwrap();
        problems.on_problem(problem(0));

        let err = problems.report(Path::new("/nonexistent")).unwrap_err();
        assert!(matches!(
            err,
            Error::Problems(ProblemsError::FailedWithoutReport { problem_count: 1 })
        ));
        assert!(*invalidated.lock().unwrap());
    }
}
