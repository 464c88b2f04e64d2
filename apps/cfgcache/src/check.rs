//! `cfgcache check`: replay recorded problems through the outcome decision

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cfgcache_config::Config;
use cfgcache_errors::Error;
use cfgcache_events::{ConfigCacheEvent, EventEmitter, EventSender, ListenerManager};
use cfgcache_problems::{
    ConfigCacheProblems, InvalidateStoredState, ProblemReporter, ProblemsListener,
};
use cfgcache_report::HtmlReport;
use cfgcache_types::{CacheAction, CacheKey, PropertyProblem};
use serde::Serialize;

use crate::cli::CheckArgs;
use crate::error::CliError;

/// Result of a check that did not fail the build
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub cache_key: String,
    pub action: CacheAction,
    pub problem_count: usize,
    pub unique_problem_count: usize,
    pub outcome: Option<String>,
}

/// Apply check flags on top of file and environment configuration
pub fn apply_cli_config(config: &mut Config, args: &CheckArgs) {
    if let Some(mode) = args.problems_mode {
        config.problems.mode = mode;
    }
    if let Some(max_problems) = args.max_problems {
        config.problems.max_problems = max_problems;
    }
    if !args.tasks.is_empty() {
        config.problems.requested_tasks.clone_from(&args.tasks);
    }
    if let Some(reports_dir) = &args.reports_dir {
        config.paths.reports_root = Some(reports_dir.clone());
    }
}

/// Load the recorded problems and run them through the engine
pub async fn check(
    config: Config,
    args: CheckArgs,
    event_sender: EventSender,
) -> Result<CheckReport, CliError> {
    let contents = tokio::fs::read_to_string(&args.problems)
        .await
        .map_err(|e| Error::io_with_path(&e, &args.problems))?;
    let problems: Vec<PropertyProblem> = serde_json::from_str(&contents).map_err(|e| {
        CliError::InvalidArguments(format!(
            "{} is not a valid problems file: {e}",
            args.problems.display()
        ))
    })?;
    let cache_key = CacheKey::parse(args.key.clone())?;

    tokio::task::spawn_blocking(move || replay(&config, &args, cache_key, problems, event_sender))
        .await
        .map_err(|e| CliError::Internal(e.to_string()))?
}

fn replay(
    config: &Config,
    args: &CheckArgs,
    cache_key: CacheKey,
    problems: Vec<PropertyProblem>,
    event_sender: EventSender,
) -> Result<CheckReport, CliError> {
    let listeners = ListenerManager::with_events(event_sender.clone());
    let report = Arc::new(HtmlReport::new(config.problems.documentation_url.clone()));
    let engine = ConfigCacheProblems::new(
        &config.problems,
        report,
        cache_key.clone(),
        &listeners,
        Some(event_sender.clone()),
    );
    listeners.after_start();

    let invalidate = invalidation_hook(
        args.action,
        args.cache_dir.as_deref(),
        &cache_key,
        event_sender.clone(),
    );
    engine.action(args.action, invalidate)?;
    if args.action == CacheAction::Update {
        engine.project_state_stats(args.reused, args.updated);
    }

    report_from_workers(&engine, &problems, usize::from(args.workers));
    if args.serialization_error {
        engine.failing_build_due_to_serialization_error();
    }

    let reports_root = config.reports_root();
    tracing::debug!(
        reporter = engine.id(),
        reports_root = %reports_root.display(),
        "deciding cache phase outcome"
    );
    let decision = engine.report(&reports_root);
    let summary = engine.summary();
    let outcome = engine.build_outcome_message();

    // The outcome line is logged whether or not the decision failed
    listeners.before_complete();
    engine.close();
    decision?;

    Ok(CheckReport {
        cache_key: cache_key.to_string(),
        action: args.action,
        problem_count: summary.problem_count(),
        unique_problem_count: summary.unique_problems().len(),
        outcome,
    })
}

fn report_from_workers(engine: &ConfigCacheProblems, problems: &[PropertyProblem], workers: usize) {
    if problems.is_empty() {
        return;
    }
    let chunk_size = problems.len().div_ceil(workers.max(1));
    std::thread::scope(|scope| {
        for chunk in problems.chunks(chunk_size) {
            scope.spawn(move || {
                for problem in chunk {
                    engine.on_problem(problem.clone());
                }
            });
        }
    });
}

fn invalidation_hook(
    action: CacheAction,
    cache_dir: Option<&Path>,
    cache_key: &CacheKey,
    event_sender: EventSender,
) -> Option<InvalidateStoredState> {
    if action == CacheAction::Load {
        return None;
    }
    let entry: Option<PathBuf> = cache_dir.map(|dir| dir.join(cache_key.as_str()));
    Some(Box::new(move || {
        let Some(entry) = entry else {
            tracing::debug!("no cache directory configured, nothing to invalidate");
            return;
        };
        match std::fs::remove_dir_all(&entry) {
            Ok(()) => tracing::info!(path = %entry.display(), "removed stored cache entry"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %entry.display(), "stored cache entry already absent");
            }
            Err(e) => {
                tracing::warn!(
                    path = %entry.display(),
                    error = %e,
                    "failed to remove stored cache entry"
                );
                event_sender.emit_config_cache(ConfigCacheEvent::InvalidationFailed {
                    path: entry.clone(),
                    message: e.to_string(),
                });
            }
        }
    }))
}
