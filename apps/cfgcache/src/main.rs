//! cfgcache - Configuration cache problem reporting
//!
//! CLI that replays recorded configuration cache problems through the
//! outcome decision engine, writes the problems report and exits non-zero
//! when the problems fail the build.

mod check;
mod cli;
mod error;
mod events;
mod logging;

use crate::check::CheckReport;
use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::events::EventHandler;
use cfgcache_config::Config;
use cfgcache_events::{EventReceiver, FailureContext};
use clap::Parser;
use std::future::Future;
use std::process;
use tokio::select;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.global.json;
    init_tracing(json_mode, cli.global.debug);

    match run(cli).await {
        Ok(report) if json_mode => match serde_json::to_string(&report) {
            Ok(line) => println!("{line}"),
            Err(e) => error!("Failed to serialize result: {e}"),
        },
        Ok(_) => {}
        Err(e) => {
            report_failure(&e, json_mode);
            process::exit(1);
        }
    }
}

fn report_failure(e: &CliError, json_mode: bool) {
    if !json_mode {
        error!(problems_failure = e.is_problems_failure(), "Check failed");
        eprintln!("Error: {e}");
        return;
    }
    let failure = match e {
        CliError::Check(err) => FailureContext::from_error(err),
        other => FailureContext {
            code: None,
            message: other.to_string(),
            hint: None,
            retryable: false,
        },
    };
    if let Ok(line) = serde_json::to_string(&failure) {
        println!("{line}");
    }
}

async fn run(cli: Cli) -> Result<CheckReport, CliError> {
    info!("Starting cfgcache v{}", env!("CARGO_PKG_VERSION"));

    // File (or defaults), then environment, then flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    let Commands::Check(args) = cli.command;
    check::apply_cli_config(&mut config, &args);

    let (event_sender, event_receiver) = cfgcache_events::channel();
    let mut event_handler = EventHandler::new(cli.global.json);

    let report = execute_with_events(
        check::check(config, args, event_sender),
        event_receiver,
        &mut event_handler,
    )
    .await?;

    info!(problem_count = report.problem_count, "Check finished without failing the build");
    Ok(report)
}

/// Run a command while draining its events
async fn execute_with_events<F>(
    command: F,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<CheckReport, CliError>
where
    F: Future<Output = Result<CheckReport, CliError>>,
{
    let mut command_future = Box::pin(command);

    loop {
        select! {
            result = &mut command_future => {
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result;
            }

            Some(event) = event_receiver.recv() => event_handler.handle_event(event),
        }
    }
}

/// Logs go to stderr; in JSON mode stdout is reserved for event lines
fn init_tracing(json_mode: bool, debug: bool) {
    let debug_enabled = debug || std::env::var("RUST_LOG").is_ok();
    let default_filter = if debug_enabled {
        "info,cfgcache=debug,cfgcache_problems=debug"
    } else {
        "warn,cfgcache=warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    if json_mode {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    }
}
