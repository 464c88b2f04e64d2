//! Command line interface definition

use cfgcache_types::{CacheAction, ProblemsMode};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// cfgcache - Configuration cache problem reporting
#[derive(Parser)]
#[command(name = "cfgcache")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Configuration cache problem reporting and build outcome summaries")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output events and the result as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Replay recorded problems through the outcome decision
    Check(CheckArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// JSON file holding the recorded problems
    #[arg(long, value_name = "PATH")]
    pub problems: PathBuf,

    /// What the build did with the cache entry
    #[arg(long, value_enum)]
    pub action: CacheAction,

    /// Cache entry key, used for the report directory
    #[arg(long, value_name = "KEY", default_value = "default")]
    pub key: String,

    /// Root directory below which reports are written
    #[arg(long, value_name = "DIR")]
    pub reports_dir: Option<PathBuf>,

    /// Requested task (repeatable)
    #[arg(long = "task", value_name = "TASK")]
    pub tasks: Vec<String>,

    /// Whether problems fail the build
    #[arg(long, value_enum)]
    pub problems_mode: Option<ProblemsMode>,

    /// Number of problems tolerated before the build fails
    #[arg(long, value_name = "N")]
    pub max_problems: Option<usize>,

    /// Flag that serializing the build state failed
    #[arg(long)]
    pub serialization_error: bool,

    /// Projects reused by an update
    #[arg(long, default_value_t = 0)]
    pub reused: usize,

    /// Projects refreshed by an update
    #[arg(long, default_value_t = 0)]
    pub updated: usize,

    /// Directory holding stored cache entries, cleared on failure
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Worker threads reporting problems
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: u16,
}
