//! Fixed names and limits for configuration cache reporting
//!
//! These values are part of the on-disk and console contract and are not
//! exposed via TOML configuration.

/// Report directory below the reports root, followed by the cache key
pub const REPORTS_SUBDIR: &str = "reports/configuration-cache";

/// File name of the rendered report inside the report directory
pub const REPORT_FILE_NAME: &str = "configuration-cache-report.html";

/// Label used in place of requested task names when none were given
pub const DEFAULT_TASKS_LABEL: &str = "default tasks";

/// Problems past this count are counted but no longer forwarded to the report
pub const MAX_REPORTED_PROBLEMS: usize = 4096;

/// Unique problems listed in the console summary
pub const MAX_CONSOLE_PROBLEMS: usize = 15;

/// Causes attached to a configuration cache build failure
pub const MAX_CAUSES: usize = 5;

/// Default value of `problems.max_problems`
pub const DEFAULT_MAX_PROBLEMS: usize = 512;

/// Configuration cache guide that documentation sections are anchored in
pub const DOCUMENTATION_URL: &str = "https://cfgcache.dev/docs/configuration_cache.html";

/// Directory name below the system config dir
pub const CONFIG_DIR_NAME: &str = "cfgcache";

/// Config file name inside `CONFIG_DIR_NAME`
pub const CONFIG_FILE_NAME: &str = "config.toml";
