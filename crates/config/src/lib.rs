#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Settings for cfgcache problem reporting
//!
//! Values are layered: built-in defaults, then the TOML file (by default
//! `~/.config/cfgcache/config.toml`), then `CFGCACHE_*` variables. The CLI
//! applies its own flags last.

pub mod constants;

use cfgcache_errors::{ConfigError, Error};
use cfgcache_types::{CacheKey, ProblemsMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Everything `cfgcache` reads from config files and the environment
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub problems: ProblemsConfig,

    #[serde(default)]
    pub paths: PathConfig,
}

/// Problem handling policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemsConfig {
    #[serde(default)]
    pub mode: ProblemsMode,
    #[serde(default = "default_max_problems")]
    pub max_problems: usize,
    #[serde(default)]
    pub requested_tasks: Vec<String>,
    #[serde(default = "default_documentation_url")]
    pub documentation_url: String,
}

/// Where reports are written
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    pub reports_root: Option<PathBuf>,
}

impl Default for ProblemsConfig {
    fn default() -> Self {
        Self {
            mode: ProblemsMode::Fail,
            max_problems: constants::DEFAULT_MAX_PROBLEMS,
            requested_tasks: Vec::new(),
            documentation_url: constants::DOCUMENTATION_URL.to_string(),
        }
    }
}

fn default_max_problems() -> usize {
    constants::DEFAULT_MAX_PROBLEMS
}

fn default_documentation_url() -> String {
    constants::DOCUMENTATION_URL.to_string()
}

impl ProblemsConfig {
    /// Whether any problem fails the build
    #[must_use]
    pub fn fail_on_problems(&self) -> bool {
        self.mode.fails_on_problems()
    }

    /// Requested task names joined by spaces, or the default tasks label
    #[must_use]
    pub fn requested_tasks_or_default(&self) -> String {
        if self.requested_tasks.is_empty() {
            constants::DEFAULT_TASKS_LABEL.to_string()
        } else {
            self.requested_tasks.join(" ")
        }
    }
}

impl Config {
    /// `<system config dir>/cfgcache/config.toml`
    ///
    /// # Errors
    ///
    /// Fails on platforms without a config directory.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir
            .join(constants::CONFIG_DIR_NAME)
            .join(constants::CONFIG_FILE_NAME))
    }

    /// Read and validate one TOML file
    ///
    /// # Errors
    ///
    /// Fails if the file is unreadable, is not valid TOML for this schema,
    /// or holds a value [`Config::validate`] rejects.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Check values the TOML schema cannot express
    ///
    /// # Errors
    ///
    /// Returns an error if the documentation URL is blank.
    pub fn validate(&self) -> Result<(), Error> {
        if self.problems.documentation_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "problems.documentation_url must not be empty".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// The explicit file if given, else the default file if it exists,
    /// else built-in defaults
    ///
    /// # Errors
    ///
    /// An explicit path must exist; any file that is read must parse.
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        if let Some(path) = path {
            return Self::load_from_file(path).await;
        }
        let default_path = Self::default_path()?;
        if default_path.exists() {
            Self::load_from_file(&default_path).await
        } else {
            tracing::debug!(
                path = %default_path.display(),
                "no configuration file, using defaults"
            );
            Ok(Self::default())
        }
    }

    /// Overlay `CFGCACHE_PROBLEMS`, `CFGCACHE_MAX_PROBLEMS` and
    /// `CFGCACHE_REPORTS_ROOT`
    ///
    /// # Errors
    ///
    /// Fails on a value that does not parse; nothing is applied past it.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        if let Some(mode) = env_value("CFGCACHE_PROBLEMS") {
            self.problems.mode = mode
                .parse::<ProblemsMode>()
                .map_err(|_| invalid_env("CFGCACHE_PROBLEMS", mode.clone()))?;
        }

        if let Some(max) = env_value("CFGCACHE_MAX_PROBLEMS") {
            self.problems.max_problems = max
                .parse()
                .map_err(|_| invalid_env("CFGCACHE_MAX_PROBLEMS", max.clone()))?;
        }

        if let Some(root) = env_value("CFGCACHE_REPORTS_ROOT") {
            if root.is_empty() {
                return Err(invalid_env("CFGCACHE_REPORTS_ROOT", root));
            }
            self.paths.reports_root = Some(PathBuf::from(root));
        }

        Ok(())
    }

    /// Configured reports root, or `./build`
    #[must_use]
    pub fn reports_root(&self) -> PathBuf {
        if let Some(root) = &self.paths.reports_root {
            return root.clone();
        }
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("build")
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn invalid_env(name: &str, value: String) -> Error {
    ConfigError::InvalidValue {
        field: name.to_string(),
        value,
    }
    .into()
}

/// Report directory for a cache entry below the given reports root
#[must_use]
pub fn report_dir_for(reports_root: &Path, cache_key: &CacheKey) -> PathBuf {
    reports_root
        .join(constants::REPORTS_SUBDIR)
        .join(cache_key.as_str())
}
