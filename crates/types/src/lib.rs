#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for cfgcache
//!
//! This crate provides the vocabulary shared by the problem aggregator,
//! the report writer and the outcome decision engine: cache actions,
//! cache keys, project statistics and the structured problem model.

pub mod problem;

pub use cfgcache_errors::ProblemCause;
pub use problem::{DocumentationSection, PropertyKind, PropertyProblem, PropertyTrace};

use cfgcache_errors::{ConfigError, Error};
use serde::{Deserialize, Serialize};

/// What the current build did with the configuration cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheAction {
    /// A previously stored entry was reused
    Load,
    /// A fresh entry was written
    Store,
    /// Part of an existing entry was refreshed
    Update,
}

impl CacheAction {
    /// Verb used in console summaries and report headers
    #[must_use]
    pub fn summary_text(self) -> &'static str {
        match self {
            Self::Load => "reusing",
            Self::Store => "storing",
            Self::Update => "updating",
        }
    }
}

impl std::fmt::Display for CacheAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Load => write!(f, "load"),
            Self::Store => write!(f, "store"),
            Self::Update => write!(f, "update"),
        }
    }
}

// Implement clap::ValueEnum for CacheAction
impl clap::ValueEnum for CacheAction {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Load, Self::Store, Self::Update]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Load => clap::builder::PossibleValue::new("load"),
            Self::Store => clap::builder::PossibleValue::new("store"),
            Self::Update => clap::builder::PossibleValue::new("update"),
        })
    }
}

/// How configuration cache problems affect the build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemsMode {
    /// Any problem fails the build
    Fail,
    /// Problems are reported as warnings up to the maximum
    Warn,
}

impl ProblemsMode {
    #[must_use]
    pub fn fails_on_problems(self) -> bool {
        matches!(self, Self::Fail)
    }
}

impl Default for ProblemsMode {
    fn default() -> Self {
        Self::Fail
    }
}

impl std::str::FromStr for ProblemsMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fail" => Ok(Self::Fail),
            "warn" => Ok(Self::Warn),
            _ => Err(ConfigError::InvalidValue {
                field: "problems.mode".to_string(),
                value: s.to_string(),
            }
            .into()),
        }
    }
}

// Implement clap::ValueEnum for ProblemsMode
impl clap::ValueEnum for ProblemsMode {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Fail, Self::Warn]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Fail => clap::builder::PossibleValue::new("fail"),
            Self::Warn => clap::builder::PossibleValue::new("warn"),
        })
    }
}

/// Identifier of a configuration cache entry
///
/// The key names the entry's report directory, so it must be a single
/// path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CacheKey(String);

impl CacheKey {
    /// Parse a cache key
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty, is a relative path component
    /// or contains a path separator.
    pub fn parse(key: impl Into<String>) -> Result<Self, Error> {
        let key = key.into();
        let invalid = key.is_empty()
            || key == "."
            || key == ".."
            || key.contains(['/', '\\'])
            || key.chars().any(char::is_control);
        if invalid {
            return Err(ConfigError::InvalidValue {
                field: "cache key".to_string(),
                value: key,
            }
            .into());
        }
        Ok(Self(key))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CacheKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Project counts reported by an incremental (`Update`) cache action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStats {
    /// Projects whose cached state was reused as is
    pub reused: usize,
    /// Projects whose cached state was rewritten
    pub updated: usize,
}

impl ProjectStats {
    #[must_use]
    pub fn new(reused: usize, updated: usize) -> Self {
        Self { reused, updated }
    }
}
