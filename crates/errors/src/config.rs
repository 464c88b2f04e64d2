//! Errors raised while loading settings

use std::borrow::Cow;

use thiserror::Error;

use crate::UserFacingError;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum ConfigError {
    #[error("cannot read configuration from {path}")]
    NotFound { path: String },

    #[error("configuration rejected: {message}")]
    Invalid { message: String },

    #[error("configuration is not valid TOML: {message}")]
    ParseError { message: String },

    #[error("`{value}` is not a valid value for {field}")]
    InvalidValue { field: String, value: String },
}

impl UserFacingError for ConfigError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotFound { .. } => Some("Provide a configuration file or omit --config."),
            Self::InvalidValue { field, .. } => Some(match field.as_str() {
                "CFGCACHE_PROBLEMS" | "problems.mode" => "Use either `fail` or `warn`.",
                "CFGCACHE_MAX_PROBLEMS" | "problems.max_problems" => {
                    "Use a non-negative integer for the maximum problem count."
                }
                _ => "Fix the configuration value and retry the command.",
            }),
            Self::Invalid { .. } | Self::ParseError { .. } => {
                Some("Fix the configuration value and retry the command.")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::NotFound { .. } => "config.not_found",
            Self::Invalid { .. } => "config.invalid",
            Self::ParseError { .. } => "config.parse_error",
            Self::InvalidValue { .. } => "config.invalid_value",
        };
        Some(code)
    }
}
