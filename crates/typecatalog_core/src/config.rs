//! Environment-driven configuration.
//!
//! # Responsibility
//! - Resolve logging settings from the environment with explicit overrides.
//!
//! # Invariants
//! - A missing level falls back to `default_log_level()`.
//! - A missing directory disables file logging instead of failing.

use crate::logging::{default_log_level, init_logging};
use std::path::PathBuf;

/// Log level variable, e.g. `debug`.
pub const LOG_LEVEL_ENV: &str = "TYPECATALOG_LOG_LEVEL";
/// Absolute log directory variable.
pub const LOG_DIR_ENV: &str = "TYPECATALOG_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let set = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();
        Self {
            level: set(LOG_LEVEL_ENV).unwrap_or(defaults.level),
            log_dir: set(LOG_DIR_ENV).map(PathBuf::from),
        }
    }

    pub fn with_level(mut self, level: Option<String>) -> Self {
        if let Some(level) = level {
            self.level = level;
        }
        self
    }

    pub fn with_log_dir(mut self, log_dir: Option<PathBuf>) -> Self {
        if log_dir.is_some() {
            self.log_dir = log_dir;
        }
        self
    }

    /// Starts file logging when a directory is configured.
    ///
    /// Returns whether a logger is active afterwards.
    pub fn apply(&self) -> Result<bool, String> {
        let Some(log_dir) = &self.log_dir else {
            return Ok(false);
        };
        let log_dir = log_dir
            .to_str()
            .ok_or_else(|| format!("log_dir is not valid UTF-8: {}", log_dir.display()))?;
        init_logging(&self.level, log_dir)?;
        Ok(true)
    }
}
