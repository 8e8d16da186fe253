//! Configuration Module
//!
//! Handles loading and managing memo cache configuration from environment variables.

use std::env;
use std::time::Duration;

use tracing::warn;

use crate::error::ConfigError;

/// Memo cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
/// The default configuration is unbounded and never expires entries, which is
/// the plain memoization contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoConfig {
    /// Maximum number of cached results, None = unbounded
    pub max_entries: Option<usize>,
    /// Maximum age of a cached result, None = never expires
    pub max_age: Option<Duration>,
    /// Interval between background expiry sweeps
    pub cleanup_interval: Duration,
}

impl MemoConfig {
    /// Creates a new MemoConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MEMO_MAX_ENTRIES` - Maximum cached results (default: unbounded)
    /// - `MEMO_MAX_AGE_SECS` - Result lifetime in seconds (default: no expiry)
    /// - `MEMO_CLEANUP_INTERVAL_SECS` - Sweep frequency in seconds (default: 1)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_parse::<usize>("MEMO_MAX_ENTRIES").or(defaults.max_entries),
            max_age: env_parse::<u64>("MEMO_MAX_AGE_SECS")
                .map(Duration::from_secs)
                .or(defaults.max_age),
            cleanup_interval: env_parse::<u64>("MEMO_CLEANUP_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.cleanup_interval),
        }
    }

    /// Bounds the cache to `max_entries` results with LRU eviction.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    /// Expires cached results once they are older than `max_age`.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Checks that the configuration describes a usable cache.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_entries == Some(0) {
            return Err(ConfigError::Invalid(
                "max_entries must be greater than zero".to_string(),
            ));
        }
        if self.max_age == Some(Duration::ZERO) {
            return Err(ConfigError::Invalid(
                "max_age must be greater than zero".to_string(),
            ));
        }
        if self.cleanup_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "cleanup_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MemoConfig {
    fn default() -> Self {
        Self {
            max_entries: None,
            max_age: None,
            cleanup_interval: Duration::from_secs(1),
        }
    }
}

/// Reads and parses an environment variable, warning on malformed values.
fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring unparseable {}={:?}, using default", name, raw);
            None
        }
    }
}
