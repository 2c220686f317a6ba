//! Dispatch configuration: batch size, pacing delay, retry budget.
//!
//! Fixed at deployment (environment variables or builder), not per-request.
//! The controller exposes it read-only so a frontend can display the
//! effective settings.

use std::env;
use std::time::Duration;

use crate::error::EngineError;

const DEFAULT_MAX_BATCH_SIZE: usize = 50;
const DEFAULT_BATCH_DELAY_MS: u64 = 500;
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Worker pool settings for campaign dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Number of concurrent workers; caps recipients in flight, not the
    /// total recipient count.
    pub max_batch_size: usize,
    /// Minimum spacing a single worker enforces between its successive
    /// send attempts.
    pub batch_delay: Duration,
    /// Additional attempts after the first for transient failures.
    pub max_retries: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            batch_delay: Duration::from_millis(DEFAULT_BATCH_DELAY_MS),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl DispatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker count. Clamped to at least 1.
    pub fn max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size.max(1);
        self
    }

    /// Set the per-worker pacing interval.
    pub fn batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    /// Set the retry budget for transient failures.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Read settings from `MAX_BATCH_SIZE`, `BATCH_DELAY_MS` and
    /// `MAX_RETRIES`, falling back to defaults for unset variables.
    ///
    /// A set-but-unparseable variable is a configuration error rather than
    /// a silent fallback.
    pub fn from_env() -> Result<Self, EngineError> {
        let mut config = Self::default();

        if let Some(size) = parse_env::<usize>("MAX_BATCH_SIZE")? {
            if size == 0 {
                return Err(EngineError::Configuration(
                    "MAX_BATCH_SIZE must be at least 1".into(),
                ));
            }
            config.max_batch_size = size;
        }
        if let Some(ms) = parse_env::<u64>("BATCH_DELAY_MS")? {
            config.batch_delay = Duration::from_millis(ms);
        }
        if let Some(retries) = parse_env::<u32>("MAX_RETRIES")? {
            config.max_retries = retries;
        }

        Ok(config)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>, EngineError> {
    match env::var(name) {
        Ok(raw) => raw.parse::<T>().map(Some).map_err(|_| {
            EngineError::Configuration(format!("{} has invalid value '{}'", name, raw))
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DispatchConfig::default();
        assert_eq!(config.max_batch_size, 50);
        assert_eq!(config.batch_delay, Duration::from_millis(500));
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_builder() {
        let config = DispatchConfig::new()
            .max_batch_size(4)
            .batch_delay(Duration::from_millis(10))
            .max_retries(1);
        assert_eq!(config.max_batch_size, 4);
        assert_eq!(config.batch_delay, Duration::from_millis(10));
        assert_eq!(config.max_retries, 1);
    }

    #[test]
    fn test_batch_size_clamped() {
        let config = DispatchConfig::new().max_batch_size(0);
        assert_eq!(config.max_batch_size, 1);
    }
}
