use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::GatewayError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    #[serde(default = "DatabaseConfig::default_path")]
    pub path: PathBuf,
    #[serde(default = "DatabaseConfig::default_read_only")]
    pub read_only: bool,
    #[serde(
        with = "humantime_serde",
        default = "DatabaseConfig::default_busy_timeout"
    )]
    pub busy_timeout: Duration,
}

impl DatabaseConfig {
    fn default_path() -> PathBuf {
        PathBuf::from("sqlgate.db")
    }

    fn default_read_only() -> bool {
        true
    }

    fn default_busy_timeout() -> Duration {
        Duration::from_secs(5)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
            read_only: Self::default_read_only(),
            busy_timeout: Self::default_busy_timeout(),
        }
    }
}

/// Sizing for the connection pool.
///
/// `min_idle` connections are opened up front, at most `max_idle` are kept
/// around once released, and no more than `max_size` exist at the same time.
/// Without `acquire_timeout` a saturated pool makes callers wait indefinitely.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PoolConfig {
    #[serde(default = "PoolConfig::default_min_idle")]
    pub min_idle: usize,
    #[serde(default = "PoolConfig::default_max_idle")]
    pub max_idle: usize,
    #[serde(default = "PoolConfig::default_max_size")]
    pub max_size: usize,
    #[serde(with = "humantime_serde", default)]
    pub acquire_timeout: Option<Duration>,
}

impl PoolConfig {
    fn default_min_idle() -> usize {
        2
    }

    fn default_max_idle() -> usize {
        5
    }

    fn default_max_size() -> usize {
        10
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.max_size == 0 {
            return Err(GatewayError::ConfigParsingError(
                "pool.max_size must be at least 1".to_string(),
            ));
        }
        if self.max_idle > self.max_size {
            return Err(GatewayError::ConfigParsingError(format!(
                "pool.max_idle ({}) exceeds pool.max_size ({})",
                self.max_idle, self.max_size
            )));
        }
        if self.min_idle > self.max_idle {
            return Err(GatewayError::ConfigParsingError(format!(
                "pool.min_idle ({}) exceeds pool.max_idle ({})",
                self.min_idle, self.max_idle
            )));
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_idle: Self::default_min_idle(),
            max_idle: Self::default_max_idle(),
            max_size: Self::default_max_size(),
            acquire_timeout: None,
        }
    }
}
