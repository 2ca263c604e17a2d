use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::core::GatewayError;

/// Log level and the size-rotated log file. Set `file = ""` to log to stderr only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
    #[serde(default = "LoggingConfig::default_file")]
    pub file: Option<PathBuf>,
    /// Size at which the log file is rotated.
    #[serde(default = "LoggingConfig::default_max_bytes")]
    pub max_bytes: usize,
    /// Rotated files kept next to the live one (`app.log.1` is the newest).
    #[serde(default = "LoggingConfig::default_backup_count")]
    pub backup_count: usize,
}

impl LoggingConfig {
    fn default_level() -> String {
        String::from("info")
    }

    fn default_file() -> Option<PathBuf> {
        Some(PathBuf::from("app.log"))
    }

    fn default_max_bytes() -> usize {
        10 * 1024 * 1024
    }

    fn default_backup_count() -> usize {
        5
    }

    pub fn level_filter(&self) -> Result<LevelFilter, GatewayError> {
        LevelFilter::from_str(&self.level).map_err(|_| {
            GatewayError::ConfigParsingError(format!("unknown log level '{}'", self.level))
        })
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.file
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        self.level_filter()?;
        if self.log_file().is_some() && self.max_bytes == 0 {
            return Err(GatewayError::ConfigParsingError(
                "logging.max_bytes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            file: Self::default_file(),
            max_bytes: Self::default_max_bytes(),
            backup_count: Self::default_backup_count(),
        }
    }
}
