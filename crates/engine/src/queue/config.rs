//! Queue configuration via `stratq.toml`
//!
//! The config file lives in the data directory next to the log. The CLI
//! writes a default `stratq.toml` on first start; to change settings, edit
//! the file and restart.

use serde::{Deserialize, Serialize};
use std::path::Path;
use stratq_core::QueueError;

/// Config file name placed in the data directory.
pub const CONFIG_FILE_NAME: &str = "stratq.toml";

/// Largest allowed `max_payload_bytes`, leaving room for the id and framing
/// inside a u32-length record.
const PAYLOAD_CEILING: usize = u32::MAX as usize - 1024;

/// Queue configuration loaded from `stratq.toml`.
///
/// # Example
///
/// ```toml
/// # Log file name, relative to the data directory
/// log_file = "queue.log"
///
/// # Largest accepted payload in bytes
/// max_payload_bytes = 16777216
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Log file name, relative to the data directory.
    #[serde(default = "default_log_file")]
    pub log_file: String,
    /// Payloads larger than this are rejected by `submit`.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
}

fn default_log_file() -> String {
    "queue.log".to_string()
}

fn default_max_payload_bytes() -> usize {
    16 * 1024 * 1024
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            max_payload_bytes: default_max_payload_bytes(),
        }
    }
}

impl QueueConfig {
    /// Set the log file name (builder pattern).
    pub fn with_log_file(mut self, name: impl Into<String>) -> Self {
        self.log_file = name.into();
        self
    }

    /// Set the payload limit (builder pattern).
    pub fn with_max_payload_bytes(mut self, bytes: usize) -> Self {
        self.max_payload_bytes = bytes;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_payload_bytes == 0 {
            return Err(ConfigError::PayloadLimitZero);
        }
        if self.max_payload_bytes > PAYLOAD_CEILING {
            return Err(ConfigError::PayloadLimitTooLarge(self.max_payload_bytes));
        }
        let is_plain_name = Path::new(&self.log_file)
            .file_name()
            .map(|name| name == self.log_file.as_str())
            .unwrap_or(false);
        if !is_plain_name {
            return Err(ConfigError::InvalidLogFile(self.log_file.clone()));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# stratq queue configuration
#
# Log file name, relative to the data directory.
# The log is append-only and is never compacted.
log_file = "queue.log"

# Largest accepted payload in bytes (default 16 MiB).
# Larger submissions are rejected before anything is written.
max_payload_bytes = 16777216
"#
    }

    /// Read, parse and validate config from a file path.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: QueueConfig = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| ConfigError::Write {
                path: path.display().to_string(),
                source: e,
            })?;
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        /// Config file path
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// Config file could not be written
    #[error("Failed to write config file '{path}': {source}")]
    Write {
        /// Config file path
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("Failed to parse config file '{path}': {message}")]
    Parse {
        /// Config file path
        path: String,
        /// Parser message
        message: String,
    },

    /// `max_payload_bytes` is zero
    #[error("max_payload_bytes must be greater than zero")]
    PayloadLimitZero,

    /// `max_payload_bytes` does not fit a log record
    #[error("max_payload_bytes {0} exceeds the record size limit")]
    PayloadLimitTooLarge(usize),

    /// `log_file` is empty or contains a directory component
    #[error("log_file '{0}' must be a plain file name")]
    InvalidLogFile(String),
}

impl From<ConfigError> for QueueError {
    fn from(e: ConfigError) -> Self {
        QueueError::Config(e.to_string())
    }
}
