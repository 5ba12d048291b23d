//! Error types for sink construction.
//!
//! Processing itself never fails: malformed input degrades by omission.

use std::path::PathBuf;

/// Error type for configuration failures.
#[derive(Debug)]
pub enum ConfigError {
    /// Neither a process type nor the `enabled` flag was given.
    MissingProcessType,
    /// No license key and not running in diagnostics mode.
    MissingLicenseKey,
    /// Config file could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Config file is not valid JSON for [`crate::config::SinkConfig`].
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingProcessType => {
                write!(f, "no process type configured, monitoring disabled")
            }
            ConfigError::MissingLicenseKey => write!(f, "no license key given"),
            ConfigError::Io { path, source } => {
                write!(f, "cannot read config {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "invalid config {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}
