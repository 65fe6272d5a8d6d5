//! Error types for sitewatch.
//!
//! All errors are strongly typed using thiserror. Fetch failures are not
//! errors at this level: they are recorded on the affected site and the
//! scan pass carries on. Only configuration and persistence problems
//! surface to the caller.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::storage::StorageError;

/// Configuration errors detected by `MonitorConfig::validate`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Fetch timeout must be non-zero (got {timeout:?})")]
    ZeroFetchTimeout {
        timeout: Duration,
    },

    #[error("Fetch worker count must be at least 1")]
    NoFetchWorkers,

    #[error("Path for '{field}' cannot be empty")]
    EmptyPath {
        field: &'static str,
    },

    #[error("State and history files must differ (both are {path})")]
    SharedPath {
        path: PathBuf,
    },
}

/// Top-level error type for sitewatch.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl WatchError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns true if this is a storage error.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }
}

/// Result type alias for sitewatch operations.
pub type WatchResult<T> = Result<T, WatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_timeout() {
        let err = ConfigError::ZeroFetchTimeout {
            timeout: Duration::ZERO,
        };
        let msg = format!("{err}");
        assert!(msg.contains("non-zero"));
    }

    #[test]
    fn test_config_error_empty_path() {
        let err = ConfigError::EmptyPath { field: "state_path" };
        let msg = format!("{err}");
        assert!(msg.contains("state_path"));
    }

    #[test]
    fn test_watch_error_from_config() {
        let err: WatchError = ConfigError::NoFetchWorkers.into();
        assert!(err.is_config());
        assert!(!err.is_storage());
    }

    #[test]
    fn test_watch_error_from_storage() {
        let err: WatchError = StorageError::BackendError("poisoned".to_string()).into();
        assert!(err.is_storage());
        let msg = format!("{err}");
        assert!(msg.contains("poisoned"));
    }

    #[test]
    fn test_watch_error_internal() {
        let err = WatchError::internal("fetch worker panicked");
        assert!(err.is_internal());
        assert!(format!("{err}").contains("fetch worker panicked"));
    }
}
