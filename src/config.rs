//! Engine configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::fetch::DEFAULT_FETCH_TIMEOUT;

/// Default snapshot file name.
pub const DEFAULT_STATE_FILE: &str = "website_state.json";

/// Default history file name.
pub const DEFAULT_HISTORY_FILE: &str = "website_history.csv";

/// Configuration for a monitor instance.
///
/// File locations are always explicit; stores never fall back to a
/// process-wide path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// JSON snapshot of tracked sites.
    pub state_path: PathBuf,
    /// CSV scan history.
    pub history_path: PathBuf,
    /// Bounded wait for a single fetch.
    pub fetch_timeout: Duration,
    /// Fetch fan-out width. 1 fetches strictly one URL at a time.
    pub fetch_workers: usize,
    /// User agent sent by the HTTP fetcher.
    pub user_agent: String,
    /// Whether to fsync files before the atomic rename (slower but safer).
    pub sync_on_write: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from(DEFAULT_STATE_FILE),
            history_path: PathBuf::from(DEFAULT_HISTORY_FILE),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            fetch_workers: 1,
            user_agent: concat!("sitewatch/", env!("CARGO_PKG_VERSION")).to_string(),
            sync_on_write: true,
        }
    }
}

impl MonitorConfig {
    /// Default configuration with both files placed in `dir`.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            state_path: dir.join(DEFAULT_STATE_FILE),
            history_path: dir.join(DEFAULT_HISTORY_FILE),
            ..Self::default()
        }
    }

    /// Checks the configuration and returns it unchanged if usable.
    ///
    /// Paths are compared component by component without touching the
    /// filesystem. `dir/./h.csv` matches `dir/h.csv`, but `dir/sub/../h.csv`
    /// and symlinks do not. Opening the stores locks each file separately,
    /// which rejects those cases.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` found.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.state_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath { field: "state_path" });
        }
        if self.history_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath { field: "history_path" });
        }
        if self.state_path == self.history_path {
            return Err(ConfigError::SharedPath { path: self.state_path });
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::ZeroFetchTimeout {
                timeout: self.fetch_timeout,
            });
        }
        if self.fetch_workers == 0 {
            return Err(ConfigError::NoFetchWorkers);
        }
        Ok(self)
    }
}
