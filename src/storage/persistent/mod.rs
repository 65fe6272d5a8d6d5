//! File-backed storage for sitewatch.
//!
//! - `state_file`: JSON snapshot of every tracked site, rewritten on each save
//! - `history_file`: CSV log with one row per scan pass
//! - `file_lock`: exclusive lock so only one process drives a state file
//! - `codec`: CSV encoding and atomic file replacement shared by both
//!
//! ```text
//! <dir>/website_state.json        snapshot   (atomic rename on save)
//! <dir>/website_state.json.lock   flock / LockFileEx
//! <dir>/website_history.csv       history    (atomic rename on append)
//! <dir>/website_history.csv.lock  flock / LockFileEx
//! ```

mod codec;
mod file_lock;
mod history_file;
mod state_file;

pub use codec::HISTORY_HEADER;
pub use file_lock::FileLock;
pub use history_file::CsvHistoryLog;
pub use state_file::JsonStateStore;

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::config::MonitorConfig;
use crate::error::WatchResult;
use crate::storage::traits::StorageError;

/// Opened file-backed stores plus the locks that guard them.
#[derive(Debug)]
pub struct PersistentStores {
    /// Site snapshot store.
    pub state: JsonStateStore,
    /// Scan history log.
    pub history: CsvHistoryLog,
    /// Lock on the state file, held until the stores are dropped.
    pub lock: FileLock,
    /// Lock on the history file, held until the stores are dropped.
    pub history_lock: FileLock,
}

fn lock_file(data_path: &Path) -> Result<FileLock, StorageError> {
    let lock_path = FileLock::path_for(data_path);
    FileLock::acquire(&lock_path).map_err(|e| match e.kind() {
        ErrorKind::WouldBlock => StorageError::Locked { path: lock_path.clone() },
        _ => StorageError::io(&lock_path, e),
    })
}

/// Locks and opens the state and history files named by `config`.
///
/// Files are not read here; a missing state or history file is simply
/// empty on first use.
///
/// # Errors
/// - `ConfigError` if the configuration does not validate
/// - `StorageError::Locked` if another process holds the state or history file
/// - `StorageError::Io` if a lock file cannot be created
///
/// # Example
/// ```rust,no_run
/// use sitewatch::{storage::open_stores, MonitorConfig};
///
/// let stores = open_stores(&MonitorConfig::in_dir("./watch-data"))?;
/// # Ok::<(), sitewatch::WatchError>(())
/// ```
pub fn open_stores(config: &MonitorConfig) -> WatchResult<PersistentStores> {
    let config = config.clone().validate()?;

    for path in [&config.state_path, &config.history_path] {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
            }
        }
    }

    // The history log is rewritten on every append, so it needs its own lock
    // even when two configs name different state files.
    let lock = lock_file(&config.state_path)?;
    let history_lock = lock_file(&config.history_path)?;

    Ok(PersistentStores {
        state: JsonStateStore::new(&config.state_path, config.sync_on_write),
        history: CsvHistoryLog::new(&config.history_path, config.sync_on_write),
        lock,
        history_lock,
    })
}
