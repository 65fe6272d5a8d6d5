//! Abstract storage traits for sitewatch.
//!
//! The engine owns the in-memory site table and mirrors it into a
//! [`StateStore`] after every mutation. Scan summaries go to a
//! [`HistoryLog`]. Both are injected, so tests run against the in-memory
//! backends and production against the file-backed ones.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::history::HistoryRecord;
use crate::site::TrackedSite;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing a backing file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Encoding a snapshot failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Persisted data could not be decoded.
    #[error("Corrupt data in {} at line {line}: {reason}", path.display())]
    Corrupt {
        /// File being decoded.
        path: PathBuf,
        /// 1-based line number (1 for whole-file formats).
        line: usize,
        /// What was wrong.
        reason: String,
    },

    /// Another process holds the store.
    #[error("Store at {} is locked by another process", path.display())]
    Locked {
        /// Lock file.
        path: PathBuf,
    },

    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Durable snapshot of all tracked sites.
///
/// `save` overwrites the previous snapshot as a whole; there is no
/// incremental update.
pub trait StateStore: Send + Sync {
    /// Reads the persisted snapshot in registration order.
    ///
    /// A store that has never been saved yields an empty list.
    fn load(&self) -> Result<Vec<TrackedSite>, StorageError>;

    /// Replaces the persisted snapshot with `sites`.
    fn save(&self, sites: &[TrackedSite]) -> Result<(), StorageError>;
}

/// Durable append-only log of scan summaries.
pub trait HistoryLog: Send + Sync {
    /// Adds `record` as the last entry.
    fn append(&self, record: &HistoryRecord) -> Result<(), StorageError>;

    /// Reads every record in append order. A missing log yields an empty list.
    fn records(&self) -> Result<Vec<HistoryRecord>, StorageError>;
}
