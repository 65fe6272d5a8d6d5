//! In-memory storage backend.
//!
//! Thread-safe implementations of the storage traits for embedded use,
//! tests and benchmarks. Nothing survives the process.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::history::HistoryRecord;
use crate::site::TrackedSite;
use crate::storage::traits::{HistoryLog, StateStore, StorageError};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

/// In-memory [`StateStore`].
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    snapshot: RwLock<Vec<TrackedSite>>,
    saves: AtomicUsize,
}

impl InMemoryStateStore {
    /// Creates a store pre-seeded with `sites`, as if they had been saved.
    #[must_use]
    pub fn with_sites(sites: Vec<TrackedSite>) -> Self {
        Self {
            snapshot: RwLock::new(sites),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of `save` calls so far.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl StateStore for InMemoryStateStore {
    fn load(&self) -> Result<Vec<TrackedSite>, StorageError> {
        let snapshot = self.snapshot.read().map_err(|_| lock_err("state read"))?;
        Ok(snapshot.clone())
    }

    fn save(&self, sites: &[TrackedSite]) -> Result<(), StorageError> {
        let mut snapshot = self.snapshot.write().map_err(|_| lock_err("state write"))?;
        *snapshot = sites.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory [`HistoryLog`].
#[derive(Debug, Default)]
pub struct InMemoryHistoryLog {
    records: RwLock<Vec<HistoryRecord>>,
}

impl HistoryLog for InMemoryHistoryLog {
    fn append(&self, record: &HistoryRecord) -> Result<(), StorageError> {
        let mut records = self.records.write().map_err(|_| lock_err("history write"))?;
        records.push(record.clone());
        Ok(())
    }

    fn records(&self) -> Result<Vec<HistoryRecord>, StorageError> {
        let records = self.records.read().map_err(|_| lock_err("history read"))?;
        Ok(records.clone())
    }
}
