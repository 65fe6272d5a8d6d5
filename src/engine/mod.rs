//! The monitor engine.
//!
//! `MonitorEngine` owns the in-memory [`SiteTable`] and mirrors it into the
//! injected [`StateStore`] after every mutation. A scan pass holds the table
//! lock from the first fetch until the history row is written, so passes
//! and registrations never interleave.
//!
//! # Scan pass
//!
//! ```text
//! urls (registration order)
//!   └─ fetch + hash ── fetch_pool (sequential, or fanned out)
//!        └─ apply in order ── TrackedSite::record_digest / record_failure
//!             └─ StateStore::save   (one snapshot)
//!                  └─ HistoryLog::append (one row)
//! ```

mod fetch_pool;

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::digest::{Blake3Hasher, ContentHasher};
use crate::error::{WatchError, WatchResult};
use crate::fetch::Fetcher;
use crate::history::HistoryRecord;
use crate::site::{normalize_url, SiteTable, SiteView, TrackedSite};
use crate::storage::{
    open_stores, FileLock, HistoryLog, InMemoryHistoryLog, InMemoryStateStore, StateStore,
};
use crate::time::{Clock, SystemClock};

/// Change-detection engine over a set of tracked sites.
pub struct MonitorEngine {
    fetcher: Arc<dyn Fetcher>,
    hasher: Arc<dyn ContentHasher>,
    clock: Arc<dyn Clock>,
    state: Arc<dyn StateStore>,
    history: Arc<dyn HistoryLog>,
    sites: Mutex<SiteTable>,
    fetch_workers: usize,
    _locks: Vec<FileLock>,
}

impl std::fmt::Debug for MonitorEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorEngine")
            .field("fetch_workers", &self.fetch_workers)
            .finish_non_exhaustive()
    }
}

impl MonitorEngine {
    /// Starts building an engine around `fetcher`.
    ///
    /// Unless overridden, the engine uses BLAKE3 digests, the system clock
    /// and in-memory stores.
    #[must_use]
    pub fn builder(fetcher: Arc<dyn Fetcher>) -> MonitorEngineBuilder {
        MonitorEngineBuilder {
            fetcher,
            hasher: Arc::new(Blake3Hasher),
            clock: Arc::new(SystemClock),
            state: None,
            history: None,
            fetch_workers: 1,
            locks: Vec::new(),
        }
    }

    /// Opens an engine over the files named by `config`.
    ///
    /// Takes the state and history file locks, then loads the persisted
    /// sites.
    ///
    /// # Errors
    /// - invalid configuration
    /// - the state or history file is locked by another process
    /// - the state file exists but cannot be read or decoded
    pub fn open(config: &MonitorConfig, fetcher: Arc<dyn Fetcher>) -> WatchResult<Self> {
        let stores = open_stores(config)?;
        Self::builder(fetcher)
            .state(Arc::new(stores.state))
            .history(Arc::new(stores.history))
            .fetch_workers(config.fetch_workers)
            .hold_lock(stores.lock)
            .hold_lock(stores.history_lock)
            .build()
    }

    fn lock_sites(&self) -> WatchResult<MutexGuard<'_, SiteTable>> {
        self.sites
            .lock()
            .map_err(|_| WatchError::internal("site table lock poisoned"))
    }

    /// Starts tracking `urls`.
    ///
    /// Each URL is normalized; URLs already tracked are skipped. The state
    /// is saved exactly once per call, even if nothing new was added.
    /// Returns the number of newly tracked sites.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the snapshot cannot be saved; the
    /// in-memory table is then left as it was before the call.
    pub fn register<I, S>(&self, urls: I) -> WatchResult<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = self.lock_sites()?;
        let mut next = table.clone();
        let added = next.register(urls);
        self.state.save(next.sites())?;
        *table = next;
        debug!(added, tracked = table.len(), "registered sites");
        Ok(added)
    }

    /// Runs one scan pass over every tracked site.
    ///
    /// Returns the URLs whose content changed, in registration order. Fetch
    /// failures are recorded as `SiteStatus::Error` on the affected site and
    /// never abort the pass.
    ///
    /// # Errors
    ///
    /// Storage errors from saving the snapshot or appending the history
    /// row, and internal errors from the fetch pool. If the snapshot cannot
    /// be saved, the in-memory table keeps its pre-scan state.
    pub fn scan(&self) -> WatchResult<Vec<String>> {
        let mut table = self.lock_sites()?;
        let urls = table.urls();
        let scan_time = self.clock.now();

        let probes = fetch_pool::probe_all(
            &urls,
            self.fetcher.as_ref(),
            self.hasher.as_ref(),
            self.fetch_workers,
        )?;

        let mut next = table.clone();
        let mut changed = Vec::new();
        let mut failed = 0usize;
        for (idx, (url, probe)) in urls.iter().zip(probes).enumerate() {
            let site = next
                .get_index_mut(idx)
                .ok_or_else(|| WatchError::internal(format!("site {url} vanished during scan")))?;
            match probe {
                Ok(digest) => {
                    if site.record_digest(digest, scan_time) {
                        changed.push(url.clone());
                    }
                }
                Err(failure) => {
                    warn!(url = %url, reason = %failure.reason, "fetch failed");
                    site.record_failure();
                    failed += 1;
                }
            }
        }

        self.state.save(next.sites())?;
        *table = next;

        let record = HistoryRecord::new(self.clock.now(), changed.clone(), table.len());
        self.history.append(&record)?;

        info!(
            tracked = table.len(),
            changed = changed.len(),
            failed,
            "scan pass complete"
        );
        Ok(changed)
    }

    /// Snapshot of every tracked site in registration order.
    ///
    /// # Errors
    ///
    /// Internal error if the site table lock is poisoned.
    pub fn sites(&self) -> WatchResult<Vec<TrackedSite>> {
        Ok(self.lock_sites()?.sites().to_vec())
    }

    /// Looks up one site; `url` is normalized first.
    ///
    /// # Errors
    ///
    /// Internal error if the site table lock is poisoned.
    pub fn site(&self, url: &str) -> WatchResult<Option<TrackedSite>> {
        Ok(self.lock_sites()?.get(&normalize_url(url)).cloned())
    }

    /// Display rows for every tracked site.
    ///
    /// # Errors
    ///
    /// Internal error if the site table lock is poisoned.
    pub fn views(&self) -> WatchResult<Vec<SiteView>> {
        Ok(self.lock_sites()?.sites().iter().map(TrackedSite::view).collect())
    }

    /// Number of tracked sites.
    ///
    /// # Errors
    ///
    /// Internal error if the site table lock is poisoned.
    pub fn tracked_count(&self) -> WatchResult<usize> {
        Ok(self.lock_sites()?.len())
    }

    /// Every history record in append order.
    ///
    /// # Errors
    ///
    /// Storage error if the history log cannot be read.
    pub fn history(&self) -> WatchResult<Vec<HistoryRecord>> {
        Ok(self.history.records()?)
    }
}

/// Builder for [`MonitorEngine`].
pub struct MonitorEngineBuilder {
    fetcher: Arc<dyn Fetcher>,
    hasher: Arc<dyn ContentHasher>,
    clock: Arc<dyn Clock>,
    state: Option<Arc<dyn StateStore>>,
    history: Option<Arc<dyn HistoryLog>>,
    fetch_workers: usize,
    locks: Vec<FileLock>,
}

impl MonitorEngineBuilder {
    /// Uses `hasher` for content digests.
    #[must_use]
    pub fn hasher(mut self, hasher: Arc<dyn ContentHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Uses `clock` for scan timestamps.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Persists site state to `state`.
    #[must_use]
    pub fn state(mut self, state: Arc<dyn StateStore>) -> Self {
        self.state = Some(state);
        self
    }

    /// Appends scan summaries to `history`.
    #[must_use]
    pub fn history(mut self, history: Arc<dyn HistoryLog>) -> Self {
        self.history = Some(history);
        self
    }

    /// Sets the fetch fan-out width (clamped to at least 1).
    #[must_use]
    pub fn fetch_workers(mut self, workers: usize) -> Self {
        self.fetch_workers = workers.max(1);
        self
    }

    /// Keeps `lock` alive for as long as the engine exists. May be called
    /// once per guarded file.
    #[must_use]
    pub fn hold_lock(mut self, lock: FileLock) -> Self {
        self.locks.push(lock);
        self
    }

    /// Loads the persisted state and returns the engine.
    ///
    /// # Errors
    ///
    /// Storage error if the state store cannot be loaded.
    pub fn build(self) -> WatchResult<MonitorEngine> {
        let state = self
            .state
            .unwrap_or_else(|| Arc::new(InMemoryStateStore::default()));
        let history = self
            .history
            .unwrap_or_else(|| Arc::new(InMemoryHistoryLog::default()));

        let table = SiteTable::from_sites(state.load()?);
        debug!(tracked = table.len(), "engine state loaded");

        Ok(MonitorEngine {
            fetcher: self.fetcher,
            hasher: self.hasher,
            clock: self.clock,
            state,
            history,
            sites: Mutex::new(table),
            fetch_workers: self.fetch_workers,
            _locks: self.locks,
        })
    }
}
