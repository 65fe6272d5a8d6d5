//! JSON snapshot of tracked sites.
//!
//! # File Format
//! ```text
//! {
//!   "https://example.com": {
//!     "last_scan": "2024-03-09 17:04:05",
//!     "changes": 2,
//!     "status": "No changes",
//!     "last_hash": "<hex digest>"
//!   },
//!   ...
//! }
//! ```
//! Keys appear in registration order. `last_scan` and `last_hash` are
//! `null` until the first successful fetch.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::digest::ContentDigest;
use crate::site::{SiteStatus, TrackedSite};
use crate::storage::traits::{StateStore, StorageError};
use crate::time::optional_scan_time;

use super::codec::{read_optional, write_atomically};

#[derive(Debug, Serialize, Deserialize)]
struct SiteEntry {
    #[serde(with = "optional_scan_time", default)]
    last_scan: Option<DateTime<Utc>>,
    changes: u64,
    status: SiteStatus,
    #[serde(default)]
    last_hash: Option<ContentDigest>,
}

impl SiteEntry {
    fn from_site(site: &TrackedSite) -> Self {
        Self {
            last_scan: site.last_scan,
            changes: site.change_count,
            status: site.status,
            last_hash: site.last_digest.clone(),
        }
    }

    fn into_site(self, url: String) -> TrackedSite {
        TrackedSite {
            url,
            last_scan: self.last_scan,
            change_count: self.changes,
            status: self.status,
            last_digest: self.last_hash,
        }
    }
}

/// [`StateStore`] backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
    sync_on_write: bool,
}

impl JsonStateStore {
    /// Creates a store over `path`. Nothing is read until [`StateStore::load`].
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, sync_on_write: bool) -> Self {
        Self {
            path: path.into(),
            sync_on_write,
        }
    }

    /// Returns the snapshot file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn corrupt(&self, reason: impl Into<String>) -> StorageError {
        StorageError::Corrupt {
            path: self.path.clone(),
            line: 1,
            reason: reason.into(),
        }
    }
}

impl StateStore for JsonStateStore {
    fn load(&self) -> Result<Vec<TrackedSite>, StorageError> {
        let Some(text) = read_optional(&self.path)? else {
            debug!(path = %self.path.display(), "no state file, starting empty");
            return Ok(Vec::new());
        };
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let map: Map<String, Value> =
            serde_json::from_str(&text).map_err(|e| StorageError::Corrupt {
                path: self.path.clone(),
                line: e.line(),
                reason: e.to_string(),
            })?;

        let sites = map
            .into_iter()
            .map(|(url, value)| {
                serde_json::from_value::<SiteEntry>(value)
                    .map(|entry| entry.into_site(url.clone()))
                    .map_err(|e| self.corrupt(format!("entry for {url}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(path = %self.path.display(), sites = sites.len(), "loaded state");
        Ok(sites)
    }

    fn save(&self, sites: &[TrackedSite]) -> Result<(), StorageError> {
        let mut map = Map::with_capacity(sites.len());
        for site in sites {
            let value = serde_json::to_value(SiteEntry::from_site(site))
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            map.insert(site.url.clone(), value);
        }
        let bytes = serde_json::to_vec_pretty(&map)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        write_atomically(&self.path, &bytes, self.sync_on_write)?;
        debug!(path = %self.path.display(), sites = sites.len(), "saved state");
        Ok(())
    }
}
