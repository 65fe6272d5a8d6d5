//! Tracked sites and the ordered in-memory site table.
//!
//! A site is keyed by its normalized URL. Sites are never removed, and the
//! table keeps registration order so scan passes and history rows are
//! reproducible for a given sequence of registrations.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::digest::ContentDigest;
use crate::time::format_scan_time;

/// Scheme prefixes accepted as-is by [`normalize_url`].
pub const RECOGNIZED_SCHEMES: [&str; 2] = ["http://", "https://"];

/// Scheme prepended to URLs that carry none of [`RECOGNIZED_SCHEMES`].
pub const DEFAULT_SCHEME: &str = "https://";

/// Display text for a site that has never been scanned.
pub const NEVER_SCANNED: &str = "Never";

/// Outcome of the most recent scan attempt for a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SiteStatus {
    /// Registered, not scanned yet.
    #[serde(rename = "Pending")]
    Pending,
    /// First successful fetch; digest recorded, not counted as a change.
    #[serde(rename = "Initial scan")]
    InitialScan,
    /// Content identical to the last known-good digest.
    #[serde(rename = "No changes")]
    NoChange,
    /// Content differs from the last known-good digest.
    #[serde(rename = "Changed")]
    Changed,
    /// The fetch failed.
    #[serde(rename = "Error")]
    Error,
}

impl SiteStatus {
    /// Human-readable label, identical to the persisted form.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InitialScan => "Initial scan",
            Self::NoChange => "No changes",
            Self::Changed => "Changed",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Canonicalizes a URL for use as a tracking key.
///
/// URLs without an `http://` or `https://` prefix get `https://` prepended.
/// Nothing else is rewritten.
///
/// # Examples
///
/// ```
/// use sitewatch::normalize_url;
///
/// assert_eq!(normalize_url("example.com"), "https://example.com");
/// assert_eq!(normalize_url("http://example.com"), "http://example.com");
/// ```
#[must_use]
pub fn normalize_url(raw: &str) -> String {
    if RECOGNIZED_SCHEMES.iter().any(|scheme| raw.starts_with(scheme)) {
        raw.to_string()
    } else {
        format!("{DEFAULT_SCHEME}{raw}")
    }
}

/// Splits free-text input (one URL per line) into trimmed, non-blank entries.
#[must_use]
pub fn split_url_input(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Tracking record for one normalized URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedSite {
    /// Normalized URL; unique key.
    pub url: String,
    /// Time of the last successful scan. Left untouched by failed fetches.
    pub last_scan: Option<DateTime<Utc>>,
    /// Number of detected content changes. Never decreases.
    pub change_count: u64,
    /// Outcome of the most recent scan attempt.
    pub status: SiteStatus,
    /// Digest of the last successfully fetched content.
    pub last_digest: Option<ContentDigest>,
}

impl TrackedSite {
    /// Creates a pending record for an already-normalized URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            last_scan: None,
            change_count: 0,
            status: SiteStatus::Pending,
            last_digest: None,
        }
    }

    /// Records a failed fetch. Digest, change count and scan time keep the
    /// values from the last successful fetch.
    pub fn record_failure(&mut self) {
        self.status = SiteStatus::Error;
    }

    /// Records a successful fetch and returns true if it counts as a change.
    ///
    /// The first successful fetch only establishes the baseline digest.
    pub fn record_digest(&mut self, digest: ContentDigest, at: DateTime<Utc>) -> bool {
        let changed = match &self.last_digest {
            None => {
                self.status = SiteStatus::InitialScan;
                false
            }
            Some(previous) if *previous != digest => {
                self.change_count = self.change_count.saturating_add(1);
                self.status = SiteStatus::Changed;
                true
            }
            Some(_) => {
                self.status = SiteStatus::NoChange;
                false
            }
        };
        self.last_digest = Some(digest);
        self.last_scan = Some(at);
        changed
    }

    /// Display row for this site.
    #[must_use]
    pub fn view(&self) -> SiteView {
        SiteView {
            url: self.url.clone(),
            last_scan: self
                .last_scan
                .as_ref()
                .map_or_else(|| NEVER_SCANNED.to_string(), format_scan_time),
            changes: self.change_count,
            status: self.status,
        }
    }
}

/// Read-only display row: URL, last scan text, change count, status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteView {
    /// Normalized URL.
    pub url: String,
    /// Formatted scan time, or [`NEVER_SCANNED`].
    pub last_scan: String,
    /// Detected change count.
    pub changes: u64,
    /// Status of the last scan attempt.
    pub status: SiteStatus,
}

/// Ordered mapping from normalized URL to [`TrackedSite`].
#[derive(Debug, Default, Clone)]
pub struct SiteTable {
    sites: Vec<TrackedSite>,
    by_url: HashMap<String, usize>,
}

impl SiteTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from persisted records, keeping their order.
    ///
    /// A URL that appears more than once keeps its first record.
    #[must_use]
    pub fn from_sites(sites: impl IntoIterator<Item = TrackedSite>) -> Self {
        let mut table = Self::new();
        for site in sites {
            table.insert(site);
        }
        table
    }

    fn insert(&mut self, site: TrackedSite) -> bool {
        if self.by_url.contains_key(&site.url) {
            return false;
        }
        self.by_url.insert(site.url.clone(), self.sites.len());
        self.sites.push(site);
        true
    }

    /// Normalizes and adds each URL that is not tracked yet.
    ///
    /// Returns the number of newly tracked sites.
    pub fn register<I, S>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for raw in urls {
            if self.insert(TrackedSite::new(normalize_url(raw.as_ref()))) {
                added += 1;
            }
        }
        added
    }

    /// Looks up a site by its normalized URL.
    #[must_use]
    pub fn get(&self, url: &str) -> Option<&TrackedSite> {
        self.by_url.get(url).map(|&idx| &self.sites[idx])
    }

    pub(crate) fn get_index_mut(&mut self, idx: usize) -> Option<&mut TrackedSite> {
        self.sites.get_mut(idx)
    }

    /// Returns true if the normalized URL is tracked.
    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.by_url.contains_key(url)
    }

    /// All sites in registration order.
    #[must_use]
    pub fn sites(&self) -> &[TrackedSite] {
        &self.sites
    }

    /// Tracked URLs in registration order.
    #[must_use]
    pub fn urls(&self) -> Vec<String> {
        self.sites.iter().map(|s| s.url.clone()).collect()
    }

    /// Number of tracked sites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Returns true if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}
