//! # sitewatch - website change detection
//!
//! sitewatch periodically fetches a set of web pages, detects content
//! changes by comparing digests, and persists both the current state of
//! every tracked site and a history of scan passes.
//!
//! ## Core Concepts
//!
//! - **TrackedSite**: per-URL record (last scan, change count, status, last digest)
//! - **Scan pass**: one fetch of every tracked URL, producing one history row
//! - **StateStore / HistoryLog**: durable snapshot and append-only history
//! - **MonitorEngine**: registration, scanning and the display read model
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sitewatch::{HttpFetcher, MonitorConfig, MonitorEngine};
//!
//! let config = MonitorConfig::in_dir("./watch-data");
//! let fetcher = HttpFetcher::new(config.fetch_timeout, &config.user_agent)?;
//! let engine = MonitorEngine::open(&config, Arc::new(fetcher))?;
//!
//! engine.register(["example.com", "https://www.rust-lang.org"])?;
//! let changed = engine.scan()?;
//! if !changed.is_empty() {
//!     println!("changed: {}", changed.join(", "));
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod digest;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod history;
pub mod site;
pub mod storage;
pub mod time;

// Re-export primary types at crate root for convenience
pub use config::MonitorConfig;
pub use digest::{Blake3Hasher, ContentDigest, ContentHasher};
pub use engine::{MonitorEngine, MonitorEngineBuilder};
pub use error::{ConfigError, WatchError, WatchResult};
pub use fetch::{FetchFailure, FetchOutcome, Fetcher, DEFAULT_FETCH_TIMEOUT};
pub use history::HistoryRecord;
pub use site::{normalize_url, split_url_input, SiteStatus, SiteTable, SiteView, TrackedSite};
pub use storage::{HistoryLog, InMemoryHistoryLog, InMemoryStateStore, StateStore, StorageError};
pub use time::{Clock, FixedClock, SystemClock};

#[cfg(feature = "http")]
pub use fetch::HttpFetcher;
