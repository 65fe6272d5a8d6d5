//! Page fetching.
//!
//! The engine only needs to know whether a fetch produced content. Transport
//! errors, timeouts and non-success HTTP statuses all collapse into one
//! [`FetchFailure`]; the reason string exists for logs only.

use std::fmt;
use std::time::Duration;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::HttpFetcher;

/// Bounded wait applied to a single fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// A fetch that produced no content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    /// URL that was requested.
    pub url: String,
    /// Human-readable cause, for logging.
    pub reason: String,
}

impl FetchFailure {
    /// Creates a failure for `url`.
    #[must_use]
    pub fn new(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fetch of {} failed: {}", self.url, self.reason)
    }
}

/// Page body on success, [`FetchFailure`] otherwise.
pub type FetchOutcome = Result<String, FetchFailure>;

/// Retrieves raw page content.
///
/// Implementations must be shareable across the fetch pool's threads and
/// must bound how long a single call may block.
pub trait Fetcher: Send + Sync {
    /// Fetches `url`.
    fn fetch(&self, url: &str) -> FetchOutcome;
}
