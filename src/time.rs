//! Scan timestamps.
//!
//! Every timestamp sitewatch records is UTC with whole-second precision and
//! is persisted as `YYYY-MM-DD HH:MM:SS`. Truncating at the source means a
//! value read back from disk compares equal to the value that was written.

use std::sync::Mutex;

use chrono::{DateTime, NaiveDateTime, ParseError, SubsecRound, TimeZone, Utc};

/// Text format used for scan timestamps in the state and history files.
pub const SCAN_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Source of "now" for scan passes.
pub trait Clock: Send + Sync {
    /// Current time, truncated to whole seconds.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(0)
    }
}

/// Manually driven clock for tests and benchmarks.
#[derive(Debug)]
pub struct FixedClock {
    current: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Creates a clock frozen at `at` (truncated to whole seconds).
    #[must_use]
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(at.trunc_subsecs(0)),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: chrono::Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = *current + by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Formats a timestamp in the persisted text form.
#[must_use]
pub fn format_scan_time(at: &DateTime<Utc>) -> String {
    at.format(SCAN_TIME_FORMAT).to_string()
}

/// Parses a timestamp written by [`format_scan_time`].
///
/// # Errors
///
/// Returns the chrono parse error if `s` is not in `YYYY-MM-DD HH:MM:SS` form.
pub fn parse_scan_time(s: &str) -> Result<DateTime<Utc>, ParseError> {
    let naive = NaiveDateTime::parse_from_str(s.trim(), SCAN_TIME_FORMAT)?;
    Ok(Utc.from_utc_datetime(&naive))
}

/// Serde adapter for `Option<DateTime<Utc>>` in the persisted text form.
pub mod optional_scan_time {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    /// Serializes `None` as `null`, `Some` as `YYYY-MM-DD HH:MM:SS`.
    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(at) => serializer.serialize_str(&super::format_scan_time(at)),
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes `null` or a `YYYY-MM-DD HH:MM:SS` string.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| super::parse_scan_time(&s).map_err(de::Error::custom))
            .transpose()
    }
}
