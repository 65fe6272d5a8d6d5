//! Scan history records.
//!
//! The changed URLs of a pass are stored as one text field. Inside that
//! field each URL has `%` written as `%25` and `,` written as `%2C`, so the
//! separator never appears inside a URL and the field splits back into
//! exactly the URLs that were joined.

use std::borrow::Cow;

use chrono::{DateTime, Utc};

/// Separator between URLs in the `changed_websites` history column.
pub const CHANGED_URL_SEPARATOR: &str = ",";

fn escape_url(url: &str) -> Cow<'_, str> {
    if url.contains(['%', ',']) {
        Cow::Owned(url.replace('%', "%25").replace(',', "%2C"))
    } else {
        Cow::Borrowed(url)
    }
}

fn unescape_url(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut rest = escaped;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with("%2C") {
            out.push(',');
            rest = &tail[3..];
        } else if tail.starts_with("%25") {
            out.push('%');
            rest = &tail[3..];
        } else {
            out.push('%');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

/// Summary of one completed scan pass. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    /// When the pass completed.
    pub timestamp: DateTime<Utc>,
    /// URLs whose content changed during the pass, in registration order.
    pub changed_urls: Vec<String>,
    /// Number of tracked sites at the time of the pass.
    pub total_tracked: usize,
}

impl HistoryRecord {
    /// Creates a record.
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, changed_urls: Vec<String>, total_tracked: usize) -> Self {
        Self {
            timestamp,
            changed_urls,
            total_tracked,
        }
    }

    /// Changed URLs joined into one field; empty when nothing changed.
    #[must_use]
    pub fn changed_field(&self) -> String {
        self.changed_urls
            .iter()
            .map(|url| escape_url(url))
            .collect::<Vec<_>>()
            .join(CHANGED_URL_SEPARATOR)
    }

    /// Inverse of [`changed_field`](Self::changed_field).
    #[must_use]
    pub fn split_changed_field(field: &str) -> Vec<String> {
        if field.is_empty() {
            return Vec::new();
        }
        field
            .split(CHANGED_URL_SEPARATOR)
            .map(unescape_url)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_change_set_is_empty_field() {
        let record = HistoryRecord::new(Utc::now(), Vec::new(), 3);
        assert_eq!(record.changed_field(), "");
        assert!(HistoryRecord::split_changed_field("").is_empty());
    }

    #[test]
    fn changed_field_joins_in_order() {
        let record = HistoryRecord::new(
            Utc::now(),
            vec!["https://b.com".to_string(), "https://a.com".to_string()],
            2,
        );
        let field = record.changed_field();
        assert_eq!(field, "https://b.com,https://a.com");
        assert_eq!(HistoryRecord::split_changed_field(&field), record.changed_urls);
    }

    #[test]
    fn commas_inside_urls_survive_the_field() {
        let urls = vec![
            "https://shop.example/?ids=1,2".to_string(),
            "https://a.com".to_string(),
        ];
        let record = HistoryRecord::new(Utc::now(), urls.clone(), 2);
        let field = record.changed_field();
        assert_eq!(field, "https://shop.example/?ids=1%2C2,https://a.com");
        assert_eq!(HistoryRecord::split_changed_field(&field), urls);
    }

    #[test]
    fn percent_sequences_are_not_mistaken_for_escapes() {
        let urls = vec![
            "https://a.com/q?x=%2C".to_string(),
            "https://b.com/100%".to_string(),
            "https://c.com/%zz,%25".to_string(),
        ];
        let record = HistoryRecord::new(Utc::now(), urls.clone(), 3);
        assert_eq!(
            HistoryRecord::split_changed_field(&record.changed_field()),
            urls
        );
    }
}
