//! CSV scan history.
//!
//! Each append reads the whole log, adds one row and rewrites the file, so
//! the file on disk is always a complete, header-first CSV document.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::history::HistoryRecord;
use crate::storage::traits::{HistoryLog, StorageError};

use super::codec::{decode_history, encode_history, read_optional, write_atomically};

/// [`HistoryLog`] backed by a CSV file.
#[derive(Debug)]
pub struct CsvHistoryLog {
    path: PathBuf,
    sync_on_write: bool,
    // Serializes read-modify-write cycles within the process.
    write_lock: Mutex<()>,
}

impl CsvHistoryLog {
    /// Creates a log over `path`. A missing file is an empty log.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, sync_on_write: bool) -> Self {
        Self {
            path: path.into(),
            sync_on_write,
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the history file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Vec<HistoryRecord>, StorageError> {
        match read_optional(&self.path)? {
            Some(text) => decode_history(&self.path, &text),
            None => Ok(Vec::new()),
        }
    }
}

impl HistoryLog for CsvHistoryLog {
    fn append(&self, record: &HistoryRecord) -> Result<(), StorageError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StorageError::BackendError("poisoned lock: history append".to_string()))?;

        let mut records = self.read_all()?;
        records.push(record.clone());
        write_atomically(&self.path, &encode_history(&records), self.sync_on_write)?;
        debug!(path = %self.path.display(), rows = records.len(), "appended history row");
        Ok(())
    }

    fn records(&self) -> Result<Vec<HistoryRecord>, StorageError> {
        self.read_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_missing_log_is_empty() {
        let dir = tempdir().unwrap();
        let log = CsvHistoryLog::new(dir.path().join("history.csv"), false);
        assert!(log.records().unwrap().is_empty());
    }

    #[test]
    fn test_append_creates_file_with_header() {
        let dir = tempdir().unwrap();
        let log = CsvHistoryLog::new(dir.path().join("history.csv"), false);
        let at = Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap();
        log.append(&HistoryRecord::new(at, vec![], 1)).unwrap();

        let text = fs::read_to_string(log.path()).unwrap();
        assert_eq!(
            text,
            "timestamp,changed_websites,total_websites\n2024-02-29 12:00:00,,1\n"
        );
    }

    #[test]
    fn test_append_keeps_prior_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let at = Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap();

        CsvHistoryLog::new(&path, false)
            .append(&HistoryRecord::new(at, vec!["https://a.com".into()], 1))
            .unwrap();
        // A second instance sees the first row and appends after it.
        let log = CsvHistoryLog::new(&path, false);
        log.append(&HistoryRecord::new(at, vec![], 2)).unwrap();

        let records = log.records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].changed_urls, vec!["https://a.com"]);
        assert_eq!(records[1].total_tracked, 2);
    }

    #[test]
    fn test_corrupt_log_blocks_append() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.csv");
        fs::write(&path, "garbage\n").unwrap();
        let log = CsvHistoryLog::new(&path, false);
        let err = log.append(&HistoryRecord::new(Utc::now(), vec![], 0)).unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
        // The corrupt file is left as found.
        assert_eq!(fs::read_to_string(&path).unwrap(), "garbage\n");
    }
}
