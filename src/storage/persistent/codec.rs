//! Text codecs for the persistent files.
//!
//! History is CSV: a header row followed by one
//! `timestamp,changed_websites,total_websites` row per scan pass. Fields
//! containing a comma, quote or line break are quoted with `"` doubled.
//! Both files are replaced through a temporary sibling and a rename so a
//! crash mid-write leaves the previous version intact.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::mem::take;
use std::path::{Path, PathBuf};

use crate::history::HistoryRecord;
use crate::storage::traits::StorageError;
use crate::time::{format_scan_time, parse_scan_time};

/// Column names of the history file, in order.
pub const HISTORY_HEADER: [&str; 3] = ["timestamp", "changed_websites", "total_websites"];

const SEP: char = ',';

fn needs_quotes(field: &str) -> bool {
    field.contains(SEP) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Writes one CSV row terminated by `\n`.
pub fn write_row<W: Write>(mut w: W, row: &[&str]) -> io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            write!(w, "{SEP}")?;
        }
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{cell}")?;
        }
    }
    writeln!(w)
}

/// Splits CSV text into rows, each tagged with the 1-based line it starts on.
///
/// Blank lines are skipped. CRLF is accepted.
#[must_use]
pub fn parse_rows(text: &str) -> Vec<(usize, Vec<String>)> {
    let mut rows = Vec::new();
    let mut field = String::new();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut row_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            c if c == SEP && !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(take(&mut field));
                if !(row.len() == 1 && row[0].is_empty()) {
                    rows.push((row_line, take(&mut row)));
                } else {
                    row.clear();
                }
                line += 1;
                row_line = line;
            }
            c => {
                if c == '\n' {
                    line += 1;
                }
                field.push(c);
            }
        }
    }

    // Trailing row without a final newline.
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push((row_line, row));
    }

    rows
}

/// Encodes the full history file, header included.
#[must_use]
pub fn encode_history(records: &[HistoryRecord]) -> Vec<u8> {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_row(&mut buf, &HISTORY_HEADER);
    for record in records {
        let timestamp = format_scan_time(&record.timestamp);
        let changed = record.changed_field();
        let total = record.total_tracked.to_string();
        let _ = write_row(&mut buf, &[timestamp.as_str(), changed.as_str(), total.as_str()]);
    }
    buf
}

/// Decodes a history file written by [`encode_history`].
///
/// # Errors
///
/// `StorageError::Corrupt` if the header is missing or a row is malformed.
pub fn decode_history(path: &Path, text: &str) -> Result<Vec<HistoryRecord>, StorageError> {
    let corrupt = |line: usize, reason: String| StorageError::Corrupt {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let mut rows = parse_rows(text).into_iter();
    let Some((line, header)) = rows.next() else {
        return Ok(Vec::new());
    };
    if header.iter().map(String::as_str).ne(HISTORY_HEADER) {
        return Err(corrupt(line, format!("unexpected header {header:?}")));
    }

    rows.map(|(line, row)| -> Result<HistoryRecord, StorageError> {
        let [timestamp, changed, total] = <[String; 3]>::try_from(row)
            .map_err(|row| corrupt(line, format!("expected 3 fields, found {}", row.len())))?;
        let timestamp = parse_scan_time(&timestamp)
            .map_err(|e| corrupt(line, format!("bad timestamp '{timestamp}': {e}")))?;
        let total_tracked = total
            .trim()
            .parse::<usize>()
            .map_err(|e| corrupt(line, format!("bad total '{total}': {e}")))?;
        Ok(HistoryRecord::new(
            timestamp,
            HistoryRecord::split_changed_field(&changed),
            total_tracked,
        ))
    })
    .collect()
}

/// Reads a file, treating a missing file as `None`.
pub fn read_optional(path: &Path) -> Result<Option<String>, StorageError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StorageError::io(path, e)),
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = std::ffi::OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replaces `path` with `bytes` via write-to-temp, optional fsync, rename.
pub fn write_atomically(path: &Path, bytes: &[u8], sync: bool) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }
    }

    let temp_path = temp_path_for(path);
    let result = (|| {
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(bytes)?;
        writer.flush()?;
        if sync {
            writer.get_ref().sync_all()?;
        }
        fs::rename(&temp_path, path)
    })();

    result.map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        StorageError::io(path, e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(secs: i64, changed: &[&str], total: usize) -> HistoryRecord {
        HistoryRecord::new(
            Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
            changed.iter().map(|s| (*s).to_string()).collect(),
            total,
        )
    }

    #[test]
    fn test_parse_rows_quotes_and_crlf() {
        let rows = parse_rows("a,\"b,c\",\"say \"\"hi\"\"\"\r\n\r\nx,y,z");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].1, vec!["a", "b,c", "say \"hi\""]);
        assert_eq!(rows[1].0, 3);
        assert_eq!(rows[1].1, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_parse_rows_keeps_empty_middle_field() {
        let rows = parse_rows("2024-01-01 00:00:00,,4\n");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, 1);
        assert_eq!(rows[0].1, vec!["2024-01-01 00:00:00", "", "4"]);
    }

    #[test]
    fn test_encode_quotes_joined_urls() {
        let records = [record(0, &["https://a.com", "https://b.com"], 2)];
        let text = String::from_utf8(encode_history(&records)).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("timestamp,changed_websites,total_websites"));
        assert_eq!(
            lines.next(),
            Some("2023-11-14 22:13:20,\"https://a.com,https://b.com\",2")
        );
    }

    #[test]
    fn test_encode_empty_change_set_as_empty_field() {
        let text = String::from_utf8(encode_history(&[record(0, &[], 5)])).unwrap();
        assert!(text.ends_with("2023-11-14 22:13:20,,5\n"));
    }

    #[test]
    fn test_decode_reproduces_records() {
        let records = vec![
            record(0, &[], 1),
            record(60, &["https://a.com"], 2),
            record(120, &["https://a.com", "https://b.com"], 2),
        ];
        let text = String::from_utf8(encode_history(&records)).unwrap();
        let decoded = decode_history(Path::new("h.csv"), &text).unwrap();
        assert_eq!(decoded, records);
    }

    #[test]
    fn test_decode_empty_file() {
        assert!(decode_history(Path::new("h.csv"), "").unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_bad_header() {
        let err = decode_history(Path::new("h.csv"), "when,what\n").unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { line: 1, .. }));
    }

    #[test]
    fn test_decode_rejects_bad_total() {
        let text = "timestamp,changed_websites,total_websites\n2024-01-01 00:00:00,,many\n";
        let err = decode_history(Path::new("h.csv"), text).unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { line: 2, .. }));
    }

    #[test]
    fn test_write_atomically_replaces_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.txt");
        write_atomically(&path, b"one", true).unwrap();
        write_atomically(&path, b"two", false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "two");
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_read_optional_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_optional(&dir.path().join("absent")).unwrap().is_none());
    }
}
