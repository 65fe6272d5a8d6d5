//! Restart tests for the file-backed stores.
//!
//! These tests verify that:
//! - site state written by one engine is loaded unchanged by a fresh one
//! - history rows survive restarts and keep accumulating
//! - a second engine cannot open a state or history file that is in use

use std::fs;
use std::sync::Arc;

use tempfile::tempdir;

use sitewatch::storage::{open_stores, CsvHistoryLog, JsonStateStore};
use sitewatch::{
    FetchFailure, FetchOutcome, Fetcher, HistoryLog, MonitorConfig, MonitorEngine, SiteStatus,
    StateStore, StorageError, WatchError,
};

/// Every URL serves `<url>#<generation>`; URLs containing "offline" fail.
struct GenerationFetcher {
    generation: u32,
}

impl Fetcher for GenerationFetcher {
    fn fetch(&self, url: &str) -> FetchOutcome {
        if url.contains("offline") {
            return Err(FetchFailure::new(url, "timed out"));
        }
        Ok(format!("{url}#{}", self.generation))
    }
}

fn open_engine(config: &MonitorConfig, generation: u32) -> MonitorEngine {
    MonitorEngine::open(config, Arc::new(GenerationFetcher { generation })).unwrap()
}

#[test]
fn state_survives_restart() {
    let dir = tempdir().unwrap();
    let config = MonitorConfig::in_dir(dir.path());

    let before = {
        let engine = open_engine(&config, 1);
        engine
            .register(["zeta.example", "alpha.example", "offline.example", "new.example"])
            .unwrap();
        engine.scan().unwrap();
        drop(engine);

        let engine = open_engine(&config, 2);
        engine.scan().unwrap();
        engine.sites().unwrap()
    };

    let reopened = open_engine(&config, 2);
    let after = reopened.sites().unwrap();
    assert_eq!(after, before);

    let urls: Vec<&str> = after.iter().map(|s| s.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://zeta.example",
            "https://alpha.example",
            "https://offline.example",
            "https://new.example"
        ]
    );
    assert_eq!(after[0].status, SiteStatus::Changed);
    assert_eq!(after[0].change_count, 1);
    assert_eq!(after[2].status, SiteStatus::Error);
    assert!(after[2].last_scan.is_none());
    assert!(after[2].last_digest.is_none());
}

#[test]
fn registration_survives_restart() {
    let dir = tempdir().unwrap();
    let config = MonitorConfig::in_dir(dir.path());
    {
        let engine = open_engine(&config, 1);
        engine.register(["example.com"]).unwrap();
    }

    let engine = open_engine(&config, 1);
    let views = engine.views().unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].url, "https://example.com");
    assert_eq!(views[0].last_scan, "Never");
    assert_eq!(views[0].status, SiteStatus::Pending);

    // Re-registering after restart is still a no-op.
    assert_eq!(engine.register(["example.com"]).unwrap(), 0);
    assert_eq!(engine.tracked_count().unwrap(), 1);
}

#[test]
fn history_accumulates_across_restarts() {
    let dir = tempdir().unwrap();
    let config = MonitorConfig::in_dir(dir.path());
    let mut expected = Vec::new();

    for generation in 1..=4 {
        let engine = open_engine(&config, generation);
        engine.register(["a.example", "b.example"]).unwrap();
        let changed = engine.scan().unwrap();
        expected.push(changed);
    }

    let log = CsvHistoryLog::new(&config.history_path, false);
    let records = log.records().unwrap();
    assert_eq!(records.len(), 4);
    for (record, changed) in records.iter().zip(&expected) {
        assert_eq!(record.total_tracked, 2);
        assert_eq!(&record.changed_urls, changed);
    }
    assert!(records[0].changed_urls.is_empty());
    assert_eq!(records[3].changed_urls, vec!["https://a.example", "https://b.example"]);
}

#[test]
fn stores_can_be_read_without_an_engine() {
    let dir = tempdir().unwrap();
    let config = MonitorConfig::in_dir(dir.path());
    let sites = {
        let engine = open_engine(&config, 1);
        engine.register(["a.example"]).unwrap();
        engine.scan().unwrap();
        engine.sites().unwrap()
    };

    let state = JsonStateStore::new(&config.state_path, false);
    assert_eq!(state.load().unwrap(), sites);
}

#[test]
fn second_engine_is_locked_out() {
    let dir = tempdir().unwrap();
    let config = MonitorConfig::in_dir(dir.path());
    let _first = open_engine(&config, 1);

    let err = MonitorEngine::open(&config, Arc::new(GenerationFetcher { generation: 1 }))
        .unwrap_err();
    assert!(matches!(
        err,
        WatchError::Storage(StorageError::Locked { .. })
    ));
}

#[test]
fn engines_cannot_share_a_history_file() {
    let dir = tempdir().unwrap();
    let history_path = dir.path().join("shared_history.csv");
    let config_a = MonitorConfig {
        state_path: dir.path().join("a.json"),
        history_path: history_path.clone(),
        ..MonitorConfig::default()
    };
    let config_b = MonitorConfig {
        state_path: dir.path().join("b.json"),
        history_path,
        ..MonitorConfig::default()
    };
    let _first = open_engine(&config_a, 1);

    let err = MonitorEngine::open(&config_b, Arc::new(GenerationFetcher { generation: 1 }))
        .unwrap_err();
    assert!(matches!(
        err,
        WatchError::Storage(StorageError::Locked { .. })
    ));
}

#[test]
fn lock_is_released_on_drop() {
    let dir = tempdir().unwrap();
    let config = MonitorConfig::in_dir(dir.path());
    drop(open_stores(&config).unwrap());
    assert!(open_stores(&config).is_ok());
}

#[test]
fn corrupt_state_is_fatal_not_empty() {
    let dir = tempdir().unwrap();
    let config = MonitorConfig::in_dir(dir.path());
    fs::write(&config.state_path, "[1, 2, 3]").unwrap();

    let err = MonitorEngine::open(&config, Arc::new(GenerationFetcher { generation: 1 }))
        .unwrap_err();
    assert!(err.is_storage());
}
