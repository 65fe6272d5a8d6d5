//! Fetch-and-hash fan-out for a scan pass.
//!
//! Fetching and hashing one URL is independent of every other URL, so a
//! pass may spread that work over a small pool of scoped threads. Results
//! come back indexed by position and are returned in the input order; all
//! mutation of site records stays on the calling thread.

use std::thread;

use crossbeam_channel::bounded;

use crate::digest::{ContentDigest, ContentHasher};
use crate::error::{WatchError, WatchResult};
use crate::fetch::{FetchFailure, Fetcher};

/// Digest of the fetched page, or why there is none.
pub(crate) type Probe = Result<ContentDigest, FetchFailure>;

fn probe_one(url: &str, fetcher: &dyn Fetcher, hasher: &dyn ContentHasher) -> Probe {
    fetcher.fetch(url).map(|body| hasher.digest(&body))
}

/// Fetches and hashes every URL, returning probes in `urls` order.
///
/// With `workers <= 1` the URLs are processed one after another on the
/// calling thread.
pub(crate) fn probe_all(
    urls: &[String],
    fetcher: &dyn Fetcher,
    hasher: &dyn ContentHasher,
    workers: usize,
) -> WatchResult<Vec<Probe>> {
    if workers <= 1 || urls.len() <= 1 {
        return Ok(urls.iter().map(|url| probe_one(url, fetcher, hasher)).collect());
    }

    let workers = workers.min(urls.len());
    let (job_tx, job_rx) = bounded::<usize>(urls.len());
    let (result_tx, result_rx) = bounded::<(usize, Probe)>(urls.len());

    for idx in 0..urls.len() {
        job_tx
            .send(idx)
            .map_err(|_| WatchError::internal("fetch job queue closed"))?;
    }
    drop(job_tx);

    thread::scope(|scope| -> WatchResult<()> {
        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let jobs = job_rx.clone();
            let results = result_tx.clone();
            let handle = thread::Builder::new()
                .name(format!("sitewatch-fetch-{worker}"))
                .spawn_scoped(scope, move || {
                    for idx in jobs.iter() {
                        let probe = probe_one(&urls[idx], fetcher, hasher);
                        if results.send((idx, probe)).is_err() {
                            break;
                        }
                    }
                })
                .map_err(|e| WatchError::internal(format!("failed to spawn fetch worker: {e}")))?;
            handles.push(handle);
        }

        let mut panicked = false;
        for handle in handles {
            panicked |= handle.join().is_err();
        }
        if panicked {
            return Err(WatchError::internal("fetch worker panicked"));
        }
        Ok(())
    })?;
    drop(result_tx);

    let mut slots: Vec<Option<Probe>> = vec![None; urls.len()];
    for (idx, probe) in result_rx.try_iter() {
        slots[idx] = Some(probe);
    }
    slots
        .into_iter()
        .zip(urls)
        .map(|(slot, url)| {
            slot.ok_or_else(|| WatchError::internal(format!("no fetch result for {url}")))
        })
        .collect()
}
