use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use sitewatch::{FetchOutcome, Fetcher, MonitorEngine};

const SITES: usize = 256;

/// Serves a ~4 KiB page per URL; every eighth URL changes on each call.
struct SyntheticFetcher {
    generation: AtomicU64,
}

impl Fetcher for SyntheticFetcher {
    fn fetch(&self, url: &str) -> FetchOutcome {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let churn = if url.len() % 8 == 0 { generation } else { 0 };
        Ok(format!("<html><body>{url} {churn}</body></html>").repeat(64))
    }
}

fn make_engine(workers: usize) -> MonitorEngine {
    let engine = MonitorEngine::builder(Arc::new(SyntheticFetcher {
        generation: AtomicU64::new(0),
    }))
    .fetch_workers(workers)
    .build()
    .unwrap();

    let urls: Vec<String> = (0..SITES).map(|i| format!("bench-{i}.example")).collect();
    engine.register(&urls).unwrap();
    // Establish baseline digests so timed passes exercise change detection.
    engine.scan().unwrap();
    engine
}

fn bench_scan_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");
    group.throughput(Throughput::Elements(SITES as u64));

    for workers in [1usize, 4] {
        group.bench_function(format!("pass_{SITES}_sites_{workers}_workers"), |b| {
            b.iter_custom(|iters| {
                // Fresh engine per sample so history growth does not leak between samples.
                let engine = make_engine(workers);
                let start = Instant::now();
                for _ in 0..iters {
                    let _ = engine.scan().unwrap();
                }
                start.elapsed()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_scan_pass);
criterion_main!(benches);
