//! Benchmarks for the sequencer
//!
//! Run with: cargo bench --package chronoseq-core

use chronoseq_core::{Entry, MemoryPage, SearchQuery, Sequencer, SequencerConfig, TimeRange};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Samples from `series` producers with local jitter of up to `jitter` positions
fn jittered_samples(count: usize, series: u64, jitter: usize) -> Vec<Entry> {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut samples: Vec<Entry> = (0..count as u64)
        .map(|i| Entry::value(i / series, i % series, i as f64))
        .collect();
    for chunk in samples.chunks_mut(jitter.max(1)) {
        chunk.shuffle(&mut rng);
    }
    samples
}

fn loaded_sequencer(samples: &[Entry]) -> Sequencer {
    let seq = Sequencer::new(SequencerConfig::with_window(u64::MAX / 2)).unwrap();
    for entry in samples {
        seq.add(*entry).unwrap();
    }
    seq
}

fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("add");

    for jitter in [1usize, 16, 256] {
        let samples = jittered_samples(10_000, 8, jitter);
        group.throughput(Throughput::Elements(samples.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(jitter), &samples, |b, samples| {
            b.iter(|| loaded_sequencer(black_box(samples)))
        });
    }

    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let samples = jittered_samples(10_000, 8, 64);
    let mut group = c.benchmark_group("merge");
    group.throughput(Throughput::Elements(samples.len() as u64));

    group.bench_function("merge_and_compress_10k", |b| {
        b.iter_with_setup(
            || loaded_sequencer(&samples),
            |seq| {
                let mut page = MemoryPage::unbounded();
                seq.close(&mut page).unwrap();
                page
            },
        )
    });

    group.bench_function("compact_10k", |b| {
        b.iter_with_setup(
            || {
                let seq = loaded_sequencer(&samples);
                seq.reset();
                seq
            },
            |seq| {
                let mut page = MemoryPage::unbounded();
                seq.compact(&mut page).unwrap();
                page
            },
        )
    });

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let samples = jittered_samples(10_000, 8, 64);
    let seq = loaded_sequencer(&samples);
    let query = SearchQuery::new(TimeRange::new(200, 800)).with_series([3]);

    c.bench_function("search_range_one_series", |b| {
        b.iter(|| {
            let (_, sequence) = seq.get_window();
            let mut results = Vec::new();
            seq.search(&mut results, black_box(&query), sequence).unwrap();
            results
        })
    });
}

criterion_group!(benches, bench_add, bench_merge, bench_search);
criterion_main!(benches);
