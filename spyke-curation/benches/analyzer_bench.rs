//! Criterion benchmarks for the correlation analyzer.
//!
//! - windowed correlations, 10K spikes
//! - identify on a unimodal channel, 5K spikes
//! - identify on an MUA channel, 8.9K spikes (one split level)

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use spyke_curation::analyzer::correlation::windowed_correlations;
use spyke_curation::{identify, AnalyzerParams};
use test_fixtures::synthetic::{self, PEAK};

const BIN: f64 = 0.05;

fn params() -> AnalyzerParams {
    AnalyzerParams {
        bin_size: BIN,
        distribution_threshold: 0.001,
        recursive: true,
    }
}

fn bench_correlations(c: &mut Criterion) {
    let channel = synthetic::from_histogram(&[(30, 2000), (35, 4000), (39, 4000)], BIN, 1.0);
    let template = synthetic::template();
    c.bench_function("windowed_correlations_10k", |b| {
        b.iter(|| windowed_correlations(black_box(&channel.snippets), &template, PEAK))
    });
}

fn bench_identify(c: &mut Criterion) {
    let template = synthetic::template();
    let unimodal = synthetic::from_histogram(&synthetic::unimodal_counts(), BIN, 1.0);
    c.bench_function("identify_unimodal_5k", |b| {
        b.iter(|| identify(0, black_box(&unimodal.snippets), Some(&template), PEAK, &params()))
    });

    let mua = synthetic::from_histogram(&synthetic::bimodal_counts(true), BIN, 1.0);
    c.bench_function("identify_mua_8k", |b| {
        b.iter(|| identify(0, black_box(&mua.snippets), None, PEAK, &params()))
    });
}

criterion_group!(benches, bench_correlations, bench_identify);
criterion_main!(benches);
