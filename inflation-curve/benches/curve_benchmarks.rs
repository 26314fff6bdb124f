//! Benchmarks for the per-epoch inflation pipeline.
//!
//! Measures performance of:
//! - Curve evaluation
//! - Waterfall split with and without locked supply
//! - Moving-average smoothing
//! - Full ratio → amounts pipeline

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use um_inflation_curve::{inflation_rate, smooth, waterfall_split, Capacity, CurveParams};

/// Benchmark the inflation curve across utilization levels.
fn bench_inflation_rate(c: &mut Criterion) {
    let params = CurveParams::default();
    let mut group = c.benchmark_group("inflation_rate");

    for utilization in [0.02f32, 0.3, 0.9] {
        group.bench_with_input(
            BenchmarkId::new("u", utilization),
            &utilization,
            |b, &u| b.iter(|| black_box(inflation_rate(black_box(u), &params))),
        );
    }

    group.finish();
}

/// Benchmark the waterfall split.
fn bench_waterfall(c: &mut Criterion) {
    let params = CurveParams::default();
    let inflation = inflation_rate(0.3, &params);
    let mut group = c.benchmark_group("waterfall");

    for locked in [0.0f32, 0.4] {
        group.bench_with_input(BenchmarkId::new("locked", locked), &locked, |b, &l| {
            b.iter(|| black_box(waterfall_split(inflation, 0.3, black_box(l), &params)))
        });
    }

    group.finish();
}

/// Benchmark one smoothing step.
fn bench_smooth(c: &mut Criterion) {
    c.bench_function("smooth_steady_state", |b| {
        b.iter(|| black_box(smooth(black_box(0.4), 0.1, 0.2, 9, 9, 5)))
    });
}

/// Benchmark the complete per-epoch computation.
fn bench_epoch_pipeline(c: &mut Criterion) {
    let params = CurveParams::default();
    let capacity = Capacity::default();
    let supply = 10_000_000_000_000u64;

    c.bench_function("epoch_pipeline", |b| {
        b.iter(|| {
            let processing = capacity.processing_ratio(black_box(1_728_000_000));
            let bandwidth = capacity.bandwidth_ratio(black_box(1_132_462_080));
            let p = smooth(0.4, 0.1, processing, 9, 9, 5);
            let w = smooth(0.4, 0.1, bandwidth, 9, 9, 5);
            let u = p.ema + w.ema;
            let inflation = inflation_rate(u, &params);
            black_box(
                waterfall_split(inflation, u, 0.2, &params)
                    .daily()
                    .amounts(supply),
            )
        })
    });
}

criterion_group!(
    benches,
    bench_inflation_rate,
    bench_waterfall,
    bench_smooth,
    bench_epoch_pipeline,
);

criterion_main!(benches);
