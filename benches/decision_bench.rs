//! Benchmarks for the decision path.
//!
//! Benchmarks cover:
//! - Rate aggregation over growing pools
//! - The hysteresis decision
//! - A full decision cycle against the simulated pool

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

use corescale::config::Tunables;
use corescale::core::policy::{decide, summarize, threshold_rate, PolicyLimits, UnitSample};
use corescale::core::Sampler;
use corescale::infra::SimulatedPool;

// ============================================================================
// Policy
// ============================================================================

fn samples(count: u32) -> Vec<UnitSample> {
    (1..count)
        .map(|unit| UnitSample {
            unit,
            rate: u64::from(unit * 37 % 1_000) * 1_000,
        })
        .collect()
}

fn bench_summarize(c: &mut Criterion) {
    let mut group = c.benchmark_group("summarize");
    for count in [2_u32, 8, 64, 256] {
        let input = samples(count);
        group.throughput(Throughput::Elements(u64::from(count)));
        group.bench_with_input(BenchmarkId::from_parameter(count), &input, |b, input| {
            b.iter(|| summarize(black_box(1_500_000), black_box(input)));
        });
    }
    group.finish();
}

fn bench_decide(c: &mut Criterion) {
    let limits = PolicyLimits {
        up_rate: threshold_rate(60, 2_000_000),
        down_rate: threshold_rate(40, 2_000_000),
        max_active: 8,
        min_active: 2,
        cycles_up: 2,
        cycles_down: 2,
    };
    let summary = summarize(1_500_000, &samples(8));
    c.bench_function("decide", |b| {
        b.iter(|| decide(black_box(&summary), black_box(4), black_box(2), &limits));
    });
}

// ============================================================================
// Full cycle
// ============================================================================

fn bench_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("cycle");
    for capacity in [4_u32, 16, 64] {
        let pool = SimulatedPool::new(capacity, 1_000);
        pool.set_all_rates(500);
        let tunables = Tunables::with_defaults(capacity);
        let mut sampler = Sampler::new();
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, _| {
            b.iter(|| black_box(sampler.run_cycle(&pool, &pool, &tunables)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_summarize, bench_decide, bench_cycle);
criterion_main!(benches);
