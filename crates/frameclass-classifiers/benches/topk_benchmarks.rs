//! Top-K ranking benchmarks
//!
//! Compares the full stable sort used by tensor-graph classifiers with the
//! single-scan bounded buffer used by traced-module classifiers, over label
//! counts typical of small and ImageNet-sized models.
//!
//! Run with: cargo bench -p frameclass-classifiers

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use frameclass_classifiers::topk::{argmax, top_k_bounded, top_k_stable_sort, TOP_K};

/// Deterministic pseudo-random scores
fn scores(len: usize) -> Vec<f32> {
    let mut state = 0x2545_f491_u32;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state % 10_000) as f32 / 10_000.0
        })
        .collect()
}

fn benchmark_top_k(c: &mut Criterion) {
    let mut group = c.benchmark_group("Top_K");
    group.significance_level(0.05);
    group.sample_size(100);

    for len in [10usize, 100, 1000] {
        let input = scores(len);
        group.bench_with_input(BenchmarkId::new("stable_sort", len), &input, |b, input| {
            b.iter(|| top_k_stable_sort(black_box(input), TOP_K))
        });
        group.bench_with_input(BenchmarkId::new("bounded", len), &input, |b, input| {
            b.iter(|| top_k_bounded(black_box(input), TOP_K))
        });
    }

    group.finish();
}

fn benchmark_argmax(c: &mut Criterion) {
    let mut group = c.benchmark_group("Argmax");

    for len in [10usize, 1000] {
        let input = scores(len);
        group.bench_with_input(BenchmarkId::new("argmax", len), &input, |b, input| {
            b.iter(|| argmax(black_box(input)))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_top_k, benchmark_argmax);
criterion_main!(benches);
