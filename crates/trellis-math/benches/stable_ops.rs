//! Criterion benchmarks for `trellis-math`.
//!
//! Focus on the log-domain kernels that run inside the inference loops.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use trellis_math::{careful_log, log1m_exp, mutual_information, neg_log};

fn bench_log_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("stable");

    group.bench_function("careful_log", |b| {
        b.iter(|| black_box(careful_log(black_box(0.37_f64))));
    });

    group.bench_function("neg_log", |b| {
        b.iter(|| black_box(neg_log(black_box(0.37_f64))));
    });

    // Both sides of the -ln 2 split.
    for x in [-0.05_f64, -3.0] {
        group.bench_with_input(BenchmarkId::new("log1m_exp", x), &x, |b, &x| {
            b.iter(|| black_box(log1m_exp(black_box(x))));
        });
    }

    group.finish();
}

fn bench_mutual_information(c: &mut Criterion) {
    let mut group = c.benchmark_group("info");

    for n in [3usize, 16, 64] {
        let cell = 1.0 / (n * n) as f64;
        let joint = vec![vec![cell; n]; n];
        group.bench_with_input(BenchmarkId::new("mutual_information", n), &joint, |b, j| {
            b.iter(|| black_box(mutual_information(black_box(j))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_log_kernels, bench_mutual_information);
criterion_main!(benches);
