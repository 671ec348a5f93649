//! Criterion benchmarks for the forward-backward and Viterbi hot paths.
//!
//! Models are synthetic banded chains so runs are deterministic and need no
//! model files on disk.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use trellis_core::{Distribution, ForwardBackward, SequenceGenerator, TabularModel, Viterbi};

/// `n` states, each moving to itself or its two neighbours, emitting one of
/// `n` symbols with most mass on its own index.
fn banded_model(n: usize) -> TabularModel<usize, usize> {
    let states: Vec<usize> = (0..n).collect();
    let mut model = TabularModel::new(states.clone(), states.clone(), Distribution::uniform(&states));
    for &s in &states {
        let transition: Distribution<usize> = [
            ((s + n - 1) % n, 0.1),
            (s, 0.8),
            ((s + 1) % n, 0.1),
        ]
        .into_iter()
        .collect();
        let mut emission: Distribution<usize> = states.iter().map(|&o| (o, 0.1 / n as f64)).collect();
        emission.add(s, 0.9);
        emission.renormalize();
        model = model.with_transition(s, transition).with_emission(s, emission);
    }
    model
}

fn bench_inference(c: &mut Criterion) {
    let mut group = c.benchmark_group("inference");

    for (states, steps) in [(4usize, 100usize), (16, 100), (16, 1000), (64, 200)] {
        let model = banded_model(states);
        let observations = SequenceGenerator::new(&model)
            .generate(steps, 42, 0.1)
            .expect("banded model should sample")
            .observations;
        let id = format!("{states}x{steps}");

        group.bench_with_input(
            BenchmarkId::new("forward_backward", &id),
            &observations,
            |b, obs| {
                let engine = ForwardBackward::new(&model);
                b.iter(|| black_box(engine.run(black_box(obs)).expect("marginals")));
            },
        );

        group.bench_with_input(BenchmarkId::new("viterbi", &id), &observations, |b, obs| {
            let decoder = Viterbi::new(&model);
            b.iter(|| black_box(decoder.decode(black_box(obs)).expect("path")));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_inference);
criterion_main!(benches);
