//! Benchmarks comparing the scheduling strategies against the sequential
//! reference on the standard scenario sizes.

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

use sparselu::{factorize, matgen, verify, Strategy};

fn bench_factorize(c: &mut Criterion) {
    for (blocks, block_size) in [(16, 8), (32, 8)] {
        let initial = matgen::generate(blocks, block_size, matgen::DEFAULT_SEED)
            .expect("generation succeeds");
        let mut group = c.benchmark_group(format!("sparselu_{}x{}", blocks, block_size));

        group.bench_function("sequential", |b| {
            b.iter_batched(
                || initial.clone(),
                |mut grid| verify::reference_factorize(&mut grid).unwrap(),
                BatchSize::LargeInput,
            )
        });
        group.bench_function("barrier", |b| {
            b.iter_batched(
                || initial.clone(),
                |mut grid| factorize(&mut grid, Strategy::Barrier).unwrap(),
                BatchSize::LargeInput,
            )
        });
        group.bench_function("dependency", |b| {
            b.iter_batched(
                || initial.clone(),
                |mut grid| factorize(&mut grid, Strategy::Dependency).unwrap(),
                BatchSize::LargeInput,
            )
        });

        group.finish();
    }
}

fn bench_matgen(c: &mut Criterion) {
    c.bench_function("matgen_16x8", |b| {
        b.iter(|| matgen::generate(16, 8, matgen::DEFAULT_SEED).unwrap())
    });
}

criterion_group!(benches, bench_factorize, bench_matgen);
criterion_main!(benches);
