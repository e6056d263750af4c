//! Throughput of the elementwise kernels and of single growth steps.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use nnets::grow::{exhaustive, SearchContext, SearchSettings, StrategySpec, Sweep};
use nnets::{Kernel, Network, Op, TrainingConfig};

fn ramp(n: usize, scale: f32) -> Vec<f32> {
    (0..n).map(|i| (i as f32 * scale).sin()).collect()
}

/// Scalar loop against the detected SIMD kernel over column-sized buffers.
fn bench_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("kernels");
    for &n in &[64usize, 1024, 16384] {
        let a = ramp(n, 0.37);
        let b = ramp(n, 0.11);
        let mut dst = vec![0.0f32; n];
        for kernel in [Kernel::Scalar, Kernel::detect()] {
            group.bench_with_input(BenchmarkId::new(kernel.to_string(), n), &n, |bench, _| {
                bench.iter(|| {
                    for op in Op::ALL {
                        op.apply(kernel, black_box(&mut dst), black_box(&a), black_box(&b));
                    }
                })
            });
        }
    }
    group.finish();
}

/// Network over the default configuration with its images loaded.
fn fixture() -> (Network, Vec<f32>) {
    let data = TrainingConfig::default().build().unwrap();
    let mut net = Network::new(data.images.receptors(), data.classes);
    net.load_images(&data.images);
    let target = data.images.target(1);
    (net, target)
}

fn bench_growth(c: &mut Criterion) {
    let (net, target) = fixture();
    let mut group = c.benchmark_group("growth_step");
    group.sample_size(20);

    for parallel in [false, true] {
        let label = if parallel { "parallel" } else { "serial" };
        group.bench_function(BenchmarkId::new("exhaustive_full", label), |b| {
            b.iter_batched(
                || net.clone(),
                |mut n| exhaustive(&mut n, &target, Sweep::Full, parallel, &SearchSettings::default()),
                criterion::BatchSize::LargeInput,
            )
        });
    }

    for name in ["triplet", "triplet_parallel"] {
        let spec = StrategySpec::lookup(name).unwrap();
        group.bench_function(name, |b| {
            b.iter_batched(
                || (net.clone(), SearchContext::new(SearchSettings::default())),
                |(mut n, mut ctx)| spec.grow(&mut n, &target, &mut ctx),
                criterion::BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_kernels, bench_growth);
criterion_main!(benches);
