//! ToMaTo clustering benchmarks.
//!
//! Density estimation and filtration construction happen once per dataset;
//! the measured loop covers cluster assignment and any escalation.
#![allow(missing_docs, reason = "Criterion macros generate undocumented items")]
#![allow(
    clippy::expect_used,
    reason = "benchmark setup is infallible for valid constants"
)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use topologyx_core::{ClusterGenerator, ClusterStructure, GaussianKde, TomatoClustering};

/// Seed used for all synthetic data generation in this benchmark.
const SEED: u64 = 42;

/// Dataset sizes to benchmark.
const POINT_COUNTS: &[usize] = &[200, 500, 1_000];

const N_NEIGHBORS: usize = 8;
const TAU: f64 = 0.01;

fn fit_predict(c: &mut Criterion) {
    let mut group = c.benchmark_group("tomato_fit_predict");
    group.sample_size(20);

    for &points in POINT_COUNTS {
        let generated = ClusterGenerator::new(ClusterStructure::Blobs, points, SEED)
            .generate()
            .expect("generation must succeed");
        let tomato =
            TomatoClustering::new(&generated.points, &GaussianKde::default(), N_NEIGHBORS)
                .expect("fitting must succeed");

        group.bench_with_input(BenchmarkId::from_parameter(points), &tomato, |b, tomato| {
            b.iter(|| tomato.fit_predict(black_box(Some(3)), TAU, N_NEIGHBORS));
        });
    }

    group.finish();
}

fn density(c: &mut Criterion) {
    let mut group = c.benchmark_group("gaussian_kde");
    group.sample_size(20);

    for &points in POINT_COUNTS {
        let generated = ClusterGenerator::new(ClusterStructure::Moons, points, SEED)
            .generate()
            .expect("generation must succeed");
        let estimator = GaussianKde::default();

        group.bench_with_input(
            BenchmarkId::from_parameter(points),
            &generated.points,
            |b, cloud| {
                b.iter(|| TomatoClustering::estimate_density(cloud, &estimator));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, fit_predict, density);
criterion_main!(benches);
