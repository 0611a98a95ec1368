//! DBSCAN benchmarks on synthetic ping sets.
//!
//! Run with: `cargo bench --bench clustering`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use heatcluster::synthetic::PingScenario;
use heatcluster::{dbscan, partition_by_age, summarize_clusters, Coordinate, DbscanConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Scenario with `hotspots` seeded random centers and `per_hotspot` pings each.
fn scenario(hotspots: usize, per_hotspot: usize, seed: u64) -> PingScenario {
    let mut rng = StdRng::seed_from_u64(seed);
    let centers = (0..hotspots)
        .map(|_| Coordinate::new(rng.gen_range(-60.0..60.0), rng.gen_range(-170.0..170.0)))
        .collect();

    PingScenario {
        centers,
        points_per_center: per_hotspot,
        spread_degrees: 0.5,
        background_points: hotspots * per_hotspot / 10,
        seed,
        ..PingScenario::default()
    }
}

fn bench_dbscan(c: &mut Criterion) {
    let mut group = c.benchmark_group("dbscan");
    let config = DbscanConfig::default();

    for &size in &[1_000usize, 10_000, 50_000] {
        let points = scenario(size / 100, 100, 42).generate();
        group.bench_with_input(BenchmarkId::from_parameter(size), &points, |b, points| {
            b.iter(|| dbscan(black_box(points), &config).unwrap())
        });
    }
    group.finish();
}

fn bench_dense_hotspot(c: &mut Criterion) {
    // Worst case for neighborhood expansion: everything within eps of everything
    let points = scenario(1, 5_000, 7).generate();
    let config = DbscanConfig::default();

    c.bench_function("dbscan_single_dense_hotspot_5000", |b| {
        b.iter(|| dbscan(black_box(&points), &config).unwrap())
    });
}

fn bench_partition_and_aggregate(c: &mut Criterion) {
    let points = scenario(100, 100, 11).generate();
    let config = DbscanConfig::default();

    c.bench_function("partition_cluster_aggregate_10000", |b| {
        b.iter(|| {
            let parts = partition_by_age(black_box(&points), 1_700_000_000, 7200);
            let clustering = dbscan(&parts.current, &config).unwrap();
            summarize_clusters(&parts.current, &clustering)
        })
    });
}

criterion_group!(
    benches,
    bench_dbscan,
    bench_dense_hotspot,
    bench_partition_and_aggregate
);
criterion_main!(benches);
