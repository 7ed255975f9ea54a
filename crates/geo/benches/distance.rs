//! Benchmarks for geo crate distance calculations.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use foodshare_geo::{haversine_distance, within_radius, Coordinate};

fn create_test_points(count: usize) -> Vec<Coordinate> {
    (0..count)
        .map(|i| {
            // Generate points in a grid around Athens
            let lat = 37.0 + (i as f64 * 0.01) % 2.0;
            let lng = 23.0 + (i as f64 * 0.01) % 2.0;
            Coordinate::new(lat, lng)
        })
        .collect()
}

fn bench_single_distance(c: &mut Criterion) {
    let berlin = Coordinate::new(52.5200, 13.4050);
    let paris = Coordinate::new(48.8566, 2.3522);

    c.bench_function("haversine_single", |b| {
        b.iter(|| haversine_distance(black_box(&berlin), black_box(&paris)))
    });
}

fn bench_radius_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("radius_filter");
    let center = Coordinate::new(37.9838, 23.7275);

    for size in [10, 100, 1000, 10000].iter() {
        let points = create_test_points(*size);

        group.bench_with_input(BenchmarkId::new("within_5km", size), size, |b, _| {
            b.iter(|| {
                points
                    .iter()
                    .filter(|p| within_radius(black_box(&center), p, 5.0).unwrap_or(false))
                    .count()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single_distance, bench_radius_filter);
criterion_main!(benches);
