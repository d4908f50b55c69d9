use criterion::{BenchmarkId, Criterion, Throughput};
use nav_triangulator::Triangulator;

use crate::benchmark_utilities::{uniform_distribution, RANGE, SEED};

pub fn add_vertex_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("add vertex benchmark");

    for size in [1000, 10_000, 100_000] {
        let points = uniform_distribution(*SEED, RANGE)
            .take(size)
            .collect::<Vec<_>>();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("add_vertex", size), &points, |b, points| {
            b.iter(|| {
                let mut triangulator = Triangulator::new();
                for point in points {
                    triangulator.add_vertex(point.x, point.y, point.z, false, false);
                }
                triangulator
            })
        });
    }

    group.finish();
}
