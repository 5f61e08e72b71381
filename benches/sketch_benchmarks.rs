use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rel_quantile_sketch::Sketch;

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("sketch_update");

    for &epsilon in &[0.1, 0.01, 0.001] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::new("simple", epsilon),
            &epsilon,
            |b, &epsilon| {
                let mut sketch = Sketch::with_seed(epsilon, 0.01, 0.0, vec![], false, 1).unwrap();
                let mut counter = 0i64;
                b.iter(|| {
                    counter += 1;
                    sketch.update(black_box(counter));
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("improved", epsilon),
            &epsilon,
            |b, &epsilon| {
                let mut sketch = Sketch::with_seed(epsilon, 0.01, 0.0, vec![], true, 1).unwrap();
                let mut counter = 0i64;
                b.iter(|| {
                    counter += 1;
                    sketch.update(black_box(counter));
                });
            },
        );
    }
    group.finish();
}

fn bench_quantile(c: &mut Criterion) {
    let mut group = c.benchmark_group("sketch_quantile");

    for n in [1_000i64, 100_000, 1_000_000] {
        let mut sketch = Sketch::with_seed(0.01, 0.01, 0.0, vec![], false, 1).unwrap();
        for i in 1..=n {
            sketch.update(i);
        }

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("p50", n), &sketch, |b, sketch| {
            b.iter(|| sketch.quantile(black_box(0.5)));
        });
        group.bench_with_input(BenchmarkId::new("p99", n), &sketch, |b, sketch| {
            b.iter(|| sketch.quantile(black_box(0.99)));
        });
    }
    group.finish();
}

fn bench_important_quantiles(c: &mut Criterion) {
    let mut group = c.benchmark_group("sketch_update_with_important_quantiles");

    for n in [100_000i64] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("boosted_p99", n), &n, |b, &n| {
            b.iter(|| {
                let mut sketch =
                    Sketch::with_seed(0.02, 0.02, 1.0, vec![0.99], false, 1).unwrap();
                for i in 1..=n {
                    sketch.update(black_box(i));
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_update, bench_quantile, bench_important_quantiles);
criterion_main!(benches);
