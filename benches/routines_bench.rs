//! Routine benchmarks for strided-numeric
//!
//! Compares the portable backend with the faer-backed native backend for
//! products and factorizations, and times the view-level reductions and sort.
//!
//! Run with: cargo bench --bench routines_bench

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::cell::RefCell;
use std::time::Duration;
use strided_numeric::{portable_backend, sort_indexed, Backend, StridedArray, Transpose};

fn random_matrix(rng: &mut StdRng, rows: usize, cols: usize) -> StridedArray {
    let data: Vec<f64> = (0..rows * cols).map(|_| rng.sample(StandardNormal)).collect();
    StridedArray::from_vec(&[rows, cols], data).unwrap()
}

fn backends() -> Vec<&'static dyn Backend> {
    #[allow(unused_mut)]
    let mut out: Vec<&'static dyn Backend> = vec![portable_backend()];
    #[cfg(feature = "native")]
    out.push(strided_numeric::native_backend());
    out
}

/// Portable vs native C = A * B
fn bench_gemm(c: &mut Criterion) {
    let mut group = c.benchmark_group("gemm");
    group.sample_size(20);
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));

    for size in [16, 64, 128] {
        group.throughput(Throughput::Elements((size * size * size) as u64));

        let mut rng = StdRng::seed_from_u64(42);
        let a = random_matrix(&mut rng, size, size);
        let b = random_matrix(&mut rng, size, size);
        let out = StridedArray::zeros(strided_numeric::ElementKind::Double, &[size, size]).unwrap();

        for be in backends() {
            group.bench_with_input(BenchmarkId::new(be.name(), size), &size, |bench, _| {
                bench.iter(|| {
                    be.routines()
                        .gemm(Transpose::Keep, Transpose::Keep, 1.0, &a, &b, 0.0, &out)
                        .unwrap()
                })
            });
        }

        // transposed view operand, no copy on the caller side
        let at = a.transpose();
        for be in backends() {
            let id = format!("{}_transposed", be.name());
            group.bench_with_input(BenchmarkId::new(id, size), &size, |bench, _| {
                bench.iter(|| {
                    be.routines()
                        .gemm(Transpose::Keep, Transpose::Keep, 1.0, &at, &b, 0.0, &out)
                        .unwrap()
                })
            });
        }
    }
    group.finish();
}

/// Per-axis sums over contiguous and transposed layouts
fn bench_sum_axis(c: &mut Criterion) {
    let mut group = c.benchmark_group("sum_axis");
    group.sample_size(20);
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));

    for size in [100, 500, 1000] {
        group.throughput(Throughput::Elements((size * size) as u64));

        let mut rng = StdRng::seed_from_u64(42);
        let a = random_matrix(&mut rng, size, size);
        let routines = portable_backend().routines();

        for axis in [0, 1] {
            group.bench_with_input(
                BenchmarkId::new(format!("axis{axis}"), size),
                &size,
                |bench, _| bench.iter(|| routines.sum_axis(&a, axis).unwrap()),
            );
        }
    }
    group.finish();
}

/// Index quicksort driving an external buffer
fn bench_quick_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("quick_sort");
    group.sample_size(20);
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));

    for size in [1000, 10000, 100000] {
        group.throughput(Throughput::Elements(size as u64));

        let mut rng = StdRng::seed_from_u64(42);
        let data: Vec<f64> = (0..size).map(|_| rng.sample(StandardNormal)).collect();

        group.bench_with_input(BenchmarkId::new("sort_indexed", size), &size, |bench, _| {
            bench.iter(|| {
                let buf = RefCell::new(data.clone());
                sort_indexed(
                    size,
                    |i, j| buf.borrow()[i].total_cmp(&buf.borrow()[j]),
                    |i, j| buf.borrow_mut().swap(i, j),
                );
                buf
            })
        });

        group.bench_with_input(BenchmarkId::new("std_sort", size), &size, |bench, _| {
            bench.iter(|| {
                let mut buf = data.clone();
                buf.sort_by(f64::total_cmp);
                buf
            })
        });
    }
    group.finish();
}

/// Portable Jacobi SVD vs faer SVD
fn bench_svd(c: &mut Criterion) {
    let mut group = c.benchmark_group("svd");
    group.sample_size(10);
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));

    for size in [8, 32, 64] {
        let mut rng = StdRng::seed_from_u64(42);
        let a = random_matrix(&mut rng, size, size);

        for be in backends() {
            group.bench_with_input(BenchmarkId::new(be.name(), size), &size, |bench, _| {
                bench.iter(|| be.linalg().gesvd(&a).unwrap())
            });
        }
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_gemm,
    bench_sum_axis,
    bench_quick_sort,
    bench_svd
);
criterion_main!(benches);
