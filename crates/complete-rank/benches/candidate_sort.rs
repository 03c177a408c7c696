//! Benchmarks the one hot path in the ranking stage: sorting a candidate
//! list under the strict weak order from spec.md §4.3. Libclang's own
//! completion results arrive unsorted, so this is real per-request work,
//! not a synthetic exercise.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use complete_model::{Candidate, CursorKind};
use complete_rank::sort_candidates;

fn candidates(n: usize) -> Vec<Candidate> {
    (0..n)
        .map(|i| {
            let mut c = Candidate::new(
                format!("identifier_{}", (n - i) % 37),
                format!("identifier_{i}(int, int)"),
                (i % 11) as i32,
                CursorKind::FunctionDecl,
            );
            c.distance = ((i * 7) % 503) as i32;
            c
        })
        .collect()
}

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort_candidates");
    for size in [8usize, 64, 512] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let unsorted = candidates(size);
            b.iter(|| {
                let mut batch = unsorted.clone();
                sort_candidates(&mut batch);
                black_box(batch);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_sort);
criterion_main!(benches);
