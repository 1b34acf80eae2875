//! Benchmarks for canonical certificate computation
//!
//! Run with: cargo bench -p forge-graph

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use forge_graph::{Canonicalizer, GraphBuilder, GraphRecord, RefinementCanonicalizer};
use rand::{Rng, SeedableRng};

fn random_graph(n: usize, p: f64, seed: u64) -> GraphRecord {
    let mut rng = rand::rngs::SmallRng::seed_from_u64(seed);
    let mut b = GraphBuilder::new(n);
    for i in 0..n {
        for j in (i + 1)..n {
            if rng.gen_bool(p) {
                b.edge(i, j).unwrap();
            }
        }
    }
    b.build()
}

fn complete_graph(n: usize) -> GraphRecord {
    let mut b = GraphBuilder::new(n);
    for i in 0..n {
        for j in (i + 1)..n {
            b.edge(i, j).unwrap();
        }
    }
    b.build()
}

/// Benchmark certificates of random graphs at catalogue sizes
fn bench_random_graphs(c: &mut Criterion) {
    let canon = RefinementCanonicalizer::new();
    let mut group = c.benchmark_group("certificate_random");

    for n in &[5usize, 7, 9, 12] {
        let graph = random_graph(*n, 0.5, 42);
        group.bench_with_input(BenchmarkId::new("gnp_0.5", n), &graph, |b, g| {
            b.iter(|| canon.certificate(black_box(g)));
        });
    }

    group.finish();
}

/// Benchmark the worst case: fully symmetric graphs
fn bench_complete_graphs(c: &mut Criterion) {
    let canon = RefinementCanonicalizer::new();
    let mut group = c.benchmark_group("certificate_complete");

    for n in &[4usize, 6, 7] {
        let graph = complete_graph(*n);
        group.bench_with_input(BenchmarkId::new("k_n", n), &graph, |b, g| {
            b.iter(|| canon.certificate(black_box(g)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_random_graphs, bench_complete_graphs);
criterion_main!(benches);
