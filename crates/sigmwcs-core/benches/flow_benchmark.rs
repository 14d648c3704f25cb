// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::{Rng, SeedableRng, rngs::StdRng};
use sigmwcs_core::algorithm::flow::EdmondsKarp;
use std::hint::black_box;

/// Builds a vertex-split grid network like the ones the separator creates:
/// every cell becomes an (in, out) pair and neighbouring cells are joined in
/// both directions.
fn split_grid(side: usize, seed: u64) -> EdmondsKarp<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let cells = side * side;
    let mut net = EdmondsKarp::new(2 * cells);
    let id = |r: usize, c: usize| r * side + c;

    for cell in 0..cells {
        net.add_edge(2 * cell, 2 * cell + 1);
        net.set_capacity(2 * cell, 2 * cell + 1, rng.random_range(0.0..1.0));
    }
    for r in 0..side {
        for c in 0..side {
            let mut link = |a: usize, b: usize, cap: f64| {
                net.add_edge(2 * a + 1, 2 * b);
                net.add_edge(2 * b + 1, 2 * a);
                net.set_capacity(2 * a + 1, 2 * b, cap);
                net.set_capacity(2 * b + 1, 2 * a, cap);
            };
            if c + 1 < side {
                link(id(r, c), id(r, c + 1), rng.random_range(0.0..1.0));
            }
            if r + 1 < side {
                link(id(r, c), id(r + 1, c), rng.random_range(0.0..1.0));
            }
        }
    }
    net
}

fn bench_min_cut(c: &mut Criterion) {
    let mut group = c.benchmark_group("edmonds_karp_min_cut");

    for side in [8usize, 16, 32] {
        let mut net = split_grid(side, 17);
        let source = 1;
        let sink = 2 * (side * side - 1);

        group.throughput(Throughput::Elements((side * side) as u64));
        group.bench_with_input(BenchmarkId::new("exact", side), &side, |b, _| {
            b.iter(|| {
                black_box(net.compute_min_cut(black_box(source), black_box(sink), f64::INFINITY))
            })
        });
        group.bench_with_input(BenchmarkId::new("threshold", side), &side, |b, _| {
            b.iter(|| black_box(net.compute_min_cut(black_box(source), black_box(sink), 0.5)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_min_cut);
criterion_main!(benches);
