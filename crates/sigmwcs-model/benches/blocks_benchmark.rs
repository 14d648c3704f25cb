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
use sigmwcs_model::blocks::BlockCutTree;
use sigmwcs_model::graph::Graph;
use sigmwcs_model::index::{EdgeIndex, NodeIndex};
use std::hint::black_box;

/// A chain of small random cycles joined at shared nodes, which yields many
/// blocks and cut vertices.
fn cactus_chain(num_nodes: usize, seed: u64) -> Graph {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut g = Graph::new();
    for i in 0..num_nodes {
        g.add_node(NodeIndex::new(i));
    }
    let mut edge = 0usize;
    let mut add = |g: &mut Graph, u: usize, v: usize| {
        g.add_edge(EdgeIndex::new(edge), NodeIndex::new(u), NodeIndex::new(v));
        edge += 1;
    };
    let mut start = 0usize;
    while start + 1 < num_nodes {
        let len = rng.random_range(2..=6).min(num_nodes - 1 - start);
        for i in start..start + len {
            add(&mut g, i, i + 1);
        }
        if len >= 2 {
            add(&mut g, start + len, start);
        }
        start += len;
    }
    g
}

fn bench_block_cut_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_cut_tree");

    for size in [1_000usize, 10_000, 100_000] {
        let graph = cactus_chain(size, 42);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &graph, |b, g| {
            b.iter(|| black_box(BlockCutTree::new(black_box(g))))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_block_cut_tree);
criterion_main!(benches);
