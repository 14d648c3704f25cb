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

//! Shared fixtures for the end-to-end tests: a seeded instance generator
//! and an exhaustive reference solver.

use rand::Rng;
use rand::rngs::StdRng;
use sigmwcs_model::graph::Graph;
use sigmwcs_model::index::{EdgeIndex, NodeIndex, SignalIndex};
use sigmwcs_model::signals::Signals;
use sigmwcs_model::unit::Unit;

pub fn n(i: usize) -> NodeIndex {
    NodeIndex::new(i)
}

pub fn e(i: usize) -> EdgeIndex {
    EdgeIndex::new(i)
}

/// The best score over all connected selections, the empty one included.
///
/// Enumerates every subset of units, so keep instances below ~16 units.
pub fn brute_force(graph: &Graph, signals: &Signals) -> f64 {
    let units = graph.units();
    assert!(
        units.len() <= 20,
        "called `brute_force` with {} units",
        units.len()
    );
    let mut best = 0.0_f64;
    let mut chosen = Vec::with_capacity(units.len());
    for mask in 1_u32..(1 << units.len()) {
        chosen.clear();
        chosen.extend(
            units
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, &u)| u),
        );
        if !graph.is_connected_selection(&chosen) {
            continue;
        }
        best = best.max(signals.score(chosen.iter().copied()));
    }
    best
}

/// A random connected-ish multigraph with integer weights. Roughly one unit
/// in four joins an existing signal instead of getting its own.
pub fn random_instance(rng: &mut StdRng, nodes: usize, extra_edges: usize) -> (Graph, Signals) {
    let mut graph = Graph::new();
    let mut signals = Signals::new();
    let mut shared: Vec<SignalIndex> = Vec::new();

    let mut assign = |signals: &mut Signals, unit: Unit, weight: f64, rng: &mut StdRng| {
        if !shared.is_empty() && rng.random_bool(0.25) {
            let signal = shared[rng.random_range(0..shared.len())];
            signals.attach(unit, signal);
        } else {
            shared.push(signals.add_unit(unit, weight));
        }
    };

    for i in 0..nodes {
        graph.add_node(n(i));
        let weight = rng.random_range(-5_i32..=5) as f64;
        assign(&mut signals, Unit::Node(n(i)), weight, rng);
    }

    let mut next_edge = 0;
    let mut add_edge = |graph: &mut Graph, u: usize, v: usize| {
        graph.add_edge(e(next_edge), n(u), n(v));
        next_edge += 1;
        e(next_edge - 1)
    };

    for v in 1..nodes {
        // Occasionally leave a vertex detached to get several components.
        if rng.random_bool(0.1) {
            continue;
        }
        let u = rng.random_range(0..v);
        let edge = add_edge(&mut graph, u, v);
        let weight = rng.random_range(-3_i32..=1) as f64;
        assign(&mut signals, Unit::Edge(edge), weight, rng);
    }
    for _ in 0..extra_edges {
        if nodes < 2 {
            break;
        }
        let u = rng.random_range(0..nodes);
        let v = rng.random_range(0..nodes);
        if u == v {
            continue;
        }
        let edge = add_edge(&mut graph, u, v);
        let weight = rng.random_range(-3_i32..=1) as f64;
        assign(&mut signals, Unit::Edge(edge), weight, rng);
    }

    (graph, signals)
}
