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

//! # Edmonds–Karp Max-Flow / Min-Cut
//!
//! A reusable residual network over dense integer node ids. Arcs are added
//! once and their capacities can be rewritten between computations, which is
//! exactly what a cutting-plane separator needs: the topology of the network
//! is fixed per component, while the capacities follow the LP values of the
//! current relaxation.
//!
//! ## Threshold early exit
//!
//! `compute_min_cut(s, t, threshold)` augments along shortest residual paths
//! (BFS) and stops as soon as the accumulated flow reaches `threshold`. In
//! that case no cut of capacity below `threshold` exists and `None` is
//! returned. Otherwise the search runs until no augmenting path remains and
//! the arcs leaving the source side of the residual graph are returned; their
//! total capacity equals the maximum flow.
//!
//! ## Arc model
//!
//! Arcs live in pairs: arc `2k` is a declared arc and `2k + 1` is its residual
//! twin (or the other declared direction when both `(i, j)` and `(j, i)` are
//! added). Only declared arcs are ever reported as cut arcs.
//!
//! ## Usage
//!
//! ```rust
//! use sigmwcs_core::algorithm::flow::EdmondsKarp;
//!
//! let mut network = EdmondsKarp::<f64>::new(3);
//! network.add_edge(0, 1);
//! network.add_edge(1, 2);
//! network.set_capacity(0, 1, 2.0);
//! network.set_capacity(1, 2, 0.5);
//!
//! let cut = network.compute_min_cut(0, 2, 1.0).expect("flow stays below 1.0");
//! assert_eq!(cut, vec![(1, 2)]);
//! assert!(network.compute_min_cut(0, 2, 0.25).is_none());
//! ```

use fixedbitset::FixedBitSet;
use num_traits::Float;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

/// Sentinel for "no arc" in the BFS parent table.
const NO_ARC: usize = usize::MAX;

/// An incremental max-flow network solved with the Edmonds–Karp algorithm.
#[derive(Debug, Clone)]
pub struct EdmondsKarp<T> {
    adjacency: Vec<Vec<usize>>,
    head: Vec<usize>,
    capacity: Vec<T>,
    flow: Vec<T>,
    declared: FixedBitSet,
    arcs: FxHashMap<(usize, usize), usize>,
    tolerance: T,
    last_flow: T,
    parent_arc: Vec<usize>,
    reached: FixedBitSet,
    queue: VecDeque<usize>,
}

impl<T> EdmondsKarp<T>
where
    T: Float,
{
    /// Creates a network with `num_nodes` nodes and no arcs.
    pub fn new(num_nodes: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); num_nodes],
            head: Vec::new(),
            capacity: Vec::new(),
            flow: Vec::new(),
            declared: FixedBitSet::new(),
            arcs: FxHashMap::default(),
            tolerance: T::epsilon(),
            last_flow: T::zero(),
            parent_arc: vec![NO_ARC; num_nodes],
            reached: FixedBitSet::with_capacity(num_nodes),
            queue: VecDeque::with_capacity(num_nodes),
        }
    }

    /// Sets the residual capacity below which an arc counts as saturated.
    #[inline]
    pub fn with_tolerance(mut self, tolerance: T) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Returns the number of nodes.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.adjacency.len()
    }

    /// Returns the number of declared arcs.
    #[inline]
    pub fn num_arcs(&self) -> usize {
        self.declared.count_ones(..)
    }

    /// Returns `true` if the arc `(i, j)` has been declared.
    #[inline]
    pub fn has_arc(&self, i: usize, j: usize) -> bool {
        self.arcs
            .get(&(i, j))
            .is_some_and(|&arc| self.declared.contains(arc))
    }

    /// Declares the arc `(i, j)`. Declaring an existing arc is a no-op, and
    /// declaring the reverse of an existing arc reuses its residual twin.
    ///
    /// # Panics
    ///
    /// Panics if `i` or `j` is out of bounds or if `i == j`.
    pub fn add_edge(&mut self, i: usize, j: usize) {
        let n = self.num_nodes();
        assert!(
            i < n && j < n,
            "called `EdmondsKarp::add_edge` with node out of bounds: the len is {} but the arc is ({}, {})",
            n,
            i,
            j
        );
        assert!(
            i != j,
            "called `EdmondsKarp::add_edge` with a self-loop on node {}",
            i
        );

        if let Some(&arc) = self.arcs.get(&(i, j)) {
            self.declared.insert(arc);
            return;
        }

        let forward = self.head.len();
        let backward = forward + 1;
        self.head.push(j);
        self.head.push(i);
        self.capacity.push(T::zero());
        self.capacity.push(T::zero());
        self.flow.push(T::zero());
        self.flow.push(T::zero());
        self.declared.grow(backward + 1);
        self.declared.insert(forward);
        self.adjacency[i].push(forward);
        self.adjacency[j].push(backward);
        self.arcs.insert((i, j), forward);
        self.arcs.insert((j, i), backward);
    }

    /// Sets the capacity of the declared arc `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics if the arc was never declared or the capacity is negative/NaN.
    pub fn set_capacity(&mut self, i: usize, j: usize, capacity: T) {
        assert!(
            capacity >= T::zero(),
            "called `EdmondsKarp::set_capacity` with a negative or NaN capacity on arc ({}, {})",
            i,
            j
        );
        match self.arcs.get(&(i, j)) {
            Some(&arc) if self.declared.contains(arc) => self.capacity[arc] = capacity,
            _ => panic!(
                "called `EdmondsKarp::set_capacity` with undeclared arc ({}, {})",
                i, j
            ),
        }
    }

    /// Returns the capacity of the declared arc `(i, j)`, if any.
    #[inline]
    pub fn capacity(&self, i: usize, j: usize) -> Option<T> {
        self.arcs
            .get(&(i, j))
            .filter(|&&arc| self.declared.contains(arc))
            .map(|&arc| self.capacity[arc])
    }

    /// Returns the flow value reached by the last call to
    /// [`compute_min_cut`](Self::compute_min_cut). After an early exit this is
    /// the first accumulated value that reached the threshold.
    #[inline]
    pub fn max_flow(&self) -> T {
        self.last_flow
    }

    /// Computes a minimum `s`-`t` cut unless the maximum flow reaches
    /// `threshold`.
    ///
    /// Returns `None` as soon as the accumulated flow is at least
    /// `threshold`. Otherwise returns the declared arcs leading from the
    /// source side to the sink side of the final residual network.
    ///
    /// # Panics
    ///
    /// Panics if `s` or `t` is out of bounds or `s == t`.
    pub fn compute_min_cut(
        &mut self,
        s: usize,
        t: usize,
        threshold: T,
    ) -> Option<Vec<(usize, usize)>> {
        let n = self.num_nodes();
        assert!(
            s < n && t < n,
            "called `EdmondsKarp::compute_min_cut` with terminal out of bounds: the len is {} but the terminals are ({}, {})",
            n,
            s,
            t
        );
        assert!(
            s != t,
            "called `EdmondsKarp::compute_min_cut` with identical source and sink {}",
            s
        );

        for f in self.flow.iter_mut() {
            *f = T::zero();
        }

        let mut total = T::zero();
        loop {
            if total >= threshold {
                self.last_flow = total;
                return None;
            }
            if !self.find_augmenting_path(s, t) {
                break;
            }

            let mut bottleneck = T::infinity();
            let mut v = t;
            while v != s {
                let arc = self.parent_arc[v];
                bottleneck = bottleneck.min(self.residual(arc));
                v = self.head[arc ^ 1];
            }

            let mut v = t;
            while v != s {
                let arc = self.parent_arc[v];
                self.flow[arc] = self.flow[arc] + bottleneck;
                self.flow[arc ^ 1] = self.flow[arc ^ 1] - bottleneck;
                v = self.head[arc ^ 1];
            }
            total = total + bottleneck;
        }

        self.last_flow = total;
        Some(self.source_side_cut())
    }

    #[inline(always)]
    fn residual(&self, arc: usize) -> T {
        self.capacity[arc] - self.flow[arc]
    }

    /// Breadth-first search over arcs with positive residual capacity.
    /// Leaves `reached` holding the source side when the sink is unreachable.
    fn find_augmenting_path(&mut self, s: usize, t: usize) -> bool {
        self.reached.clear();
        self.reached.grow(self.num_nodes());
        self.queue.clear();
        self.reached.insert(s);
        self.queue.push_back(s);

        while let Some(v) = self.queue.pop_front() {
            for &arc in &self.adjacency[v] {
                let u = self.head[arc];
                if self.reached.contains(u) || self.residual(arc) <= self.tolerance {
                    continue;
                }
                self.reached.insert(u);
                self.parent_arc[u] = arc;
                if u == t {
                    return true;
                }
                self.queue.push_back(u);
            }
        }
        false
    }

    fn source_side_cut(&self) -> Vec<(usize, usize)> {
        let mut cut = Vec::new();
        for v in self.reached.ones() {
            for &arc in &self.adjacency[v] {
                let u = self.head[arc];
                if self.declared.contains(arc) && !self.reached.contains(u) {
                    cut.push((v, u));
                }
            }
        }
        cut
    }
}

impl<T> std::fmt::Display for EdmondsKarp<T>
where
    T: Float + std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "EdmondsKarp(nodes: {}, arcs: {}, last_flow: {})",
            self.num_nodes(),
            self.num_arcs(),
            self.last_flow
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    const EPS: f64 = 1e-9;

    /// The classic CLRS network; its maximum flow is 23.
    fn clrs_network() -> EdmondsKarp<f64> {
        let mut net = EdmondsKarp::new(6);
        let arcs = [
            (0, 1, 16.0),
            (0, 2, 13.0),
            (2, 1, 4.0),
            (1, 3, 12.0),
            (3, 2, 9.0),
            (2, 4, 14.0),
            (4, 3, 7.0),
            (3, 5, 20.0),
            (4, 5, 4.0),
        ];
        for (i, j, c) in arcs {
            net.add_edge(i, j);
            net.set_capacity(i, j, c);
        }
        net
    }

    fn cut_capacity(net: &EdmondsKarp<f64>, cut: &[(usize, usize)]) -> f64 {
        cut.iter()
            .map(|&(i, j)| net.capacity(i, j).expect("cut arcs are declared"))
            .sum()
    }

    /// Plain BFS over arcs with positive capacity, skipping the given cut.
    fn reachable_without(
        net: &EdmondsKarp<f64>,
        s: usize,
        t: usize,
        cut: &[(usize, usize)],
    ) -> bool {
        let n = net.num_nodes();
        let mut seen = vec![false; n];
        let mut stack = vec![s];
        seen[s] = true;
        while let Some(v) = stack.pop() {
            if v == t {
                return true;
            }
            for u in 0..n {
                if seen[u] || cut.contains(&(v, u)) {
                    continue;
                }
                if net.capacity(v, u).is_some_and(|c| c > EPS) {
                    seen[u] = true;
                    stack.push(u);
                }
            }
        }
        false
    }

    #[test]
    fn test_clrs_max_flow_and_cut() {
        let mut net = clrs_network();
        let cut = net
            .compute_min_cut(0, 5, f64::INFINITY)
            .expect("an infinite threshold always yields a cut");
        assert!((net.max_flow() - 23.0).abs() < EPS);
        assert!((cut_capacity(&net, &cut) - 23.0).abs() < EPS);
        assert!(!reachable_without(&net, 0, 5, &cut));
    }

    #[test]
    fn test_threshold_early_exit() {
        let mut net = clrs_network();
        assert!(net.compute_min_cut(0, 5, 23.0).is_none());
        assert!(net.max_flow() >= 23.0 - EPS);
        assert!(net.compute_min_cut(0, 5, 10.0).is_none());
        assert!(net.compute_min_cut(0, 5, 23.5).is_some());
    }

    #[test]
    fn test_non_positive_threshold_returns_none_immediately() {
        let mut net = clrs_network();
        assert!(net.compute_min_cut(0, 5, 0.0).is_none());
        assert_eq!(net.max_flow(), 0.0);
    }

    #[test]
    fn test_disconnected_sink_yields_empty_cut() {
        let mut net = EdmondsKarp::<f64>::new(3);
        net.add_edge(0, 1);
        net.set_capacity(0, 1, 5.0);
        let cut = net.compute_min_cut(0, 2, 1.0).expect("no flow reaches node 2");
        assert!(cut.is_empty());
        assert_eq!(net.max_flow(), 0.0);
    }

    #[test]
    fn test_add_edge_is_idempotent_and_reuses_reverse() {
        let mut net = EdmondsKarp::<f64>::new(2);
        net.add_edge(0, 1);
        net.add_edge(0, 1);
        assert_eq!(net.num_arcs(), 1);
        assert!(!net.has_arc(1, 0));
        net.add_edge(1, 0);
        assert_eq!(net.num_arcs(), 2);
        assert!(net.has_arc(1, 0));

        net.set_capacity(0, 1, 1.0);
        net.set_capacity(1, 0, 3.0);
        net.compute_min_cut(1, 0, f64::INFINITY);
        assert!((net.max_flow() - 3.0).abs() < EPS);
        net.compute_min_cut(0, 1, f64::INFINITY);
        assert!((net.max_flow() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_only_declared_arcs_are_reported() {
        let mut net = EdmondsKarp::<f64>::new(3);
        net.add_edge(0, 1);
        net.add_edge(1, 2);
        net.set_capacity(0, 1, 1.0);
        net.set_capacity(1, 2, 1.0);
        let cut = net.compute_min_cut(2, 0, f64::INFINITY).expect("no arcs lead back");
        assert!(cut.is_empty(), "reverse residual arcs must not appear: {cut:?}");
    }

    #[test]
    fn test_capacities_can_be_rewritten_between_runs() {
        let mut net = EdmondsKarp::<f64>::new(3);
        net.add_edge(0, 1);
        net.add_edge(1, 2);
        net.set_capacity(0, 1, 1.0);
        net.set_capacity(1, 2, 1.0);
        assert!(net.compute_min_cut(0, 2, 0.9).is_none());

        net.set_capacity(1, 2, 0.25);
        let cut = net.compute_min_cut(0, 2, 0.9).expect("capacity dropped to 0.25");
        assert_eq!(cut, vec![(1, 2)]);
        assert!((net.max_flow() - 0.25).abs() < EPS);
    }

    #[test]
    #[should_panic(expected = "called `EdmondsKarp::set_capacity` with undeclared arc")]
    fn test_set_capacity_on_missing_arc_panics() {
        let mut net = EdmondsKarp::<f64>::new(2);
        net.set_capacity(0, 1, 1.0);
    }

    #[test]
    fn test_random_networks_satisfy_duality() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let n = rng.random_range(2..8);
            let mut net = EdmondsKarp::<f64>::new(n);
            for i in 0..n {
                for j in 0..n {
                    if i != j && rng.random_bool(0.4) {
                        net.add_edge(i, j);
                        net.set_capacity(i, j, rng.random_range(0.0..5.0));
                    }
                }
            }
            let cut = net
                .compute_min_cut(0, n - 1, f64::INFINITY)
                .expect("infinite threshold");
            assert!(
                (cut_capacity(&net, &cut) - net.max_flow()).abs() < 1e-6,
                "cut capacity {} differs from max flow {}",
                cut_capacity(&net, &cut),
                net.max_flow()
            );
            assert!(!reachable_without(&net, 0, n - 1, &cut));
        }
    }

    proptest! {
        #[test]
        fn prop_threshold_agrees_with_exact_flow(
            caps in proptest::collection::vec(0.0f64..4.0, 12),
            threshold in 0.0f64..8.0,
        ) {
            let mut net = EdmondsKarp::<f64>::new(4);
            let pairs = [
                (0, 1),
                (0, 2),
                (1, 2),
                (2, 1),
                (1, 3),
                (2, 3),
                (0, 3),
                (3, 0),
                (1, 0),
                (2, 0),
                (3, 1),
                (3, 2),
            ];
            for (&(i, j), &c) in pairs.iter().zip(caps.iter()) {
                net.add_edge(i, j);
                net.set_capacity(i, j, c);
            }
            net.compute_min_cut(0, 3, f64::INFINITY);
            let exact = net.max_flow();
            let early = net.compute_min_cut(0, 3, threshold);
            if exact < threshold - 1e-9 {
                prop_assert!(early.is_some());
            }
            if exact >= threshold + 1e-9 {
                prop_assert!(early.is_none());
            }
        }
    }
}
