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

//! # Connectivity Separator
//!
//! A `CutCallback` that strengthens rooted subproblems with min-cut
//! inequalities, block by block.
//!
//! ## Network
//!
//! Every block of the rooted block tree gets one flow network, built once.
//! Vertex `i` of the block is split into `2i` (in) and `2i + 1` (out), joined
//! by an arc whose capacity is the current value of "vertex selected". Each
//! pair of adjacent vertices gets one arc per direction from out to in, with
//! the summed values of the parallel edges between them as capacity. All
//! capacities carry a small epsilon so zero-valued arcs still exist.
//!
//! ## Separation
//!
//! For a vertex `v` with value `y_v`, a flow from the block root below
//! `y_v` certifies a cut `C` with `y_v > sum(C)`. The inequality
//! `y_v <= sum(C)` holds for every connected selection that contains the
//! root, so it is emitted as a global cut. The search for it stops as soon
//! as the flow reaches the threshold.
//!
//! Calls are rate limited: after every processed call the number of skipped
//! calls grows by `rate_step`. Processed calls probe a shuffled sample of the
//! selected vertices and stop after `max_cuts_per_round` cuts. Independently
//! of the rate limit, every improvement of the shared lower bound is turned
//! into an `objective >= bound` row once it cuts off the current point.

use crate::{config::SeparatorConfig, formulation::Formulation};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use rustc_hash::FxHashMap;
use sigmwcs_core::algorithm::flow::EdmondsKarp;
use sigmwcs_mip::{
    callback::{CutCallback, CutContext},
    model::{LinearConstraint, VarIndex},
};
use sigmwcs_model::{
    graph::Graph,
    index::{EdgeIndex, NodeIndex},
};
use sigmwcs_search::bound::SharedLowerBound;
use smallvec::SmallVec;

/// Margin by which a flow must fall short of a vertex value to yield a cut.
const CUT_MARGIN: f64 = 1e-4;

/// The flow network of one block.
#[derive(Debug, Clone)]
struct BlockNetwork {
    flow: EdmondsKarp<f64>,
    root: usize,
    block_root: NodeIndex,
    vertices: Vec<(NodeIndex, VarIndex)>,
    /// Adjacent vertex pairs `(a, b)` with `a < b` and their edge variables.
    pairs: Vec<(usize, usize, SmallVec<[VarIndex; 2]>)>,
}

impl BlockNetwork {
    fn new(
        graph: &Graph,
        formulation: &Formulation,
        block_root: NodeIndex,
        nodes: &[NodeIndex],
        edges: &[EdgeIndex],
    ) -> Option<Self> {
        let mut local: FxHashMap<NodeIndex, usize> = FxHashMap::default();
        let mut vertices = Vec::with_capacity(nodes.len());
        for &v in nodes {
            local.insert(v, vertices.len());
            vertices.push((v, formulation.node_var(v)?));
        }
        let root = *local.get(&block_root)?;

        let mut grouped: FxHashMap<(usize, usize), SmallVec<[VarIndex; 2]>> =
            FxHashMap::default();
        for &e in edges {
            let (u, v) = graph.endpoints(e)?;
            let (a, b) = (*local.get(&u)?, *local.get(&v)?);
            let key = (a.min(b), a.max(b));
            grouped.entry(key).or_default().push(formulation.edge_var(e)?);
        }
        let mut pairs: Vec<_> = grouped
            .into_iter()
            .map(|((a, b), vars)| (a, b, vars))
            .collect();
        pairs.sort_unstable_by_key(|&(a, b, _)| (a, b));

        let mut flow = EdmondsKarp::new(2 * vertices.len());
        for i in 0..vertices.len() {
            flow.add_edge(2 * i, 2 * i + 1);
        }
        for &(a, b, _) in &pairs {
            flow.add_edge(2 * a + 1, 2 * b);
            flow.add_edge(2 * b + 1, 2 * a);
        }

        Some(Self {
            flow,
            root,
            block_root,
            vertices,
            pairs,
        })
    }

    fn refresh(&mut self, values: &[f64], epsilon: f64) {
        for (i, &(_, var)) in self.vertices.iter().enumerate() {
            let capacity = values[var.get()].max(0.0) + epsilon;
            self.flow.set_capacity(2 * i, 2 * i + 1, capacity);
        }
        for (a, b, vars) in &self.pairs {
            let used: f64 = vars.iter().map(|v| values[v.get()].max(0.0)).sum();
            let capacity = used + epsilon;
            self.flow.set_capacity(2 * a + 1, 2 * b, capacity);
            self.flow.set_capacity(2 * b + 1, 2 * a, capacity);
        }
    }

    /// The min-cut row separating vertex `target` from the block root, if
    /// the current point violates it.
    fn separate(&mut self, target: usize, values: &[f64]) -> Option<LinearConstraint> {
        let (node, var) = self.vertices[target];
        let threshold = values[var.get()] - CUT_MARGIN;
        if threshold <= 0.0 {
            return None;
        }
        let cut = self
            .flow
            .compute_min_cut(2 * self.root + 1, 2 * target, threshold)?;

        let mut vars: Vec<VarIndex> = Vec::with_capacity(cut.len());
        for (tail, head) in cut {
            if tail % 2 == 0 && head == tail + 1 {
                vars.push(self.vertices[tail / 2].1);
            } else {
                let (a, b) = (tail / 2, head / 2);
                let key = (a.min(b), a.max(b));
                if let Ok(slot) = self.pairs.binary_search_by_key(&key, |&(a, b, _)| (a, b)) {
                    vars.extend(self.pairs[slot].2.iter().copied());
                }
            }
        }
        vars.sort_unstable();
        vars.dedup();

        let mut terms = Vec::with_capacity(vars.len() + 1);
        terms.push((var, 1.0));
        terms.extend(vars.into_iter().map(|v| (v, -1.0)));
        Some(LinearConstraint::le(
            format!("connectivity_{}_{}", self.block_root.get(), node.get()),
            terms,
            0.0,
        ))
    }
}

/// Counters of a separator over one engine run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SeparatorStatistics {
    /// Callback invocations.
    pub calls: u64,
    /// Invocations that passed the rate limiter.
    pub rounds: u64,
    /// Connectivity rows emitted.
    pub cuts: u64,
    /// Lower-bound rows emitted.
    pub bound_cuts: u64,
}

impl std::fmt::Display for SeparatorStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SeparatorStatistics(calls: {}, rounds: {}, cuts: {}, bound_cuts: {})",
            self.calls, self.rounds, self.cuts, self.bound_cuts
        )
    }
}

/// Min-cut connectivity separation over the blocks of a rooted subproblem.
#[derive(Debug)]
pub struct ConnectivitySeparator<'a> {
    config: &'a SeparatorConfig,
    bound: &'a SharedLowerBound,
    objective: VarIndex,
    networks: Vec<BlockNetwork>,
    last_bound: f64,
    waited: f64,
    period: f64,
    rng: StdRng,
    candidates: Vec<(usize, usize)>,
    stats: SeparatorStatistics,
}

impl<'a> ConnectivitySeparator<'a> {
    /// Builds one network per block generator of `formulation`.
    pub fn new(
        graph: &Graph,
        formulation: &Formulation,
        config: &'a SeparatorConfig,
        bound: &'a SharedLowerBound,
    ) -> Self {
        let networks: Vec<BlockNetwork> = formulation
            .generators()
            .iter()
            .filter_map(|g| BlockNetwork::new(graph, formulation, g.root, &g.nodes, &g.edges))
            .collect();
        Self {
            config,
            bound,
            objective: formulation.objective_var(),
            networks,
            last_bound: f64::NEG_INFINITY,
            waited: 0.0,
            period: 0.0,
            rng: StdRng::seed_from_u64(config.seed),
            candidates: Vec::new(),
            stats: SeparatorStatistics::default(),
        }
    }

    #[inline]
    pub fn num_blocks(&self) -> usize {
        self.networks.len()
    }

    #[inline]
    pub fn statistics(&self) -> SeparatorStatistics {
        self.stats
    }

    fn bound_cut(&mut self, values: &[f64], cuts: &mut Vec<LinearConstraint>) {
        let bound = self.bound.get();
        if !bound.is_finite() || bound <= self.last_bound {
            return;
        }
        if values[self.objective.get()] < bound - CUT_MARGIN {
            cuts.push(LinearConstraint::ge(
                "shared_lower_bound",
                vec![(self.objective, 1.0)],
                bound,
            ));
            self.last_bound = bound;
            self.stats.bound_cuts += 1;
        }
    }

    fn passes_rate_limit(&mut self) -> bool {
        self.waited += 1.0;
        if self.waited > self.period {
            self.waited = 0.0;
            self.period += self.config.rate_step;
            return true;
        }
        false
    }

    fn connectivity_cuts(&mut self, values: &[f64], cuts: &mut Vec<LinearConstraint>) -> usize {
        self.candidates.clear();
        for (n, network) in self.networks.iter().enumerate() {
            for (i, &(_, var)) in network.vertices.iter().enumerate() {
                if i != network.root && values[var.get()] > CUT_MARGIN {
                    self.candidates.push((n, i));
                }
            }
        }
        self.candidates.shuffle(&mut self.rng);
        self.candidates.truncate(self.config.max_candidates);

        let epsilon = self.config.capacity_epsilon;
        let mut refreshed = vec![false; self.networks.len()];
        let mut added = 0usize;
        for &(n, i) in &self.candidates {
            if added >= self.config.max_cuts_per_round {
                break;
            }
            let network = &mut self.networks[n];
            if !refreshed[n] {
                network.refresh(values, epsilon);
                refreshed[n] = true;
            }
            if let Some(row) = network.separate(i, values) {
                cuts.push(row);
                added += 1;
            }
        }
        added
    }
}

impl CutCallback for ConnectivitySeparator<'_> {
    fn separate(&mut self, ctx: &CutContext<'_>, cuts: &mut Vec<LinearConstraint>) {
        self.stats.calls += 1;
        self.bound_cut(ctx.values, cuts);
        if self.networks.is_empty() || !self.passes_rate_limit() {
            return;
        }

        let start = std::time::Instant::now();
        self.stats.rounds += 1;
        let added = self.connectivity_cuts(ctx.values, cuts);
        self.stats.cuts += added as u64;
        if added > 0 {
            tracing::debug!(
                cuts = added,
                depth = ctx.depth,
                integral = ctx.is_integral,
                elapsed_us = start.elapsed().as_micros() as u64,
                "connectivity cuts separated"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeparatorConfigBuilder;
    use sigmwcs_mip::model::Sense;
    use sigmwcs_model::{signals::Signals, unit::Unit};

    /// Path 0 - 1 - 2 rooted at its middle vertex.
    fn rooted_path() -> (Graph, Formulation) {
        let mut g = Graph::new();
        let mut s = Signals::new();
        for i in 0..3 {
            g.add_node(NodeIndex::new(i));
            s.add_unit(Unit::Node(NodeIndex::new(i)), 1.0);
        }
        for i in 0..2 {
            let e = EdgeIndex::new(i);
            g.add_edge(e, NodeIndex::new(i), NodeIndex::new(i + 1));
            s.add_unit(Unit::Edge(e), -0.5);
        }
        let f = Formulation::new(&g, &s, Some(NodeIndex::new(1)), f64::NEG_INFINITY).unwrap();
        (g, f)
    }

    fn point(f: &Formulation, nodes: [f64; 3], edges: [f64; 2]) -> Vec<f64> {
        let mut values = vec![0.0; f.model().num_vars()];
        for (i, y) in nodes.into_iter().enumerate() {
            values[f.node_var(NodeIndex::new(i)).unwrap().get()] = y;
        }
        for (i, w) in edges.into_iter().enumerate() {
            values[f.edge_var(EdgeIndex::new(i)).unwrap().get()] = w;
        }
        values
    }

    fn bound_rows(cuts: &[LinearConstraint]) -> Vec<&LinearConstraint> {
        cuts.iter()
            .filter(|c| c.tag == "shared_lower_bound")
            .collect()
    }

    fn call(
        sep: &mut ConnectivitySeparator<'_>,
        f: &Formulation,
        values: &[f64],
    ) -> Vec<LinearConstraint> {
        let mut cuts = Vec::new();
        let ctx = CutContext {
            model: f.model(),
            values,
            objective: 0.0,
            is_integral: false,
            depth: 0,
        };
        sep.separate(&ctx, &mut cuts);
        cuts
    }

    #[test]
    fn test_cut_for_disconnected_vertex() {
        let (g, f) = rooted_path();
        let config = SeparatorConfig::default();
        let bound = SharedLowerBound::default();
        let mut sep = ConnectivitySeparator::new(&g, &f, &config, &bound);
        assert_eq!(sep.num_blocks(), 2);

        let values = point(&f, [1.0, 1.0, 0.0], [0.2, 0.0]);
        let cuts = call(&mut sep, &f, &values);
        assert_eq!(cuts.len(), 1);
        let cut = &cuts[0];
        assert_eq!(cut.sense, Sense::Le);
        assert_eq!(cut.rhs, 0.0);
        let y0 = f.node_var(NodeIndex::new(0)).unwrap();
        let w0 = f.edge_var(EdgeIndex::new(0)).unwrap();
        assert_eq!(cut.terms, vec![(y0, 1.0), (w0, -1.0)]);
        assert!(cut.violation(&values) > 0.5);
    }

    #[test]
    fn test_no_cut_when_connected() {
        let (g, f) = rooted_path();
        let config = SeparatorConfig::default();
        let bound = SharedLowerBound::default();
        let mut sep = ConnectivitySeparator::new(&g, &f, &config, &bound);
        let values = point(&f, [1.0, 1.0, 0.5], [1.0, 0.5]);
        assert!(call(&mut sep, &f, &values).is_empty());
        assert_eq!(sep.statistics().rounds, 1);
    }

    #[test]
    fn test_cuts_per_round_are_capped() {
        let (g, f) = rooted_path();
        let config = SeparatorConfigBuilder::new().max_cuts_per_round(1).build();
        let bound = SharedLowerBound::default();
        let mut sep = ConnectivitySeparator::new(&g, &f, &config, &bound);
        let values = point(&f, [1.0, 1.0, 1.0], [0.0, 0.0]);
        assert_eq!(call(&mut sep, &f, &values).len(), 1);

        let config = SeparatorConfig::default();
        let mut sep = ConnectivitySeparator::new(&g, &f, &config, &bound);
        assert_eq!(call(&mut sep, &f, &values).len(), 2);
    }

    #[test]
    fn test_rate_limiter_skips_growing_number_of_calls() {
        let (g, f) = rooted_path();
        let config = SeparatorConfigBuilder::new().rate_step(1.0).build();
        let bound = SharedLowerBound::default();
        let mut sep = ConnectivitySeparator::new(&g, &f, &config, &bound);
        let values = point(&f, [1.0, 1.0, 0.0], [0.0, 0.0]);
        let produced: Vec<bool> = (0..6)
            .map(|_| !call(&mut sep, &f, &values).is_empty())
            .collect();
        assert_eq!(produced, vec![true, false, true, false, false, true]);
        assert_eq!(sep.statistics().calls, 6);
        assert_eq!(sep.statistics().rounds, 3);
    }

    #[test]
    fn test_bound_row_once_per_improvement() {
        let (g, f) = rooted_path();
        let config = SeparatorConfig::default();
        let bound = SharedLowerBound::new(2.0);
        let mut sep = ConnectivitySeparator::new(&g, &f, &config, &bound);
        let mut values = point(&f, [1.0, 1.0, 1.0], [1.0, 1.0]);
        values[f.objective_var().get()] = 1.0;

        let first = call(&mut sep, &f, &values);
        assert_eq!(bound_rows(&first).len(), 1);
        let second = call(&mut sep, &f, &values);
        assert!(bound_rows(&second).is_empty());

        assert!(bound.try_raise(3.0));
        let third = call(&mut sep, &f, &values);
        let rows = bound_rows(&third);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].rhs, 3.0);
        assert_eq!(sep.statistics().bound_cuts, 2);
    }

    #[test]
    fn test_bound_row_waits_until_violated() {
        let (g, f) = rooted_path();
        let config = SeparatorConfig::default();
        let bound = SharedLowerBound::new(2.0);
        let mut sep = ConnectivitySeparator::new(&g, &f, &config, &bound);
        let mut values = point(&f, [1.0, 1.0, 1.0], [1.0, 1.0]);
        values[f.objective_var().get()] = 2.5;
        assert!(call(&mut sep, &f, &values).is_empty());

        values[f.objective_var().get()] = 1.5;
        assert_eq!(call(&mut sep, &f, &values).len(), 1);
    }
}
