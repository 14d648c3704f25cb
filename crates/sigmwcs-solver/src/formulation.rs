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

//! # Subproblem Formulation
//!
//! Builds the 0/1 program of one subproblem: find a connected subgraph of
//! maximum distinct-signal weight, optionally forced to contain a root.
//!
//! ## Model
//!
//! Connectivity is modeled as a spanning arborescence of the selected
//! vertices. Every edge carries two arc variables, one per orientation, and
//! every vertex either is the unique root or has exactly one incoming arc.
//! Depth variables increase by exactly one along every arc, which rules out
//! cycles, and differ by at most one along every selected edge, which keeps
//! one breadth-first tree per selection. Unrooted models additionally pick
//! the highest-ranked selected vertex as the root.
//!
//! Signals with a single unit put their weight straight onto that unit.
//! Signals with several units get an indicator linked to their members, so
//! the objective counts each signal once.
//!
//! ## Tightening
//!
//! * A selected vertex pulls in every neighbour that carries no negative
//!   signal, through a non-negative edge. Some optimum always has this
//!   closure property.
//! * When the root is a cut vertex, the blocks are walked outwards from it.
//!   No arc enters a block through anything but its block root, vertices
//!   behind a cut vertex require that cut vertex, and every block becomes a
//!   separation target for the connectivity separator.
//!
//! The model comes with a warm start: the closure of the best single vertex
//! (or of the root), laid out as a breadth-first tree.

use rustc_hash::{FxHashMap, FxHashSet};
use sigmwcs_mip::{
    error::MipError,
    model::{LinearConstraint, MipModel, MipModelBuilder, VarIndex},
    start::MipStart,
};
use sigmwcs_model::{
    blocks::BlockCutTree,
    graph::Graph,
    index::{EdgeIndex, NodeIndex},
    signals::Signals,
    unit::Unit,
};
use std::collections::VecDeque;

/// A block together with the vertex through which it is entered.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockGenerator {
    pub root: NodeIndex,
    pub nodes: Vec<NodeIndex>,
    pub edges: Vec<EdgeIndex>,
}

#[derive(Debug, Clone, Copy)]
struct Arc {
    from: NodeIndex,
    to: NodeIndex,
    edge: EdgeIndex,
    var: VarIndex,
}

#[derive(Debug, Clone, Copy)]
struct NodeVars {
    selected: VarIndex,
    root: VarIndex,
    depth: VarIndex,
}

/// The 0/1 program of one subproblem plus the data needed to read it back.
#[derive(Debug, Clone)]
pub struct Formulation {
    model: MipModel,
    start: MipStart,
    root: Option<NodeIndex>,
    node_vars: FxHashMap<NodeIndex, VarIndex>,
    edge_vars: FxHashMap<EdgeIndex, VarIndex>,
    objective: VarIndex,
    generators: Vec<BlockGenerator>,
}

impl Formulation {
    /// Formulates the subproblem on the connected `graph` with weights from
    /// `signals`. `root`, if given, must be selected. A finite `lower_bound`
    /// is added as a bound on the objective.
    ///
    /// # Panics
    ///
    /// Panics if `root` is not a node of `graph`.
    pub fn new(
        graph: &Graph,
        signals: &Signals,
        root: Option<NodeIndex>,
        lower_bound: f64,
    ) -> Result<Self, MipError> {
        if let Some(root) = root {
            assert!(
                graph.contains_node(root),
                "called `Formulation::new` with root {} outside the graph",
                root
            );
        }
        FormulationBuilder::new(graph, signals, root).build(lower_bound)
    }

    #[inline]
    pub fn model(&self) -> &MipModel {
        &self.model
    }

    /// The closure of the best single vertex as a full assignment.
    #[inline]
    pub fn start(&self) -> &MipStart {
        &self.start
    }

    #[inline]
    pub fn root(&self) -> Option<NodeIndex> {
        self.root
    }

    #[inline]
    pub fn node_var(&self, node: NodeIndex) -> Option<VarIndex> {
        self.node_vars.get(&node).copied()
    }

    #[inline]
    pub fn edge_var(&self, edge: EdgeIndex) -> Option<VarIndex> {
        self.edge_vars.get(&edge).copied()
    }

    #[inline]
    pub fn objective_var(&self) -> VarIndex {
        self.objective
    }

    /// Blocks that need connectivity separation, empty for unrooted models.
    #[inline]
    pub fn generators(&self) -> &[BlockGenerator] {
        &self.generators
    }

    /// The units set in `values`, sorted.
    pub fn selected_units(&self, values: &[f64]) -> Vec<Unit> {
        let nodes = self
            .node_vars
            .iter()
            .filter(|&(_, var)| values[var.get()] > 0.5)
            .map(|(&v, _)| Unit::Node(v));
        let edges = self
            .edge_vars
            .iter()
            .filter(|&(_, var)| values[var.get()] > 0.5)
            .map(|(&e, _)| Unit::Edge(e));
        let mut units: Vec<Unit> = nodes.chain(edges).collect();
        units.sort_unstable();
        units
    }
}

impl std::fmt::Display for Formulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Formulation(vars: {}, constraints: {}, rooted: {}, blocks: {})",
            self.model.num_vars(),
            self.model.num_constraints(),
            self.root.is_some(),
            self.generators.len()
        )
    }
}

struct FormulationBuilder<'a> {
    graph: &'a Graph,
    signals: &'a Signals,
    root: Option<NodeIndex>,
    builder: MipModelBuilder,
    nodes: Vec<NodeIndex>,
    node_vars: FxHashMap<NodeIndex, NodeVars>,
    edge_vars: FxHashMap<EdgeIndex, VarIndex>,
    arcs: Vec<Arc>,
    /// Per vertex, the neighbours and edges its selection pulls in.
    closure: FxHashMap<NodeIndex, Vec<(NodeIndex, EdgeIndex)>>,
    /// Indicators of the signals with several units, with their members.
    indicators: Vec<(VarIndex, Vec<Unit>)>,
    rank_var: Option<VarIndex>,
    generators: Vec<BlockGenerator>,
}

impl<'a> FormulationBuilder<'a> {
    fn new(graph: &'a Graph, signals: &'a Signals, root: Option<NodeIndex>) -> Self {
        Self {
            graph,
            signals,
            root,
            builder: MipModelBuilder::new(),
            nodes: graph.nodes().collect(),
            node_vars: FxHashMap::default(),
            edge_vars: FxHashMap::default(),
            arcs: Vec::new(),
            closure: FxHashMap::default(),
            indicators: Vec::new(),
            rank_var: None,
            generators: Vec::new(),
        }
    }

    #[inline]
    fn size(&self) -> f64 {
        self.nodes.len() as f64
    }

    /// Rank of the `i`-th smallest vertex; smaller ids rank higher.
    #[inline]
    fn rank(&self, i: usize) -> f64 {
        (self.nodes.len() - i) as f64
    }

    fn unit_var(&self, unit: Unit) -> Option<VarIndex> {
        match unit {
            Unit::Node(v) => self.node_vars.get(&v).map(|vars| vars.selected),
            Unit::Edge(e) => self.edge_vars.get(&e).copied(),
        }
    }

    fn build(mut self, lower_bound: f64) -> Result<Formulation, MipError> {
        self.add_variables();
        self.add_tree_rows();
        let objective = self.add_objective();
        self.add_closure_rows();
        if lower_bound.is_finite() {
            self.builder.add_constraint(LinearConstraint::ge(
                "lower_bound",
                vec![(objective, 1.0)],
                lower_bound,
            ));
        }
        match self.root {
            Some(root) => self.add_rooted_rows(root),
            None => self.add_rank_rows(),
        }

        let builder = std::mem::take(&mut self.builder);
        let model = builder.build()?;
        let start = self.warm_start(&model, objective);
        let node_vars = self
            .node_vars
            .iter()
            .map(|(&v, vars)| (v, vars.selected))
            .collect();
        Ok(Formulation {
            model,
            start,
            root: self.root,
            node_vars,
            edge_vars: self.edge_vars,
            objective,
            generators: self.generators,
        })
    }

    fn add_variables(&mut self) {
        let size = self.size();
        for &v in &self.nodes {
            let vars = NodeVars {
                selected: self.builder.add_binary(format!("y_{}", v.get())),
                root: self.builder.add_binary(format!("r_{}", v.get())),
                depth: self
                    .builder
                    .add_continuous(format!("d_{}", v.get()), 0.0, size),
            };
            self.node_vars.insert(v, vars);
        }
        let graph = self.graph;
        for (e, u, v) in graph.edges() {
            let w = self.builder.add_binary(format!("w_{}", e.get()));
            self.edge_vars.insert(e, w);
            let forward = self
                .builder
                .add_binary(format!("x_{}_{}", e.get(), v.get()));
            let backward = self
                .builder
                .add_binary(format!("x_{}_{}", e.get(), u.get()));
            self.arcs.push(Arc {
                from: u,
                to: v,
                edge: e,
                var: forward,
            });
            self.arcs.push(Arc {
                from: v,
                to: u,
                edge: e,
                var: backward,
            });
        }
    }

    fn add_tree_rows(&mut self) {
        let size = self.size();
        let roots = self
            .nodes
            .iter()
            .map(|v| (self.node_vars[v].root, 1.0))
            .collect();
        self.builder
            .add_constraint(LinearConstraint::le("single_root", roots, 1.0));

        let mut incoming: FxHashMap<NodeIndex, Vec<(VarIndex, f64)>> = FxHashMap::default();
        for arc in &self.arcs {
            incoming.entry(arc.to).or_default().push((arc.var, 1.0));
        }
        for &v in &self.nodes {
            let vars = self.node_vars[&v];
            let mut terms = incoming.remove(&v).unwrap_or_default();
            terms.push((vars.root, 1.0));
            terms.push((vars.selected, -1.0));
            self.builder.add_constraint(LinearConstraint::equal(
                format!("parent_{}", v.get()),
                terms,
                0.0,
            ));
            self.builder.add_constraint(LinearConstraint::le(
                format!("root_depth_{}", v.get()),
                vec![(vars.depth, 1.0), (vars.root, size)],
                size,
            ));
        }

        let graph = self.graph;
        for (e, u, v) in graph.edges() {
            let w = self.edge_vars[&e];
            let (yu, yv) = (self.node_vars[&u].selected, self.node_vars[&v].selected);
            let (du, dv) = (self.node_vars[&u].depth, self.node_vars[&v].depth);
            let id = e.get();
            self.builder.add_constraint(LinearConstraint::le(
                format!("edge_tail_{}", id),
                vec![(w, 1.0), (yu, -1.0)],
                0.0,
            ));
            self.builder.add_constraint(LinearConstraint::le(
                format!("edge_head_{}", id),
                vec![(w, 1.0), (yv, -1.0)],
                0.0,
            ));
            self.builder.add_constraint(LinearConstraint::le(
                format!("tree_symmetry_{}_{}", id, u.get()),
                vec![(du, 1.0), (dv, -1.0), (w, size - 1.0)],
                size,
            ));
            self.builder.add_constraint(LinearConstraint::le(
                format!("tree_symmetry_{}_{}", id, v.get()),
                vec![(dv, 1.0), (du, -1.0), (w, size - 1.0)],
                size,
            ));
        }

        for pair in self.arcs.chunks_exact(2) {
            let (forward, backward) = (pair[0], pair[1]);
            let w = self.edge_vars[&forward.edge];
            self.builder.add_constraint(LinearConstraint::le(
                format!("edge_orientation_{}", forward.var.get()),
                vec![(forward.var, 1.0), (backward.var, 1.0), (w, -1.0)],
                0.0,
            ));
        }

        for arc in &self.arcs {
            let d_to = self.node_vars[&arc.to].depth;
            let d_from = self.node_vars[&arc.from].depth;
            self.builder.add_constraint(LinearConstraint::ge(
                format!("arc_depth_min_{}", arc.var.get()),
                vec![(d_to, 1.0), (d_from, -1.0), (arc.var, -(size + 1.0))],
                -size,
            ));
            self.builder.add_constraint(LinearConstraint::le(
                format!("arc_depth_max_{}", arc.var.get()),
                vec![(d_to, 1.0), (d_from, -1.0), (arc.var, size - 1.0)],
                size,
            ));
        }
    }

    fn add_objective(&mut self) -> VarIndex {
        let units = self.graph.units();
        let lower = self.signals.negative_sum(units.iter().copied());
        let upper = self.signals.positive_sum(units.iter().copied());
        let objective = self.builder.add_continuous("objective", lower, upper);
        self.builder.set_objective(objective, 1.0);

        let mut weights: FxHashMap<VarIndex, f64> = FxHashMap::default();
        for k in 0..self.signals.len() {
            let signal = k.into();
            let weight = self.signals.weight(signal);
            let members: Vec<(Unit, VarIndex)> = self
                .signals
                .members(signal)
                .iter()
                .filter_map(|&u| self.unit_var(u).map(|var| (u, var)))
                .collect();
            if members.is_empty() || weight == 0.0 {
                continue;
            }
            if let [(_, var)] = members.as_slice() {
                *weights.entry(*var).or_default() += weight;
                continue;
            }

            let indicator = self.builder.add_binary(format!("s_{}", k));
            *weights.entry(indicator).or_default() += weight;
            let count = members.len() as f64;
            let row = if weight > 0.0 {
                let mut terms = vec![(indicator, 1.0)];
                terms.extend(members.iter().map(|&(_, var)| (var, -1.0)));
                LinearConstraint::le(format!("signal_{}", k), terms, 0.0)
            } else {
                let mut terms = vec![(indicator, count)];
                terms.extend(members.iter().map(|&(_, var)| (var, -1.0)));
                LinearConstraint::ge(format!("signal_{}", k), terms, 0.0)
            };
            self.builder.add_constraint(row);
            self.indicators
                .push((indicator, members.into_iter().map(|(u, _)| u).collect()));
        }

        let mut terms: Vec<(VarIndex, f64)> =
            weights.into_iter().map(|(var, w)| (var, -w)).collect();
        terms.sort_unstable_by_key(|&(var, _)| var);
        terms.push((objective, 1.0));
        self.builder
            .add_constraint(LinearConstraint::equal("objective_definition", terms, 0.0));
        objective
    }

    fn add_closure_rows(&mut self) {
        for &v in &self.nodes {
            let mut pulled = Vec::new();
            for u in self.graph.neighbors(v) {
                if self.signals.negative_part_of(Unit::Node(u)) < 0.0 {
                    continue;
                }
                let edge = self
                    .graph
                    .edges_between(v, u)
                    .into_iter()
                    .filter(|&e| self.signals.negative_part_of(Unit::Edge(e)) >= 0.0)
                    .max_by(|&a, &b| {
                        let wa = self.signals.unit_weight(Unit::Edge(a));
                        let wb = self.signals.unit_weight(Unit::Edge(b));
                        wa.total_cmp(&wb).then(b.cmp(&a))
                    });
                let Some(edge) = edge else {
                    continue;
                };
                self.builder.add_constraint(LinearConstraint::le(
                    format!("closure_{}_{}", v.get(), u.get()),
                    vec![
                        (self.node_vars[&v].selected, 1.0),
                        (self.edge_vars[&edge], -1.0),
                    ],
                    0.0,
                ));
                pulled.push((u, edge));
            }
            self.closure.insert(v, pulled);
        }
    }

    /// Symmetry breaking: the root is the highest-ranked selected vertex.
    fn add_rank_rows(&mut self) {
        let size = self.size();
        let rank = self.builder.add_continuous("root_rank", 0.0, size);
        let mut definition = vec![(rank, 1.0)];
        for i in 0..self.nodes.len() {
            let v = self.nodes[i];
            let vars = self.node_vars[&v];
            let weight = self.rank(i);
            definition.push((vars.root, -weight));
            self.builder.add_constraint(LinearConstraint::ge(
                format!("root_rank_{}", v.get()),
                vec![(rank, 1.0), (vars.selected, -weight)],
                0.0,
            ));
        }
        self.builder.add_constraint(LinearConstraint::equal(
            "root_rank_definition",
            definition,
            0.0,
        ));
        self.rank_var = Some(rank);
    }

    fn add_rooted_rows(&mut self, root: NodeIndex) {
        let vars = self.node_vars[&root];
        self.builder.set_bounds(vars.selected, 1.0, 1.0);
        self.builder.set_bounds(vars.root, 1.0, 1.0);

        let tree = BlockCutTree::new(self.graph);
        if !tree.is_cut_vertex(root) {
            return;
        }

        let entering: FxHashMap<(NodeIndex, EdgeIndex), VarIndex> = self
            .arcs
            .iter()
            .map(|arc| ((arc.to, arc.edge), arc.var))
            .collect();

        let mut visited = FxHashSet::default();
        let mut stack: Vec<_> = tree
            .incident_blocks(root)
            .iter()
            .map(|&b| (b, root, true))
            .collect();
        visited.extend(tree.incident_blocks(root).iter().copied());

        while let Some((block, block_root, top)) = stack.pop() {
            let nodes = tree.block(block).to_vec();
            let block_edges = tree.block_edges(block).to_vec();
            for &e in &block_edges {
                if let Some(&var) = entering.get(&(block_root, e)) {
                    self.builder.set_bounds(var, 0.0, 0.0);
                }
            }
            if !top {
                let guard = self.node_vars[&block_root].selected;
                for &v in nodes.iter().filter(|&&v| v != block_root) {
                    self.builder.add_constraint(LinearConstraint::le(
                        format!("behind_{}_{}", block_root.get(), v.get()),
                        vec![(self.node_vars[&v].selected, 1.0), (guard, -1.0)],
                        0.0,
                    ));
                }
            }
            for &cut in tree.cut_vertices_of(block) {
                if cut == block_root {
                    continue;
                }
                for &next in tree.incident_blocks(cut) {
                    if visited.insert(next) {
                        stack.push((next, cut, false));
                    }
                }
            }
            self.generators.push(BlockGenerator {
                root: block_root,
                nodes,
                edges: block_edges,
            });
        }
        self.generators.sort_unstable_by_key(|g| (g.root, g.nodes.first().copied()));
    }

    /// The closure of the best vertex, oriented as a breadth-first tree from
    /// its highest-ranked vertex (or the root).
    fn warm_start(&self, model: &MipModel, objective: VarIndex) -> MipStart {
        let mut start = MipStart::for_model(model);
        let seed = self.root.or_else(|| {
            self.nodes.iter().copied().max_by(|&a, &b| {
                let wa = self.signals.unit_weight(Unit::Node(a));
                let wb = self.signals.unit_weight(Unit::Node(b));
                wa.total_cmp(&wb).then(b.cmp(&a))
            })
        });
        let Some(seed) = seed else {
            return start;
        };

        let mut selected: FxHashSet<NodeIndex> = FxHashSet::default();
        let mut edges: FxHashSet<EdgeIndex> = FxHashSet::default();
        let mut queue = VecDeque::from([seed]);
        selected.insert(seed);
        while let Some(v) = queue.pop_front() {
            for &(u, e) in self.closure.get(&v).map_or(&[][..], |c| c.as_slice()) {
                edges.insert(e);
                if selected.insert(u) {
                    queue.push_back(u);
                }
            }
        }

        let tree_root = match self.root {
            Some(root) => root,
            None => selected.iter().copied().min().unwrap_or(seed),
        };
        let mut depth: FxHashMap<NodeIndex, usize> = FxHashMap::default();
        depth.insert(tree_root, 0);
        let mut queue = VecDeque::from([tree_root]);
        let mut tree_arcs: FxHashSet<(NodeIndex, EdgeIndex)> = FxHashSet::default();
        while let Some(v) = queue.pop_front() {
            let d = depth[&v];
            for (u, e) in self.graph.incident(v) {
                if !edges.contains(&e) || depth.contains_key(&u) {
                    continue;
                }
                depth.insert(u, d + 1);
                tree_arcs.insert((u, e));
                queue.push_back(u);
            }
        }

        for &v in &selected {
            let vars = self.node_vars[&v];
            start.set(vars.selected, 1.0);
            start.set(vars.depth, depth.get(&v).copied().unwrap_or(0) as f64);
        }
        start.set(self.node_vars[&tree_root].root, 1.0);
        for &e in &edges {
            start.set(self.edge_vars[&e], 1.0);
        }
        for arc in &self.arcs {
            if tree_arcs.contains(&(arc.to, arc.edge)) {
                start.set(arc.var, 1.0);
            }
        }

        let is_selected = |unit: &Unit| match *unit {
            Unit::Node(v) => selected.contains(&v),
            Unit::Edge(e) => edges.contains(&e),
        };
        for (indicator, members) in &self.indicators {
            if members.iter().any(|u| is_selected(u)) {
                start.set(*indicator, 1.0);
            }
        }
        if let Some(rank) = self.rank_var {
            let position = self.nodes.iter().position(|&v| v == tree_root).unwrap_or(0);
            start.set(rank, self.rank(position));
        }

        let units = selected
            .iter()
            .map(|&v| Unit::Node(v))
            .chain(edges.iter().map(|&e| Unit::Edge(e)));
        start.set(objective, self.signals.score(units));
        start
    }
}
