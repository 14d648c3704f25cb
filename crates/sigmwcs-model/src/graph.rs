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

//! An undirected multigraph over typed node and edge ids.
//!
//! Ids are chosen by the caller and kept stable across subgraph extraction,
//! so a solution found on a piece of the graph is expressed in the units of
//! the whole. Parallel edges are allowed; self-loops are not.

use crate::index::{EdgeIndex, NodeIndex};
use crate::unit::{Absorption, Unit};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::collections::{BTreeMap, VecDeque};

/// An undirected multigraph.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: BTreeMap<NodeIndex, SmallVec<[EdgeIndex; 4]>>,
    edges: BTreeMap<EdgeIndex, (NodeIndex, NodeIndex)>,
    absorption: Absorption,
}

impl Graph {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn contains_node(&self, node: NodeIndex) -> bool {
        self.nodes.contains_key(&node)
    }

    #[inline]
    pub fn contains_edge(&self, edge: EdgeIndex) -> bool {
        self.edges.contains_key(&edge)
    }

    #[inline]
    pub fn contains_unit(&self, unit: Unit) -> bool {
        match unit {
            Unit::Node(v) => self.contains_node(v),
            Unit::Edge(e) => self.contains_edge(e),
        }
    }

    /// Adds an isolated node.
    ///
    /// # Panics
    ///
    /// Panics if the node already exists.
    pub fn add_node(&mut self, node: NodeIndex) {
        let previous = self.nodes.insert(node, SmallVec::new());
        assert!(
            previous.is_none(),
            "called `Graph::add_node` with existing node {}",
            node
        );
    }

    /// Adds the edge `edge` between `u` and `v`.
    ///
    /// # Panics
    ///
    /// Panics if the edge id is taken, if either endpoint is missing, or if
    /// `u == v`.
    pub fn add_edge(&mut self, edge: EdgeIndex, u: NodeIndex, v: NodeIndex) {
        assert!(
            u != v,
            "called `Graph::add_edge` with self-loop {} on {}",
            edge,
            u
        );
        assert!(
            !self.edges.contains_key(&edge),
            "called `Graph::add_edge` with existing edge {}",
            edge
        );
        assert!(
            self.nodes.contains_key(&u) && self.nodes.contains_key(&v),
            "called `Graph::add_edge` with missing endpoint for {} ({}, {})",
            edge,
            u,
            v
        );
        self.edges.insert(edge, (u, v));
        if let Some(incident) = self.nodes.get_mut(&u) {
            incident.push(edge);
        }
        if let Some(incident) = self.nodes.get_mut(&v) {
            incident.push(edge);
        }
    }

    /// Removes an edge. Returns its endpoints, or `None` if it was absent.
    pub fn remove_edge(&mut self, edge: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        let (u, v) = self.edges.remove(&edge)?;
        for end in [u, v] {
            if let Some(incident) = self.nodes.get_mut(&end) {
                incident.retain(|e| *e != edge);
            }
        }
        Some((u, v))
    }

    /// Removes a node together with all its incident edges.
    ///
    /// Returns the removed edges, or `None` if the node was absent.
    pub fn remove_node(&mut self, node: NodeIndex) -> Option<Vec<EdgeIndex>> {
        let incident = self.nodes.get(&node)?.to_vec();
        for &edge in &incident {
            self.remove_edge(edge);
        }
        self.nodes.remove(&node);
        Some(incident)
    }

    /// Iterates over all nodes in increasing id order.
    #[inline]
    pub fn nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.nodes.keys().copied()
    }

    /// Iterates over all edges as `(edge, u, v)` in increasing id order.
    #[inline]
    pub fn edges(&self) -> impl Iterator<Item = (EdgeIndex, NodeIndex, NodeIndex)> + '_ {
        self.edges.iter().map(|(&e, &(u, v))| (e, u, v))
    }

    /// All nodes followed by all edges, as units.
    pub fn units(&self) -> Vec<Unit> {
        self.nodes()
            .map(Unit::Node)
            .chain(self.edges.keys().map(|&e| Unit::Edge(e)))
            .collect()
    }

    #[inline]
    pub fn endpoints(&self, edge: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.edges.get(&edge).copied()
    }

    /// Returns the endpoint of `edge` that is not `node`.
    ///
    /// # Panics
    ///
    /// Panics if `edge` is absent or not incident to `node`.
    pub fn opposite(&self, node: NodeIndex, edge: EdgeIndex) -> NodeIndex {
        match self.edges.get(&edge) {
            Some(&(u, v)) if u == node => v,
            Some(&(u, v)) if v == node => u,
            _ => panic!(
                "called `Graph::opposite` with {} not incident to {}",
                edge, node
            ),
        }
    }

    /// The edges incident to `node`; empty if the node is absent.
    #[inline]
    pub fn edges_of(&self, node: NodeIndex) -> &[EdgeIndex] {
        self.nodes.get(&node).map_or(&[], |incident| incident.as_slice())
    }

    #[inline]
    pub fn degree(&self, node: NodeIndex) -> usize {
        self.edges_of(node).len()
    }

    /// Iterates over `(neighbor, edge)` pairs; a neighbor appears once per
    /// parallel edge.
    pub fn incident(&self, node: NodeIndex) -> impl Iterator<Item = (NodeIndex, EdgeIndex)> + '_ {
        self.edges_of(node)
            .iter()
            .map(move |&e| (self.opposite(node, e), e))
    }

    /// The distinct neighbors of `node`, sorted.
    pub fn neighbors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut out: Vec<NodeIndex> = self.incident(node).map(|(w, _)| w).collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// All edges joining `u` and `v`, sorted.
    pub fn edges_between(&self, u: NodeIndex, v: NodeIndex) -> Vec<EdgeIndex> {
        let mut out: Vec<EdgeIndex> = self
            .incident(u)
            .filter(|&(w, _)| w == v)
            .map(|(_, e)| e)
            .collect();
        out.sort_unstable();
        out
    }

    #[inline]
    pub fn absorption(&self) -> &Absorption {
        &self.absorption
    }

    /// Records that `what` was absorbed into `into`.
    #[inline]
    pub fn absorb(&mut self, into: Unit, what: Unit) {
        self.absorption.absorb(into, what);
    }

    /// Expands units through the absorption records of this graph.
    #[inline]
    pub fn expand<I>(&self, units: I) -> Vec<Unit>
    where
        I: IntoIterator<Item = Unit>,
    {
        self.absorption.expand(units)
    }

    /// The subgraph induced by `nodes`. Ids that are not nodes of this graph
    /// are ignored. The subgraph starts with empty absorption records.
    pub fn subgraph<I>(&self, nodes: I) -> Graph
    where
        I: IntoIterator<Item = NodeIndex>,
    {
        let keep: FxHashSet<NodeIndex> = nodes
            .into_iter()
            .filter(|v| self.nodes.contains_key(v))
            .collect();
        let mut sub = Graph::new();
        let mut sorted: Vec<NodeIndex> = keep.iter().copied().collect();
        sorted.sort_unstable();
        for &v in &sorted {
            sub.add_node(v);
        }
        for (&e, &(u, v)) in &self.edges {
            if keep.contains(&u) && keep.contains(&v) {
                sub.add_edge(e, u, v);
            }
        }
        sub
    }

    /// The subgraph on `nodes` restricted to the given `edges`. Edges whose
    /// endpoints are not both kept are ignored.
    pub fn subgraph_with_edges<N, E>(&self, nodes: N, edges: E) -> Graph
    where
        N: IntoIterator<Item = NodeIndex>,
        E: IntoIterator<Item = EdgeIndex>,
    {
        let mut sub = Graph::new();
        let mut sorted: Vec<NodeIndex> = nodes
            .into_iter()
            .filter(|v| self.nodes.contains_key(v))
            .collect();
        sorted.sort_unstable();
        sorted.dedup();
        for &v in &sorted {
            sub.add_node(v);
        }
        let mut edges: Vec<EdgeIndex> = edges.into_iter().collect();
        edges.sort_unstable();
        edges.dedup();
        for e in edges {
            if let Some(&(u, v)) = self.edges.get(&e) {
                if sub.contains_node(u) && sub.contains_node(v) {
                    sub.add_edge(e, u, v);
                }
            }
        }
        sub
    }

    /// The connected components, each sorted, ordered by smallest node.
    pub fn connected_components(&self) -> Vec<Vec<NodeIndex>> {
        let mut seen: FxHashSet<NodeIndex> = FxHashSet::default();
        let mut components = Vec::new();
        let mut queue = VecDeque::new();
        for start in self.nodes() {
            if !seen.insert(start) {
                continue;
            }
            let mut component = vec![start];
            queue.push_back(start);
            while let Some(v) = queue.pop_front() {
                for (w, _) in self.incident(v) {
                    if seen.insert(w) {
                        component.push(w);
                        queue.push_back(w);
                    }
                }
            }
            component.sort_unstable();
            components.push(component);
        }
        components
    }

    /// Whether `units` form a connected selection: every selected edge has
    /// both endpoints selected and the selected nodes are connected through
    /// selected edges. The empty selection is connected.
    pub fn is_connected_selection(&self, units: &[Unit]) -> bool {
        let nodes: FxHashSet<NodeIndex> = units.iter().filter_map(Unit::as_node).collect();
        let edges: Vec<EdgeIndex> = units.iter().filter_map(Unit::as_edge).collect();
        if nodes.iter().any(|v| !self.contains_node(*v)) {
            return false;
        }
        for &e in &edges {
            match self.endpoints(e) {
                Some((u, v)) if nodes.contains(&u) && nodes.contains(&v) => {}
                _ => return false,
            }
        }
        if nodes.len() <= 1 {
            return true;
        }
        let sub = self.subgraph_with_edges(nodes.iter().copied(), edges);
        sub.connected_components().len() == 1
    }
}

impl std::fmt::Display for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Graph(nodes: {}, edges: {})",
            self.nodes.len(),
            self.edges.len()
        )
    }
}
