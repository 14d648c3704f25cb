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

//! # Block-Cut Decomposition
//!
//! Splits a graph into its blocks (maximal biconnected pieces) and cut
//! vertices in a single depth-first search.
//!
//! ## Motivation
//!
//! Connectivity inside a block never depends on anything outside of it, and
//! two blocks only ever meet in a cut vertex. The solver exploits this to
//! break an instance at a well-chosen cut vertex into independent rooted and
//! unrooted pieces, and to install connectivity cuts per block.
//!
//! ## Highlights
//!
//! * **Iterative**: The DFS runs on an explicit frame stack, so paths of any
//!   length are handled without touching the thread stack.
//! * **Multigraph-aware**: Only the tree edge itself is skipped when looking
//!   for back edges; a parallel edge to the parent counts as a back edge.
//! * **Edge partition**: Every edge ends up in exactly one block, and blocks
//!   record their edges as well as their nodes.
//!
//! ## Usage
//!
//! ```
//! use sigmwcs_model::blocks::BlockCutTree;
//! use sigmwcs_model::graph::Graph;
//! use sigmwcs_model::index::{EdgeIndex, NodeIndex};
//!
//! // Two triangles sharing node 2.
//! let mut g = Graph::new();
//! for i in 0..5 {
//!     g.add_node(NodeIndex::new(i));
//! }
//! let pairs = [(0, 1), (1, 2), (2, 0), (2, 3), (3, 4), (4, 2)];
//! for (id, (u, v)) in pairs.into_iter().enumerate() {
//!     g.add_edge(EdgeIndex::new(id), NodeIndex::new(u), NodeIndex::new(v));
//! }
//!
//! let tree = BlockCutTree::new(&g);
//! assert_eq!(tree.num_blocks(), 2);
//! assert_eq!(tree.cut_vertices(), &[NodeIndex::new(2)]);
//! ```

use crate::graph::Graph;
use crate::index::{BlockIndex, EdgeIndex, NodeIndex};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

const UNVISITED: usize = usize::MAX;

#[derive(Debug, Clone, Copy)]
struct Frame {
    node: usize,
    parent_edge: Option<EdgeIndex>,
    next: usize,
}

/// The blocks and cut vertices of a graph plus their incidence.
#[derive(Debug, Clone, Default)]
pub struct BlockCutTree {
    blocks: Vec<Vec<NodeIndex>>,
    block_edges: Vec<Vec<EdgeIndex>>,
    cut_vertices: Vec<NodeIndex>,
    block_cut_vertices: Vec<Vec<NodeIndex>>,
    cut_vertex_blocks: FxHashMap<NodeIndex, Vec<BlockIndex>>,
    node_blocks: FxHashMap<NodeIndex, SmallVec<[BlockIndex; 2]>>,
}

impl BlockCutTree {
    /// Decomposes `graph`. Each connected component is handled separately;
    /// an isolated node forms a block of its own.
    pub fn new(graph: &Graph) -> Self {
        let nodes: Vec<NodeIndex> = graph.nodes().collect();
        let n = nodes.len();
        let local: FxHashMap<NodeIndex, usize> =
            nodes.iter().enumerate().map(|(i, &v)| (v, i)).collect();

        let mut disc = vec![UNVISITED; n];
        let mut low = vec![0usize; n];
        let mut is_cut = vec![false; n];
        let mut time = 0usize;

        let mut frames: Vec<Frame> = Vec::new();
        let mut edge_stack: Vec<EdgeIndex> = Vec::new();
        let mut raw_blocks: Vec<(Vec<NodeIndex>, Vec<EdgeIndex>)> = Vec::new();

        for start in 0..n {
            if disc[start] != UNVISITED {
                continue;
            }
            disc[start] = time;
            low[start] = time;
            time += 1;
            if graph.degree(nodes[start]) == 0 {
                raw_blocks.push((vec![nodes[start]], Vec::new()));
                continue;
            }

            let mut root_children = 0usize;
            frames.push(Frame {
                node: start,
                parent_edge: None,
                next: 0,
            });

            while let Some(frame) = frames.last_mut() {
                let v = frame.node;
                let incident = graph.edges_of(nodes[v]);
                if frame.next < incident.len() {
                    let edge = incident[frame.next];
                    frame.next += 1;
                    if frame.parent_edge == Some(edge) {
                        continue;
                    }
                    let w = local[&graph.opposite(nodes[v], edge)];
                    if disc[w] == UNVISITED {
                        edge_stack.push(edge);
                        disc[w] = time;
                        low[w] = time;
                        time += 1;
                        frames.push(Frame {
                            node: w,
                            parent_edge: Some(edge),
                            next: 0,
                        });
                    } else if disc[w] < disc[v] {
                        // Back edge to an ancestor; seen once from below.
                        edge_stack.push(edge);
                        low[v] = low[v].min(disc[w]);
                    }
                    continue;
                }

                let finished = *frame;
                frames.pop();
                let Some(parent) = frames.last() else {
                    break;
                };
                let p = parent.node;
                low[p] = low[p].min(low[v]);
                if low[v] < disc[p] {
                    continue;
                }

                let mut block_edges = Vec::new();
                while let Some(edge) = edge_stack.pop() {
                    block_edges.push(edge);
                    if Some(edge) == finished.parent_edge {
                        break;
                    }
                }
                let mut block_nodes = Vec::with_capacity(block_edges.len() + 1);
                for &edge in &block_edges {
                    if let Some((a, b)) = graph.endpoints(edge) {
                        block_nodes.push(a);
                        block_nodes.push(b);
                    }
                }
                block_nodes.sort_unstable();
                block_nodes.dedup();
                block_edges.sort_unstable();
                raw_blocks.push((block_nodes, block_edges));

                if frames.len() == 1 {
                    root_children += 1;
                } else {
                    is_cut[p] = true;
                }
            }
            if root_children >= 2 {
                is_cut[start] = true;
            }
        }

        let cut_vertices: Vec<NodeIndex> = (0..n)
            .filter(|&i| is_cut[i])
            .map(|i| nodes[i])
            .collect();

        let mut tree = BlockCutTree {
            blocks: Vec::with_capacity(raw_blocks.len()),
            block_edges: Vec::with_capacity(raw_blocks.len()),
            cut_vertices,
            block_cut_vertices: Vec::with_capacity(raw_blocks.len()),
            cut_vertex_blocks: FxHashMap::default(),
            node_blocks: FxHashMap::default(),
        };

        for (index, (block_nodes, block_edges)) in raw_blocks.into_iter().enumerate() {
            let block = BlockIndex::new(index);
            let mut cuts = Vec::new();
            for &v in &block_nodes {
                tree.node_blocks.entry(v).or_default().push(block);
                if is_cut[local[&v]] {
                    cuts.push(v);
                    tree.cut_vertex_blocks.entry(v).or_default().push(block);
                }
            }
            tree.blocks.push(block_nodes);
            tree.block_edges.push(block_edges);
            tree.block_cut_vertices.push(cuts);
        }
        tree
    }

    #[inline]
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// All blocks as sorted node lists.
    #[inline]
    pub fn blocks(&self) -> &[Vec<NodeIndex>] {
        &self.blocks
    }

    /// The sorted nodes of `block`.
    #[inline]
    pub fn block(&self, block: BlockIndex) -> &[NodeIndex] {
        &self.blocks[block.get()]
    }

    /// The sorted edges of `block`.
    #[inline]
    pub fn block_edges(&self, block: BlockIndex) -> &[EdgeIndex] {
        &self.block_edges[block.get()]
    }

    /// All cut vertices, sorted.
    #[inline]
    pub fn cut_vertices(&self) -> &[NodeIndex] {
        &self.cut_vertices
    }

    #[inline]
    pub fn is_cut_vertex(&self, node: NodeIndex) -> bool {
        self.cut_vertex_blocks.contains_key(&node)
    }

    /// The cut vertices contained in `block`, sorted.
    #[inline]
    pub fn cut_vertices_of(&self, block: BlockIndex) -> &[NodeIndex] {
        &self.block_cut_vertices[block.get()]
    }

    /// The blocks meeting at the cut vertex `cut`; empty for other nodes.
    #[inline]
    pub fn incident_blocks(&self, cut: NodeIndex) -> &[BlockIndex] {
        self.cut_vertex_blocks
            .get(&cut)
            .map_or(&[], |blocks| blocks.as_slice())
    }

    /// Every block containing `node`.
    #[inline]
    pub fn blocks_of(&self, node: NodeIndex) -> &[BlockIndex] {
        self.node_blocks
            .get(&node)
            .map_or(&[], |blocks| blocks.as_slice())
    }

    /// Some block containing `node`, or `None` for unknown nodes.
    #[inline]
    pub fn block_of(&self, node: NodeIndex) -> Option<BlockIndex> {
        self.blocks_of(node).first().copied()
    }
}

impl std::fmt::Display for BlockCutTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BlockCutTree(blocks: {}, cut vertices: {})",
            self.blocks.len(),
            self.cut_vertices.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeSet;

    fn n(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    fn build(num_nodes: usize, pairs: &[(usize, usize)]) -> Graph {
        let mut g = Graph::new();
        for i in 0..num_nodes {
            g.add_node(n(i));
        }
        for (id, &(u, v)) in pairs.iter().enumerate() {
            g.add_edge(EdgeIndex::new(id), n(u), n(v));
        }
        g
    }

    fn random_connected(rng: &mut StdRng, num_nodes: usize) -> Graph {
        let mut pairs = Vec::new();
        for v in 1..num_nodes {
            pairs.push((rng.random_range(0..v), v));
        }
        if num_nodes >= 2 {
            let extra = rng.random_range(0..=num_nodes);
            for _ in 0..extra {
                let u = rng.random_range(0..num_nodes);
                let v = rng.random_range(0..num_nodes);
                if u != v {
                    pairs.push((u, v));
                }
            }
        }
        build(num_nodes, &pairs)
    }

    /// Component label of every node of `graph` with `removed` deleted.
    fn labels_without(graph: &Graph, removed: NodeIndex) -> FxHashMap<NodeIndex, usize> {
        let sub = graph.subgraph(graph.nodes().filter(|&v| v != removed));
        let mut labels = FxHashMap::default();
        for (label, component) in sub.connected_components().into_iter().enumerate() {
            for v in component {
                labels.insert(v, label);
            }
        }
        labels
    }

    /// Textbook check: two edges share a block iff no single node removal
    /// separates their remaining endpoints.
    fn reference_edge_blocks(graph: &Graph) -> BTreeSet<Vec<EdgeIndex>> {
        let edges: Vec<(EdgeIndex, NodeIndex, NodeIndex)> = graph.edges().collect();
        let removals: Vec<(NodeIndex, FxHashMap<NodeIndex, usize>)> = graph
            .nodes()
            .map(|x| (x, labels_without(graph, x)))
            .collect();

        let m = edges.len();
        let mut sets = sigmwcs_core::algorithm::dsu::DisjointSets::new(m);
        for i in 0..m {
            for j in (i + 1)..m {
                let (_, a, b) = edges[i];
                let (_, c, d) = edges[j];
                let separated = removals.iter().any(|(x, labels)| {
                    let left = if a != *x { a } else { b };
                    let right = if c != *x { c } else { d };
                    labels[&left] != labels[&right]
                });
                if !separated {
                    sets.union(i, j);
                }
            }
        }
        let mut groups: FxHashMap<usize, Vec<EdgeIndex>> = FxHashMap::default();
        for (i, &(e, _, _)) in edges.iter().enumerate() {
            groups.entry(sets.find(i)).or_default().push(e);
        }
        groups
            .into_values()
            .map(|mut g| {
                g.sort_unstable();
                g
            })
            .collect()
    }

    fn reference_cut_vertices(graph: &Graph) -> Vec<NodeIndex> {
        let base = graph.connected_components().len();
        graph
            .nodes()
            .filter(|&x| {
                let sub = graph.subgraph(graph.nodes().filter(|&v| v != x));
                let isolated = graph.degree(x) == 0;
                let after = sub.connected_components().len();
                !isolated && after > base
            })
            .collect()
    }

    #[test]
    fn test_single_node_is_one_block() {
        let g = build(1, &[]);
        let tree = BlockCutTree::new(&g);
        assert_eq!(tree.num_blocks(), 1);
        assert_eq!(tree.block(BlockIndex::new(0)), &[n(0)]);
        assert!(tree.cut_vertices().is_empty());
        assert_eq!(tree.block_of(n(0)), Some(BlockIndex::new(0)));
    }

    #[test]
    fn test_cycle_is_one_block() {
        let g = build(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
        let tree = BlockCutTree::new(&g);
        assert_eq!(tree.num_blocks(), 1);
        assert_eq!(tree.block(BlockIndex::new(0)), &[n(0), n(1), n(2), n(3)]);
        assert!(tree.cut_vertices().is_empty());
    }

    #[test]
    fn test_path_blocks_are_edges() {
        let g = build(4, &[(0, 1), (1, 2), (2, 3)]);
        let tree = BlockCutTree::new(&g);
        assert_eq!(tree.num_blocks(), 3);
        assert_eq!(tree.cut_vertices(), &[n(1), n(2)]);
        assert_eq!(tree.incident_blocks(n(1)).len(), 2);
        assert!(tree.incident_blocks(n(0)).is_empty());
        assert!(!tree.is_cut_vertex(n(3)));
    }

    #[test]
    fn test_root_with_single_child_is_not_cut() {
        // DFS starts at node 0, which has one DFS child.
        let g = build(3, &[(0, 1), (1, 2)]);
        let tree = BlockCutTree::new(&g);
        assert_eq!(tree.cut_vertices(), &[n(1)]);
    }

    #[test]
    fn test_root_with_two_children_is_cut() {
        let g = build(3, &[(0, 1), (0, 2)]);
        let tree = BlockCutTree::new(&g);
        assert_eq!(tree.cut_vertices(), &[n(0)]);
        for b in 0..tree.num_blocks() {
            assert_eq!(tree.cut_vertices_of(BlockIndex::new(b)), &[n(0)]);
        }
    }

    #[test]
    fn test_parallel_edges_form_one_block() {
        let g = build(3, &[(0, 1), (1, 0), (1, 2)]);
        let tree = BlockCutTree::new(&g);
        assert_eq!(tree.num_blocks(), 2);
        let first = tree.block_of(n(0)).unwrap();
        assert_eq!(
            tree.block_edges(first),
            &[EdgeIndex::new(0), EdgeIndex::new(1)]
        );
        assert_eq!(tree.cut_vertices(), &[n(1)]);
    }

    #[test]
    fn test_deep_path_does_not_overflow() {
        let len = 100_000;
        let pairs: Vec<(usize, usize)> = (1..len).map(|i| (i - 1, i)).collect();
        let g = build(len, &pairs);
        let tree = BlockCutTree::new(&g);
        assert_eq!(tree.num_blocks(), len - 1);
        assert_eq!(tree.cut_vertices().len(), len - 2);
    }

    #[test]
    fn test_matches_reference_on_random_graphs() {
        let mut rng = StdRng::seed_from_u64(0xB10C);
        for _ in 0..150 {
            let num_nodes = rng.random_range(1..=20);
            let g = random_connected(&mut rng, num_nodes);
            let tree = BlockCutTree::new(&g);

            assert_eq!(tree.cut_vertices(), reference_cut_vertices(&g).as_slice());

            let ours: BTreeSet<Vec<EdgeIndex>> = (0..tree.num_blocks())
                .map(|b| tree.block_edges(BlockIndex::new(b)).to_vec())
                .filter(|edges| !edges.is_empty())
                .collect();
            assert_eq!(ours, reference_edge_blocks(&g));
        }
    }

    #[test]
    fn test_block_invariants_on_random_graphs() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let num_nodes = rng.random_range(1..=20);
            let g = random_connected(&mut rng, num_nodes);
            let tree = BlockCutTree::new(&g);

            let mut seen = BTreeSet::new();
            for b in 0..tree.num_blocks() {
                for &e in tree.block_edges(BlockIndex::new(b)) {
                    assert!(seen.insert(e), "edge {} in two blocks", e);
                }
            }
            assert_eq!(seen.len(), g.num_edges());

            for v in g.nodes() {
                let count = tree.blocks_of(v).len();
                assert!(count >= 1);
                assert_eq!(tree.is_cut_vertex(v), count >= 2);
                assert_eq!(tree.incident_blocks(v).len(), if count >= 2 { count } else { 0 });
            }
        }
    }
}
