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

//! Balancing root selection
//!
//! Removing a cut vertex splits a connected graph into one piece per block
//! incident to it. The balancing root is the cut vertex whose largest piece
//! is smallest, which keeps the remainder pieces that are queued again as
//! even as the block structure allows.
//!
//! The block-cut tree is rooted at the first block. A block weighs its
//! non-cut vertices and a cut vertex weighs one, so the subtree weight below
//! a block is exactly the size of the piece hanging off its parent cut
//! vertex. The piece towards the tree root is whatever is left.

use rustc_hash::FxHashMap;
use sigmwcs_model::{blocks::BlockCutTree, graph::Graph, index::NodeIndex};

/// The cut vertex of the connected `graph` minimizing its largest piece,
/// ties broken by the smallest index. `None` if `graph` has no cut vertex.
pub fn balancing_root(graph: &Graph, tree: &BlockCutTree) -> Option<NodeIndex> {
    let cuts = tree.cut_vertices();
    if cuts.is_empty() {
        return None;
    }
    let num_blocks = tree.num_blocks();
    let cut_slot: FxHashMap<NodeIndex, usize> = cuts
        .iter()
        .enumerate()
        .map(|(i, &c)| (c, num_blocks + i))
        .collect();

    // Tree slots: blocks first, then cut vertices.
    let size = num_blocks + cuts.len();
    let mut weight = vec![1usize; size];
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); size];
    for (b, nodes) in tree.blocks().iter().enumerate() {
        let cut_vertices = tree.cut_vertices_of(b.into());
        weight[b] = nodes.len() - cut_vertices.len();
        for c in cut_vertices {
            let slot = cut_slot[c];
            adjacency[b].push(slot);
            adjacency[slot].push(b);
        }
    }

    let mut parent = vec![usize::MAX; size];
    let mut order = Vec::with_capacity(size);
    let mut stack = vec![0usize];
    parent[0] = 0;
    while let Some(slot) = stack.pop() {
        order.push(slot);
        for &next in &adjacency[slot] {
            if parent[next] == usize::MAX {
                parent[next] = slot;
                stack.push(next);
            }
        }
    }

    let mut subtree = weight;
    for &slot in order.iter().skip(1).rev() {
        subtree[parent[slot]] += subtree[slot];
    }

    let total = graph.num_nodes();
    let mut best: Option<(usize, NodeIndex)> = None;
    for (i, &cut) in cuts.iter().enumerate() {
        let slot = num_blocks + i;
        let mut below = 0usize;
        let mut largest = 0usize;
        for &next in &adjacency[slot] {
            if next != parent[slot] {
                below += subtree[next];
                largest = largest.max(subtree[next]);
            }
        }
        let rest = total.saturating_sub(below + 1);
        largest = largest.max(rest);

        // Cut vertices are sorted, so a strict comparison keeps the smallest.
        if best.is_none_or(|(value, _)| largest < value) {
            best = Some((largest, cut));
        }
    }

    if let Some((largest, root)) = best {
        tracing::debug!(
            %root,
            largest_piece = largest,
            vertices = total,
            "balancing root selected"
        );
    }
    best.map(|(_, root)| root)
}
