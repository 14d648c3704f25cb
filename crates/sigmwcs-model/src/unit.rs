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

//! Units and absorption tracking.
//!
//! A `Unit` is the atom of a selection: either a node or an edge. Reduction
//! passes may fold units into one another (for example, contracting a chain
//! into a single edge); `Absorption` remembers those merges so a solution over
//! the reduced graph can be expanded back to the original units.

use crate::index::{EdgeIndex, NodeIndex};
use rustc_hash::FxHashMap;
use sigmwcs_core::algorithm::dsu::DisjointSets;

/// A node or an edge of a graph.
///
/// Units order nodes before edges, then by index.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Unit {
    Node(NodeIndex),
    Edge(EdgeIndex),
}

impl Unit {
    #[inline]
    pub fn is_node(&self) -> bool {
        matches!(self, Unit::Node(_))
    }

    #[inline]
    pub fn is_edge(&self) -> bool {
        matches!(self, Unit::Edge(_))
    }

    #[inline]
    pub fn as_node(&self) -> Option<NodeIndex> {
        match self {
            Unit::Node(v) => Some(*v),
            Unit::Edge(_) => None,
        }
    }

    #[inline]
    pub fn as_edge(&self) -> Option<EdgeIndex> {
        match self {
            Unit::Node(_) => None,
            Unit::Edge(e) => Some(*e),
        }
    }
}

impl From<NodeIndex> for Unit {
    #[inline]
    fn from(value: NodeIndex) -> Self {
        Unit::Node(value)
    }
}

impl From<EdgeIndex> for Unit {
    #[inline]
    fn from(value: EdgeIndex) -> Self {
        Unit::Edge(value)
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unit::Node(v) => write!(f, "{}", v),
            Unit::Edge(e) => write!(f, "{}", e),
        }
    }
}

/// Records which units have been absorbed into which.
///
/// Absorption is transitive and symmetric in the sense of a union-find: once
/// two units are merged, expanding either one yields both. Units that were
/// never mentioned are implicitly their own singleton group.
#[derive(Debug, Clone, Default)]
pub struct Absorption {
    slots: FxHashMap<Unit, usize>,
    units: Vec<Unit>,
    sets: DisjointSets,
    members: Vec<Vec<usize>>,
}

impl Absorption {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of units that take part in at least one absorption.
    #[inline]
    pub fn num_tracked(&self) -> usize {
        self.units.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    fn slot(&mut self, unit: Unit) -> usize {
        if let Some(&slot) = self.slots.get(&unit) {
            return slot;
        }
        let slot = self.sets.push();
        debug_assert_eq!(slot, self.units.len());
        self.slots.insert(unit, slot);
        self.units.push(unit);
        self.members.push(vec![slot]);
        slot
    }

    /// Absorbs `what` into `into`, merging their groups.
    pub fn absorb(&mut self, into: Unit, what: Unit) {
        let a = self.slot(into);
        let b = self.slot(what);
        let ra = self.sets.find(a);
        let rb = self.sets.find(b);
        if ra == rb {
            return;
        }
        let root = self.sets.union(ra, rb);
        let other = if root == ra { rb } else { ra };
        let moved = std::mem::take(&mut self.members[other]);
        self.members[root].extend(moved);
    }

    /// The unit standing for the whole group of `unit`.
    pub fn representative(&self, unit: Unit) -> Unit {
        match self.slots.get(&unit) {
            None => unit,
            Some(&slot) => self.units[self.sets.find_immutable(slot)],
        }
    }

    /// Whether `unit` shares its group with at least one other unit.
    pub fn is_absorbed(&self, unit: Unit) -> bool {
        self.slots.get(&unit).is_some_and(|&slot| {
            let root = self.sets.find_immutable(slot);
            self.members[root].len() > 1
        })
    }

    /// Returns every unit in the group of `unit`, including `unit` itself.
    pub fn members_of(&self, unit: Unit) -> Vec<Unit> {
        match self.slots.get(&unit) {
            None => vec![unit],
            Some(&slot) => {
                let root = self.sets.find_immutable(slot);
                let mut out: Vec<Unit> = self.members[root]
                    .iter()
                    .map(|&s| self.units[s])
                    .collect();
                out.sort_unstable();
                out
            }
        }
    }

    /// Expands a set of units to the sorted, duplicate-free union of their
    /// groups.
    pub fn expand<I>(&self, units: I) -> Vec<Unit>
    where
        I: IntoIterator<Item = Unit>,
    {
        let mut out = Vec::new();
        for unit in units {
            match self.slots.get(&unit) {
                None => out.push(unit),
                Some(&slot) => {
                    let root = self.sets.find_immutable(slot);
                    out.extend(self.members[root].iter().map(|&s| self.units[s]));
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Copies the absorption records of `other` into `self`.
    pub fn merge_from(&mut self, other: &Absorption) {
        for (slot, members) in other.members.iter().enumerate() {
            let Some(&first) = members.first() else {
                continue;
            };
            debug_assert_eq!(other.sets.find_immutable(slot), slot);
            let head = other.units[first];
            for &m in &members[1..] {
                self.absorb(head, other.units[m]);
            }
        }
    }
}

impl std::fmt::Display for Absorption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let groups = self.members.iter().filter(|m| m.len() > 1).count();
        write!(
            f,
            "Absorption(tracked: {}, groups: {})",
            self.units.len(),
            groups
        )
    }
}
