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

use crate::graph::Graph;
use crate::index::{EdgeIndex, NodeIndex};
use crate::signals::Signals;
use crate::unit::Unit;

/// A set of selected units together with its score.
///
/// The units are kept sorted and free of duplicates. A selection is only
/// meaningful relative to a graph; use [`Selection::is_connected_in`] to
/// verify it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    units: Vec<Unit>,
    score: f64,
}

impl Selection {
    /// The empty selection, which scores zero.
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a selection and scores it against `signals`.
    pub fn new<I>(units: I, signals: &Signals) -> Self
    where
        I: IntoIterator<Item = Unit>,
    {
        let mut units: Vec<Unit> = units.into_iter().collect();
        units.sort_unstable();
        units.dedup();
        let score = signals.score(units.iter().copied());
        Self { units, score }
    }

    #[inline]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    #[inline]
    pub fn into_units(self) -> Vec<Unit> {
        self.units
    }

    #[inline]
    pub fn score(&self) -> f64 {
        self.score
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.units.iter().filter_map(Unit::as_node)
    }

    pub fn edges(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.units.iter().filter_map(Unit::as_edge)
    }

    #[inline]
    pub fn contains(&self, unit: Unit) -> bool {
        self.units.binary_search(&unit).is_ok()
    }

    /// Whether the selection is a connected subgraph of `graph`.
    #[inline]
    pub fn is_connected_in(&self, graph: &Graph) -> bool {
        graph.is_connected_selection(&self.units)
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Selection(units: {}, score: {})",
            self.units.len(),
            self.score
        )
    }
}
