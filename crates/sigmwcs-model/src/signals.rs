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

//! Signal groups and distinct-signal scoring.
//!
//! A signal owns one weight and a set of member units. The score of a
//! selection counts every signal touched by the selection exactly once, no
//! matter how many of its members were selected.

use crate::index::SignalIndex;
use crate::unit::Unit;
use fixedbitset::FixedBitSet;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// Signal weights and unit memberships.
///
/// # Examples
///
/// ```
/// use sigmwcs_model::index::{EdgeIndex, NodeIndex};
/// use sigmwcs_model::signals::Signals;
/// use sigmwcs_model::unit::Unit;
///
/// let mut signals = Signals::new();
/// let a = Unit::Node(NodeIndex::new(0));
/// let b = Unit::Edge(EdgeIndex::new(0));
/// let shared = signals.add_unit(a, 5.0);
/// signals.attach(b, shared);
///
/// assert_eq!(signals.unit_weight(b), 5.0);
/// assert_eq!(signals.score([a, b]), 5.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Signals {
    weights: Vec<f64>,
    members: Vec<SmallVec<[Unit; 4]>>,
    memberships: FxHashMap<Unit, SmallVec<[SignalIndex; 2]>>,
}

impl Signals {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of signals.
    #[inline]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Number of units with at least one membership record.
    #[inline]
    pub fn num_units(&self) -> usize {
        self.memberships.len()
    }

    #[inline]
    pub fn contains_unit(&self, unit: Unit) -> bool {
        self.memberships.contains_key(&unit)
    }

    /// Iterates over the units known to this structure, in arbitrary order.
    #[inline]
    pub fn units(&self) -> impl Iterator<Item = Unit> + '_ {
        self.memberships.keys().copied()
    }

    /// Creates an empty signal.
    ///
    /// # Panics
    ///
    /// Panics if `weight` is not finite.
    pub fn add_signal(&mut self, weight: f64) -> SignalIndex {
        assert!(
            weight.is_finite(),
            "called `Signals::add_signal` with non-finite weight {}",
            weight
        );
        self.weights.push(weight);
        self.members.push(SmallVec::new());
        SignalIndex::new(self.weights.len() - 1)
    }

    /// Creates a fresh signal of weight `weight` whose only member is `unit`.
    pub fn add_unit(&mut self, unit: Unit, weight: f64) -> SignalIndex {
        let signal = self.add_signal(weight);
        self.attach(unit, signal);
        signal
    }

    /// Makes `unit` a member of `signal`. Attaching twice has no effect.
    ///
    /// # Panics
    ///
    /// Panics if `signal` is out of bounds.
    pub fn attach(&mut self, unit: Unit, signal: SignalIndex) {
        assert!(
            signal.get() < self.len(),
            "called `Signals::attach` with out-of-bounds {} (len {})",
            signal,
            self.len()
        );
        let list = self.memberships.entry(unit).or_default();
        if list.contains(&signal) {
            return;
        }
        list.push(signal);
        self.members[signal.get()].push(unit);
    }

    #[inline]
    pub fn weight(&self, signal: SignalIndex) -> f64 {
        debug_assert!(signal.get() < self.len());
        self.weights[signal.get()]
    }

    /// # Panics
    ///
    /// Panics if `weight` is not finite.
    #[inline]
    pub fn set_weight(&mut self, signal: SignalIndex, weight: f64) {
        assert!(
            weight.is_finite(),
            "called `Signals::set_weight` with non-finite weight {}",
            weight
        );
        self.weights[signal.get()] = weight;
    }

    /// The current members of `signal`.
    #[inline]
    pub fn members(&self, signal: SignalIndex) -> &[Unit] {
        &self.members[signal.get()]
    }

    /// The signals `unit` belongs to; empty for unknown units.
    #[inline]
    pub fn signals_of(&self, unit: Unit) -> &[SignalIndex] {
        self.memberships.get(&unit).map_or(&[], |l| l.as_slice())
    }

    /// Sum of the weights of the signals of `unit`.
    pub fn unit_weight(&self, unit: Unit) -> f64 {
        self.signals_of(unit).iter().map(|&s| self.weight(s)).sum()
    }

    /// Sum of the negative weights among the signals of `unit`.
    pub fn negative_part_of(&self, unit: Unit) -> f64 {
        self.signals_of(unit)
            .iter()
            .map(|&s| self.weight(s))
            .filter(|w| *w < 0.0)
            .sum()
    }

    /// Whether every signal of `unit` has `unit` as its only member.
    pub fn is_exclusive(&self, unit: Unit) -> bool {
        self.signals_of(unit)
            .iter()
            .all(|&s| self.members[s.get()].len() == 1)
    }

    /// Folds `what` into `with`: every signal of `what` now contains `with`
    /// instead, and `what` disappears.
    pub fn join(&mut self, what: Unit, with: Unit) {
        if what == with {
            return;
        }
        let Some(moved) = self.memberships.remove(&what) else {
            return;
        };
        for signal in moved {
            let members = &mut self.members[signal.get()];
            members.retain(|u| *u != what);
            self.attach(with, signal);
        }
    }

    /// Drops every membership of `unit`. Signals stay, possibly empty.
    pub fn remove(&mut self, unit: Unit) {
        if let Some(list) = self.memberships.remove(&unit) {
            for signal in list {
                self.members[signal.get()].retain(|u| *u != unit);
            }
        }
    }

    /// The view on `units`: memberships of other units are dropped, as are
    /// signals left without members. Signal order is preserved and indices
    /// are renumbered densely.
    pub fn restrict<I>(&self, units: I) -> Signals
    where
        I: IntoIterator<Item = Unit>,
    {
        let keep: FxHashSet<Unit> = units.into_iter().collect();
        let mut view = Signals::new();
        for (index, members) in self.members.iter().enumerate() {
            let mut kept = members.iter().filter(|u| keep.contains(u)).peekable();
            if kept.peek().is_none() {
                continue;
            }
            let signal = view.add_signal(self.weights[index]);
            for &unit in kept {
                view.attach(unit, signal);
            }
        }
        view
    }

    fn touched<I>(&self, units: I) -> FixedBitSet
    where
        I: IntoIterator<Item = Unit>,
    {
        let mut seen = FixedBitSet::with_capacity(self.len());
        for unit in units {
            for &signal in self.signals_of(unit) {
                seen.insert(signal.get());
            }
        }
        seen
    }

    /// The objective value of `units`: the sum of the weights of the
    /// distinct signals they touch.
    pub fn score<I>(&self, units: I) -> f64
    where
        I: IntoIterator<Item = Unit>,
    {
        self.touched(units).ones().map(|s| self.weights[s]).sum()
    }

    /// Sum of the distinct positive signal weights touched by `units`.
    pub fn positive_sum<I>(&self, units: I) -> f64
    where
        I: IntoIterator<Item = Unit>,
    {
        self.touched(units)
            .ones()
            .map(|s| self.weights[s])
            .filter(|w| *w > 0.0)
            .sum()
    }

    /// Sum of the distinct negative signal weights touched by `units`.
    pub fn negative_sum<I>(&self, units: I) -> f64
    where
        I: IntoIterator<Item = Unit>,
    {
        self.touched(units)
            .ones()
            .map(|s| self.weights[s])
            .filter(|w| *w < 0.0)
            .sum()
    }

    /// Adds `delta` to the weight of every edge. Exclusive edge signals are
    /// adjusted in place; shared edges get a dedicated extra signal.
    pub fn add_edge_penalty(&mut self, delta: f64) {
        let mut edges: Vec<Unit> = self.units().filter(Unit::is_edge).collect();
        edges.sort_unstable();
        for unit in edges {
            match self.signals_of(unit).first().copied() {
                Some(first) if self.is_exclusive(unit) => {
                    let weight = self.weight(first) + delta;
                    self.set_weight(first, weight);
                }
                _ => {
                    self.add_unit(unit, delta);
                }
            }
        }
    }
}

impl std::fmt::Display for Signals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Signals(signals: {}, units: {})",
            self.weights.len(),
            self.memberships.len()
        )
    }
}
