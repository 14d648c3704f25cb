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

//! # Time-Budget Tree
//!
//! A `TimeLimit` is a node in a tree of nested wall-clock budgets, measured
//! in seconds. The root holds the global budget; `sub_limit(fraction)`
//! carves out a child whose budget is that fraction of the parent's
//! *current* remaining time; `spend(secs)` charges a node and every one of
//! its ancestors.
//!
//! ## Motivation
//!
//! The orchestrator splits one deadline over many subproblems that run
//! concurrently on a worker pool. Each worker owns a leaf, spends what it
//! actually used, and the root ends up charged with the total.
//!
//! ## Highlights
//!
//! * **Shared ownership**: Nodes are reference-counted and point to their
//!   parent, so a leaf can outlive the scope that created it.
//! * **Lock-free**: Remaining time is an `f64` stored as bits in an
//!   `AtomicU64` and updated with a compare-and-swap loop.
//! * **Never throws on overrun**: Spending may drive the remaining time
//!   negative. Callers treat a non-positive value as expired.
//!
//! ## Usage
//!
//! ```
//! use sigmwcs_search::time_limit::TimeLimit;
//!
//! let root = TimeLimit::new(10.0);
//! let child = root.sub_limit(0.5);
//! assert_eq!(child.remaining(), 5.0);
//!
//! child.spend(2.0);
//! assert_eq!(child.remaining(), 3.0);
//! assert_eq!(root.remaining(), 8.0);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug)]
struct Node {
    remaining: AtomicU64,
    parent: Option<Arc<Node>>,
}

impl Node {
    #[inline]
    fn remaining(&self) -> f64 {
        f64::from_bits(self.remaining.load(Ordering::Acquire))
    }

    #[inline]
    fn charge(&self, secs: f64) {
        // The closure never returns `None`, so the update cannot fail.
        let _ = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                Some((f64::from_bits(bits) - secs).to_bits())
            });
    }
}

/// A node of the time-budget tree. Cloning yields another handle to the
/// same node.
#[derive(Debug, Clone)]
pub struct TimeLimit {
    node: Arc<Node>,
}

impl TimeLimit {
    /// Creates a root budget of `total` seconds. `f64::INFINITY` is allowed.
    ///
    /// # Panics
    ///
    /// Panics if `total` is negative or NaN.
    pub fn new(total: f64) -> Self {
        assert!(
            total >= 0.0,
            "called `TimeLimit::new` with invalid total {}",
            total
        );
        Self {
            node: Arc::new(Node {
                remaining: AtomicU64::new(total.to_bits()),
                parent: None,
            }),
        }
    }

    /// A root budget that never expires.
    #[inline]
    pub fn unlimited() -> Self {
        Self::new(f64::INFINITY)
    }

    #[inline]
    pub fn from_duration(total: Duration) -> Self {
        Self::new(total.as_secs_f64())
    }

    /// Creates a child whose budget is `fraction` of this node's current
    /// remaining time.
    ///
    /// # Panics
    ///
    /// Panics unless `0 < fraction <= 1`.
    pub fn sub_limit(&self, fraction: f64) -> TimeLimit {
        assert!(
            fraction > 0.0 && fraction <= 1.0,
            "called `TimeLimit::sub_limit` with fraction {} outside (0, 1]",
            fraction
        );
        let budget = self.remaining() * fraction;
        TimeLimit {
            node: Arc::new(Node {
                remaining: AtomicU64::new(budget.to_bits()),
                parent: Some(Arc::clone(&self.node)),
            }),
        }
    }

    /// Deducts `secs` from this node and all of its ancestors.
    ///
    /// # Panics
    ///
    /// Panics if `secs` is negative or NaN.
    pub fn spend(&self, secs: f64) {
        assert!(
            secs >= 0.0,
            "called `TimeLimit::spend` with invalid amount {}",
            secs
        );
        let mut current = Some(&self.node);
        while let Some(node) = current {
            node.charge(secs);
            current = node.parent.as_ref();
        }
    }

    #[inline]
    pub fn spend_duration(&self, elapsed: Duration) {
        self.spend(elapsed.as_secs_f64());
    }

    /// The remaining time of this node in seconds; may be negative.
    #[inline]
    pub fn remaining(&self) -> f64 {
        self.node.remaining()
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.remaining() <= 0.0
    }

    #[inline]
    pub fn is_unlimited(&self) -> bool {
        self.remaining() == f64::INFINITY
    }

    /// The remaining time as a `Duration`, or `None` if unlimited. An expired
    /// budget yields `Duration::ZERO`.
    pub fn remaining_duration(&self) -> Option<Duration> {
        let secs = self.remaining();
        if secs == f64::INFINITY {
            return None;
        }
        Some(Duration::from_secs_f64(secs.max(0.0)))
    }

    /// Number of ancestors of this node.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.node.parent.as_ref();
        while let Some(node) = current {
            depth += 1;
            current = node.parent.as_ref();
        }
        depth
    }
}

impl std::fmt::Display for TimeLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TimeLimit(remaining: {:.3}s, depth: {})",
            self.remaining(),
            self.depth()
        )
    }
}
