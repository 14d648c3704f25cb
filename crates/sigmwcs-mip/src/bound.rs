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

//! Objective bound sharing for branch-and-cut
//!
//! Declares `ObjectiveBound`, the interface through which a session reads the
//! best objective known elsewhere and publishes its own incumbents.
//!
//! Implementations
//! - `NoSharedBound`: local only. `shared_bound()` is `-inf` and
//!   `on_solution_found` is a no-op.
//! - `SharedBoundAdapter<'a>`: wraps `sigmwcs_search::bound::SharedLowerBound`;
//!   reads mirror the shared value and new incumbents try to raise it.
//!
//! The engine maximizes, so a shared value is a lower bound on the optimum
//! and any node whose relaxation falls below it can be dropped.

use sigmwcs_search::bound::SharedLowerBound;

/// Access to a lower bound on the objective that may be shared with other
/// solver instances.
pub trait ObjectiveBound {
    /// Returns the best objective known outside this session.
    fn shared_bound(&self) -> f64;
    /// Notifies the store that the session found a solution with `objective`.
    fn on_solution_found(&self, objective: f64);
}

/// A bound store that shares nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSharedBound;

impl NoSharedBound {
    #[inline(always)]
    pub fn new() -> Self {
        Self
    }
}

impl ObjectiveBound for NoSharedBound {
    #[inline(always)]
    fn shared_bound(&self) -> f64 {
        f64::NEG_INFINITY
    }

    #[inline(always)]
    fn on_solution_found(&self, _objective: f64) {}
}

/// A bound store backed by a `SharedLowerBound`.
#[repr(transparent)]
#[derive(Debug, Clone, Copy)]
pub struct SharedBoundAdapter<'a> {
    inner: &'a SharedLowerBound,
}

impl<'a> SharedBoundAdapter<'a> {
    #[inline(always)]
    pub fn new(inner: &'a SharedLowerBound) -> Self {
        Self { inner }
    }
}

impl ObjectiveBound for SharedBoundAdapter<'_> {
    #[inline(always)]
    fn shared_bound(&self) -> f64 {
        self.inner.get()
    }

    #[inline]
    fn on_solution_found(&self, objective: f64) {
        if self.inner.try_raise(objective) {
            tracing::debug!(objective, "raised shared lower bound");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_shared_bound_is_negative_infinity() {
        let store = NoSharedBound::new();
        assert_eq!(store.shared_bound(), f64::NEG_INFINITY);
        store.on_solution_found(10.0);
        assert_eq!(store.shared_bound(), f64::NEG_INFINITY);
    }

    #[test]
    fn test_adapter_reads_shared_value() {
        let shared = SharedLowerBound::new(3.0);
        let adapter = SharedBoundAdapter::new(&shared);
        assert_eq!(adapter.shared_bound(), 3.0);

        assert!(shared.try_raise(4.5));
        assert_eq!(adapter.shared_bound(), 4.5);
    }

    #[test]
    fn test_adapter_only_raises() {
        let shared = SharedLowerBound::new(5.0);
        let adapter = SharedBoundAdapter::new(&shared);

        adapter.on_solution_found(2.0);
        assert_eq!(shared.get(), 5.0);

        adapter.on_solution_found(7.0);
        assert_eq!(shared.get(), 7.0);
    }
}
