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

//! # Shared Lower Bound
//!
//! One process-wide objective value that only ever goes up. Every
//! subproblem of an orchestrated solve reads it to prune, and publishes its
//! own improved incumbents to it.
//!
//! The value is an `f64` kept as raw bits in an `AtomicU64`. Raising it is a
//! compare-and-swap loop that gives up as soon as the stored value is at
//! least as large as the candidate, so concurrent raises can never lower it.
//!
//! ## Usage
//!
//! ```
//! use sigmwcs_search::bound::SharedLowerBound;
//!
//! let bound = SharedLowerBound::new(f64::NEG_INFINITY);
//! assert!(bound.try_raise(3.0));
//! assert!(!bound.try_raise(2.0));
//! assert_eq!(bound.get(), 3.0);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug)]
pub struct SharedLowerBound {
    bits: AtomicU64,
}

impl SharedLowerBound {
    /// Creates a bound starting at `initial`, which may be `-inf`.
    ///
    /// # Panics
    ///
    /// Panics if `initial` is NaN.
    pub fn new(initial: f64) -> Self {
        assert!(
            !initial.is_nan(),
            "called `SharedLowerBound::new` with NaN"
        );
        Self {
            bits: AtomicU64::new(initial.to_bits()),
        }
    }

    /// The current bound.
    #[inline]
    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Whether the bound holds a finite value.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.get().is_finite()
    }

    /// Raises the bound to `candidate` if that is strictly larger. Returns
    /// whether this call changed the value. NaN is ignored.
    pub fn try_raise(&self, candidate: f64) -> bool {
        if candidate.is_nan() {
            return false;
        }
        self.bits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                (candidate > f64::from_bits(bits)).then(|| candidate.to_bits())
            })
            .is_ok()
    }
}

impl Default for SharedLowerBound {
    fn default() -> Self {
        Self::new(f64::NEG_INFINITY)
    }
}

impl std::fmt::Display for SharedLowerBound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SharedLowerBound({})", self.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_default_is_negative_infinity() {
        let bound = SharedLowerBound::default();
        assert_eq!(bound.get(), f64::NEG_INFINITY);
        assert!(!bound.is_finite());
    }

    #[test]
    fn test_only_raises() {
        let bound = SharedLowerBound::new(1.0);
        assert!(!bound.try_raise(0.5));
        assert!(!bound.try_raise(1.0));
        assert!(bound.try_raise(1.5));
        assert!(!bound.try_raise(f64::NAN));
        assert!(!bound.try_raise(f64::NEG_INFINITY));
        assert_eq!(bound.get(), 1.5);
    }

    #[test]
    #[should_panic(expected = "called `SharedLowerBound::new` with NaN")]
    fn test_nan_initial_panics() {
        SharedLowerBound::new(f64::NAN);
    }

    #[test]
    fn test_concurrent_raises_keep_maximum() {
        let bound = SharedLowerBound::default();
        let mut rng = StdRng::seed_from_u64(99);
        let batches: Vec<Vec<f64>> = (0..8)
            .map(|_| (0..2000).map(|_| rng.random_range(-1e3..1e3)).collect())
            .collect();
        let expected = batches
            .iter()
            .flatten()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);

        std::thread::scope(|s| {
            for batch in &batches {
                let bound = &bound;
                s.spawn(move || {
                    let mut last = f64::NEG_INFINITY;
                    for &value in batch {
                        bound.try_raise(value);
                        let seen = bound.get();
                        assert!(seen >= last, "bound decreased");
                        last = seen;
                    }
                });
            }
        });

        assert_eq!(bound.get(), expected);
    }
}
