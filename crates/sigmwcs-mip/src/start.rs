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

//! Warm starts
//!
//! A `MipStart` is a full assignment handed to the engine before the search
//! begins. If it satisfies the model and survives the cut callback it becomes
//! the first incumbent, so pruning can start at the root.

use crate::model::{MipModel, VarIndex};

/// A candidate starting assignment, one value per variable.
#[derive(Debug, Clone, PartialEq)]
pub struct MipStart {
    values: Vec<f64>,
}

impl MipStart {
    /// Creates a start from explicit values.
    #[inline]
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Creates a start for `model` with every variable at its lower bound.
    pub fn for_model(model: &MipModel) -> Self {
        Self {
            values: model.lower_bounds(),
        }
    }

    /// Sets the value of `var`.
    ///
    /// # Panics
    ///
    /// Panics if `var` is out of bounds.
    #[inline]
    pub fn set(&mut self, var: VarIndex, value: f64) {
        let len = self.values.len();
        let slot = self.values.get_mut(var.get()).unwrap_or_else(|| {
            panic!(
                "called `MipStart::set` with variable {} but the start has {} values",
                var, len
            )
        });
        *slot = value;
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
