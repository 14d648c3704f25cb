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

//! Lazy-constraint separation hooks
//!
//! The engine hands every relaxation optimum to a `CutCallback`. The callback
//! inspects the point and appends rows it violates; the engine adds them to
//! its pool and re-solves. At an integral point the callback doubles as a
//! lazy-constraint check: a point is only accepted as an incumbent once the
//! callback has nothing left to add.
//!
//! Notes
//! - Rows in the pool apply to every node of the tree, so callbacks must only
//!   emit globally valid inequalities.
//! - Duplicate rows are filtered by the engine.

use crate::model::{LinearConstraint, MipModel};

/// The point a callback is asked to separate.
#[derive(Debug, Clone, Copy)]
pub struct CutContext<'a> {
    /// The model being solved.
    pub model: &'a MipModel,
    /// The relaxation optimum, one value per variable.
    pub values: &'a [f64],
    /// The relaxation objective at `values`.
    pub objective: f64,
    /// Whether every binary variable is integral at `values`.
    pub is_integral: bool,
    /// Depth of the tree node the point belongs to.
    pub depth: u64,
}

/// A source of cutting planes.
pub trait CutCallback {
    /// Appends to `cuts` rows violated by `ctx.values`.
    fn separate(&mut self, ctx: &CutContext<'_>, cuts: &mut Vec<LinearConstraint>);
}

/// A callback that never cuts anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCuts;

impl CutCallback for NoCuts {
    #[inline(always)]
    fn separate(&mut self, _ctx: &CutContext<'_>, _cuts: &mut Vec<LinearConstraint>) {}
}

impl<C> CutCallback for &mut C
where
    C: CutCallback + ?Sized,
{
    #[inline(always)]
    fn separate(&mut self, ctx: &CutContext<'_>, cuts: &mut Vec<LinearConstraint>) {
        (**self).separate(ctx, cuts);
    }
}
