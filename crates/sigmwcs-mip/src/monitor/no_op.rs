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

use crate::{
    model::{MipModel, VarIndex},
    monitor::tree_search_monitor::{PruneReason, TreeSearchMonitor},
    result::MipSolution,
    stats::MipStatistics,
};

/// A no-operation monitor that implements the `TreeSearchMonitor` trait
/// but does nothing on any of the events, always returning `Continue` for the
/// search command.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct NoOperationMonitor;

impl NoOperationMonitor {
    /// Creates a new `NoOperationMonitor`.
    #[inline(always)]
    pub fn new() -> Self {
        Self
    }
}

impl TreeSearchMonitor for NoOperationMonitor {
    #[inline(always)]
    fn name(&self) -> &str {
        "NoOperationMonitor"
    }

    #[inline(always)]
    fn on_enter_search(&mut self, _model: &MipModel, _statistics: &MipStatistics) {}

    #[inline(always)]
    fn on_exit_search(&mut self, _statistics: &MipStatistics) {}

    #[inline(always)]
    fn on_step(&mut self, _statistics: &MipStatistics) {}

    #[inline(always)]
    fn on_node_solved(&mut self, _depth: u64, _objective: f64, _statistics: &MipStatistics) {}

    #[inline(always)]
    fn on_prune(&mut self, _reason: PruneReason, _statistics: &MipStatistics) {}

    #[inline(always)]
    fn on_branch(&mut self, _var: VarIndex, _value: f64, _statistics: &MipStatistics) {}

    #[inline(always)]
    fn on_cuts_added(&mut self, _count: usize, _statistics: &MipStatistics) {}

    #[inline(always)]
    fn on_solution_found(&mut self, _solution: &MipSolution, _statistics: &MipStatistics) {}
}
