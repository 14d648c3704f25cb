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

//! Tree search monitoring interface
//!
//! Declares the `TreeSearchMonitor` trait and `PruneReason` for observing and
//! controlling branch-and-cut. Callbacks track the session lifecycle, and a
//! monitor can stop the search via `SearchCommand` (default: Continue).
//!
//! Lifecycle highlights
//! - enter → step → node solved → {cuts | prune | branch} → solution → exit
//! - `MipStatistics` is provided to every callback for telemetry.

use crate::{
    model::{MipModel, VarIndex},
    result::MipSolution,
    stats::MipStatistics,
};
use sigmwcs_search::command::SearchCommand;

/// Reasons for dropping a tree node.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PruneReason {
    /// The node's relaxation is infeasible.
    Infeasible,
    /// The node's relaxation cannot beat the best known objective.
    BoundDominated,
}

impl std::fmt::Display for PruneReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PruneReason::Infeasible => write!(f, "Infeasible"),
            PruneReason::BoundDominated => write!(f, "BoundDominated"),
        }
    }
}

/// Trait for monitoring and controlling the search process of the engine.
pub trait TreeSearchMonitor {
    /// Returns the name of the monitor.
    fn name(&self) -> &str;
    /// Called when the search starts.
    fn on_enter_search(&mut self, model: &MipModel, statistics: &MipStatistics);
    /// Called when the search ends.
    fn on_exit_search(&mut self, statistics: &MipStatistics);
    /// Called to determine the next action of the search.
    fn search_command(&mut self, _statistics: &MipStatistics) -> SearchCommand {
        SearchCommand::Continue
    }
    /// Called at each step of the search, before a node is taken off the stack.
    fn on_step(&mut self, statistics: &MipStatistics);
    /// Called when a node's cut loop has finished with an optimal relaxation.
    fn on_node_solved(&mut self, depth: u64, objective: f64, statistics: &MipStatistics);
    /// Called when a node is dropped.
    fn on_prune(&mut self, reason: PruneReason, statistics: &MipStatistics);
    /// Called when a node is split on `var`, whose relaxation value was `value`.
    fn on_branch(&mut self, var: VarIndex, value: f64, statistics: &MipStatistics);
    /// Called when `count` new rows entered the cut pool.
    fn on_cuts_added(&mut self, count: usize, statistics: &MipStatistics);
    /// Called when a new incumbent is installed.
    fn on_solution_found(&mut self, solution: &MipSolution, statistics: &MipStatistics);
}

impl std::fmt::Debug for dyn TreeSearchMonitor + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SearchMonitor({})", self.name())
    }
}

impl std::fmt::Display for dyn TreeSearchMonitor + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SearchMonitor({})", self.name())
    }
}
