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

use std::time::Duration;

/// Statistics of one orchestrated solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverStatistics {
    /// Number of subproblems the instance was decomposed into.
    pub subproblems: usize,
    /// Number of subproblems solved to proven optimality.
    pub subproblems_optimal: usize,
    /// Number of subproblems handed to the engine.
    pub engine_runs: usize,
    /// Branch-and-bound nodes explored over all engine runs.
    pub nodes_explored: u64,
    /// Cutting planes added over all engine runs.
    pub cuts_added: u64,
    /// Improving integer solutions found over all engine runs.
    pub solutions_found: u64,
    /// Number of worker threads.
    pub used_threads: usize,
    /// Total wall-clock duration of the solve.
    pub solve_duration: Duration,
}

impl std::fmt::Display for SolverStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solver Statistics:")?;
        writeln!(f, "  Subproblems: {}", self.subproblems)?;
        writeln!(f, "  Subproblems Optimal: {}", self.subproblems_optimal)?;
        writeln!(f, "  Engine Runs: {}", self.engine_runs)?;
        writeln!(f, "  Nodes Explored: {}", self.nodes_explored)?;
        writeln!(f, "  Cuts Added: {}", self.cuts_added)?;
        writeln!(f, "  Solutions Found: {}", self.solutions_found)?;
        writeln!(f, "  Used Threads: {}", self.used_threads)?;
        writeln!(
            f,
            "  Solve Duration (secs): {:.3}",
            self.solve_duration.as_secs_f64()
        )
    }
}

/// Builder for `SolverStatistics`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverStatisticsBuilder {
    subproblems: usize,
    subproblems_optimal: usize,
    engine_runs: usize,
    nodes_explored: u64,
    cuts_added: u64,
    solutions_found: u64,
    used_threads: usize,
    solve_duration: Duration,
}

impl Default for SolverStatisticsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverStatisticsBuilder {
    #[inline]
    pub fn new() -> Self {
        Self {
            subproblems: 0,
            subproblems_optimal: 0,
            engine_runs: 0,
            nodes_explored: 0,
            cuts_added: 0,
            solutions_found: 0,
            used_threads: 1,
            solve_duration: Duration::ZERO,
        }
    }

    #[inline]
    pub fn subproblems(mut self, subproblems: usize) -> Self {
        self.subproblems = subproblems;
        self
    }

    #[inline]
    pub fn subproblems_optimal(mut self, subproblems_optimal: usize) -> Self {
        self.subproblems_optimal = subproblems_optimal;
        self
    }

    #[inline]
    pub fn engine_runs(mut self, engine_runs: usize) -> Self {
        self.engine_runs = engine_runs;
        self
    }

    #[inline]
    pub fn nodes_explored(mut self, nodes_explored: u64) -> Self {
        self.nodes_explored = nodes_explored;
        self
    }

    #[inline]
    pub fn cuts_added(mut self, cuts_added: u64) -> Self {
        self.cuts_added = cuts_added;
        self
    }

    #[inline]
    pub fn solutions_found(mut self, solutions_found: u64) -> Self {
        self.solutions_found = solutions_found;
        self
    }

    #[inline]
    pub fn used_threads(mut self, used_threads: usize) -> Self {
        self.used_threads = used_threads;
        self
    }

    #[inline]
    pub fn solve_duration(mut self, solve_duration: Duration) -> Self {
        self.solve_duration = solve_duration;
        self
    }

    #[inline]
    pub fn build(self) -> SolverStatistics {
        SolverStatistics {
            subproblems: self.subproblems,
            subproblems_optimal: self.subproblems_optimal,
            engine_runs: self.engine_runs,
            nodes_explored: self.nodes_explored,
            cuts_added: self.cuts_added,
            solutions_found: self.solutions_found,
            used_threads: self.used_threads,
            solve_duration: self.solve_duration,
        }
    }
}
