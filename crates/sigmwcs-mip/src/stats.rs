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

/// Statistics collected during one branch-and-cut session.
#[derive(Debug, Clone, PartialEq)]
pub struct MipStatistics {
    /// Total tree nodes processed.
    pub nodes_explored: u64,
    /// Total relaxations solved, including re-solves after cuts.
    pub lp_solves: u64,
    /// Total simplex pivots and bound flips.
    pub simplex_iterations: u64,
    /// Distinct rows added to the cut pool.
    pub cuts_added: u64,
    /// Separation rounds that produced at least one new row.
    pub cut_rounds: u64,
    /// Rows dropped from the pool after staying slack too long.
    pub cuts_purged: u64,
    /// Nodes dropped because their relaxation was infeasible.
    pub prunings_infeasible: u64,
    /// Nodes dropped because their relaxation could not beat the best known
    /// objective (local or shared).
    pub prunings_bound: u64,
    /// Incumbents installed, including an accepted warm start.
    pub solutions_found: u64,
    /// The deepest level reached in the tree.
    pub max_depth: u64,
    /// Total time spent in the session.
    pub time_total: Duration,
    /// The relaxation objective at the root after its cut loop.
    pub root_bound: f64,
}

impl Default for MipStatistics {
    fn default() -> Self {
        Self {
            nodes_explored: 0,
            lp_solves: 0,
            simplex_iterations: 0,
            cuts_added: 0,
            cut_rounds: 0,
            cuts_purged: 0,
            prunings_infeasible: 0,
            prunings_bound: 0,
            solutions_found: 0,
            max_depth: 0,
            time_total: Duration::ZERO,
            root_bound: f64::INFINITY,
        }
    }
}

impl MipStatistics {
    #[inline]
    pub fn on_node_explored(&mut self) {
        self.nodes_explored = self.nodes_explored.saturating_add(1);
    }

    #[inline]
    pub fn on_lp_solved(&mut self, iterations: u64) {
        self.lp_solves = self.lp_solves.saturating_add(1);
        self.simplex_iterations = self.simplex_iterations.saturating_add(iterations);
    }

    #[inline]
    pub fn on_cuts_added(&mut self, count: usize) {
        self.cuts_added = self.cuts_added.saturating_add(count as u64);
        self.cut_rounds = self.cut_rounds.saturating_add(1);
    }

    #[inline]
    pub fn on_cuts_purged(&mut self, count: usize) {
        self.cuts_purged = self.cuts_purged.saturating_add(count as u64);
    }

    #[inline]
    pub fn on_pruning_infeasible(&mut self) {
        self.prunings_infeasible = self.prunings_infeasible.saturating_add(1);
    }

    /// Records a pruning event caused by the objective bound (either local or shared).
    #[inline]
    pub fn on_pruning_bound(&mut self) {
        self.prunings_bound = self.prunings_bound.saturating_add(1);
    }

    #[inline]
    pub fn on_solution_found(&mut self) {
        self.solutions_found = self.solutions_found.saturating_add(1);
    }

    #[inline]
    pub fn on_depth_update(&mut self, depth: u64) {
        self.max_depth = self.max_depth.max(depth);
    }

    #[inline]
    pub fn set_total_time(&mut self, duration: Duration) {
        self.time_total = duration;
    }

    #[inline]
    pub fn set_root_bound(&mut self, bound: f64) {
        self.root_bound = bound;
    }
}

impl std::fmt::Display for MipStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Branch-and-Cut Statistics:")?;
        writeln!(f, "  Nodes explored:       {}", self.nodes_explored)?;
        writeln!(f, "  Max depth reached:    {}", self.max_depth)?;
        writeln!(f, "  LP solves:            {}", self.lp_solves)?;
        writeln!(f, "  Simplex iterations:   {}", self.simplex_iterations)?;
        writeln!(f, "  Cuts added:           {}", self.cuts_added)?;
        writeln!(f, "  Cut rounds:           {}", self.cut_rounds)?;
        writeln!(f, "  Cuts purged:          {}", self.cuts_purged)?;
        writeln!(f, "  Prunings (infeasible):{}", self.prunings_infeasible)?;
        writeln!(f, "  Prunings (bound):     {}", self.prunings_bound)?;
        writeln!(f, "  Solutions found:      {}", self.solutions_found)?;
        writeln!(f, "  Root bound:           {}", self.root_bound)?;
        writeln!(f, "  Total time:           {:.2?}", self.time_total)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        let stats = MipStatistics::default();
        assert_eq!(stats.nodes_explored, 0);
        assert_eq!(stats.cuts_added, 0);
        assert_eq!(stats.root_bound, f64::INFINITY);
    }

    #[test]
    fn test_counters_accumulate() {
        let mut stats = MipStatistics::default();
        stats.on_node_explored();
        stats.on_node_explored();
        stats.on_lp_solved(7);
        stats.on_lp_solved(3);
        stats.on_cuts_added(4);
        stats.on_cuts_purged(3);
        stats.on_depth_update(5);
        stats.on_depth_update(2);

        assert_eq!(stats.nodes_explored, 2);
        assert_eq!(stats.lp_solves, 2);
        assert_eq!(stats.simplex_iterations, 10);
        assert_eq!(stats.cuts_added, 4);
        assert_eq!(stats.cut_rounds, 1);
        assert_eq!(stats.cuts_purged, 3);
        assert_eq!(stats.max_depth, 5);
    }

    #[test]
    fn test_saturates() {
        let mut stats = MipStatistics {
            simplex_iterations: u64::MAX - 1,
            ..Default::default()
        };
        stats.on_lp_solved(10);
        assert_eq!(stats.simplex_iterations, u64::MAX);
    }

    #[test]
    fn test_display_lists_counters() {
        let text = MipStatistics::default().to_string();
        assert!(text.starts_with("Branch-and-Cut Statistics:"));
        assert!(text.contains("Cuts added:"));
    }
}
