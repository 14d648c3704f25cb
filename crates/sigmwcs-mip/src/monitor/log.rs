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
use std::time::{Duration, Instant};

/// Periodic progress reporting through `tracing` at info level.
#[derive(Debug, Clone)]
pub struct LogMonitor {
    start_time: Instant,
    last_log_time: Instant,
    log_interval: Duration,
    clock_check_mask: u64,
    best_objective: Option<f64>,
    last_bound: f64,
}

impl LogMonitor {
    pub fn new(log_interval: Duration, clock_check_mask: u64) -> Self {
        Self {
            start_time: Instant::now(),
            last_log_time: Instant::now(),
            log_interval,
            clock_check_mask,
            best_objective: None,
            last_bound: f64::INFINITY,
        }
    }

    fn log_line(&mut self, depth: u64, stats: &MipStatistics) {
        let now = Instant::now();
        let best = match self.best_objective {
            Some(obj) => format!("{:.4}", obj),
            None => "-inf".to_string(),
        };
        tracing::info!(
            elapsed = %format!("{:.1}s", now.duration_since(self.start_time).as_secs_f32()),
            nodes = stats.nodes_explored,
            depth,
            best = %best,
            node_bound = self.last_bound,
            cuts = stats.cuts_added,
            pruned = stats.prunings_bound + stats.prunings_infeasible,
            "branch-and-cut progress"
        );
        self.last_log_time = now;
    }
}

impl Default for LogMonitor {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), 0x3f)
    }
}

impl std::fmt::Display for LogMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LogMonitor(log_interval: {}s, clock_check_mask: {})",
            self.log_interval.as_secs(),
            self.clock_check_mask
        )
    }
}

impl TreeSearchMonitor for LogMonitor {
    fn name(&self) -> &str {
        "LogMonitor"
    }

    fn on_enter_search(&mut self, model: &MipModel, _statistics: &MipStatistics) {
        self.start_time = Instant::now();
        self.last_log_time = self.start_time;
        self.best_objective = None;
        self.last_bound = f64::INFINITY;
        tracing::info!(
            vars = model.num_vars(),
            rows = model.num_constraints(),
            "branch-and-cut started"
        );
    }

    fn on_exit_search(&mut self, statistics: &MipStatistics) {
        tracing::info!(
            nodes = statistics.nodes_explored,
            cuts = statistics.cuts_added,
            solutions = statistics.solutions_found,
            elapsed = ?statistics.time_total,
            "branch-and-cut finished"
        );
    }

    fn on_step(&mut self, _statistics: &MipStatistics) {}

    fn on_node_solved(&mut self, depth: u64, objective: f64, statistics: &MipStatistics) {
        self.last_bound = objective;
        if (statistics.nodes_explored & self.clock_check_mask) == 0
            && self.last_log_time.elapsed() >= self.log_interval
        {
            self.log_line(depth, statistics);
        }
    }

    fn on_prune(&mut self, _reason: PruneReason, _statistics: &MipStatistics) {}

    fn on_branch(&mut self, _var: VarIndex, _value: f64, _statistics: &MipStatistics) {}

    fn on_cuts_added(&mut self, _count: usize, _statistics: &MipStatistics) {}

    fn on_solution_found(&mut self, solution: &MipSolution, _statistics: &MipStatistics) {
        self.best_objective = Some(solution.objective());
        tracing::debug!(objective = solution.objective(), "new incumbent");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracks_best_objective() {
        let mut monitor = LogMonitor::new(Duration::ZERO, 0);
        let stats = MipStatistics::default();
        monitor.on_enter_search(&MipModel::default(), &stats);
        monitor.on_solution_found(&MipSolution::new(vec![1.0], 4.0), &stats);
        assert_eq!(monitor.best_objective, Some(4.0));
        monitor.on_node_solved(0, 5.0, &stats);
        assert_eq!(monitor.last_bound, 5.0);
        monitor.on_exit_search(&stats);
    }

    #[test]
    fn test_display() {
        let monitor = LogMonitor::new(Duration::from_secs(2), 7);
        assert_eq!(
            monitor.to_string(),
            "LogMonitor(log_interval: 2s, clock_check_mask: 7)"
        );
    }
}
