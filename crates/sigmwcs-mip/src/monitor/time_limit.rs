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
use sigmwcs_search::command::SearchCommand;
use std::time::{Duration, Instant};

/// A monitor that terminates the search after a specified duration.
///
/// The clock is only read on steps where `steps & clock_check_mask == 0`.
/// Nodes of this engine solve a relaxation each and are therefore slow, so
/// the default mask checks often.
#[derive(Debug, Clone)]
pub struct TimeLimitMonitor {
    time_limit: Duration,
    start_time: Option<Instant>,
    clock_check_mask: u64,
    steps: u64,
}

impl TimeLimitMonitor {
    /// Creates a new `TimeLimitMonitor` that checks the clock every eighth step.
    pub fn new(time_limit: Duration) -> Self {
        Self::with_clock_check_mask(time_limit, 0x7)
    }

    /// Creates a new `TimeLimitMonitor` with an explicit clock check mask.
    /// A mask of zero reads the clock on every step.
    pub fn with_clock_check_mask(time_limit: Duration, clock_check_mask: u64) -> Self {
        Self {
            time_limit,
            start_time: None,
            clock_check_mask,
            steps: 0,
        }
    }

    #[inline]
    pub fn time_limit(&self) -> Duration {
        self.time_limit
    }
}

impl TreeSearchMonitor for TimeLimitMonitor {
    fn name(&self) -> &str {
        "TimeLimitMonitor"
    }

    fn on_enter_search(&mut self, _model: &MipModel, _statistics: &MipStatistics) {
        self.start_time = Some(Instant::now());
        self.steps = 0;
    }

    fn on_exit_search(&mut self, _statistics: &MipStatistics) {
        self.start_time = None;
    }

    fn search_command(&mut self, _statistics: &MipStatistics) -> SearchCommand {
        let step = self.steps;
        self.steps = self.steps.wrapping_add(1);
        if step & self.clock_check_mask != 0 {
            return SearchCommand::Continue;
        }
        match self.start_time {
            Some(start) if start.elapsed() >= self.time_limit => {
                SearchCommand::Terminate("time limit reached".to_string())
            }
            _ => SearchCommand::Continue,
        }
    }

    fn on_step(&mut self, _statistics: &MipStatistics) {}
    fn on_node_solved(&mut self, _depth: u64, _objective: f64, _statistics: &MipStatistics) {}
    fn on_prune(&mut self, _reason: PruneReason, _statistics: &MipStatistics) {}
    fn on_branch(&mut self, _var: VarIndex, _value: f64, _statistics: &MipStatistics) {}
    fn on_cuts_added(&mut self, _count: usize, _statistics: &MipStatistics) {}
    fn on_solution_found(&mut self, _solution: &MipSolution, _statistics: &MipStatistics) {}
}

impl std::fmt::Display for TimeLimitMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TimeLimitMonitor(time_limit: {:.3}s, clock_check_mask: {})",
            self.time_limit.as_secs_f64(),
            self.clock_check_mask
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_limit_terminates_immediately() {
        let mut monitor = TimeLimitMonitor::with_clock_check_mask(Duration::ZERO, 0);
        let stats = MipStatistics::default();
        monitor.on_enter_search(&MipModel::default(), &stats);
        assert_eq!(
            monitor.search_command(&stats),
            SearchCommand::Terminate("time limit reached".to_string())
        );
    }

    #[test]
    fn test_generous_limit_continues() {
        let mut monitor = TimeLimitMonitor::new(Duration::from_secs(3600));
        let stats = MipStatistics::default();
        monitor.on_enter_search(&MipModel::default(), &stats);
        for _ in 0..100 {
            assert_eq!(monitor.search_command(&stats), SearchCommand::Continue);
        }
    }

    #[test]
    fn test_not_started_never_terminates() {
        let mut monitor = TimeLimitMonitor::with_clock_check_mask(Duration::ZERO, 0);
        assert_eq!(
            monitor.search_command(&MipStatistics::default()),
            SearchCommand::Continue
        );
    }

    #[test]
    fn test_mask_skips_clock_reads() {
        let mut monitor = TimeLimitMonitor::with_clock_check_mask(Duration::ZERO, 0x3);
        let stats = MipStatistics::default();
        monitor.on_enter_search(&MipModel::default(), &stats);
        // Step 0 reads the clock.
        assert!(monitor.search_command(&stats).is_terminate());
        // Steps 1..=3 are skipped.
        for _ in 0..3 {
            assert_eq!(monitor.search_command(&stats), SearchCommand::Continue);
        }
        assert!(monitor.search_command(&stats).is_terminate());
    }
}
