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

//! Solver configuration
//!
//! Everything the orchestrator and the separator need is passed in
//! explicitly through these structs; no solve reads global state, so one
//! configuration can be reused for any number of concurrent solves.

use std::time::Duration;

/// Parameters of the connectivity separator.
#[derive(Debug, Clone, PartialEq)]
pub struct SeparatorConfig {
    /// Connectivity cuts emitted per call at most.
    pub max_cuts_per_round: usize,
    /// Vertices probed with a min-cut computation per call at most.
    pub max_candidates: usize,
    /// Growth of the skip period after every processed call.
    pub rate_step: f64,
    /// Added to every arc capacity of the flow network.
    pub capacity_epsilon: f64,
    /// Seed of the candidate shuffle.
    pub seed: u64,
}

impl Default for SeparatorConfig {
    fn default() -> Self {
        SeparatorConfigBuilder::new().build()
    }
}

impl std::fmt::Display for SeparatorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SeparatorConfig(max_cuts_per_round: {}, max_candidates: {}, rate_step: {}, seed: {})",
            self.max_cuts_per_round, self.max_candidates, self.rate_step, self.seed
        )
    }
}

/// Builder for `SeparatorConfig`.
#[derive(Debug, Clone, PartialEq)]
pub struct SeparatorConfigBuilder {
    max_cuts_per_round: usize,
    max_candidates: usize,
    rate_step: f64,
    capacity_epsilon: f64,
    seed: u64,
}

impl Default for SeparatorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SeparatorConfigBuilder {
    #[inline]
    pub fn new() -> Self {
        Self {
            max_cuts_per_round: 10,
            max_candidates: 30,
            rate_step: 0.15,
            capacity_epsilon: 1e-6,
            seed: 0,
        }
    }

    #[inline]
    pub fn max_cuts_per_round(mut self, max_cuts: usize) -> Self {
        self.max_cuts_per_round = max_cuts;
        self
    }

    #[inline]
    pub fn max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates;
        self
    }

    #[inline]
    pub fn rate_step(mut self, rate_step: f64) -> Self {
        self.rate_step = rate_step;
        self
    }

    #[inline]
    pub fn capacity_epsilon(mut self, epsilon: f64) -> Self {
        self.capacity_epsilon = epsilon;
        self
    }

    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// # Panics
    ///
    /// Panics if `rate_step` or `capacity_epsilon` is negative or NaN.
    pub fn build(self) -> SeparatorConfig {
        assert!(
            self.rate_step >= 0.0,
            "called `SeparatorConfigBuilder::build` with invalid rate step {}",
            self.rate_step
        );
        assert!(
            self.capacity_epsilon >= 0.0,
            "called `SeparatorConfigBuilder::build` with invalid capacity epsilon {}",
            self.capacity_epsilon
        );
        SeparatorConfig {
            max_cuts_per_round: self.max_cuts_per_round,
            max_candidates: self.max_candidates,
            rate_step: self.rate_step,
            capacity_epsilon: self.capacity_epsilon,
            seed: self.seed,
        }
    }
}

/// Parameters of an orchestrated solve.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Size of the worker pool.
    pub threads: usize,
    /// Components with at least this many vertices are split at a balancing
    /// root.
    pub decomposition_threshold: usize,
    /// Global wall-clock budget; `None` runs every subproblem to completion.
    pub time_limit: Option<Duration>,
    /// Objective value every reported solution is known to reach;
    /// `f64::NEG_INFINITY` when nothing is known.
    pub initial_lower_bound: f64,
    pub separator: SeparatorConfig,
    /// Attach a progress monitor to every engine run.
    pub log_progress: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfigBuilder::new().build()
    }
}

impl std::fmt::Display for SolverConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let limit = match self.time_limit {
            Some(limit) => format!("{:.3}s", limit.as_secs_f64()),
            None => "none".to_string(),
        };
        write!(
            f,
            "SolverConfig(threads: {}, decomposition_threshold: {}, time_limit: {}, initial_lower_bound: {})",
            self.threads, self.decomposition_threshold, limit, self.initial_lower_bound
        )
    }
}

/// Builder for `SolverConfig`.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfigBuilder {
    threads: usize,
    decomposition_threshold: usize,
    time_limit: Option<Duration>,
    initial_lower_bound: f64,
    separator: SeparatorConfig,
    log_progress: bool,
}

impl Default for SolverConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverConfigBuilder {
    #[inline]
    pub fn new() -> Self {
        Self {
            threads: 1,
            decomposition_threshold: 50,
            time_limit: None,
            initial_lower_bound: f64::NEG_INFINITY,
            separator: SeparatorConfig::default(),
            log_progress: false,
        }
    }

    #[inline]
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    #[inline]
    pub fn decomposition_threshold(mut self, threshold: usize) -> Self {
        self.decomposition_threshold = threshold;
        self
    }

    #[inline]
    pub fn time_limit(mut self, time_limit: Option<Duration>) -> Self {
        self.time_limit = time_limit;
        self
    }

    #[inline]
    pub fn initial_lower_bound(mut self, bound: f64) -> Self {
        self.initial_lower_bound = bound;
        self
    }

    #[inline]
    pub fn separator(mut self, separator: SeparatorConfig) -> Self {
        self.separator = separator;
        self
    }

    #[inline]
    pub fn log_progress(mut self, log_progress: bool) -> Self {
        self.log_progress = log_progress;
        self
    }

    /// # Panics
    ///
    /// Panics if `threads` is 0 or the initial lower bound is NaN.
    pub fn build(self) -> SolverConfig {
        assert!(
            self.threads >= 1,
            "called `SolverConfigBuilder::build` with zero threads"
        );
        assert!(
            !self.initial_lower_bound.is_nan(),
            "called `SolverConfigBuilder::build` with a NaN initial lower bound"
        );
        SolverConfig {
            threads: self.threads,
            decomposition_threshold: self.decomposition_threshold,
            time_limit: self.time_limit,
            initial_lower_bound: self.initial_lower_bound,
            separator: self.separator,
            log_progress: self.log_progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SolverConfig::default();
        assert_eq!(config.threads, 1);
        assert_eq!(config.time_limit, None);
        assert_eq!(config.initial_lower_bound, f64::NEG_INFINITY);
        assert_eq!(config.separator.rate_step, 0.15);
        assert_eq!(config.separator.capacity_epsilon, 1e-6);
        assert!(!config.log_progress);
    }

    #[test]
    fn test_builder_overrides() {
        let separator = SeparatorConfigBuilder::new()
            .max_cuts_per_round(3)
            .max_candidates(7)
            .seed(42)
            .build();
        let config = SolverConfigBuilder::new()
            .threads(4)
            .decomposition_threshold(8)
            .time_limit(Some(Duration::from_millis(1500)))
            .initial_lower_bound(2.5)
            .separator(separator.clone())
            .log_progress(true)
            .build();
        assert_eq!(config.threads, 4);
        assert_eq!(config.decomposition_threshold, 8);
        assert_eq!(config.initial_lower_bound, 2.5);
        assert_eq!(config.separator, separator);
        assert!(config.log_progress);
        assert!(format!("{}", config).contains("1.500s"));
    }

    #[test]
    #[should_panic(expected = "zero threads")]
    fn test_zero_threads_panics() {
        SolverConfigBuilder::new().threads(0).build();
    }

    #[test]
    #[should_panic(expected = "invalid rate step")]
    fn test_negative_rate_step_panics() {
        SeparatorConfigBuilder::new().rate_step(-1.0).build();
    }
}
