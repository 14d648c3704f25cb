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

/// Parameters of a branch-and-cut run.
#[derive(Debug, Clone, PartialEq)]
pub struct MipConfig {
    /// Wall-clock limit of one run; `None` runs to completion.
    pub time_limit: Option<Duration>,
    /// Distance to the nearest integer below which a binary counts as integral.
    pub integrality_tolerance: f64,
    /// Slack allowed on constraints and bounds.
    pub feasibility_tolerance: f64,
    /// Separation rounds per node at fractional points before branching.
    pub max_cut_rounds: usize,
    /// Simplex iterations per relaxation before giving up.
    pub max_simplex_iterations: u64,
    /// Consecutive relaxations a pooled cut may stay slack before it is
    /// dropped; 0 keeps every cut.
    pub cut_slack_limit: usize,
}

impl Default for MipConfig {
    fn default() -> Self {
        MipConfigBuilder::new().build()
    }
}

impl std::fmt::Display for MipConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let limit = match self.time_limit {
            Some(limit) => format!("{:.3}s", limit.as_secs_f64()),
            None => "none".to_string(),
        };
        write!(
            f,
            "MipConfig(time_limit: {}, max_cut_rounds: {}, \
             max_simplex_iterations: {}, cut_slack_limit: {})",
            limit, self.max_cut_rounds, self.max_simplex_iterations, self.cut_slack_limit
        )
    }
}

/// Builder for `MipConfig`.
#[derive(Debug, Clone, PartialEq)]
pub struct MipConfigBuilder {
    time_limit: Option<Duration>,
    integrality_tolerance: f64,
    feasibility_tolerance: f64,
    max_cut_rounds: usize,
    max_simplex_iterations: u64,
    cut_slack_limit: usize,
}

impl Default for MipConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MipConfigBuilder {
    #[inline]
    pub fn new() -> Self {
        Self {
            time_limit: None,
            integrality_tolerance: 1e-6,
            feasibility_tolerance: 1e-6,
            max_cut_rounds: 20,
            max_simplex_iterations: 100_000,
            cut_slack_limit: 50,
        }
    }

    #[inline]
    pub fn time_limit(mut self, time_limit: Option<Duration>) -> Self {
        self.time_limit = time_limit;
        self
    }

    #[inline]
    pub fn integrality_tolerance(mut self, tolerance: f64) -> Self {
        self.integrality_tolerance = tolerance;
        self
    }

    #[inline]
    pub fn feasibility_tolerance(mut self, tolerance: f64) -> Self {
        self.feasibility_tolerance = tolerance;
        self
    }

    #[inline]
    pub fn max_cut_rounds(mut self, rounds: usize) -> Self {
        self.max_cut_rounds = rounds;
        self
    }

    #[inline]
    pub fn max_simplex_iterations(mut self, iterations: u64) -> Self {
        self.max_simplex_iterations = iterations;
        self
    }

    #[inline]
    pub fn cut_slack_limit(mut self, limit: usize) -> Self {
        self.cut_slack_limit = limit;
        self
    }

    /// # Panics
    ///
    /// Panics if a tolerance is not positive or `max_simplex_iterations` is 0.
    pub fn build(self) -> MipConfig {
        assert!(
            self.integrality_tolerance > 0.0 && self.feasibility_tolerance > 0.0,
            "called `MipConfigBuilder::build` with non-positive tolerance"
        );
        assert!(
            self.max_simplex_iterations > 0,
            "called `MipConfigBuilder::build` with zero simplex iterations"
        );
        MipConfig {
            time_limit: self.time_limit,
            integrality_tolerance: self.integrality_tolerance,
            feasibility_tolerance: self.feasibility_tolerance,
            max_cut_rounds: self.max_cut_rounds,
            max_simplex_iterations: self.max_simplex_iterations,
            cut_slack_limit: self.cut_slack_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MipConfig::default();
        assert_eq!(config.time_limit, None);
        assert_eq!(config.max_cut_rounds, 20);
        assert_eq!(config.cut_slack_limit, 50);
        assert!(config.integrality_tolerance > 0.0);
    }

    #[test]
    fn test_builder_overrides() {
        let config = MipConfigBuilder::new()
            .time_limit(Some(Duration::from_secs(3)))
            .max_cut_rounds(5)
            .max_simplex_iterations(10)
            .cut_slack_limit(0)
            .build();
        assert_eq!(config.time_limit, Some(Duration::from_secs(3)));
        assert_eq!(config.max_cut_rounds, 5);
        assert_eq!(config.max_simplex_iterations, 10);
        assert_eq!(config.cut_slack_limit, 0);
        assert!(format!("{}", config).contains("3.000s"));
    }

    #[test]
    #[should_panic(expected = "non-positive tolerance")]
    fn test_zero_tolerance_panics() {
        MipConfigBuilder::new().feasibility_tolerance(0.0).build();
    }
}
