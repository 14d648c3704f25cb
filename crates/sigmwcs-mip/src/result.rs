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

use crate::stats::MipStatistics;
use sigmwcs_search::result::{SolverResult, TerminationReason};

/// An assignment found by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct MipSolution {
    values: Vec<f64>,
    objective: f64,
}

impl MipSolution {
    #[inline]
    pub fn new(values: Vec<f64>, objective: f64) -> Self {
        Self { values, objective }
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    #[inline]
    pub fn objective(&self) -> f64 {
        self.objective
    }

    /// Returns the value of variable `var` rounded to a 0/1 decision.
    #[inline]
    pub fn is_set(&self, var: crate::model::VarIndex) -> bool {
        self.values[var.get()] > 0.5
    }
}

impl std::fmt::Display for MipSolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MipSolution(objective: {}, vars: {})",
            self.objective,
            self.values.len()
        )
    }
}

/// Result of a branch-and-cut session after termination.
#[derive(Debug, Clone)]
pub struct MipOutcome {
    result: SolverResult<MipSolution>,
    termination_reason: TerminationReason,
    statistics: MipStatistics,
}

impl MipOutcome {
    #[inline]
    pub fn optimal(solution: MipSolution, statistics: MipStatistics) -> Self {
        Self {
            result: SolverResult::Optimal(solution),
            termination_reason: TerminationReason::OptimalityProven,
            statistics,
        }
    }

    #[inline]
    pub fn infeasible(statistics: MipStatistics) -> Self {
        Self {
            result: SolverResult::Infeasible,
            termination_reason: TerminationReason::InfeasibilityProven,
            statistics,
        }
    }

    #[inline]
    pub fn aborted<R>(solution: Option<MipSolution>, reason: R, statistics: MipStatistics) -> Self
    where
        R: Into<String>,
    {
        let result = match solution {
            Some(sol) => SolverResult::Feasible(sol),
            None => SolverResult::Unknown,
        };
        Self {
            result,
            termination_reason: TerminationReason::Aborted(reason.into()),
            statistics,
        }
    }

    #[inline]
    pub fn result(&self) -> &SolverResult<MipSolution> {
        &self.result
    }

    #[inline]
    pub fn into_result(self) -> SolverResult<MipSolution> {
        self.result
    }

    #[inline]
    pub fn termination_reason(&self) -> &TerminationReason {
        &self.termination_reason
    }

    #[inline]
    pub fn statistics(&self) -> &MipStatistics {
        &self.statistics
    }

    /// Returns `true` if the search closed the tree.
    #[inline]
    pub fn is_proven(&self) -> bool {
        !self.termination_reason.is_aborted()
    }
}

impl std::fmt::Display for MipOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.result, self.termination_reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solution(obj: f64) -> MipSolution {
        MipSolution::new(vec![1.0, 0.0], obj)
    }

    #[test]
    fn test_optimal_outcome() {
        let out = MipOutcome::optimal(solution(3.0), MipStatistics::default());
        assert!(out.result().is_optimal());
        assert!(out.is_proven());
        assert_eq!(out.result().solution().map(|s| s.objective()), Some(3.0));
    }

    #[test]
    fn test_infeasible_outcome() {
        let out = MipOutcome::infeasible(MipStatistics::default());
        assert!(out.result().is_infeasible());
        assert_eq!(out.termination_reason(), &TerminationReason::InfeasibilityProven);
    }

    #[test]
    fn test_aborted_with_and_without_solution() {
        let with = MipOutcome::aborted(
            Some(solution(1.0)),
            "time limit reached",
            MipStatistics::default(),
        );
        assert!(with.result().is_feasible());
        assert!(!with.is_proven());

        let without = MipOutcome::aborted(None, "time limit reached", MipStatistics::default());
        assert!(matches!(without.result(), SolverResult::Unknown));
        assert_eq!(
            without.termination_reason(),
            &TerminationReason::Aborted("time limit reached".to_string())
        );
    }

    #[test]
    fn test_is_set_rounds() {
        let sol = MipSolution::new(vec![0.9999, 0.0001], 1.0);
        assert!(sol.is_set(crate::model::VarIndex::new(0)));
        assert!(!sol.is_set(crate::model::VarIndex::new(1)));
    }
}
