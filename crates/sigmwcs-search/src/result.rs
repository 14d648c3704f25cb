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

/// The result of a search over solutions of type `S`.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverResult<S> {
    /// We have proven that the problem is infeasible.
    Infeasible,
    /// We have found a solution and proven its optimality.
    Optimal(S),
    /// We have found a feasible solution, but not proven its optimality.
    Feasible(S),
    /// The solver terminated without finding a solution and
    /// without proving infeasibility.
    Unknown,
}

impl<S> SolverResult<S> {
    #[inline]
    pub fn is_optimal(&self) -> bool {
        matches!(self, SolverResult::Optimal(_))
    }

    #[inline]
    pub fn is_feasible(&self) -> bool {
        matches!(self, SolverResult::Feasible(_))
    }

    #[inline]
    pub fn is_infeasible(&self) -> bool {
        matches!(self, SolverResult::Infeasible)
    }

    #[inline]
    pub fn has_solution(&self) -> bool {
        matches!(self, SolverResult::Optimal(_) | SolverResult::Feasible(_))
    }

    #[inline]
    pub fn solution(&self) -> Option<&S> {
        match self {
            SolverResult::Optimal(s) | SolverResult::Feasible(s) => Some(s),
            SolverResult::Infeasible | SolverResult::Unknown => None,
        }
    }

    #[inline]
    pub fn into_solution(self) -> Option<S> {
        match self {
            SolverResult::Optimal(s) | SolverResult::Feasible(s) => Some(s),
            SolverResult::Infeasible | SolverResult::Unknown => None,
        }
    }

    /// Applies `f` to the contained solution, keeping the variant.
    pub fn map<U, F>(self, f: F) -> SolverResult<U>
    where
        F: FnOnce(S) -> U,
    {
        match self {
            SolverResult::Infeasible => SolverResult::Infeasible,
            SolverResult::Optimal(s) => SolverResult::Optimal(f(s)),
            SolverResult::Feasible(s) => SolverResult::Feasible(f(s)),
            SolverResult::Unknown => SolverResult::Unknown,
        }
    }
}

impl<S> std::fmt::Display for SolverResult<S>
where
    S: std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverResult::Infeasible => write!(f, "Infeasible"),
            SolverResult::Optimal(solution) => write!(f, "Optimal({})", solution),
            SolverResult::Feasible(solution) => write!(f, "Feasible({})", solution),
            SolverResult::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    /// The solver found and proved optimality of a solution.
    OptimalityProven,
    /// The solver proved that the problem is infeasible.
    InfeasibilityProven,
    /// The solver aborted due to a search limit (time, iterations, etc.).
    /// The string contains information about the reason for abortion.
    Aborted(String),
}

impl TerminationReason {
    #[inline]
    pub fn is_aborted(&self) -> bool {
        matches!(self, TerminationReason::Aborted(_))
    }
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationReason::OptimalityProven => write!(f, "Optimality Proven"),
            TerminationReason::InfeasibilityProven => write!(f, "Infeasibility Proven"),
            TerminationReason::Aborted(reason) => write!(f, "Aborted: {}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solution_accessors() {
        let optimal: SolverResult<i32> = SolverResult::Optimal(4);
        assert!(optimal.is_optimal());
        assert!(optimal.has_solution());
        assert_eq!(optimal.solution(), Some(&4));

        let unknown: SolverResult<i32> = SolverResult::Unknown;
        assert!(!unknown.has_solution());
        assert_eq!(unknown.into_solution(), None);
    }

    #[test]
    fn test_map_keeps_variant() {
        let feasible: SolverResult<i32> = SolverResult::Feasible(2);
        assert_eq!(feasible.map(|x| x * 10), SolverResult::Feasible(20));
        let infeasible: SolverResult<i32> = SolverResult::Infeasible;
        assert!(infeasible.map(|x| x + 1).is_infeasible());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", SolverResult::Optimal(3)), "Optimal(3)");
        assert_eq!(format!("{}", SolverResult::<i32>::Unknown), "Unknown");
        assert_eq!(
            format!("{}", TerminationReason::Aborted("time limit reached".into())),
            "Aborted: time limit reached"
        );
        assert!(TerminationReason::Aborted(String::new()).is_aborted());
    }
}
