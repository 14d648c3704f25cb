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

//! # Linear Relaxation
//!
//! A dense, two-phase, bounded-variable primal simplex over the rows of a
//! `MipModel` plus any cuts found so far, under per-node variable bounds.
//!
//! ## Highlights
//!
//! * **Bounded variables**: Bounds are never turned into rows. Variables are
//!   shifted to a lower bound of zero and a nonbasic variable sits at either
//!   end of its range; the ratio test includes bound flips.
//! * **Two phases**: Rows whose slack cannot start basic get an artificial
//!   column. Phase one drives the artificials to zero; phase two pins them
//!   at zero and optimizes the real objective.
//! * **Anti-cycling**: Dantzig pricing, falling back to Bland's rule after a
//!   run of degenerate pivots.
//!
//! Each call starts from scratch. The relaxations solved by the engine are
//! small, and a fresh tableau keeps every node independent of the path that
//! led to it.

use crate::error::MipError;
use crate::model::{LinearConstraint, MipModel, Sense};

const PIVOT_TOLERANCE: f64 = 1e-9;
const OPTIMALITY_TOLERANCE: f64 = 1e-9;
const DEGENERATE_STEP: f64 = 1e-12;
const RATIO_TIE: f64 = 1e-12;
const BLAND_AFTER: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LpStatus {
    Optimal,
    Infeasible,
}

/// The outcome of one relaxation.
#[derive(Debug, Clone)]
pub struct LpSolution {
    pub status: LpStatus,
    /// Variable values in the original (unshifted) space; empty when
    /// infeasible.
    pub values: Vec<f64>,
    pub objective: f64,
    pub iterations: u64,
}

impl LpSolution {
    #[inline]
    pub fn is_optimal(&self) -> bool {
        self.status == LpStatus::Optimal
    }
}

/// Solves the relaxation of `model` with bounds `lower`/`upper` and the
/// additional rows `cuts`.
///
/// # Panics
///
/// Panics if the bound slices do not match the number of variables.
pub fn solve_relaxation(
    model: &MipModel,
    lower: &[f64],
    upper: &[f64],
    cuts: &[LinearConstraint],
    feasibility_tolerance: f64,
    max_iterations: u64,
) -> Result<LpSolution, MipError> {
    assert!(
        lower.len() == model.num_vars() && upper.len() == model.num_vars(),
        "called `solve_relaxation` with {} / {} bounds for {} variables",
        lower.len(),
        upper.len(),
        model.num_vars()
    );

    let mut tableau = Tableau::new(model, lower, upper, cuts, max_iterations);

    if tableau.has_artificials() {
        let phase_one: Vec<f64> = (0..tableau.cols)
            .map(|j| if tableau.is_artificial(j) { -1.0 } else { 0.0 })
            .collect();
        tableau.price(&phase_one);
        tableau.run()?;
        if tableau.artificial_infeasibility() > feasibility_tolerance {
            return Ok(LpSolution {
                status: LpStatus::Infeasible,
                values: Vec::new(),
                objective: f64::NEG_INFINITY,
                iterations: tableau.iterations,
            });
        }
        tableau.retire_artificials();
    }

    let n = model.num_vars();
    let phase_two: Vec<f64> = (0..tableau.cols)
        .map(|j| if j < n { model.variables()[j].objective } else { 0.0 })
        .collect();
    tableau.price(&phase_two);
    tableau.run()?;

    let shifted = tableau.primal_values();
    let values: Vec<f64> = (0..n)
        .map(|j| (lower[j] + shifted[j]).clamp(lower[j], upper[j]))
        .collect();
    let objective = model.objective_value(&values);
    Ok(LpSolution {
        status: LpStatus::Optimal,
        values,
        objective,
        iterations: tableau.iterations,
    })
}

/// How the initial basic variable of a row is chosen.
#[derive(Debug, Clone, Copy)]
enum RowStart {
    /// The slack column starts basic; the row is scaled by `sign`.
    Slack { sign: f64 },
    /// An artificial column starts basic; the row is scaled by `sign`.
    Artificial { sign: f64 },
}

#[derive(Debug)]
struct Tableau {
    rows: usize,
    cols: usize,
    structural: usize,
    first_artificial: usize,
    a: Vec<f64>,
    beta: Vec<f64>,
    basis: Vec<usize>,
    is_basic: Vec<bool>,
    at_upper: Vec<bool>,
    upper: Vec<f64>,
    blocked: Vec<bool>,
    d: Vec<f64>,
    iterations: u64,
    max_iterations: u64,
}

impl Tableau {
    fn new(
        model: &MipModel,
        lower: &[f64],
        upper: &[f64],
        cuts: &[LinearConstraint],
        max_iterations: u64,
    ) -> Self {
        let n = model.num_vars();
        let all_rows: Vec<&LinearConstraint> = model.constraints().iter().chain(cuts).collect();
        let rows = all_rows.len();

        let shifted_rhs: Vec<f64> = all_rows
            .iter()
            .map(|c| c.rhs - c.terms.iter().map(|&(v, k)| k * lower[v.get()]).sum::<f64>())
            .collect();

        let starts: Vec<RowStart> = all_rows
            .iter()
            .zip(&shifted_rhs)
            .map(|(c, &rhs)| {
                let slack_sign = match c.sense {
                    Sense::Le => Some(1.0),
                    Sense::Ge => Some(-1.0),
                    Sense::Eq => None,
                };
                match slack_sign {
                    Some(sign) if rhs * sign >= 0.0 => RowStart::Slack { sign },
                    _ => RowStart::Artificial {
                        sign: if rhs >= 0.0 { 1.0 } else { -1.0 },
                    },
                }
            })
            .collect();

        let num_slacks = all_rows.iter().filter(|c| c.sense != Sense::Eq).count();
        let num_artificials = starts
            .iter()
            .filter(|s| matches!(s, RowStart::Artificial { .. }))
            .count();
        let first_artificial = n + num_slacks;
        let cols = first_artificial + num_artificials;

        let mut a = vec![0.0; rows * cols];
        let mut beta = vec![0.0; rows];
        let mut basis = vec![0usize; rows];
        let mut is_basic = vec![false; cols];

        let mut next_slack = n;
        let mut next_artificial = first_artificial;
        for (i, c) in all_rows.iter().enumerate() {
            let row = &mut a[i * cols..(i + 1) * cols];
            for &(v, k) in &c.terms {
                row[v.get()] += k;
            }
            let slack = match c.sense {
                Sense::Le => Some((next_slack, 1.0)),
                Sense::Ge => Some((next_slack, -1.0)),
                Sense::Eq => None,
            };
            if let Some((col, coef)) = slack {
                row[col] = coef;
                next_slack += 1;
            }
            let (sign, basic) = match starts[i] {
                RowStart::Slack { sign } => (sign, slack.map_or(0, |(col, _)| col)),
                RowStart::Artificial { sign } => {
                    let col = next_artificial;
                    next_artificial += 1;
                    row[col] = sign;
                    (sign, col)
                }
            };
            if sign < 0.0 {
                row.iter_mut().for_each(|x| *x = -*x);
            }
            beta[i] = shifted_rhs[i] * sign;
            basis[i] = basic;
            is_basic[basic] = true;
        }

        let mut col_upper = vec![f64::INFINITY; cols];
        for j in 0..n {
            col_upper[j] = (upper[j] - lower[j]).max(0.0);
        }

        Self {
            rows,
            cols,
            structural: n,
            first_artificial,
            a,
            beta,
            basis,
            is_basic,
            at_upper: vec![false; cols],
            upper: col_upper,
            blocked: vec![false; cols],
            d: vec![0.0; cols],
            iterations: 0,
            max_iterations,
        }
    }

    #[inline]
    fn has_artificials(&self) -> bool {
        self.first_artificial < self.cols
    }

    #[inline]
    fn is_artificial(&self, col: usize) -> bool {
        col >= self.first_artificial
    }

    fn artificial_infeasibility(&self) -> f64 {
        (0..self.rows)
            .filter(|&i| self.is_artificial(self.basis[i]))
            .map(|i| self.beta[i].max(0.0))
            .sum()
    }

    /// Pins every artificial at zero and keeps it out of future bases.
    fn retire_artificials(&mut self) {
        for col in self.first_artificial..self.cols {
            self.upper[col] = 0.0;
            self.blocked[col] = true;
        }
    }

    /// Recomputes the reduced costs for the objective `cost`.
    fn price(&mut self, cost: &[f64]) {
        self.d.copy_from_slice(cost);
        for i in 0..self.rows {
            let cb = cost[self.basis[i]];
            if cb == 0.0 {
                continue;
            }
            let row = &self.a[i * self.cols..(i + 1) * self.cols];
            for (dj, &aij) in self.d.iter_mut().zip(row) {
                *dj -= cb * aij;
            }
        }
        for i in 0..self.rows {
            self.d[self.basis[i]] = 0.0;
        }
    }

    fn run(&mut self) -> Result<(), MipError> {
        let mut degenerate_run = 0usize;
        loop {
            let bland = degenerate_run > BLAND_AFTER;
            let Some(entering) = self.select_entering(bland) else {
                return Ok(());
            };
            if self.iterations >= self.max_iterations {
                return Err(MipError::IterationLimit {
                    limit: self.max_iterations,
                });
            }
            self.iterations += 1;
            let step = self.step(entering, bland)?;
            if step <= DEGENERATE_STEP {
                degenerate_run += 1;
            } else {
                degenerate_run = 0;
            }
        }
    }

    fn select_entering(&self, bland: bool) -> Option<usize> {
        let mut best = None;
        let mut best_gain = OPTIMALITY_TOLERANCE;
        for j in 0..self.cols {
            if self.is_basic[j] || self.blocked[j] || self.upper[j] == 0.0 {
                continue;
            }
            let gain = if self.at_upper[j] { -self.d[j] } else { self.d[j] };
            if gain > OPTIMALITY_TOLERANCE {
                if bland {
                    return Some(j);
                }
                if gain > best_gain {
                    best_gain = gain;
                    best = Some(j);
                }
            }
        }
        best
    }

    /// Moves `entering` as far as the bounds allow. Returns the step length.
    fn step(&mut self, entering: usize, bland: bool) -> Result<f64, MipError> {
        let cols = self.cols;
        let delta = if self.at_upper[entering] { -1.0 } else { 1.0 };

        let mut limit = self.upper[entering];
        let mut leave: Option<usize> = None;
        let mut leave_alpha = 0.0f64;
        for i in 0..self.rows {
            let alpha = self.a[i * cols + entering] * delta;
            let ratio = if alpha > PIVOT_TOLERANCE {
                self.beta[i].max(0.0) / alpha
            } else if alpha < -PIVOT_TOLERANCE {
                let ub = self.upper[self.basis[i]];
                if ub.is_infinite() {
                    continue;
                }
                (ub - self.beta[i]).max(0.0) / -alpha
            } else {
                continue;
            };

            let better = if ratio < limit - RATIO_TIE {
                true
            } else if let Some(r) = leave {
                ratio <= limit + RATIO_TIE
                    && if bland {
                        self.basis[i] < self.basis[r]
                    } else {
                        alpha.abs() > leave_alpha.abs()
                    }
            } else {
                false
            };
            if better {
                limit = ratio;
                leave = Some(i);
                leave_alpha = alpha;
            }
        }

        if limit.is_infinite() {
            return Err(MipError::Unbounded);
        }
        let t = limit;

        if t > 0.0 {
            for i in 0..self.rows {
                let aij = self.a[i * cols + entering];
                if aij != 0.0 {
                    self.beta[i] -= aij * delta * t;
                }
            }
        }

        match leave {
            None => {
                self.at_upper[entering] = !self.at_upper[entering];
            }
            Some(r) => {
                let leaving = self.basis[r];
                let start = if self.at_upper[entering] {
                    self.upper[entering]
                } else {
                    0.0
                };
                self.at_upper[leaving] = leave_alpha < 0.0;
                self.is_basic[leaving] = false;
                self.is_basic[entering] = true;
                self.at_upper[entering] = false;
                self.basis[r] = entering;
                self.beta[r] = start + delta * t;
                self.pivot(r, entering);
            }
        }
        Ok(t)
    }

    fn pivot(&mut self, r: usize, j: usize) {
        let cols = self.cols;
        let inv = 1.0 / self.a[r * cols + j];
        let pivot_row: Vec<f64> = self.a[r * cols..(r + 1) * cols]
            .iter()
            .map(|x| x * inv)
            .collect();

        for i in 0..self.rows {
            let row = &mut self.a[i * cols..(i + 1) * cols];
            if i == r {
                row.copy_from_slice(&pivot_row);
                row[j] = 1.0;
                continue;
            }
            let factor = row[j];
            if factor == 0.0 {
                continue;
            }
            for (x, &p) in row.iter_mut().zip(&pivot_row) {
                *x -= factor * p;
            }
            row[j] = 0.0;
        }

        let factor = self.d[j];
        if factor != 0.0 {
            for (dk, &p) in self.d.iter_mut().zip(&pivot_row) {
                *dk -= factor * p;
            }
        }
        self.d[j] = 0.0;
    }

    /// Values of all columns in the shifted space.
    fn primal_values(&self) -> Vec<f64> {
        let mut x: Vec<f64> = (0..self.cols)
            .map(|j| if self.at_upper[j] { self.upper[j] } else { 0.0 })
            .collect();
        for i in 0..self.rows {
            x[self.basis[i]] = self.beta[i];
        }
        x.truncate(self.structural);
        x
    }
}
