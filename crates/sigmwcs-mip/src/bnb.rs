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

//! Branch-and-cut for 0/1 programs.
//!
//! `MipSolver` runs a depth-first branch-and-bound over the binary variables
//! of a `MipModel`, solving a linear relaxation at every node. Each relaxation
//! optimum is handed to a `CutCallback`; rows it returns go into a global cut
//! pool and the node is re-solved. At fractional points this loop is capped at
//! `max_cut_rounds`, after which the engine branches on the most fractional
//! binary. At integral points the loop runs until the callback has nothing to
//! add, which makes the callback a lazy-constraint oracle: only points it
//! accepts become incumbents.
//!
//! A session may start from a warm start, and may share its lower bound with
//! other sessions through an `ObjectiveBound`. Nodes whose relaxation does not
//! exceed the local incumbent, or falls below the shared bound, are dropped.
//! The search is controlled by a `TreeSearchMonitor` and an optional
//! wall-clock limit from `MipConfig`.

use crate::{
    bound::{NoSharedBound, ObjectiveBound, SharedBoundAdapter},
    callback::{CutCallback, CutContext},
    config::MipConfig,
    error::MipError,
    lp::solve_relaxation,
    model::{LinearConstraint, MipModel, Sense, VarIndex},
    monitor::{
        time_limit::TimeLimitMonitor,
        tree_search_monitor::{PruneReason, TreeSearchMonitor},
    },
    result::{MipOutcome, MipSolution},
    start::MipStart,
    stats::MipStatistics,
};
use rustc_hash::FxHashMap;
use sigmwcs_search::{bound::SharedLowerBound, command::SearchCommand, result::TerminationReason};

/// The branch-and-cut engine. It holds only configuration; every solve runs
/// in its own session.
#[derive(Debug, Clone, Default)]
pub struct MipSolver {
    config: MipConfig,
}

impl MipSolver {
    #[inline]
    pub fn new(config: MipConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &MipConfig {
        &self.config
    }

    /// Solves `model` as a standalone search.
    #[inline]
    pub fn solve<C, M>(
        &self,
        model: &MipModel,
        callback: &mut C,
        monitor: M,
    ) -> Result<MipOutcome, MipError>
    where
        C: CutCallback,
        M: TreeSearchMonitor,
    {
        self.solve_internal(model, None, callback, monitor, NoSharedBound::new())
    }

    /// Solves `model`, trying `start` as the first incumbent.
    #[inline]
    pub fn solve_with_start<C, M>(
        &self,
        model: &MipModel,
        start: &MipStart,
        callback: &mut C,
        monitor: M,
    ) -> Result<MipOutcome, MipError>
    where
        C: CutCallback,
        M: TreeSearchMonitor,
    {
        self.solve_internal(model, Some(start), callback, monitor, NoSharedBound::new())
    }

    /// Solves `model` while reading and raising the shared lower bound `bound`.
    ///
    /// Nodes whose relaxation falls below the shared value are dropped, so a
    /// session that cannot reach it finishes with `InfeasibilityProven`.
    #[inline]
    pub fn solve_with_bound<C, M>(
        &self,
        model: &MipModel,
        start: Option<&MipStart>,
        callback: &mut C,
        monitor: M,
        bound: &SharedLowerBound,
    ) -> Result<MipOutcome, MipError>
    where
        C: CutCallback,
        M: TreeSearchMonitor,
    {
        self.solve_internal(model, start, callback, monitor, SharedBoundAdapter::new(bound))
    }

    fn solve_internal<C, M, B>(
        &self,
        model: &MipModel,
        start: Option<&MipStart>,
        callback: &mut C,
        mut monitor: M,
        bound: B,
    ) -> Result<MipOutcome, MipError>
    where
        C: CutCallback,
        M: TreeSearchMonitor,
        B: ObjectiveBound,
    {
        let session = MipSearchSession::new(&self.config, model, callback, &mut monitor, bound);
        session.run(start)
    }
}

/// An open node of the tree: variable bounds plus depth.
#[derive(Debug, Clone)]
struct Node {
    lower: Vec<f64>,
    upper: Vec<f64>,
    depth: u64,
}

/// Hashable identity of a normalized row. Inequalities sharing their left
/// side and sense share a key whatever their right side, so a tighter row
/// supersedes a looser one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CutKey {
    terms: Vec<(VarIndex, u64)>,
    sense: Sense,
    rhs: Option<u64>,
}

impl CutKey {
    fn of(row: &LinearConstraint) -> Self {
        Self {
            terms: row.terms.iter().map(|&(v, c)| (v, c.to_bits())).collect(),
            sense: row.sense,
            rhs: match row.sense {
                Sense::Eq => Some(row.rhs.to_bits()),
                Sense::Le | Sense::Ge => None,
            },
        }
    }
}

/// Returns `true` if `row` cuts off strictly more than `pooled`. Both rows
/// must share a `CutKey`.
#[inline]
fn is_tighter(row: &LinearConstraint, pooled: &LinearConstraint) -> bool {
    match row.sense {
        Sense::Le => row.rhs < pooled.rhs,
        Sense::Ge => row.rhs > pooled.rhs,
        Sense::Eq => false,
    }
}

/// Rows added by the cut callback; shared by every node of a session.
#[derive(Debug, Default)]
struct CutPool {
    rows: Vec<LinearConstraint>,
    slack_streaks: Vec<usize>,
    index: FxHashMap<CutKey, usize>,
}

impl CutPool {
    /// Adds `row`, or replaces the pooled row it tightens. Returns `false`
    /// if the pool already holds the same row or a tighter one.
    fn insert(&mut self, row: &LinearConstraint) -> bool {
        let row = row.normalized();
        if row.terms.is_empty() {
            return false;
        }
        let key = CutKey::of(&row);
        if let Some(&slot) = self.index.get(&key) {
            if !is_tighter(&row, &self.rows[slot]) {
                return false;
            }
            self.rows[slot] = row;
            self.slack_streaks[slot] = 0;
            return true;
        }
        self.index.insert(key, self.rows.len());
        self.rows.push(row);
        self.slack_streaks.push(0);
        true
    }

    /// Counts one more relaxation for every row and drops rows that have been
    /// slack at `values` for `limit` consecutive relaxations. A limit of 0
    /// keeps every row. Returns the number of rows dropped.
    fn age(&mut self, values: &[f64], tolerance: f64, limit: usize) -> usize {
        if limit == 0 || self.rows.is_empty() {
            return 0;
        }
        for (row, streak) in self.rows.iter().zip(self.slack_streaks.iter_mut()) {
            let activity = row.activity(values);
            let slack = match row.sense {
                Sense::Le => row.rhs - activity,
                Sense::Ge => activity - row.rhs,
                Sense::Eq => 0.0,
            };
            if slack > tolerance {
                *streak += 1;
            } else {
                *streak = 0;
            }
        }
        if self.slack_streaks.iter().all(|&streak| streak < limit) {
            return 0;
        }

        let before = self.rows.len();
        let rows = std::mem::take(&mut self.rows);
        let streaks = std::mem::take(&mut self.slack_streaks);
        self.index.clear();
        for (row, streak) in rows.into_iter().zip(streaks) {
            if streak < limit {
                self.index.insert(CutKey::of(&row), self.rows.len());
                self.rows.push(row);
                self.slack_streaks.push(streak);
            }
        }
        before - self.rows.len()
    }

    #[inline]
    fn rows(&self) -> &[LinearConstraint] {
        &self.rows
    }

    #[inline]
    fn len(&self) -> usize {
        self.rows.len()
    }
}

/// A search session of the branch-and-cut engine.
/// This struct encapsulates the state and logic
/// of a single search run.
struct MipSearchSession<'a, C, M, B> {
    config: &'a MipConfig,
    model: &'a MipModel,
    callback: &'a mut C,
    monitor: &'a mut M,
    bound: B,
    time_limit: Option<TimeLimitMonitor>,
    stack: Vec<Node>,
    pool: CutPool,
    scratch: Vec<LinearConstraint>,
    best_objective: f64,
    best_solution: Option<MipSolution>,
    stats: MipStatistics,
    start_time: std::time::Instant,
}

impl<C, M, B> std::fmt::Display for MipSearchSession<'_, C, M, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SearchSession(best_objective: {}, open_nodes: {}, pooled_cuts: {})",
            self.best_objective,
            self.stack.len(),
            self.pool.len()
        )
    }
}

impl<'a, C, M, B> MipSearchSession<'a, C, M, B>
where
    C: CutCallback,
    M: TreeSearchMonitor,
    B: ObjectiveBound,
{
    fn new(
        config: &'a MipConfig,
        model: &'a MipModel,
        callback: &'a mut C,
        monitor: &'a mut M,
        bound: B,
    ) -> Self {
        Self {
            config,
            model,
            callback,
            monitor,
            bound,
            time_limit: config
                .time_limit
                .map(|limit| TimeLimitMonitor::with_clock_check_mask(limit, 0)),
            stack: Vec::new(),
            pool: CutPool::default(),
            scratch: Vec::new(),
            best_objective: f64::NEG_INFINITY,
            best_solution: None,
            stats: MipStatistics::default(),
            start_time: std::time::Instant::now(),
        }
    }

    fn run(mut self, start: Option<&MipStart>) -> Result<MipOutcome, MipError> {
        self.monitor.on_enter_search(self.model, &self.stats);
        if let Some(limit) = self.time_limit.as_mut() {
            limit.on_enter_search(self.model, &self.stats);
        }

        let searched = self.search(start);
        self.stats.set_total_time(self.start_time.elapsed());
        self.monitor.on_exit_search(&self.stats);
        tracing::trace!(session = %self, "branch-and-cut session closed");

        let reason = searched?;
        Ok(self.finalize_result(reason))
    }

    fn search(&mut self, start: Option<&MipStart>) -> Result<TerminationReason, MipError> {
        if let Some(start) = start {
            self.try_install_start(start)?;
        }
        self.stack.push(Node {
            lower: self.model.lower_bounds(),
            upper: self.model.upper_bounds(),
            depth: 0,
        });

        loop {
            self.monitor.on_step(&self.stats);
            if let SearchCommand::Terminate(msg) = self.search_command() {
                return Ok(TerminationReason::Aborted(msg));
            }
            let Some(node) = self.stack.pop() else {
                return Ok(if self.best_solution.is_some() {
                    TerminationReason::OptimalityProven
                } else {
                    TerminationReason::InfeasibilityProven
                });
            };
            self.process_node(node)?;
        }
    }

    fn search_command(&mut self) -> SearchCommand {
        if let Some(limit) = self.time_limit.as_mut() {
            let cmd = limit.search_command(&self.stats);
            if cmd.is_terminate() {
                return cmd;
            }
        }
        self.monitor.search_command(&self.stats)
    }

    fn finalize_result(self, reason: TerminationReason) -> MipOutcome {
        match reason {
            TerminationReason::OptimalityProven => match self.best_solution {
                Some(solution) => MipOutcome::optimal(solution, self.stats),
                None => MipOutcome::infeasible(self.stats),
            },
            TerminationReason::InfeasibilityProven => MipOutcome::infeasible(self.stats),
            TerminationReason::Aborted(msg) => {
                MipOutcome::aborted(self.best_solution, msg, self.stats)
            }
        }
    }

    /// Installs `start` as the first incumbent if the model and the callback
    /// both accept it.
    fn try_install_start(&mut self, start: &MipStart) -> Result<(), MipError> {
        if start.len() != self.model.num_vars() {
            return Err(MipError::WarmStartLength {
                expected: self.model.num_vars(),
                actual: start.len(),
            });
        }
        let tol = self.config.feasibility_tolerance;
        if !self.model.is_feasible(start.values(), tol) {
            tracing::debug!("warm start violates the model, ignoring it");
            return Ok(());
        }

        let values = self.round_integral(start.values());
        let objective = self.model.objective_value(&values);
        let mut cuts = std::mem::take(&mut self.scratch);
        cuts.clear();
        self.callback.separate(
            &CutContext {
                model: self.model,
                values: &values,
                objective,
                is_integral: true,
                depth: 0,
            },
            &mut cuts,
        );
        let rejected = cuts.iter().any(|c| c.violation(&values) > tol);
        self.scratch = cuts;

        if rejected {
            tracing::debug!(objective, "warm start rejected by the cut callback");
            return Ok(());
        }
        self.install(values, objective);
        Ok(())
    }

    fn process_node(&mut self, node: Node) -> Result<(), MipError> {
        self.stats.on_node_explored();
        self.stats.on_depth_update(node.depth);

        let tol = self.config.feasibility_tolerance;
        let mut rounds = 0usize;
        loop {
            let lp = solve_relaxation(
                self.model,
                &node.lower,
                &node.upper,
                self.pool.rows(),
                tol,
                self.config.max_simplex_iterations,
            )?;
            self.stats.on_lp_solved(lp.iterations);

            if !lp.is_optimal() {
                self.prune(PruneReason::Infeasible);
                return Ok(());
            }
            let purged = self.pool.age(&lp.values, tol, self.config.cut_slack_limit);
            if purged > 0 {
                self.stats.on_cuts_purged(purged);
            }
            if node.depth == 0 {
                self.stats.set_root_bound(lp.objective);
            }
            if self.is_dominated(lp.objective) {
                self.prune(PruneReason::BoundDominated);
                return Ok(());
            }

            let branch_var = self.most_fractional(&lp.values);
            let is_integral = branch_var.is_none();
            if !is_integral && rounds >= self.config.max_cut_rounds {
                self.monitor
                    .on_node_solved(node.depth, lp.objective, &self.stats);
                if let Some(var) = branch_var {
                    self.branch(node, var, lp.values[var.get()]);
                }
                return Ok(());
            }

            let mut cuts = std::mem::take(&mut self.scratch);
            cuts.clear();
            self.callback.separate(
                &CutContext {
                    model: self.model,
                    values: &lp.values,
                    objective: lp.objective,
                    is_integral,
                    depth: node.depth,
                },
                &mut cuts,
            );
            let mut added = 0usize;
            let mut violated = false;
            for cut in cuts.iter().filter(|c| c.violation(&lp.values) > tol) {
                violated = true;
                if self.pool.insert(cut) {
                    added += 1;
                }
            }
            self.scratch = cuts;

            if added > 0 {
                rounds += 1;
                self.stats.on_cuts_added(added);
                self.monitor.on_cuts_added(added, &self.stats);
                continue;
            }

            self.monitor
                .on_node_solved(node.depth, lp.objective, &self.stats);
            match branch_var {
                None if violated => {
                    // A pooled row is violated by its own relaxation optimum.
                    tracing::warn!(
                        depth = node.depth,
                        objective = lp.objective,
                        "cut callback repeated a pooled row at an integral point"
                    );
                    self.prune(PruneReason::Infeasible);
                }
                None => {
                    let values = self.round_integral(&lp.values);
                    let objective = self.model.objective_value(&values);
                    self.install(values, objective);
                }
                Some(var) => self.branch(node, var, lp.values[var.get()]),
            }
            return Ok(());
        }
    }

    /// A node is dominated when it cannot strictly improve on the local
    /// incumbent or when it falls below the shared bound.
    #[inline]
    fn is_dominated(&self, objective: f64) -> bool {
        let tol = self.config.feasibility_tolerance;
        objective <= self.best_objective + tol || objective < self.bound.shared_bound() - tol
    }

    /// The binary variable farthest from integrality, if any.
    fn most_fractional(&self, values: &[f64]) -> Option<VarIndex> {
        let mut best: Option<(usize, f64)> = None;
        for (j, var) in self.model.variables().iter().enumerate() {
            if !var.is_binary() {
                continue;
            }
            let frac = values[j] - values[j].floor();
            let distance = frac.min(1.0 - frac);
            if distance <= self.config.integrality_tolerance {
                continue;
            }
            if best.is_none_or(|(_, d)| distance > d) {
                best = Some((j, distance));
            }
        }
        best.map(|(j, _)| VarIndex::new(j))
    }

    fn round_integral(&self, values: &[f64]) -> Vec<f64> {
        self.model
            .variables()
            .iter()
            .zip(values)
            .map(|(var, &x)| {
                if var.is_binary() {
                    x.round().clamp(0.0, 1.0)
                } else {
                    x.clamp(var.lower, var.upper)
                }
            })
            .collect()
    }

    fn branch(&mut self, node: Node, var: VarIndex, value: f64) {
        self.monitor.on_branch(var, value, &self.stats);
        let j = var.get();

        let mut down = node.clone();
        down.upper[j] = 0.0;
        down.depth += 1;

        let mut up = node;
        up.lower[j] = 1.0;
        up.depth += 1;

        // Popped first.
        self.stack.push(down);
        self.stack.push(up);
    }

    fn prune(&mut self, reason: PruneReason) {
        match reason {
            PruneReason::Infeasible => self.stats.on_pruning_infeasible(),
            PruneReason::BoundDominated => self.stats.on_pruning_bound(),
        }
        self.monitor.on_prune(reason, &self.stats);
    }

    fn install(&mut self, values: Vec<f64>, objective: f64) {
        if objective <= self.best_objective {
            return;
        }
        self.best_objective = objective;
        let solution = MipSolution::new(values, objective);
        self.stats.on_solution_found();
        self.monitor.on_solution_found(&solution, &self.stats);
        self.bound.on_solution_found(objective);
        self.best_solution = Some(solution);
    }
}
