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

//! Subproblem workers
//!
//! A worker solves one `Subproblem` on its own slice of the time budget. It
//! claims a leaf of the time-budget tree proportional to its share of the
//! vertices still waiting, scaled by the number of threads working on them
//! at once. It declines when that leaf is already expired, and
//! otherwise hands the formulation to the engine together with the shared
//! lower bound. Whatever time the run actually took is charged back to the
//! leaf and therefore to every ancestor.

use crate::{
    config::SolverConfig,
    error::SolverError,
    formulation::Formulation,
    separator::ConnectivitySeparator,
};
use sigmwcs_mip::{
    bnb::MipSolver,
    callback::NoCuts,
    config::MipConfigBuilder,
    monitor::{
        log::LogMonitor, no_op::NoOperationMonitor, tree_search_monitor::TreeSearchMonitor,
    },
    result::MipOutcome,
    stats::MipStatistics,
};
use sigmwcs_model::{graph::Graph, index::NodeIndex, signals::Signals, unit::Unit};
use sigmwcs_search::{bound::SharedLowerBound, time_limit::TimeLimit};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// A connected piece of the instance, optionally forced to contain `root`.
#[derive(Debug, Clone)]
pub struct Subproblem {
    graph: Graph,
    root: Option<NodeIndex>,
}

impl Subproblem {
    /// # Panics
    ///
    /// Panics if `root` is not a node of `graph`.
    pub fn new(graph: Graph, root: Option<NodeIndex>) -> Self {
        if let Some(root) = root {
            assert!(
                graph.contains_node(root),
                "called `Subproblem::new` with root {} outside the graph",
                root
            );
        }
        Self { graph, root }
    }

    #[inline]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    #[inline]
    pub fn root(&self) -> Option<NodeIndex> {
        self.root
    }

    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.graph.num_nodes()
    }

    #[inline]
    pub fn is_rooted(&self) -> bool {
        self.root.is_some()
    }

    /// The vertices this task adds to the waiting pool. A rooted task only
    /// adds its root: the rest of its component reappears in the pieces
    /// queued after the split.
    #[inline]
    pub fn share(&self) -> usize {
        if self.is_rooted() {
            1
        } else {
            self.num_vertices()
        }
    }
}

/// The fraction of the remaining budget granted to a task of `vertices`
/// vertices while `waiting` vertices (its own share included) are still
/// unsolved and `threads` tasks run side by side.
pub fn budget_fraction(vertices: usize, waiting: usize, threads: usize) -> f64 {
    if waiting == 0 {
        return 1.0;
    }
    let wanted = threads.max(1) as f64 * vertices as f64 / waiting as f64;
    wanted.clamp(f64::MIN_POSITIVE, 1.0)
}

impl std::fmt::Display for Subproblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.root {
            Some(root) => write!(
                f,
                "Subproblem(vertices: {}, root: {})",
                self.num_vertices(),
                root
            ),
            None => write!(f, "Subproblem(vertices: {}, unrooted)", self.num_vertices()),
        }
    }
}

/// What happened to one subproblem.
#[derive(Debug, Clone, PartialEq)]
pub struct SubproblemReport {
    pub vertices: usize,
    pub rooted: bool,
    /// Whether the subproblem was solved to proven optimality.
    pub optimal: bool,
    /// Score of the best selection found, `None` if there is none.
    pub score: Option<f64>,
    pub elapsed: Duration,
}

impl std::fmt::Display for SubproblemReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let score = match self.score {
            Some(score) => format!("{}", score),
            None => "none".to_string(),
        };
        write!(
            f,
            "SubproblemReport(vertices: {}, rooted: {}, optimal: {}, score: {}, elapsed: {:.3}s)",
            self.vertices,
            self.rooted,
            self.optimal,
            score,
            self.elapsed.as_secs_f64()
        )
    }
}

/// The result of one worker: the report, the selected units if any, and the
/// engine statistics if the engine ran.
#[derive(Debug, Clone)]
pub struct SubproblemOutcome {
    pub report: SubproblemReport,
    pub units: Option<Vec<Unit>>,
    pub statistics: Option<MipStatistics>,
}

/// Everything a worker shares with its siblings.
#[derive(Debug, Clone, Copy)]
pub struct Worker<'a> {
    signals: &'a Signals,
    bound: &'a SharedLowerBound,
    config: &'a SolverConfig,
    time_limit: &'a TimeLimit,
    /// Vertices of the subproblems that have not started yet.
    pending: &'a AtomicUsize,
}

impl<'a> Worker<'a> {
    #[inline]
    pub fn new(
        signals: &'a Signals,
        bound: &'a SharedLowerBound,
        config: &'a SolverConfig,
        time_limit: &'a TimeLimit,
        pending: &'a AtomicUsize,
    ) -> Self {
        Self {
            signals,
            bound,
            config,
            time_limit,
            pending,
        }
    }

    /// Solves `task`. Timeouts are reported through the report's optimality
    /// flag; only engine failures are errors.
    pub fn solve(&self, task: &Subproblem) -> Result<SubproblemOutcome, SolverError> {
        let start = Instant::now();
        let vertices = task.num_vertices();
        let waiting = self.claim(task.share());

        if vertices <= 1 {
            return Ok(self.solve_trivial(task, start));
        }

        let fraction = budget_fraction(vertices, waiting, self.config.threads);
        let leaf = self.time_limit.sub_limit(fraction);
        if leaf.is_expired() {
            tracing::debug!(%task, "time budget exhausted, subproblem declined");
            return Ok(self.finish(task, None, None, false, start));
        }

        let units = task.graph().units();
        let signals = self.signals.restrict(units.iter().copied());
        let reachable = signals.positive_sum(units.iter().copied());
        if reachable < self.bound.get() {
            tracing::debug!(
                %task,
                reachable,
                bound = self.bound.get(),
                "subproblem cannot beat the shared bound"
            );
            return Ok(self.finish(task, None, None, true, start));
        }

        let formulation =
            Formulation::new(task.graph(), &signals, task.root(), self.bound.get())?;
        tracing::trace!(%task, %formulation, "subproblem formulated");
        let limit = leaf.remaining_duration();
        let outcome = if self.config.log_progress {
            self.run_engine(task, &formulation, limit, LogMonitor::default())?
        } else {
            self.run_engine(task, &formulation, limit, NoOperationMonitor::new())?
        };
        leaf.spend_duration(start.elapsed());

        let optimal = !outcome.termination_reason().is_aborted();
        let units = outcome
            .result()
            .solution()
            .map(|solution| formulation.selected_units(solution.values()));
        let statistics = outcome.statistics().clone();
        Ok(self.finish_scored(task, units, Some(statistics), optimal, start, &signals))
    }

    /// Removes `vertices` from the waiting pool and returns the pool size
    /// before the removal.
    fn claim(&self, vertices: usize) -> usize {
        self.pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |waiting| {
                Some(waiting.saturating_sub(vertices))
            })
            .unwrap_or_else(|waiting| waiting)
    }

    fn run_engine<M>(
        &self,
        task: &Subproblem,
        formulation: &Formulation,
        limit: Option<Duration>,
        monitor: M,
    ) -> Result<MipOutcome, SolverError>
    where
        M: TreeSearchMonitor,
    {
        let engine = MipSolver::new(MipConfigBuilder::new().time_limit(limit).build());
        let model = formulation.model();
        let start = Some(formulation.start());
        if task.is_rooted() && !formulation.generators().is_empty() {
            let mut separator = ConnectivitySeparator::new(
                task.graph(),
                formulation,
                &self.config.separator,
                self.bound,
            );
            let outcome =
                engine.solve_with_bound(model, start, &mut separator, monitor, self.bound)?;
            tracing::debug!(%task, separator = %separator.statistics(), "separator finished");
            Ok(outcome)
        } else {
            Ok(engine.solve_with_bound(model, start, &mut NoCuts, monitor, self.bound)?)
        }
    }

    /// A subproblem of at most one vertex never needs the engine.
    fn solve_trivial(&self, task: &Subproblem, start: Instant) -> SubproblemOutcome {
        let Some(v) = task.graph().nodes().next() else {
            return self.finish(task, None, None, true, start);
        };
        let unit = Unit::Node(v);
        let weight = self.signals.score([unit]);
        if weight < 0.0 && !task.is_rooted() {
            return self.finish(task, None, None, true, start);
        }
        self.bound.try_raise(weight);
        self.finish_scored(task, Some(vec![unit]), None, true, start, self.signals)
    }

    fn finish_scored(
        &self,
        task: &Subproblem,
        units: Option<Vec<Unit>>,
        statistics: Option<MipStatistics>,
        optimal: bool,
        start: Instant,
        signals: &Signals,
    ) -> SubproblemOutcome {
        let score = units.as_ref().map(|u| signals.score(u.iter().copied()));
        let mut outcome = self.finish(task, units, statistics, optimal, start);
        outcome.report.score = score;
        tracing::info!(
            vertices = outcome.report.vertices,
            rooted = outcome.report.rooted,
            optimal,
            score = score.unwrap_or(f64::NEG_INFINITY),
            elapsed_ms = outcome.report.elapsed.as_millis() as u64,
            "subproblem finished"
        );
        outcome
    }

    fn finish(
        &self,
        task: &Subproblem,
        units: Option<Vec<Unit>>,
        statistics: Option<MipStatistics>,
        optimal: bool,
        start: Instant,
    ) -> SubproblemOutcome {
        SubproblemOutcome {
            report: SubproblemReport {
                vertices: task.num_vertices(),
                rooted: task.is_rooted(),
                optimal,
                score: None,
                elapsed: start.elapsed(),
            },
            units,
            statistics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverConfigBuilder;
    use sigmwcs_model::index::EdgeIndex;

    fn path(weights: &[f64], edge_weight: f64) -> (Graph, Signals) {
        let mut g = Graph::new();
        let mut s = Signals::new();
        for (i, &w) in weights.iter().enumerate() {
            g.add_node(NodeIndex::new(i));
            s.add_unit(Unit::Node(NodeIndex::new(i)), w);
        }
        for i in 1..weights.len() {
            let e = EdgeIndex::new(i - 1);
            g.add_edge(e, NodeIndex::new(i - 1), NodeIndex::new(i));
            s.add_unit(Unit::Edge(e), edge_weight);
        }
        (g, s)
    }

    struct Fixture {
        signals: Signals,
        bound: SharedLowerBound,
        config: SolverConfig,
        time_limit: TimeLimit,
        pending: AtomicUsize,
    }

    impl Fixture {
        fn new(signals: Signals, time_limit: TimeLimit, pending: usize) -> Self {
            Self {
                signals,
                bound: SharedLowerBound::default(),
                config: SolverConfigBuilder::new().build(),
                time_limit,
                pending: AtomicUsize::new(pending),
            }
        }

        fn worker(&self) -> Worker<'_> {
            Worker::new(
                &self.signals,
                &self.bound,
                &self.config,
                &self.time_limit,
                &self.pending,
            )
        }
    }

    #[test]
    fn test_single_vertex_skips_engine() {
        let (g, s) = path(&[2.0], 0.0);
        let fx = Fixture::new(s, TimeLimit::new(0.0), 1);
        let outcome = fx.worker().solve(&Subproblem::new(g, None)).unwrap();
        assert!(outcome.report.optimal);
        assert_eq!(outcome.report.score, Some(2.0));
        assert_eq!(outcome.units, Some(vec![Unit::Node(NodeIndex::new(0))]));
        assert!(outcome.statistics.is_none());
        assert_eq!(fx.bound.get(), 2.0);
    }

    #[test]
    fn test_negative_single_vertex_selects_nothing() {
        let (g, s) = path(&[-2.0], 0.0);
        let fx = Fixture::new(s, TimeLimit::unlimited(), 1);
        let outcome = fx.worker().solve(&Subproblem::new(g, None)).unwrap();
        assert!(outcome.report.optimal);
        assert_eq!(outcome.units, None);
        assert_eq!(outcome.report.score, None);
    }

    #[test]
    fn test_expired_budget_declines() {
        let (g, s) = path(&[1.0, 2.0], 0.0);
        let fx = Fixture::new(s, TimeLimit::new(0.0), 2);
        let outcome = fx.worker().solve(&Subproblem::new(g, None)).unwrap();
        assert!(!outcome.report.optimal);
        assert!(outcome.units.is_none());
        assert!(outcome.statistics.is_none());
        assert_eq!(fx.pending.load(Ordering::Acquire), 0);
    }

    #[test]
    fn test_hopeless_subproblem_is_skipped() {
        let (g, s) = path(&[1.0, 2.0], 0.0);
        let fx = Fixture::new(s, TimeLimit::unlimited(), 2);
        assert!(fx.bound.try_raise(10.0));
        let outcome = fx.worker().solve(&Subproblem::new(g, None)).unwrap();
        assert!(outcome.report.optimal);
        assert!(outcome.units.is_none());
        assert!(outcome.statistics.is_none());
    }

    #[test]
    fn test_engine_solves_path() {
        let (g, s) = path(&[-1.0, 3.0, -1.0, 4.0, -1.0], 0.0);
        let fx = Fixture::new(s, TimeLimit::unlimited(), 10);
        let outcome = fx.worker().solve(&Subproblem::new(g.clone(), None)).unwrap();
        assert!(outcome.report.optimal);
        assert_eq!(outcome.report.score, Some(6.0));
        assert!(outcome.statistics.is_some());
        assert_eq!(fx.pending.load(Ordering::Acquire), 5);
        assert!(fx.bound.get() >= 6.0 - 1e-9);

        let units = outcome.units.unwrap();
        assert!(g.is_connected_selection(&units));
    }

    #[test]
    fn test_rooted_subproblem_keeps_root() {
        let (g, s) = path(&[4.0, -1.0, -5.0, -1.0, 2.0], -1.0);
        let fx = Fixture::new(s, TimeLimit::unlimited(), 5);
        let task = Subproblem::new(g.clone(), Some(NodeIndex::new(2)));
        let outcome = fx.worker().solve(&task).unwrap();
        assert!(outcome.report.optimal);
        assert!(outcome.report.rooted);
        let units = outcome.units.unwrap();
        assert!(units.contains(&Unit::Node(NodeIndex::new(2))));
        assert!(g.is_connected_selection(&units));
        // The root plus the left arm beats the root alone, the right arm and
        // the whole path.
        assert_eq!(outcome.report.score, Some(4.0 - 1.0 - 5.0 - 2.0));
    }

    #[test]
    fn test_rooted_task_claims_only_its_root() {
        let (g, s) = path(&[1.0, 1.0, 1.0], 0.0);
        let fx = Fixture::new(s, TimeLimit::unlimited(), 3);
        let task = Subproblem::new(g, Some(NodeIndex::new(1)));
        assert_eq!(task.share(), 1);
        fx.worker().solve(&task).unwrap();
        assert_eq!(fx.pending.load(Ordering::Acquire), 2);
    }

    #[test]
    fn test_budget_fraction() {
        assert_eq!(budget_fraction(5, 20, 1), 0.25);
        assert_eq!(budget_fraction(5, 20, 2), 0.5);
        assert_eq!(budget_fraction(5, 20, 8), 1.0);
        assert_eq!(budget_fraction(5, 0, 1), 1.0);
        // A rooted task spans more vertices than it claimed.
        assert_eq!(budget_fraction(40, 1, 1), 1.0);
        assert!(budget_fraction(1, usize::MAX, 1) > 0.0);
    }

    #[test]
    #[should_panic(expected = "called `Subproblem::new` with root")]
    fn test_foreign_root_panics() {
        let (g, _) = path(&[1.0], 0.0);
        Subproblem::new(g, Some(NodeIndex::new(3)));
    }
}
