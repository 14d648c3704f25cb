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

//! # Decomposition Orchestrator
//!
//! Solves a signal-weighted maximum-weight connected subgraph instance by
//! splitting it into independent subproblems and solving those in parallel.
//!
//! ## Decomposition
//!
//! Connected components are taken largest first. A component with at least
//! `decomposition_threshold` vertices is split at its balancing root `r`:
//! every connected selection either contains `r`, and is found by a rooted
//! subproblem on the whole component, or avoids `r`, and then lies in one
//! component of the rest, which is queued again. Components without a cut
//! vertex, small ones, and everything once the budget is gone become
//! unrooted subproblems.
//!
//! ## Execution
//!
//! - Every subproblem is one task on a fixed-size `rayon` pool, spawned
//!   inside a scope that joins all of them before aggregation.
//! - Tasks communicate only through a `SharedLowerBound`, which the engine
//!   raises on every incumbent and reads for pruning.
//! - Results travel back over a channel; a panicking task is caught and
//!   turned into an error.
//!
//! ## Aggregation
//!
//! The best selection over all tasks wins (the empty selection scores 0),
//! absorbed units are expanded through the graph's absorption records, and
//! the outcome is optimal only if every task proved its subproblem optimal.
//!
//! ## Usage
//!
//! ```rust
//! use sigmwcs_model::graph::Graph;
//! use sigmwcs_model::index::{EdgeIndex, NodeIndex};
//! use sigmwcs_model::signals::Signals;
//! use sigmwcs_model::unit::Unit;
//! use sigmwcs_solver::solver::Solver;
//!
//! let mut graph = Graph::new();
//! let mut signals = Signals::new();
//! for (i, w) in [2.0, -1.0, 3.0].into_iter().enumerate() {
//!     graph.add_node(NodeIndex::new(i));
//!     signals.add_unit(Unit::Node(NodeIndex::new(i)), w);
//! }
//! graph.add_edge(EdgeIndex::new(0), NodeIndex::new(0), NodeIndex::new(1));
//! graph.add_edge(EdgeIndex::new(1), NodeIndex::new(1), NodeIndex::new(2));
//!
//! let outcome = Solver::default().solve(&graph, &signals).unwrap();
//! assert!(outcome.is_optimal());
//! assert_eq!(outcome.score(), 4.0);
//! ```

use crate::{
    config::SolverConfig,
    error::SolverError,
    root::balancing_root,
    worker::{Subproblem, SubproblemOutcome, SubproblemReport, Worker},
};
use sigmwcs_model::{
    blocks::BlockCutTree, graph::Graph, index::NodeIndex, selection::Selection, signals::Signals,
    unit::Unit,
};
use sigmwcs_search::{
    bound::SharedLowerBound,
    stats::{SolverStatistics, SolverStatisticsBuilder},
    time_limit::TimeLimit,
};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::AtomicUsize;
use std::sync::mpsc;
use std::time::Instant;

/// The result of an orchestrated solve.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    selection: Selection,
    is_optimal: bool,
    statistics: SolverStatistics,
    reports: Vec<SubproblemReport>,
}

impl SolveOutcome {
    /// The selected units, expanded through absorption and sorted. Empty if
    /// no non-empty selection beats the empty one.
    #[inline]
    pub fn units(&self) -> &[Unit] {
        self.selection.units()
    }

    #[inline]
    pub fn score(&self) -> f64 {
        self.selection.score()
    }

    #[inline]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    #[inline]
    pub fn into_selection(self) -> Selection {
        self.selection
    }

    /// Whether every subproblem was solved to proven optimality.
    #[inline]
    pub fn is_optimal(&self) -> bool {
        self.is_optimal
    }

    #[inline]
    pub fn statistics(&self) -> &SolverStatistics {
        &self.statistics
    }

    /// One report per subproblem, in decomposition order.
    #[inline]
    pub fn reports(&self) -> &[SubproblemReport] {
        &self.reports
    }
}

impl std::fmt::Display for SolveOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SolveOutcome(units: {}, score: {}, optimal: {}, subproblems: {})",
            self.selection.len(),
            self.selection.score(),
            self.is_optimal,
            self.reports.len()
        )
    }
}

/// The decomposition-and-cut solver.
#[derive(Debug, Clone, Default)]
pub struct Solver {
    config: SolverConfig,
}

impl Solver {
    #[inline]
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Computes a maximum-weight connected selection of `graph` under the
    /// weights of `signals`.
    pub fn solve(&self, graph: &Graph, signals: &Signals) -> Result<SolveOutcome, SolverError> {
        let start_time = Instant::now();
        if graph.is_empty() {
            return Ok(SolveOutcome {
                selection: Selection::empty(),
                is_optimal: true,
                statistics: SolverStatisticsBuilder::new()
                    .used_threads(self.config.threads)
                    .solve_duration(start_time.elapsed())
                    .build(),
                reports: Vec::new(),
            });
        }

        let time_limit = match self.config.time_limit {
            Some(limit) => TimeLimit::from_duration(limit),
            None => TimeLimit::unlimited(),
        };
        let tasks = decompose(graph, self.config.decomposition_threshold, &time_limit);
        tracing::info!(
            vertices = graph.num_nodes(),
            edges = graph.num_edges(),
            subproblems = tasks.len(),
            threads = self.config.threads,
            "starting decomposed solve"
        );

        let outcomes = self.run_parallel(&tasks, signals, &time_limit)?;
        Ok(self.construct_outcome(graph, signals, start_time, outcomes))
    }

    /// Runs every task on the worker pool and returns their outcomes in task
    /// order. The first failure, in task order, aborts the solve.
    fn run_parallel(
        &self,
        tasks: &[Subproblem],
        signals: &Signals,
        time_limit: &TimeLimit,
    ) -> Result<Vec<SubproblemOutcome>, SolverError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .thread_name(|i| format!("sigmwcs-worker-{}", i))
            .build()?;

        let bound = SharedLowerBound::new(self.config.initial_lower_bound);
        let pending = AtomicUsize::new(tasks.iter().map(Subproblem::share).sum());
        let worker = Worker::new(signals, &bound, &self.config, time_limit, &pending);

        let (sender, receiver) = mpsc::channel();
        pool.scope(|scope| {
            for (index, task) in tasks.iter().enumerate() {
                let sender = sender.clone();
                scope.spawn(move |_| {
                    let result = catch_unwind(AssertUnwindSafe(|| worker.solve(task)));
                    // The receiver outlives the scope.
                    let _ = sender.send((index, result));
                });
            }
        });
        drop(sender);

        let mut slots: Vec<Option<Result<SubproblemOutcome, SolverError>>> =
            (0..tasks.len()).map(|_| None).collect();
        for (index, result) in receiver {
            slots[index] = Some(match result {
                Ok(solved) => solved,
                Err(_) => Err(SolverError::WorkerPanicked {
                    vertices: tasks[index].num_vertices(),
                }),
            });
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        for (index, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(Ok(outcome)) => outcomes.push(outcome),
                Some(Err(err)) => {
                    tracing::error!(
                        subproblem = index,
                        error = %err,
                        "subproblem failed, aborting solve"
                    );
                    return Err(err);
                }
                None => {
                    return Err(SolverError::WorkerPanicked {
                        vertices: tasks[index].num_vertices(),
                    });
                }
            }
        }
        Ok(outcomes)
    }

    fn construct_outcome(
        &self,
        graph: &Graph,
        signals: &Signals,
        start_time: Instant,
        outcomes: Vec<SubproblemOutcome>,
    ) -> SolveOutcome {
        let mut best: Option<(f64, &[Unit])> = None;
        for outcome in &outcomes {
            let Some(units) = outcome.units.as_deref() else {
                continue;
            };
            let score = signals.score(units.iter().copied());
            if score > best.map_or(0.0, |(s, _)| s) {
                best = Some((score, units));
            }
        }
        let selection = match best {
            Some((_, units)) => Selection::new(graph.expand(units.iter().copied()), signals),
            None => Selection::empty(),
        };

        let is_optimal = outcomes.iter().all(|o| o.report.optimal);
        let engine_stats = || outcomes.iter().filter_map(|o| o.statistics.as_ref());
        let statistics = SolverStatisticsBuilder::new()
            .subproblems(outcomes.len())
            .subproblems_optimal(outcomes.iter().filter(|o| o.report.optimal).count())
            .engine_runs(engine_stats().count())
            .nodes_explored(engine_stats().map(|s| s.nodes_explored).sum())
            .cuts_added(engine_stats().map(|s| s.cuts_added).sum())
            .solutions_found(engine_stats().map(|s| s.solutions_found).sum())
            .used_threads(self.config.threads)
            .solve_duration(start_time.elapsed())
            .build();

        tracing::info!(
            score = selection.score(),
            units = selection.len(),
            optimal = is_optimal,
            subproblems = statistics.subproblems,
            elapsed_ms = statistics.solve_duration.as_millis() as u64,
            "decomposed solve finished"
        );

        SolveOutcome {
            selection,
            is_optimal,
            statistics,
            reports: outcomes.into_iter().map(|o| o.report).collect(),
        }
    }
}

/// Splits `graph` into subproblems, largest components first.
///
/// The time spent splitting is charged to `time_limit` after every step, so
/// once the budget is gone the remaining components are queued unrooted.
pub fn decompose(graph: &Graph, threshold: usize, time_limit: &TimeLimit) -> Vec<Subproblem> {
    let mut queue: BinaryHeap<(usize, Reverse<Vec<NodeIndex>>)> = graph
        .connected_components()
        .into_iter()
        .map(|c| (c.len(), Reverse(c)))
        .collect();

    let mut tasks = Vec::new();
    let mut checkpoint = Instant::now();
    while let Some((size, Reverse(nodes))) = queue.pop() {
        let now = Instant::now();
        time_limit.spend_duration(now.duration_since(checkpoint));
        checkpoint = now;

        let sub = graph.subgraph(nodes.iter().copied());
        if size < threshold || size < 2 || time_limit.is_expired() {
            tasks.push(Subproblem::new(sub, None));
            continue;
        }

        let tree = BlockCutTree::new(&sub);
        let Some(root) = balancing_root(&sub, &tree) else {
            tasks.push(Subproblem::new(sub, None));
            continue;
        };
        let rest = sub.subgraph(nodes.iter().copied().filter(|&v| v != root));
        let pieces = rest.connected_components();
        tracing::debug!(
            %root,
            vertices = size,
            pieces = pieces.len(),
            "component split at balancing root"
        );
        queue.extend(pieces.into_iter().map(|c| (c.len(), Reverse(c))));
        tasks.push(Subproblem::new(sub, Some(root)));
    }
    time_limit.spend_duration(checkpoint.elapsed());
    tasks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverConfigBuilder;
    use sigmwcs_model::index::EdgeIndex;
    use std::time::Duration;

    fn n(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    fn e(i: usize) -> EdgeIndex {
        EdgeIndex::new(i)
    }

    /// A path `0 - 1 - ... - k` with the given node weights and zero-weight
    /// edges.
    fn weighted_path(weights: &[f64]) -> (Graph, Signals) {
        let mut graph = Graph::new();
        let mut signals = Signals::new();
        for (i, &w) in weights.iter().enumerate() {
            graph.add_node(n(i));
            signals.add_unit(Unit::Node(n(i)), w);
        }
        for i in 1..weights.len() {
            graph.add_edge(e(i - 1), n(i - 1), n(i));
        }
        (graph, signals)
    }

    fn solver(threshold: usize, threads: usize) -> Solver {
        Solver::new(
            SolverConfigBuilder::new()
                .decomposition_threshold(threshold)
                .threads(threads)
                .build(),
        )
    }

    #[test]
    fn test_empty_graph_is_trivially_optimal() {
        let outcome = Solver::default()
            .solve(&Graph::new(), &Signals::new())
            .unwrap();
        assert!(outcome.is_optimal());
        assert!(outcome.units().is_empty());
        assert_eq!(outcome.score(), 0.0);
        assert!(outcome.reports().is_empty());
        assert_eq!(outcome.statistics().subproblems, 0);
    }

    #[test]
    fn test_path_optimum_without_decomposition() {
        let (graph, signals) = weighted_path(&[-1.0, 3.0, -1.0, 4.0, -1.0]);
        let outcome = solver(50, 1).solve(&graph, &signals).unwrap();
        assert!(outcome.is_optimal());
        assert_eq!(outcome.score(), 6.0);
        assert_eq!(
            outcome.units(),
            &[
                Unit::Node(n(1)),
                Unit::Node(n(2)),
                Unit::Node(n(3)),
                Unit::Edge(e(1)),
                Unit::Edge(e(2)),
            ]
        );
        assert_eq!(outcome.reports().len(), 1);
        assert!(outcome.selection().is_connected_in(&graph));
    }

    #[test]
    fn test_path_optimum_with_decomposition() {
        let (graph, signals) = weighted_path(&[-1.0, 3.0, -1.0, 4.0, -1.0]);
        let outcome = solver(3, 2).solve(&graph, &signals).unwrap();
        assert!(outcome.is_optimal());
        assert_eq!(outcome.score(), 6.0);
        assert_eq!(outcome.reports().len(), 3);
        assert!(outcome.reports()[0].rooted);
        assert_eq!(outcome.statistics().subproblems, 3);
        assert_eq!(outcome.statistics().subproblems_optimal, 3);
        assert_eq!(outcome.statistics().used_threads, 2);
    }

    #[test]
    fn test_decompose_splits_path_at_middle() {
        let (graph, _) = weighted_path(&[1.0; 5]);
        let tasks = decompose(&graph, 3, &TimeLimit::unlimited());
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].root(), Some(n(2)));
        assert_eq!(tasks[0].num_vertices(), 5);
        let pieces: Vec<Vec<NodeIndex>> = tasks[1..]
            .iter()
            .map(|t| t.graph().nodes().collect())
            .collect();
        assert_eq!(pieces, vec![vec![n(0), n(1)], vec![n(3), n(4)]]);
        assert!(tasks[1..].iter().all(|t| !t.is_rooted()));
    }

    #[test]
    fn test_decompose_keeps_small_components_whole() {
        let mut graph = Graph::new();
        for i in 0..5 {
            graph.add_node(n(i));
        }
        graph.add_edge(e(0), n(0), n(1));
        graph.add_edge(e(1), n(2), n(3));
        graph.add_edge(e(2), n(3), n(4));

        let tasks = decompose(&graph, 50, &TimeLimit::unlimited());
        let sizes: Vec<usize> = tasks.iter().map(Subproblem::num_vertices).collect();
        assert_eq!(sizes, vec![3, 2]);
        assert!(tasks.iter().all(|t| !t.is_rooted()));
    }

    #[test]
    fn test_decompose_stops_rooting_when_expired() {
        let (graph, _) = weighted_path(&[1.0; 7]);
        let tasks = decompose(&graph, 2, &TimeLimit::new(0.0));
        assert_eq!(tasks.len(), 1);
        assert!(!tasks[0].is_rooted());
    }

    #[test]
    fn test_decompose_charges_its_own_time() {
        let (graph, _) = weighted_path(&[1.0; 400]);
        let unlimited = decompose(&graph, 2, &TimeLimit::unlimited());
        assert!(unlimited.iter().filter(|t| t.is_rooted()).count() > 100);

        // Any split costs more than a nanosecond, so at most one happens.
        let budget = TimeLimit::new(1e-9);
        let tasks = decompose(&graph, 2, &budget);
        assert!(budget.is_expired());
        assert!(tasks.iter().filter(|t| t.is_rooted()).count() <= 1);
        let covered: usize = tasks.iter().map(Subproblem::share).sum();
        assert_eq!(covered, 400);
    }

    #[test]
    fn test_biconnected_component_is_not_rooted() {
        let mut graph = Graph::new();
        for i in 0..4 {
            graph.add_node(n(i));
        }
        for i in 0..4 {
            graph.add_edge(e(i), n(i), n((i + 1) % 4));
        }
        let tasks = decompose(&graph, 2, &TimeLimit::unlimited());
        assert_eq!(tasks.len(), 1);
        assert!(!tasks[0].is_rooted());
    }

    #[test]
    fn test_all_negative_selects_nothing() {
        let (graph, signals) = weighted_path(&[-1.0, -2.0, -0.5]);
        let outcome = solver(2, 1).solve(&graph, &signals).unwrap();
        assert!(outcome.is_optimal());
        assert!(outcome.units().is_empty());
        assert_eq!(outcome.score(), 0.0);
    }

    #[test]
    fn test_best_component_wins() {
        let mut graph = Graph::new();
        let mut signals = Signals::new();
        for (i, w) in [1.0, 1.0, 5.0].into_iter().enumerate() {
            graph.add_node(n(i));
            signals.add_unit(Unit::Node(n(i)), w);
        }
        graph.add_edge(e(0), n(0), n(1));

        let outcome = solver(50, 2).solve(&graph, &signals).unwrap();
        assert_eq!(outcome.score(), 5.0);
        assert_eq!(outcome.units(), &[Unit::Node(n(2))]);
        assert_eq!(outcome.reports().len(), 2);
    }

    #[test]
    fn test_absorbed_units_are_expanded() {
        let (mut graph, signals) = weighted_path(&[-1.0, 3.0, -1.0]);
        graph.absorb(Unit::Node(n(1)), Unit::Edge(e(42)));

        let outcome = Solver::default().solve(&graph, &signals).unwrap();
        assert_eq!(outcome.score(), 3.0);
        assert_eq!(outcome.units(), &[Unit::Node(n(1)), Unit::Edge(e(42))]);
    }

    #[test]
    fn test_zero_time_limit_is_not_optimal() {
        let (graph, signals) = weighted_path(&[-1.0, 3.0, -1.0, 4.0, -1.0]);
        let config = SolverConfigBuilder::new()
            .time_limit(Some(Duration::ZERO))
            .build();
        let outcome = Solver::new(config).solve(&graph, &signals).unwrap();
        assert!(!outcome.is_optimal());
        assert!(outcome.units().is_empty());
        assert_eq!(outcome.statistics().engine_runs, 0);
    }

    #[test]
    fn test_initial_lower_bound_above_optimum_yields_empty() {
        let (graph, signals) = weighted_path(&[-1.0, 3.0, -1.0, 4.0, -1.0]);
        let config = SolverConfigBuilder::new().initial_lower_bound(100.0).build();
        let outcome = Solver::new(config).solve(&graph, &signals).unwrap();
        assert!(outcome.units().is_empty());
        assert_eq!(outcome.score(), 0.0);
    }

    #[test]
    fn test_outcome_display() {
        let (graph, signals) = weighted_path(&[2.0]);
        let outcome = Solver::default().solve(&graph, &signals).unwrap();
        assert_eq!(
            outcome.to_string(),
            "SolveOutcome(units: 1, score: 2, optimal: true, subproblems: 1)"
        );
    }
}
