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

mod common;

use common::{brute_force, e, n, random_instance};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use sigmwcs_model::graph::Graph;
use sigmwcs_model::signals::Signals;
use sigmwcs_model::unit::Unit;
use sigmwcs_solver::config::{SeparatorConfigBuilder, SolverConfigBuilder};
use sigmwcs_solver::solver::{SolveOutcome, Solver};
use std::time::Duration;

fn solve(graph: &Graph, signals: &Signals, threshold: usize, threads: usize) -> SolveOutcome {
    let config = SolverConfigBuilder::new()
        .decomposition_threshold(threshold)
        .threads(threads)
        .separator(SeparatorConfigBuilder::new().seed(7).build())
        .build();
    Solver::new(config).solve(graph, signals).unwrap()
}

fn assert_consistent(graph: &Graph, signals: &Signals, outcome: &SolveOutcome) {
    assert!(outcome.selection().is_connected_in(graph));
    assert_eq!(outcome.score(), signals.score(outcome.units().iter().copied()));
}

#[test]
fn test_path_picks_best_segment() {
    let mut graph = Graph::new();
    let mut signals = Signals::new();
    for (i, w) in [-1.0, 3.0, -1.0, 4.0, -1.0].into_iter().enumerate() {
        graph.add_node(n(i));
        signals.add_unit(Unit::Node(n(i)), w);
    }
    for i in 1..5 {
        graph.add_edge(e(i - 1), n(i - 1), n(i));
    }

    for threshold in [2, 50] {
        let outcome = solve(&graph, &signals, threshold, 1);
        assert!(outcome.is_optimal());
        assert_eq!(outcome.score(), 6.0);
        assert_consistent(&graph, &signals, &outcome);
    }
}

#[test]
fn test_shared_positive_signal_counts_once() {
    let mut graph = Graph::new();
    let mut signals = Signals::new();
    let signal = signals.add_signal(5.0);
    for i in 0..3 {
        graph.add_node(n(i));
        signals.attach(Unit::Node(n(i)), signal);
    }
    graph.add_edge(e(0), n(0), n(1));
    graph.add_edge(e(1), n(1), n(2));

    let outcome = solve(&graph, &signals, 50, 1);
    assert!(outcome.is_optimal());
    assert_eq!(outcome.score(), 5.0);
}

#[test]
fn test_shared_negative_signal_counts_once() {
    let mut graph = Graph::new();
    let mut signals = Signals::new();
    for (i, w) in [3.0, 0.0, 0.0, 3.0].into_iter().enumerate() {
        graph.add_node(n(i));
        signals.add_unit(Unit::Node(n(i)), w);
    }
    let toll = signals.add_signal(-2.0);
    for i in 1..4 {
        graph.add_edge(e(i - 1), n(i - 1), n(i));
        signals.attach(Unit::Edge(e(i - 1)), toll);
    }

    for threshold in [2, 50] {
        let outcome = solve(&graph, &signals, threshold, 2);
        assert!(outcome.is_optimal());
        assert_eq!(outcome.score(), 4.0);
        assert_eq!(outcome.units().len(), 7);
        assert_consistent(&graph, &signals, &outcome);
    }
}

#[test]
fn test_random_instances_match_brute_force() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for round in 0..20 {
        let (graph, signals) = random_instance(&mut rng, 6, 2);
        let expected = brute_force(&graph, &signals);
        for (threshold, threads) in [(50, 1), (2, 1), (3, 3)] {
            let outcome = solve(&graph, &signals, threshold, threads);
            assert!(outcome.is_optimal(), "round {}: not optimal", round);
            assert!(
                (outcome.score() - expected).abs() < 1e-6,
                "round {}: threshold {} found {} instead of {}",
                round,
                threshold,
                outcome.score(),
                expected
            );
            assert_consistent(&graph, &signals, &outcome);
        }
    }
}

#[test]
fn test_tree_instances_match_brute_force() {
    let mut rng = StdRng::seed_from_u64(42);
    for round in 0..10 {
        let (graph, signals) = random_instance(&mut rng, 8, 0);
        let expected = brute_force(&graph, &signals);
        let outcome = solve(&graph, &signals, 2, 2);
        assert!(outcome.is_optimal(), "round {}: not optimal", round);
        assert!(
            (outcome.score() - expected).abs() < 1e-6,
            "round {}: found {} instead of {}",
            round,
            outcome.score(),
            expected
        );
    }
}

#[test]
fn test_thread_count_does_not_change_optimum() {
    let mut rng = StdRng::seed_from_u64(1234);
    let (graph, signals) = random_instance(&mut rng, 7, 3);
    let single = solve(&graph, &signals, 3, 1);
    let multi = solve(&graph, &signals, 3, 4);
    assert!(single.is_optimal() && multi.is_optimal());
    assert!((single.score() - multi.score()).abs() < 1e-6);
}

#[test]
fn test_absorbed_units_are_reported() {
    let mut graph = Graph::new();
    let mut signals = Signals::new();
    for (i, w) in [2.0, -1.0, 2.0].into_iter().enumerate() {
        graph.add_node(n(i));
        signals.add_unit(Unit::Node(n(i)), w);
    }
    graph.add_edge(e(0), n(0), n(1));
    graph.add_edge(e(1), n(1), n(2));
    // Node 7 and edge 9 were folded into node 0 by some reduction.
    graph.absorb(Unit::Node(n(0)), Unit::Node(n(7)));
    graph.absorb(Unit::Node(n(7)), Unit::Edge(e(9)));

    let outcome = solve(&graph, &signals, 50, 1);
    assert_eq!(outcome.score(), 3.0);
    assert!(outcome.units().contains(&Unit::Node(n(7))));
    assert!(outcome.units().contains(&Unit::Edge(e(9))));
    assert!(outcome.units().contains(&Unit::Node(n(2))));
}

#[test]
fn test_zero_budget_reports_non_optimal() {
    let mut rng = StdRng::seed_from_u64(9);
    let (graph, signals) = random_instance(&mut rng, 6, 2);
    let config = SolverConfigBuilder::new()
        .time_limit(Some(Duration::ZERO))
        .build();
    let outcome = Solver::new(config).solve(&graph, &signals).unwrap();
    let engine_sized = outcome.reports().iter().any(|r| r.vertices > 1);
    assert_eq!(outcome.is_optimal(), !engine_sized);
    assert_consistent(&graph, &signals, &outcome);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_decomposition_preserves_optimum(
        seed in any::<u64>(),
        nodes in 2usize..7,
        extra_edges in 0usize..3,
        threshold in 2usize..6,
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let (graph, signals) = random_instance(&mut rng, nodes, extra_edges);
        let expected = brute_force(&graph, &signals);
        let outcome = solve(&graph, &signals, threshold, 2);
        prop_assert!(outcome.is_optimal());
        prop_assert!((outcome.score() - expected).abs() < 1e-6);
        prop_assert!(outcome.selection().is_connected_in(&graph));
    }
}
