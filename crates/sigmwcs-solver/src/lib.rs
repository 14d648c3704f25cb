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

//! # Sigmwcs Solver
//!
//! Exact solving of the signal-weighted maximum-weight connected subgraph
//! problem by decomposition and branch-and-cut. This crate turns an instance
//! into independent subproblems, formulates each one for the engine in
//! `sigmwcs_mip`, separates connectivity cuts with max-flow, and merges the
//! per-subproblem optima.
//!
//! ## Modules
//!
//! - `config`: `SolverConfig` and `SeparatorConfig` with their builders.
//! - `error`: `SolverError`, the single failure type of a solve.
//! - `root`: Balancing root selection on the block-cut tree.
//! - `formulation`: The rooted/unrooted tree formulation of one subproblem
//!   together with a feasible warm start.
//! - `separator`: The cutting-plane separator for rooted subproblems.
//! - `worker`: Solves one subproblem under its share of the time budget.
//! - `solver`: Decomposition, the worker pool, and result aggregation.
//!
//! ## Motivation
//!
//! Large instances are rarely solved well as one model. Splitting at cut
//! vertices yields many small, independent models whose optima combine into
//! the global one, and the shared lower bound lets every finished piece
//! prune the ones still running.
//!
//! See `solver` for an end-to-end example.

pub mod config;
pub mod error;
pub mod formulation;
pub mod root;
pub mod separator;
pub mod solver;
pub mod worker;
