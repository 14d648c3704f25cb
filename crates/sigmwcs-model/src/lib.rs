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

//! # Sigmwcs Model
//!
//! **The domain model of the signal-weighted maximum-weight connected
//! subgraph problem.**
//!
//! The objective of the problem is additive over *signals*, not over graph
//! elements: a signal is a group of units (nodes or edges) that share one
//! weight, and selecting any number of its units contributes that weight
//! exactly once. This crate holds the data structures every solver layer
//! works on and the structural analysis they all need.
//!
//! ## Architecture
//!
//! * **`index`**: Strongly typed ids (`NodeIndex`, `EdgeIndex`, `SignalIndex`,
//!   `BlockIndex`) so node and edge ids can never be confused.
//! * **`unit`**: The `Unit` enum and the `Absorption` union-find that records
//!   which units were folded into which by reduction passes.
//! * **`graph`**: An undirected multigraph over units with induced-subgraph
//!   extraction and connected-component enumeration.
//! * **`signals`**: Signal weights and unit memberships, with distinct-signal
//!   scoring.
//! * **`blocks`**: Block-cut decomposition (biconnected components and cut
//!   vertices) via one iterative DFS.
//! * **`selection`**: The reported solution, a set of units that can be
//!   independently checked for connectivity.
//!
//! ## Design Philosophy
//!
//! 1.  **Shared identity**: Subgraphs reuse the ids of their parent graph, so
//!     results computed on a piece refer to the same units as the whole.
//! 2.  **Derived weights**: A unit has no weight of its own; its weight is the
//!     sum of the weights of the signals it belongs to.
//! 3.  **Fail-Fast**: Structural misuse (duplicate ids, self-loops, dangling
//!     endpoints) panics eagerly instead of corrupting the graph.

pub mod blocks;
pub mod graph;
pub mod index;
pub mod selection;
pub mod signals;
pub mod unit;
