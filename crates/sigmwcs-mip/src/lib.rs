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

//! # Sigmwcs MIP
//!
//! A compact branch-and-cut engine for mixed 0/1 linear programs, built for
//! the subproblems of the connected-subgraph solver but independent of them.
//!
//! ## Highlights
//!
//! * **Dense bounded simplex**: Node relaxations are solved by a two-phase
//!   primal simplex that treats variable bounds implicitly, so branching only
//!   changes bounds and never adds rows.
//! * **Lazy constraints**: A `CutCallback` sees every relaxation optimum. Its
//!   rows are pooled globally and an integral point only becomes an incumbent
//!   once the callback accepts it.
//! * **Shared bounds**: Sessions can read and raise a
//!   `sigmwcs_search::bound::SharedLowerBound`, letting concurrently solved
//!   models prune each other.
//! * **Monitors**: Logging, time limits and custom stop conditions plug in via
//!   `TreeSearchMonitor`, the same way as in a classic tree search.
//!
//! ## Usage
//!
//! ```rust
//! use sigmwcs_mip::bnb::MipSolver;
//! use sigmwcs_mip::callback::NoCuts;
//! use sigmwcs_mip::model::{LinearConstraint, MipModelBuilder};
//! use sigmwcs_mip::monitor::no_op::NoOperationMonitor;
//!
//! let mut builder = MipModelBuilder::new();
//! let x = builder.add_binary("x");
//! let y = builder.add_binary("y");
//! builder.set_objective(x, 2.0);
//! builder.set_objective(y, 3.0);
//! builder.add_constraint(LinearConstraint::le("pick_one", vec![(x, 1.0), (y, 1.0)], 1.0));
//! let model = builder.build().unwrap();
//!
//! let outcome = MipSolver::default()
//!     .solve(&model, &mut NoCuts, NoOperationMonitor::new())
//!     .unwrap();
//! let solution = outcome.result().solution().unwrap();
//! assert!((solution.objective() - 3.0).abs() < 1e-9);
//! assert!(solution.is_set(y));
//! ```

pub mod bnb;
pub mod bound;
pub mod callback;
pub mod config;
pub mod error;
pub mod lp;
pub mod model;
pub mod monitor;
pub mod result;
pub mod start;
pub mod stats;
