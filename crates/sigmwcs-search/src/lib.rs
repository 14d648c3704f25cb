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

//! # Sigmwcs Search
//!
//! Search-wide plumbing shared by the engine and the orchestrator:
//!
//! * **`time_limit`**: A tree of nested time budgets where spending on a
//!   leaf is charged to every ancestor.
//! * **`bound`**: The lock-free shared lower bound that concurrently solved
//!   subproblems use to prune each other.
//! * **`command`**: The continue/terminate verdict monitors hand back to a
//!   search loop.
//! * **`result`**: Solver results and termination reasons.
//! * **`stats`**: Aggregate statistics of an orchestrated solve.

pub mod bound;
pub mod command;
pub mod result;
pub mod stats;
pub mod time_limit;
