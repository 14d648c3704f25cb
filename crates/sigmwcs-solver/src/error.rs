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

use sigmwcs_mip::error::MipError;

/// The error of an orchestrated solve. Any subproblem failing aborts the
/// whole solve; running out of time is not an error.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("engine failure: {0}")]
    Mip(#[from] MipError),
    #[error("worker panicked while solving a subproblem of {vertices} vertices")]
    WorkerPanicked { vertices: usize },
    #[error("failed to build the worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = SolverError::from(MipError::Unbounded);
        assert_eq!(
            err.to_string(),
            "engine failure: the linear relaxation is unbounded"
        );
        let err = SolverError::WorkerPanicked { vertices: 4 };
        assert!(err.to_string().contains("4 vertices"));
    }
}
