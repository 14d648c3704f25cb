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

use crate::model::VarIndex;

/// Errors raised by the engine.
///
/// Running out of time is not an error; it is reported through the
/// termination reason of a `MipOutcome`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MipError {
    #[error("non-finite coefficient {value} for {var} in constraint `{tag}`")]
    InvalidCoefficient {
        tag: String,
        var: VarIndex,
        value: f64,
    },
    #[error("unknown variable {var} (model has {num_vars} variables)")]
    UnknownVariable { var: VarIndex, num_vars: usize },
    #[error("invalid bounds [{lower}, {upper}] for variable `{name}`")]
    InvalidBounds {
        name: String,
        lower: f64,
        upper: f64,
    },
    #[error("simplex exceeded the iteration limit of {limit}")]
    IterationLimit { limit: u64 },
    #[error("the linear relaxation is unbounded")]
    Unbounded,
    #[error("warm start has {actual} values but the model has {expected} variables")]
    WarmStartLength { expected: usize, actual: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = MipError::UnknownVariable {
            var: VarIndex::new(7),
            num_vars: 3,
        };
        assert_eq!(
            err.to_string(),
            "unknown variable VarIndex(7) (model has 3 variables)"
        );
        let err = MipError::WarmStartLength {
            expected: 4,
            actual: 2,
        };
        assert!(err.to_string().contains("2 values"));
    }
}
