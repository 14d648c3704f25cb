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

//! # Linear Models
//!
//! Variables, linear constraints and a maximization objective, assembled
//! through `MipModelBuilder` and validated once in `build()`.
//!
//! Every variable needs a finite lower bound; upper bounds may be infinite.
//! Binary variables live in `[0, 1]` and may be fixed by narrowing their
//! bounds.
//!
//! ## Usage
//!
//! ```
//! use sigmwcs_mip::model::{LinearConstraint, MipModelBuilder, Sense};
//!
//! let mut builder = MipModelBuilder::new();
//! let x = builder.add_binary("x");
//! let y = builder.add_binary("y");
//! builder.set_objective(x, 2.0);
//! builder.set_objective(y, 3.0);
//! builder.add_constraint(LinearConstraint::new(
//!     "pick_one",
//!     vec![(x, 1.0), (y, 1.0)],
//!     Sense::Le,
//!     1.0,
//! ));
//! let model = builder.build().unwrap();
//! assert_eq!(model.num_vars(), 2);
//! assert_eq!(model.objective_value(&[0.0, 1.0]), 3.0);
//! ```

use crate::error::MipError;
use sigmwcs_core::utils::index::{TypedIndex, TypedIndexTag};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct VarIndexTag;

impl TypedIndexTag for VarIndexTag {
    const NAME: &'static str = "VarIndex";
}

/// A typed index for model variables.
pub type VarIndex = TypedIndex<VarIndexTag>;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VarKind {
    Continuous,
    Binary,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    pub name: String,
    pub kind: VarKind,
    pub lower: f64,
    pub upper: f64,
    pub objective: f64,
}

impl Variable {
    #[inline]
    pub fn is_binary(&self) -> bool {
        self.kind == VarKind::Binary
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

impl std::fmt::Display for Sense {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sense::Le => write!(f, "<="),
            Sense::Ge => write!(f, ">="),
            Sense::Eq => write!(f, "="),
        }
    }
}

/// A tagged linear constraint `sum(coef * var) <sense> rhs`.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearConstraint {
    pub tag: String,
    pub terms: Vec<(VarIndex, f64)>,
    pub sense: Sense,
    pub rhs: f64,
}

impl LinearConstraint {
    pub fn new<S>(tag: S, terms: Vec<(VarIndex, f64)>, sense: Sense, rhs: f64) -> Self
    where
        S: Into<String>,
    {
        Self {
            tag: tag.into(),
            terms,
            sense,
            rhs,
        }
    }

    #[inline]
    pub fn le<S: Into<String>>(tag: S, terms: Vec<(VarIndex, f64)>, rhs: f64) -> Self {
        Self::new(tag, terms, Sense::Le, rhs)
    }

    #[inline]
    pub fn ge<S: Into<String>>(tag: S, terms: Vec<(VarIndex, f64)>, rhs: f64) -> Self {
        Self::new(tag, terms, Sense::Ge, rhs)
    }

    #[inline]
    pub fn equal<S: Into<String>>(tag: S, terms: Vec<(VarIndex, f64)>, rhs: f64) -> Self {
        Self::new(tag, terms, Sense::Eq, rhs)
    }

    /// The left-hand side evaluated at `values`.
    pub fn activity(&self, values: &[f64]) -> f64 {
        self.terms.iter().map(|&(v, c)| c * values[v.get()]).sum()
    }

    /// By how much `values` violate the constraint; zero when satisfied.
    pub fn violation(&self, values: &[f64]) -> f64 {
        let lhs = self.activity(values);
        match self.sense {
            Sense::Le => (lhs - self.rhs).max(0.0),
            Sense::Ge => (self.rhs - lhs).max(0.0),
            Sense::Eq => (lhs - self.rhs).abs(),
        }
    }

    /// Merges repeated variables and drops zero coefficients, sorting the
    /// terms by variable.
    pub fn normalized(&self) -> LinearConstraint {
        let mut terms = self.terms.clone();
        terms.sort_by_key(|&(v, _)| v);
        let mut merged: Vec<(VarIndex, f64)> = Vec::with_capacity(terms.len());
        for (v, c) in terms {
            match merged.last_mut() {
                Some(last) if last.0 == v => last.1 += c,
                _ => merged.push((v, c)),
            }
        }
        merged.retain(|&(_, c)| c != 0.0);
        LinearConstraint {
            tag: self.tag.clone(),
            terms: merged,
            sense: self.sense,
            rhs: self.rhs,
        }
    }

    fn validate(&self, num_vars: usize) -> Result<(), MipError> {
        for &(var, value) in &self.terms {
            if var.get() >= num_vars {
                return Err(MipError::UnknownVariable { var, num_vars });
            }
            if !value.is_finite() {
                return Err(MipError::InvalidCoefficient {
                    tag: self.tag.clone(),
                    var,
                    value,
                });
            }
        }
        if !self.rhs.is_finite() {
            return Err(MipError::InvalidCoefficient {
                tag: self.tag.clone(),
                var: self.terms.first().map_or(VarIndex::new(0), |t| t.0),
                value: self.rhs,
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for LinearConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: ", self.tag)?;
        for (i, (v, c)) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            write!(f, "{} {}", c, v)?;
        }
        write!(f, " {} {}", self.sense, self.rhs)
    }
}

/// A validated mixed 0/1 linear program, maximized.
#[derive(Clone, Debug, Default)]
pub struct MipModel {
    vars: Vec<Variable>,
    constraints: Vec<LinearConstraint>,
}

impl MipModel {
    #[inline]
    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    #[inline]
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    #[inline]
    pub fn variable(&self, var: VarIndex) -> &Variable {
        &self.vars[var.get()]
    }

    #[inline]
    pub fn variables(&self) -> &[Variable] {
        &self.vars
    }

    #[inline]
    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn lower_bounds(&self) -> Vec<f64> {
        self.vars.iter().map(|v| v.lower).collect()
    }

    pub fn upper_bounds(&self) -> Vec<f64> {
        self.vars.iter().map(|v| v.upper).collect()
    }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.vars
            .iter()
            .zip(values)
            .map(|(v, x)| v.objective * x)
            .sum()
    }

    /// Checks bounds, integrality and every constraint within `tolerance`.
    pub fn is_feasible(&self, values: &[f64], tolerance: f64) -> bool {
        if values.len() != self.vars.len() {
            return false;
        }
        let bounds_ok = self.vars.iter().zip(values).all(|(v, &x)| {
            let in_bounds = x >= v.lower - tolerance && x <= v.upper + tolerance;
            let integral = !v.is_binary() || (x - x.round()).abs() <= tolerance;
            in_bounds && integral
        });
        bounds_ok
            && self
                .constraints
                .iter()
                .all(|c| c.violation(values) <= tolerance)
    }
}

impl std::fmt::Display for MipModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let binaries = self.vars.iter().filter(|v| v.is_binary()).count();
        write!(
            f,
            "MipModel(vars: {}, binaries: {}, constraints: {})",
            self.vars.len(),
            binaries,
            self.constraints.len()
        )
    }
}

/// Builder for `MipModel`.
#[derive(Clone, Debug, Default)]
pub struct MipModelBuilder {
    vars: Vec<Variable>,
    constraints: Vec<LinearConstraint>,
}

impl MipModelBuilder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    #[inline]
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    fn push(&mut self, name: String, kind: VarKind, lower: f64, upper: f64) -> VarIndex {
        self.vars.push(Variable {
            name,
            kind,
            lower,
            upper,
            objective: 0.0,
        });
        VarIndex::new(self.vars.len() - 1)
    }

    /// Adds a 0/1 variable.
    pub fn add_binary<S: Into<String>>(&mut self, name: S) -> VarIndex {
        self.push(name.into(), VarKind::Binary, 0.0, 1.0)
    }

    /// Adds a continuous variable in `[lower, upper]`.
    pub fn add_continuous<S: Into<String>>(&mut self, name: S, lower: f64, upper: f64) -> VarIndex {
        self.push(name.into(), VarKind::Continuous, lower, upper)
    }

    /// Sets the objective coefficient of `var`.
    ///
    /// # Panics
    ///
    /// Panics if `var` is out of bounds.
    pub fn set_objective(&mut self, var: VarIndex, coefficient: f64) {
        assert!(
            var.get() < self.vars.len(),
            "called `MipModelBuilder::set_objective` with out-of-bounds {}",
            var
        );
        self.vars[var.get()].objective = coefficient;
    }

    /// Narrows the bounds of `var`, e.g. to fix a binary.
    ///
    /// # Panics
    ///
    /// Panics if `var` is out of bounds.
    pub fn set_bounds(&mut self, var: VarIndex, lower: f64, upper: f64) {
        assert!(
            var.get() < self.vars.len(),
            "called `MipModelBuilder::set_bounds` with out-of-bounds {}",
            var
        );
        let v = &mut self.vars[var.get()];
        v.lower = lower;
        v.upper = upper;
    }

    pub fn add_constraint(&mut self, constraint: LinearConstraint) {
        self.constraints.push(constraint);
    }

    /// Validates and returns the model.
    pub fn build(self) -> Result<MipModel, MipError> {
        for v in &self.vars {
            let binary_ok = !v.is_binary() || (v.lower >= 0.0 && v.upper <= 1.0);
            if !v.lower.is_finite() || v.upper.is_nan() || v.lower > v.upper || !binary_ok {
                return Err(MipError::InvalidBounds {
                    name: v.name.clone(),
                    lower: v.lower,
                    upper: v.upper,
                });
            }
            if !v.objective.is_finite() {
                return Err(MipError::InvalidCoefficient {
                    tag: "objective".to_string(),
                    var: VarIndex::new(0),
                    value: v.objective,
                });
            }
        }
        let num_vars = self.vars.len();
        for c in &self.constraints {
            c.validate(num_vars)?;
        }
        Ok(MipModel {
            vars: self.vars,
            constraints: self.constraints,
        })
    }
}
