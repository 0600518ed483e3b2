//! Optimization framework (translates `ql/math/optimization/`).
//!
//! Provides cost functions, constraints, end criteria, parameter projection
//! and two optimizers (Nelder–Mead simplex and Levenberg–Marquardt) behind a
//! common, object-safe [`OptimizationMethod`] trait.

pub mod levenberg_marquardt;
pub mod projection;
pub mod simplex;

use crate::array::Array;
use crate::matrix::Matrix;
use ql_core::{errors::Result, Real};
use std::sync::Arc;

pub use levenberg_marquardt::LevenbergMarquardt;
pub use projection::{ProjectedConstraint, ProjectedCostFunction, Projection};
pub use simplex::Simplex;

// ── Cost function trait ───────────────────────────────────────────────────────

/// A multi-dimensional cost (objective) function.
///
/// Corresponds to `QuantLib::CostFunction`.
pub trait CostFunction {
    /// Residual vector at `x`.
    fn values(&self, x: &Array) -> Result<Array>;

    /// Scalar cost `0.5 * Σ r²(x)`.
    fn value(&self, x: &Array) -> Result<Real> {
        Ok(0.5 * self.values(x)?.norm_squared())
    }

    /// Forward-difference Jacobian (rows are residuals, columns parameters)
    /// given the residuals `base` already evaluated at `x`.
    fn jacobian(&self, x: &Array, base: &Array, step: Real) -> Result<Matrix> {
        let mut jac = Matrix::zeros(base.size(), x.size());
        for j in 0..x.size() {
            let h = step * x[j].abs().max(1.0);
            let mut bumped = x.clone();
            bumped[j] += h;
            let up = self.values(&bumped)?;
            for r in 0..base.size() {
                jac[(r, j)] = (up[r] - base[r]) / h;
            }
        }
        Ok(jac)
    }
}

// ── Constraints ───────────────────────────────────────────────────────────────

/// A constraint on the parameter space.
///
/// Corresponds to `QuantLib::Constraint`.
pub trait Constraint: std::fmt::Debug + Send + Sync {
    /// Return `true` if `x` satisfies the constraint.
    fn test(&self, x: &Array) -> bool;
}

/// No constraint — all parameter values are accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConstraint;

impl Constraint for NoConstraint {
    fn test(&self, _x: &Array) -> bool {
        true
    }
}

/// Positive constraint — all parameter values must be positive.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositiveConstraint;

impl Constraint for PositiveConstraint {
    fn test(&self, x: &Array) -> bool {
        x.iter().all(|&v| v > 0.0)
    }
}

/// Boundary constraint — all parameters must be within `[lo, hi]`.
#[derive(Debug, Clone)]
pub struct BoundaryConstraint {
    lo: Real,
    hi: Real,
}

impl BoundaryConstraint {
    /// Create a boundary constraint.
    pub fn new(lo: Real, hi: Real) -> Self {
        Self { lo, hi }
    }
}

impl Constraint for BoundaryConstraint {
    fn test(&self, x: &Array) -> bool {
        x.iter().all(|&v| v >= self.lo && v <= self.hi)
    }
}

/// Conjunction of constraints, all tested on the same vector.
///
/// Corresponds to `QuantLib::CompositeConstraint`.
#[derive(Debug, Clone, Default)]
pub struct CompositeConstraint {
    parts: Vec<Arc<dyn Constraint>>,
}

impl CompositeConstraint {
    /// Combine the given constraints.
    pub fn new(parts: Vec<Arc<dyn Constraint>>) -> Self {
        Self { parts }
    }
}

impl Constraint for CompositeConstraint {
    fn test(&self, x: &Array) -> bool {
        self.parts.iter().all(|c| c.test(x))
    }
}

// ── End criteria ──────────────────────────────────────────────────────────────

/// Reason an optimization terminated.
///
/// Corresponds to `QuantLib::EndCriteria::Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndCriteriaType {
    /// Not terminated (yet).
    None,
    /// Maximum iterations reached.
    MaxIterations,
    /// Parameters stopped moving (step below root epsilon).
    StationaryPoint,
    /// Cost stopped improving by more than the function epsilon.
    StationaryFunctionValue,
    /// Cost itself is below the function epsilon.
    StationaryFunctionAccuracy,
    /// Gradient norm below the gradient-norm epsilon.
    ZeroGradientNorm,
}

impl EndCriteriaType {
    /// `true` for every outcome except hitting the iteration limit.
    pub fn succeeded(self) -> bool {
        !matches!(self, Self::MaxIterations | Self::None)
    }
}

/// Criteria to stop an optimization.
///
/// Corresponds to `QuantLib::EndCriteria`.
#[derive(Debug, Clone)]
pub struct EndCriteria {
    /// Maximum number of iterations.
    pub max_iterations: usize,
    /// Maximum number of consecutive stationary iterations.
    pub max_stationary_state_iterations: usize,
    /// Tolerance on parameter moves.
    pub root_epsilon: Real,
    /// Tolerance on the cost and its changes.
    pub function_epsilon: Real,
    /// Tolerance on the gradient norm.
    pub gradient_norm_epsilon: Real,
}

impl EndCriteria {
    /// Create new end criteria.
    pub fn new(
        max_iterations: usize,
        max_stationary_state_iterations: usize,
        root_epsilon: Real,
        function_epsilon: Real,
        gradient_norm_epsilon: Real,
    ) -> Self {
        Self {
            max_iterations,
            max_stationary_state_iterations,
            root_epsilon,
            function_epsilon,
            gradient_norm_epsilon,
        }
    }

    /// `Some(MaxIterations)` once `iteration` reached the limit.
    pub fn check_max_iterations(&self, iteration: usize) -> Option<EndCriteriaType> {
        (iteration >= self.max_iterations).then_some(EndCriteriaType::MaxIterations)
    }

    /// Counts consecutive iterations with a parameter move below the root
    /// epsilon; fires after more than `max_stationary_state_iterations`.
    pub fn check_stationary_point(
        &self,
        step_norm: Real,
        stationary_iterations: &mut usize,
    ) -> Option<EndCriteriaType> {
        if step_norm >= self.root_epsilon {
            *stationary_iterations = 0;
            return None;
        }
        *stationary_iterations += 1;
        (*stationary_iterations > self.max_stationary_state_iterations)
            .then_some(EndCriteriaType::StationaryPoint)
    }

    /// Same as [`check_stationary_point`](Self::check_stationary_point) on
    /// the change of the cost.
    pub fn check_stationary_function_value(
        &self,
        f_old: Real,
        f_new: Real,
        stationary_iterations: &mut usize,
    ) -> Option<EndCriteriaType> {
        if (f_new - f_old).abs() >= self.function_epsilon {
            *stationary_iterations = 0;
            return None;
        }
        *stationary_iterations += 1;
        (*stationary_iterations > self.max_stationary_state_iterations)
            .then_some(EndCriteriaType::StationaryFunctionValue)
    }

    /// For non-negative objectives: fires when the cost is below the
    /// function epsilon.
    pub fn check_stationary_function_accuracy(&self, f: Real) -> Option<EndCriteriaType> {
        (f < self.function_epsilon).then_some(EndCriteriaType::StationaryFunctionAccuracy)
    }

    /// Fires when the gradient norm is below its epsilon.
    pub fn check_zero_gradient_norm(&self, norm: Real) -> Option<EndCriteriaType> {
        (norm < self.gradient_norm_epsilon).then_some(EndCriteriaType::ZeroGradientNorm)
    }
}

impl Default for EndCriteria {
    fn default() -> Self {
        Self::new(1000, 100, 1e-8, 1e-8, 1e-8)
    }
}

// ── Optimizer interface ───────────────────────────────────────────────────────

/// Result of an optimization.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Final parameter values.
    pub x: Array,
    /// Final residual vector.
    pub values: Array,
    /// Final cost `0.5 * Σ r²`.
    pub value: Real,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Number of residual-vector evaluations.
    pub function_evaluations: usize,
    /// Reason for termination.
    pub end_type: EndCriteriaType,
}

/// An unconstrained-or-constrained minimizer of a [`CostFunction`].
///
/// Corresponds to `QuantLib::OptimizationMethod`.
pub trait OptimizationMethod: std::fmt::Debug {
    /// Minimize `cost` subject to `constraint`, starting from `initial`.
    ///
    /// Failure to converge is reported through
    /// [`OptimizationResult::end_type`]; errors are reserved for invalid
    /// inputs and failing cost evaluations.
    fn minimize(
        &self,
        cost: &dyn CostFunction,
        constraint: &dyn Constraint,
        initial: &Array,
        end_criteria: &EndCriteria,
    ) -> Result<OptimizationResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraints() {
        let x = Array::from_slice(&[0.5, 2.0]);
        assert!(NoConstraint.test(&x));
        assert!(PositiveConstraint.test(&x));
        assert!(!BoundaryConstraint::new(0.0, 1.0).test(&x));
        let both = CompositeConstraint::new(vec![
            Arc::new(PositiveConstraint),
            Arc::new(BoundaryConstraint::new(0.0, 3.0)),
        ]);
        assert!(both.test(&x));
        assert!(!both.test(&Array::from_slice(&[-0.1, 1.0])));
    }

    #[test]
    fn stationary_counters() {
        let ec = EndCriteria::new(10, 2, 1e-6, 1e-6, 1e-6);
        let mut n = 0;
        assert_eq!(ec.check_stationary_point(1e-7, &mut n), None);
        assert_eq!(ec.check_stationary_point(1e-7, &mut n), None);
        assert_eq!(
            ec.check_stationary_point(1e-7, &mut n),
            Some(EndCriteriaType::StationaryPoint)
        );
        assert_eq!(ec.check_stationary_point(1.0, &mut n), None);
        assert_eq!(n, 0);
        assert_eq!(ec.check_max_iterations(10), Some(EndCriteriaType::MaxIterations));
        assert!(!EndCriteriaType::MaxIterations.succeeded());
    }
}
