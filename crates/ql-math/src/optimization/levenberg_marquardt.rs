//! Levenberg–Marquardt least squares (translates
//! `ql/math/optimization/levenbergmarquardt.hpp`).
//!
//! Damped Gauss–Newton on the normal equations with a forward-difference
//! Jacobian.  A step that leaves the feasible region or fails to lower the
//! cost is rejected and the damping increased.

use super::{
    Constraint, CostFunction, EndCriteria, EndCriteriaType, OptimizationMethod,
    OptimizationResult,
};
use crate::array::Array;
use ql_core::{ensure, errors::Result, Real};

const LAMBDA_UP: Real = 3.0;
const LAMBDA_DOWN: Real = 0.35;
const LAMBDA_MIN: Real = 1e-12;
const LAMBDA_MAX: Real = 1e12;

/// Levenberg–Marquardt least-squares optimizer.
///
/// `epsfcn` is the relative accuracy of the residuals; the Jacobian step is
/// `sqrt(epsfcn) * max(|x|, 1)`.  Convergence follows the MINPACK tests:
/// relative reduction of the cost below `function_epsilon`, relative step
/// below `root_epsilon`, or residuals orthogonal to the Jacobian columns
/// within `gradient_norm_epsilon`.
///
/// Corresponds to `QuantLib::LevenbergMarquardt`.
#[derive(Debug, Clone)]
pub struct LevenbergMarquardt {
    epsfcn: Real,
    initial_lambda: Real,
}

impl Default for LevenbergMarquardt {
    fn default() -> Self {
        Self::new(1e-8)
    }
}

impl LevenbergMarquardt {
    /// Create an optimizer for residuals of relative accuracy `epsfcn`.
    pub fn new(epsfcn: Real) -> Self {
        Self {
            epsfcn,
            initial_lambda: 1e-2,
        }
    }

    /// Override the initial damping factor.
    pub fn with_initial_lambda(mut self, lambda: Real) -> Self {
        self.initial_lambda = lambda;
        self
    }
}

impl OptimizationMethod for LevenbergMarquardt {
    fn minimize(
        &self,
        cost: &dyn CostFunction,
        constraint: &dyn Constraint,
        initial: &Array,
        end_criteria: &EndCriteria,
    ) -> Result<OptimizationResult> {
        ensure!(
            constraint.test(initial),
            "initial guess {initial} violates the constraint"
        );
        let step = self.epsfcn.max(Real::EPSILON).sqrt();
        let n = initial.size();

        let mut x = initial.clone();
        let mut residuals = cost.values(&x)?;
        let mut evaluations = 1;
        ensure!(!residuals.is_empty(), "cost function returned no residuals");
        ensure!(
            residuals.is_finite(),
            "cost function is not finite at the initial guess {initial}"
        );
        let mut objective = 0.5 * residuals.norm_squared();
        let mut lambda = self.initial_lambda.max(LAMBDA_MIN);
        let mut iterations = 0;

        let end_type = loop {
            if objective == 0.0 {
                break EndCriteriaType::StationaryFunctionAccuracy;
            }
            if let Some(t) = end_criteria.check_max_iterations(iterations) {
                break t;
            }
            iterations += 1;

            let jacobian = cost.jacobian(&x, &residuals, step)?;
            evaluations += n;
            let j = jacobian.inner();
            let g = j.transpose() * residuals.inner();

            let r_norm = residuals.norm();
            let scaled_gradient = (0..n)
                .map(|c| {
                    let col = j.column(c).norm();
                    if col > 0.0 {
                        g[c].abs() / (col * r_norm)
                    } else {
                        0.0
                    }
                })
                .fold(0.0, Real::max);
            if let Some(t) = end_criteria.check_zero_gradient_norm(scaled_gradient) {
                break t;
            }

            let mut a = j.transpose() * j;
            for i in 0..n {
                a[(i, i)] += lambda * (a[(i, i)].abs() + 1.0);
            }
            let Some(delta) = a.lu().solve(&(-&g)) else {
                lambda = (lambda * LAMBDA_UP).min(LAMBDA_MAX);
                continue;
            };
            let delta = Array::from(delta);

            let step_norm = delta.norm();
            let relative_step = step_norm / (x.norm() + end_criteria.root_epsilon);
            if relative_step < end_criteria.root_epsilon {
                break EndCriteriaType::StationaryPoint;
            }

            let candidate = &x + &delta;
            if !constraint.test(&candidate) {
                lambda = (lambda * LAMBDA_UP).min(LAMBDA_MAX);
                continue;
            }
            let candidate_residuals = cost.values(&candidate)?;
            evaluations += 1;
            let candidate_objective = 0.5 * candidate_residuals.norm_squared();

            if candidate_objective.is_finite() && candidate_objective < objective {
                let reduction = (objective - candidate_objective) / objective;
                x = candidate;
                residuals = candidate_residuals;
                objective = candidate_objective;
                lambda = (lambda * LAMBDA_DOWN).max(LAMBDA_MIN);
                if reduction < end_criteria.function_epsilon && step_norm < 1.0 {
                    break EndCriteriaType::StationaryFunctionValue;
                }
            } else {
                lambda = (lambda * LAMBDA_UP).min(LAMBDA_MAX);
                if lambda >= LAMBDA_MAX {
                    break EndCriteriaType::StationaryPoint;
                }
            }
        };

        Ok(OptimizationResult {
            x,
            value: objective,
            values: residuals,
            iterations,
            function_evaluations: evaluations,
            end_type,
        })
    }
}
