//! Nelder–Mead simplex (translates `ql/math/optimization/simplex.hpp`).

use super::{
    Constraint, CostFunction, EndCriteria, EndCriteriaType, OptimizationMethod,
    OptimizationResult,
};
use crate::array::Array;
use ql_core::{ensure, errors::Result, Real};

/// Nelder–Mead simplex optimizer.
///
/// Infeasible trial points are given an infinite cost, so the simplex never
/// moves outside the constraint.
///
/// Corresponds to `QuantLib::Simplex`.
#[derive(Debug, Clone)]
pub struct Simplex {
    lambda: Real,
}

impl Simplex {
    /// Create a new simplex optimizer whose initial vertices sit `lambda`
    /// away from the starting point along each axis.
    pub fn new(lambda: Real) -> Self {
        Self { lambda }
    }
}

struct Evaluator<'a> {
    cost: &'a dyn CostFunction,
    constraint: &'a dyn Constraint,
    evaluations: usize,
}

impl Evaluator<'_> {
    fn value(&mut self, x: &Array) -> Result<Real> {
        if !self.constraint.test(x) {
            return Ok(Real::INFINITY);
        }
        self.evaluations += 1;
        let v = self.cost.value(x)?;
        Ok(if v.is_finite() { v } else { Real::INFINITY })
    }
}

impl OptimizationMethod for Simplex {
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
        let n = initial.size();
        let mut eval = Evaluator {
            cost,
            constraint,
            evaluations: 0,
        };

        let mut vertices: Vec<Array> = Vec::with_capacity(n + 1);
        vertices.push(initial.clone());
        for i in 0..n {
            let mut v = initial.clone();
            v[i] += self.lambda;
            if !constraint.test(&v) {
                v[i] = initial[i] - self.lambda;
            }
            vertices.push(v);
        }
        let mut values = vertices
            .iter()
            .map(|v| eval.value(v))
            .collect::<Result<Vec<_>>>()?;

        let mut iterations = 0;
        let mut stationary = 0;
        let mut previous_best = Real::INFINITY;
        let end_type = loop {
            let mut order: Vec<usize> = (0..=n).collect();
            order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
            let (best, worst) = (order[0], order[n]);
            let second_worst = order[n.saturating_sub(1)];

            if let Some(t) = end_criteria.check_stationary_function_accuracy(values[best]) {
                break t;
            }
            let spread = vertices
                .iter()
                .map(|v| (v - &vertices[best]).norm())
                .fold(0.0, Real::max);
            if spread < end_criteria.root_epsilon {
                break EndCriteriaType::StationaryPoint;
            }
            if let Some(t) = end_criteria.check_stationary_function_value(
                previous_best,
                values[best],
                &mut stationary,
            ) {
                break t;
            }
            previous_best = values[best];
            if let Some(t) = end_criteria.check_max_iterations(iterations) {
                break t;
            }
            iterations += 1;

            let centroid = vertices
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != worst)
                .fold(Array::zeros(n), |acc, (_, v)| &acc + v);
            let centroid = &centroid * (1.0 / n as Real);

            let reflected = &(&centroid * 2.0) - &vertices[worst];
            let f_reflected = eval.value(&reflected)?;

            if f_reflected < values[best] {
                let expanded = &(&reflected * 2.0) - &centroid;
                let f_expanded = eval.value(&expanded)?;
                if f_expanded < f_reflected {
                    vertices[worst] = expanded;
                    values[worst] = f_expanded;
                } else {
                    vertices[worst] = reflected;
                    values[worst] = f_reflected;
                }
            } else if f_reflected < values[second_worst] {
                vertices[worst] = reflected;
                values[worst] = f_reflected;
            } else {
                let contracted = if f_reflected < values[worst] {
                    &(&centroid + &reflected) * 0.5
                } else {
                    &(&centroid + &vertices[worst]) * 0.5
                };
                let f_contracted = eval.value(&contracted)?;
                if f_contracted < values[worst].min(f_reflected) {
                    vertices[worst] = contracted;
                    values[worst] = f_contracted;
                } else {
                    let anchor = vertices[best].clone();
                    for i in (0..=n).filter(|&i| i != best) {
                        vertices[i] = &(&anchor + &vertices[i]) * 0.5;
                        values[i] = eval.value(&vertices[i])?;
                    }
                }
            }
        };

        let best = (0..=n)
            .min_by(|&a, &b| values[a].total_cmp(&values[b]))
            .unwrap_or(0);
        let x = vertices.swap_remove(best);
        let residuals = cost.values(&x)?;
        Ok(OptimizationResult {
            value: 0.5 * residuals.norm_squared(),
            values: residuals,
            x,
            iterations,
            function_evaluations: eval.evaluations + 1,
            end_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::{NoConstraint, PositiveConstraint};
    use approx::assert_abs_diff_eq;

    struct Rosenbrock;

    impl CostFunction for Rosenbrock {
        fn values(&self, x: &Array) -> Result<Array> {
            Ok(Array::from_slice(&[1.0 - x[0], 10.0 * (x[1] - x[0] * x[0])]))
        }
    }

    #[test]
    fn minimizes_rosenbrock() {
        let ec = EndCriteria::new(5000, 100, 1e-10, 1e-16, 1e-10);
        let res = Simplex::new(0.1)
            .minimize(&Rosenbrock, &NoConstraint, &Array::from_slice(&[-1.2, 1.0]), &ec)
            .unwrap();
        assert!(res.end_type.succeeded());
        assert_abs_diff_eq!(res.x[0], 1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(res.x[1], 1.0, epsilon = 1e-4);
    }

    #[test]
    fn stays_feasible() {
        struct Shifted;
        impl CostFunction for Shifted {
            fn values(&self, x: &Array) -> Result<Array> {
                Ok(Array::from_slice(&[x[0] + 1.0]))
            }
        }
        let res = Simplex::new(0.5)
            .minimize(
                &Shifted,
                &PositiveConstraint,
                &Array::from_slice(&[1.0]),
                &EndCriteria::new(500, 50, 1e-8, 1e-12, 1e-8),
            )
            .unwrap();
        assert!(res.x[0] > 0.0);
        assert!(res.x[0] < 1e-3);
    }
}
