//! Calibrated model infrastructure (translates `ql/models/model.hpp` as
//! extended by the linkable calibrated model of the cross-asset library).
//!
//! A model exposes its calibratable [`Parameter`]s as an ordered list of
//! *arguments*.  [`LinkableCalibratedModel::calibrate`] flattens them into
//! one raw vector, fixes a subset through a [`Projection`] and hands the
//! free part to an [`OptimizationMethod`].

use crate::calibration_helper::CalibrationHelper;
use crate::parameter::Parameter;
use ql_core::{ensure, errors::Result, Observable, Real};
use ql_math::optimization::{
    CompositeConstraint, Constraint, CostFunction, EndCriteria, EndCriteriaType,
    OptimizationMethod, ProjectedConstraint, ProjectedCostFunction, Projection,
};
use ql_math::Array;
use std::cell::RefCell;
use std::sync::Arc;
use tracing::debug;

/// Result of a calibration.
#[derive(Debug, Clone)]
pub struct CalibrationOutcome {
    /// Reason the optimizer stopped.
    pub end_criteria: EndCriteriaType,
    /// Weighted calibration errors at the optimum.
    pub problem_values: Array,
    /// Final cost `0.5 · Σ w_i e_i²`.
    pub value: Real,
    /// Optimizer iterations.
    pub iterations: usize,
    /// Cost function evaluations.
    pub function_evaluations: usize,
}

/// A model with calibratable arguments.
///
/// Corresponds to `QuantExt::LinkableCalibratedModel`.
pub trait LinkableCalibratedModel: Observable {
    /// Number of arguments.
    fn number_of_arguments(&self) -> usize;

    /// Argument `i`.
    fn argument(&self, i: usize) -> Result<&Parameter>;

    /// Mutable argument `i`; call
    /// [`generate_arguments`](Self::generate_arguments) afterwards.
    fn argument_mut(&mut self, i: usize) -> Result<&mut Parameter>;

    /// Refresh everything derived from the arguments.
    fn generate_arguments(&mut self) {}

    /// All raw values, argument by argument.
    fn params(&self) -> Result<Array> {
        let mut values = Vec::new();
        for i in 0..self.number_of_arguments() {
            values.extend_from_slice(self.argument(i)?.params().as_slice());
        }
        Ok(Array::from(values))
    }

    /// Write all raw values back, regenerate and notify observers.
    fn set_params(&mut self, params: &Array) -> Result<()> {
        let mut offset = 0;
        for i in 0..self.number_of_arguments() {
            let arg = self.argument_mut(i)?;
            let n = arg.size();
            ensure!(
                offset + n <= params.size(),
                "parameter array too small ({} values)",
                params.size()
            );
            arg.set_params(&params.as_slice()[offset..offset + n])?;
            offset += n;
        }
        ensure!(
            offset == params.size(),
            "parameter array too big ({} values, {offset} expected)",
            params.size()
        );
        self.generate_arguments();
        self.notify_observers();
        Ok(())
    }

    /// Conjunction of the argument constraints over the flat raw vector.
    fn constraint(&self) -> Result<ArgumentsConstraint> {
        let mut parts = Vec::with_capacity(self.number_of_arguments());
        let mut offset = 0;
        for i in 0..self.number_of_arguments() {
            let arg = self.argument(i)?;
            parts.push((offset, arg.size(), arg.constraint().clone()));
            offset += arg.size();
        }
        Ok(ArgumentsConstraint { parts })
    }

    /// Calibrate to `helpers`.
    ///
    /// `weights` defaults to one per helper, `fix_parameters` to all free;
    /// the optional constraint is tested on the full raw vector in addition
    /// to the argument constraints.
    #[allow(clippy::too_many_arguments)]
    fn calibrate(
        &mut self,
        helpers: &[Arc<dyn CalibrationHelper<Self>>],
        method: &dyn OptimizationMethod,
        end_criteria: &EndCriteria,
        constraint: Option<Arc<dyn Constraint>>,
        weights: &[Real],
        fix_parameters: &[bool],
    ) -> Result<CalibrationOutcome>
    where
        Self: Sized,
    {
        calibrate_model(self, helpers, method, end_criteria, constraint, weights, fix_parameters)
    }
}

/// Argument constraints applied to their slices of the flat raw vector.
#[derive(Debug, Clone)]
pub struct ArgumentsConstraint {
    parts: Vec<(usize, usize, Arc<dyn Constraint>)>,
}

impl Constraint for ArgumentsConstraint {
    fn test(&self, x: &Array) -> bool {
        self.parts.iter().all(|(offset, n, c)| {
            x.size() >= offset + n && c.test(&Array::from_slice(&x.as_slice()[*offset..offset + n]))
        })
    }
}

struct CalibrationFunction<'a, M: ?Sized> {
    model: RefCell<&'a mut M>,
    helpers: &'a [Arc<dyn CalibrationHelper<M>>],
    weights: Vec<Real>,
}

impl<M: LinkableCalibratedModel + ?Sized> CostFunction for CalibrationFunction<'_, M> {
    fn values(&self, x: &Array) -> Result<Array> {
        let mut model = self.model.borrow_mut();
        model.set_params(x)?;
        let model: &M = &model;
        self.helpers
            .iter()
            .zip(&self.weights)
            .map(|(h, w)| Ok(h.calibration_error(model)? * w.sqrt()))
            .collect::<Result<Vec<_>>>()
            .map(Array::from)
    }
}

/// Calibration loop behind [`LinkableCalibratedModel::calibrate`].
pub fn calibrate_model<M: LinkableCalibratedModel + ?Sized>(
    model: &mut M,
    helpers: &[Arc<dyn CalibrationHelper<M>>],
    method: &dyn OptimizationMethod,
    end_criteria: &EndCriteria,
    constraint: Option<Arc<dyn Constraint>>,
    weights: &[Real],
    fix_parameters: &[bool],
) -> Result<CalibrationOutcome> {
    ensure!(!helpers.is_empty(), "no calibration helpers given");
    ensure!(
        weights.is_empty() || weights.len() == helpers.len(),
        "mismatch between number of helpers ({}) and weights ({})",
        helpers.len(),
        weights.len()
    );
    let weights = if weights.is_empty() {
        vec![1.0; helpers.len()]
    } else {
        weights.to_vec()
    };
    let initial = model.params()?;
    ensure!(
        fix_parameters.is_empty() || fix_parameters.len() == initial.size(),
        "mismatch between number of parameters ({}) and fixed parameter specs ({})",
        initial.size(),
        fix_parameters.len()
    );

    let mut parts: Vec<Arc<dyn Constraint>> = vec![Arc::new(model.constraint()?)];
    parts.extend(constraint);
    let full_constraint = CompositeConstraint::new(parts);

    let projection = Projection::new(&initial, fix_parameters)?;
    let start = projection.project(&initial);
    debug!(
        helpers = helpers.len(),
        free = projection.free_count(),
        total = initial.size(),
        "starting calibration"
    );

    let function = CalibrationFunction {
        model: RefCell::new(model),
        helpers,
        weights,
    };
    let result = {
        let cost = ProjectedCostFunction::new(&function, &projection);
        let projected_constraint = ProjectedConstraint::new(&full_constraint, &projection);
        method.minimize(&cost, &projected_constraint, &start, end_criteria)
    };
    let model = function.model.into_inner();
    let result = match result {
        Ok(r) => r,
        Err(e) => {
            model.set_params(&initial)?;
            return Err(e);
        }
    };
    model.set_params(&projection.include(&result.x))?;
    debug!(
        end_type = ?result.end_type,
        value = result.value,
        iterations = result.iterations,
        evaluations = result.function_evaluations,
        "calibration finished"
    );

    Ok(CalibrationOutcome {
        end_criteria: result.end_type,
        problem_values: result.values,
        value: result.value,
        iterations: result.iterations,
        function_evaluations: result.function_evaluations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration_helper::CalibrationHelper;
    use approx::assert_abs_diff_eq;
    use ql_core::{ObservableImpl, Observer};
    use ql_math::optimization::{LevenbergMarquardt, NoConstraint, PositiveConstraint, Simplex};
    use std::sync::Weak;

    /// `value(t) = a + b t` with `a` and `b` as separate arguments.
    #[derive(Debug)]
    struct Line {
        args: [Parameter; 2],
        generated: usize,
        observable: ObservableImpl,
    }

    impl Line {
        fn new(a: Real, b: Real) -> Self {
            Self {
                args: [
                    Parameter::unconstrained(Array::from_slice(&[a])),
                    Parameter::new(Array::from_slice(&[b]), Arc::new(PositiveConstraint)),
                ],
                generated: 0,
                observable: ObservableImpl::new(),
            }
        }

        fn value(&self, t: Real) -> Real {
            self.args[0].params()[0] + self.args[1].params()[0] * t
        }
    }

    impl Observable for Line {
        fn register_observer(&self, observer: Weak<dyn Observer>) {
            self.observable.register(observer);
        }
        fn unregister_observer(&self, observer: &Weak<dyn Observer>) {
            self.observable.unregister(observer);
        }
        fn notify_observers(&self) {
            self.observable.notify();
        }
    }

    impl LinkableCalibratedModel for Line {
        fn number_of_arguments(&self) -> usize {
            2
        }
        fn argument(&self, i: usize) -> Result<&Parameter> {
            self.args
                .get(i)
                .ok_or(ql_core::Error::IndexOutOfRange { index: i, size: 2 })
        }
        fn argument_mut(&mut self, i: usize) -> Result<&mut Parameter> {
            self.args
                .get_mut(i)
                .ok_or(ql_core::Error::IndexOutOfRange { index: i, size: 2 })
        }
        fn generate_arguments(&mut self) {
            self.generated += 1;
        }
    }

    #[derive(Debug)]
    struct Point {
        t: Real,
        y: Real,
    }

    impl CalibrationHelper<Line> for Point {
        fn market_value(&self) -> Real {
            self.y
        }
        fn model_value(&self, model: &Line) -> Result<Real> {
            Ok(model.value(self.t))
        }
        fn calibration_error(&self, model: &Line) -> Result<Real> {
            Ok(self.model_value(model)? - self.y)
        }
    }

    fn points(a: Real, b: Real) -> Vec<Arc<dyn CalibrationHelper<Line>>> {
        (0..5)
            .map(|i| {
                let t = i as Real;
                Arc::new(Point { t, y: a + b * t }) as Arc<dyn CalibrationHelper<Line>>
            })
            .collect()
    }

    #[test]
    fn params_round_trip_and_generate() {
        let mut m = Line::new(1.0, 2.0);
        assert_eq!(m.params().unwrap().as_slice(), &[1.0, 2.0]);
        m.set_params(&Array::from_slice(&[3.0, 4.0])).unwrap();
        assert_eq!(m.value(1.0), 7.0);
        assert_eq!(m.generated, 1);
        assert!(m.set_params(&Array::from_slice(&[3.0])).is_err());
        assert!(m.set_params(&Array::from_slice(&[3.0, 4.0, 5.0])).is_err());
    }

    #[test]
    fn calibrates_all_parameters() {
        let mut m = Line::new(0.0, 1.0);
        let out = m
            .calibrate(
                &points(0.5, 0.25),
                &LevenbergMarquardt::default(),
                &EndCriteria::new(100, 10, 1e-10, 1e-12, 1e-10),
                None,
                &[],
                &[],
            )
            .unwrap();
        assert!(out.end_criteria.succeeded());
        assert_abs_diff_eq!(m.value(0.0), 0.5, epsilon = 1e-7);
        assert_abs_diff_eq!(m.value(1.0), 0.75, epsilon = 1e-7);
        assert_eq!(out.problem_values.size(), 5);
    }

    #[test]
    fn fixed_parameters_stay_put() {
        let mut m = Line::new(0.0, 0.25);
        m.calibrate(
            &points(0.5, 0.25),
            &Simplex::new(0.1),
            &EndCriteria::new(1000, 100, 1e-10, 1e-14, 1e-10),
            Some(Arc::new(NoConstraint)),
            &[1.0; 5],
            &[false, true],
        )
        .unwrap();
        assert_eq!(m.args[1].params()[0], 0.25);
        assert_abs_diff_eq!(m.args[0].params()[0], 0.5, epsilon = 1e-5);
    }

    #[test]
    fn size_mismatches_fail_eagerly() {
        let mut m = Line::new(0.0, 1.0);
        let helpers = points(0.5, 0.25);
        let lm = LevenbergMarquardt::default();
        let ec = EndCriteria::default();
        assert!(m.calibrate(&helpers, &lm, &ec, None, &[1.0], &[]).is_err());
        assert!(m.calibrate(&helpers, &lm, &ec, None, &[], &[true]).is_err());
        assert!(m.calibrate(&[], &lm, &ec, None, &[], &[]).is_err());
    }

    #[test]
    fn argument_constraints_are_tested_on_slices() {
        let m = Line::new(0.0, 1.0);
        let c = m.constraint().unwrap();
        assert!(c.test(&Array::from_slice(&[-5.0, 1.0])));
        assert!(!c.test(&Array::from_slice(&[5.0, -1.0])));
    }
}
