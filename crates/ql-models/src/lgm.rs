//! Linear Gauss Markov one-factor model (translates `lgm.hpp`).
//!
//! Under the LGM measure the state `x` is a driftless Gaussian martingale
//! with variance `ζ(t)` and the numeraire is
//! `N(t, x) = exp(H(t) x + ½ H(t)² ζ(t)) / P(0, t)`.

use crate::calibrated_model::{CalibrationOutcome, LinkableCalibratedModel};
use crate::calibration_helper::CalibrationHelper;
use crate::parameter::Parameter;
use crate::parametrization::IrLgm1fParametrization;
use ql_core::{ensure, errors::Result, Observable, ObservableImpl, Observer, Real, Time};
use ql_instruments::OptionType;
use ql_math::optimization::{Constraint, EndCriteria, OptimizationMethod};
use ql_math::{close_enough, normal_cdf};
use ql_termstructures::YieldTermStructure;
use std::sync::{Arc, Weak};

/// Single currency LGM model.
///
/// Every formula takes an optional curve; `None` uses the parametrization's
/// initial term structure.
///
/// Corresponds to `QuantExt::LinearGaussMarkovModel`.
#[derive(Debug)]
pub struct LinearGaussMarkovModel {
    parametrization: Box<dyn IrLgm1fParametrization>,
    observable: ObservableImpl,
}

impl LinearGaussMarkovModel {
    /// Wrap a parametrization.
    pub fn new(parametrization: Box<dyn IrLgm1fParametrization>) -> Self {
        Self {
            parametrization,
            observable: ObservableImpl::new(),
        }
    }

    /// The parametrization.
    pub fn parametrization(&self) -> &dyn IrLgm1fParametrization {
        &*self.parametrization
    }

    /// The mutable parametrization; call [`update`](Self::update) after
    /// changing raw values.
    pub fn parametrization_mut(&mut self) -> &mut dyn IrLgm1fParametrization {
        &mut *self.parametrization
    }

    /// Refresh the parametrization caches and notify observers.
    pub fn update(&mut self) {
        self.parametrization.update();
        self.observable.notify();
    }

    fn curve<'a>(
        &'a self,
        curve: Option<&'a dyn YieldTermStructure>,
    ) -> &'a dyn YieldTermStructure {
        curve.unwrap_or(&**self.parametrization.term_structure())
    }

    /// Numeraire `N(t, x)`.
    pub fn numeraire(&self, t: Time, x: Real, curve: Option<&dyn YieldTermStructure>) -> Result<Real> {
        ensure!(t >= 0.0, "t ({t}) must be non-negative");
        let p = &self.parametrization;
        let (h, zeta) = (p.h(t), p.zeta(t));
        Ok((h * x + 0.5 * h * h * zeta).exp() / self.curve(curve).discount(t))
    }

    /// Zero bond `P(t, T | x)`.
    pub fn discount_bond(
        &self,
        t: Time,
        maturity: Time,
        x: Real,
        curve: Option<&dyn YieldTermStructure>,
    ) -> Result<Real> {
        if close_enough(t, maturity) {
            return Ok(1.0);
        }
        ensure!(
            maturity >= t && t >= 0.0,
            "T ({maturity}) >= t ({t}) >= 0 required"
        );
        let p = &self.parametrization;
        let (ht, hm, zeta) = (p.h(t), p.h(maturity), p.zeta(t));
        let curve = self.curve(curve);
        Ok(curve.discount(maturity) / curve.discount(t)
            * (-(hm - ht) * x - 0.5 * (hm * hm - ht * ht) * zeta).exp())
    }

    /// Zero bond divided by the numeraire, `P(t, T | x) / N(t, x)`.
    pub fn reduced_discount_bond(
        &self,
        t: Time,
        maturity: Time,
        x: Real,
        curve: Option<&dyn YieldTermStructure>,
    ) -> Result<Real> {
        if close_enough(t, maturity) {
            return Ok(1.0 / self.numeraire(t, x, curve)?);
        }
        ensure!(
            maturity >= t && t >= 0.0,
            "T ({maturity}) >= t ({t}) >= 0 required"
        );
        let p = &self.parametrization;
        let (hm, zeta) = (p.h(maturity), p.zeta(t));
        Ok(self.curve(curve).discount(maturity) * (-hm * x - 0.5 * hm * hm * zeta).exp())
    }

    /// Today's value of an option expiring at `t` that delivers the zero bond
    /// maturing at `maturity` against `strike` zero bonds maturing at
    /// `expiry`; with `t == expiry` this is the usual bond option.
    #[allow(clippy::too_many_arguments)]
    pub fn discount_bond_option(
        &self,
        option_type: OptionType,
        strike: Real,
        t: Time,
        expiry: Time,
        maturity: Time,
        curve: Option<&dyn YieldTermStructure>,
    ) -> Result<Real> {
        ensure!(
            maturity > expiry && expiry >= t && t >= 0.0,
            "T ({maturity}) > S ({expiry}) >= t ({t}) >= 0 required"
        );
        let w = option_type.sign();
        let curve = self.curve(curve);
        let (p_s, p_t) = (curve.discount(expiry), curve.discount(maturity));
        let p = &self.parametrization;
        let sigma = p.zeta(t).sqrt() * (p.h(maturity) - p.h(expiry));
        if close_enough(sigma, 0.0) {
            return Ok((w * (p_t - strike * p_s)).max(0.0));
        }
        let dp = (p_t / (strike * p_s)).ln() / sigma + 0.5 * sigma;
        let dm = dp - sigma;
        Ok(w * (p_t * normal_cdf(w * dp) - p_s * strike * normal_cdf(w * dm)))
    }

    fn total_parameters(&self) -> Result<(usize, usize)> {
        Ok((
            self.parametrization.parameter(0)?.size(),
            self.parametrization.parameter(1)?.size(),
        ))
    }

    /// Fix mask freeing only volatility bucket `i`.
    pub fn move_volatility(&self, i: usize) -> Result<Vec<bool>> {
        let (n_vol, n_rev) = self.total_parameters()?;
        ensure!(i < n_vol, "volatility index ({i}) out of range [0, {n_vol})");
        let mut fix = vec![true; n_vol + n_rev];
        fix[i] = false;
        Ok(fix)
    }

    /// Fix mask freeing only reversion bucket `i`.
    pub fn move_reversion(&self, i: usize) -> Result<Vec<bool>> {
        let (n_vol, n_rev) = self.total_parameters()?;
        ensure!(i < n_rev, "reversion index ({i}) out of range [0, {n_rev})");
        let mut fix = vec![true; n_vol + n_rev];
        fix[n_vol + i] = false;
        Ok(fix)
    }

    /// Calibrate volatility bucket `i` to helper `i`, one bucket at a time.
    pub fn calibrate_volatilities_iterative(
        &mut self,
        helpers: &[Arc<dyn CalibrationHelper<Self>>],
        method: &dyn OptimizationMethod,
        end_criteria: &EndCriteria,
        constraint: Option<Arc<dyn Constraint>>,
        weights: &[Real],
    ) -> Result<Vec<CalibrationOutcome>> {
        self.calibrate_iterative(helpers, method, end_criteria, constraint, weights, Self::move_volatility)
    }

    /// Calibrate reversion bucket `i` to helper `i`, one bucket at a time.
    pub fn calibrate_reversions_iterative(
        &mut self,
        helpers: &[Arc<dyn CalibrationHelper<Self>>],
        method: &dyn OptimizationMethod,
        end_criteria: &EndCriteria,
        constraint: Option<Arc<dyn Constraint>>,
        weights: &[Real],
    ) -> Result<Vec<CalibrationOutcome>> {
        self.calibrate_iterative(helpers, method, end_criteria, constraint, weights, Self::move_reversion)
    }

    fn calibrate_iterative(
        &mut self,
        helpers: &[Arc<dyn CalibrationHelper<Self>>],
        method: &dyn OptimizationMethod,
        end_criteria: &EndCriteria,
        constraint: Option<Arc<dyn Constraint>>,
        weights: &[Real],
        mask: fn(&Self, usize) -> Result<Vec<bool>>,
    ) -> Result<Vec<CalibrationOutcome>> {
        ensure!(
            weights.is_empty() || weights.len() == helpers.len(),
            "mismatch between number of helpers ({}) and weights ({})",
            helpers.len(),
            weights.len()
        );
        let mut outcomes = Vec::with_capacity(helpers.len());
        for i in 0..helpers.len() {
            let fix = mask(self, i)?;
            let w = if weights.is_empty() { &[][..] } else { &weights[i..=i] };
            outcomes.push(self.calibrate(
                &helpers[i..=i],
                method,
                end_criteria,
                constraint.clone(),
                w,
                &fix,
            )?);
        }
        Ok(outcomes)
    }
}

impl Observable for LinearGaussMarkovModel {
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

impl LinkableCalibratedModel for LinearGaussMarkovModel {
    fn number_of_arguments(&self) -> usize {
        self.parametrization.number_of_parameters()
    }

    fn argument(&self, i: usize) -> Result<&Parameter> {
        self.parametrization.parameter(i)
    }

    fn argument_mut(&mut self, i: usize) -> Result<&mut Parameter> {
        self.parametrization.parameter_mut(i)
    }

    fn generate_arguments(&mut self) {
        self.parametrization.update();
    }
}
