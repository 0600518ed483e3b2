//! Linear Gauss Markov one-factor interest rate parametrizations
//! (translates `irlgm1fparametrization.hpp`,
//! `irlgm1fconstantparametrization.hpp`,
//! `irlgm1fpiecewiseconstantparametrization.hpp` and
//! `irlgm1fpiecewiseconstanthullwhiteadaptor.hpp`).
//!
//! The LGM state `z` has variance `ζ(t)` and the zero bond reconstruction
//! formula uses `H(t)`.  The model is invariant under
//! `H → scaling·H + shift`, `ζ → ζ / scaling²`; both adjustments are
//! exposed to the user.

use super::piecewise_constant::{
    PiecewiseConstantHelper1, PiecewiseConstantHelper2, PiecewiseConstantHelper3,
};
use super::{first_derivative, no_such_parameter, second_derivative, Parametrization};
use crate::parameter::Parameter;
use ql_core::{ensure, errors::Result, Real, Time};
use ql_currencies::Currency;
use ql_math::Array;
use ql_termstructures::YieldTermStructure;
use std::sync::Arc;

const ZERO_CUTOFF: Real = 1.0e-6;

/// An LGM one-factor interest rate parametrization.
///
/// Parameter 0 is the volatility (`alpha` or Hull–White `sigma`), parameter 1
/// the reversion `kappa`.  The derived quantities default to finite
/// differences of `zeta` and `H`.
pub trait IrLgm1fParametrization: Parametrization {
    /// The initial yield curve of the currency.
    fn term_structure(&self) -> &Arc<dyn YieldTermStructure>;

    /// Variance of the state variable at `t`.
    fn zeta(&self, t: Time) -> Real;

    /// `H(t)`.
    fn h(&self, t: Time) -> Real;

    /// Instantaneous volatility `α(t) = √ζ'(t)`.
    fn alpha(&self, t: Time) -> Real {
        first_derivative(|s| self.zeta(s), t).max(0.0).sqrt()
    }

    /// `H'(t)`.
    fn h_prime(&self, t: Time) -> Real {
        first_derivative(|s| self.h(s), t)
    }

    /// `H''(t)`.
    fn h_prime2(&self, t: Time) -> Real {
        second_derivative(|s| self.h(s), t)
    }

    /// Mean reversion `κ(t) = -H''(t)/H'(t)`.
    fn kappa(&self, t: Time) -> Real {
        -self.h_prime2(t) / self.h_prime(t)
    }

    /// Hull–White volatility `σ(t) = H'(t)·α(t)`.
    fn hull_white_sigma(&self, t: Time) -> Real {
        self.h_prime(t) * self.alpha(t)
    }

    /// Additive shift of `H`.
    fn shift(&self) -> Real;

    /// Multiplicative scaling of `H`.
    fn scaling(&self) -> Real;

    /// Set the shift of `H`.
    fn set_shift(&mut self, shift: Real);

    /// Set the scaling of `H`.
    fn set_scaling(&mut self, scaling: Real);
}

/// Currency, curve and the model invariance adjustments.
#[derive(Debug, Clone)]
struct IrBase {
    currency: Currency,
    curve: Arc<dyn YieldTermStructure>,
    shift: Real,
    scaling: Real,
}

impl IrBase {
    fn new(currency: Currency, curve: Arc<dyn YieldTermStructure>) -> Self {
        Self {
            currency,
            curve,
            shift: 0.0,
            scaling: 1.0,
        }
    }
}

macro_rules! ir_base_accessors {
    () => {
        fn term_structure(&self) -> &Arc<dyn YieldTermStructure> {
            &self.base.curve
        }

        fn shift(&self) -> Real {
            self.base.shift
        }

        fn scaling(&self) -> Real {
            self.base.scaling
        }

        fn set_shift(&mut self, shift: Real) {
            self.base.shift = shift;
        }

        fn set_scaling(&mut self, scaling: Real) {
            self.base.scaling = scaling;
        }
    };
}

// ── Constant ──────────────────────────────────────────────────────────────────

/// Constant `α` and `κ`.
///
/// Corresponds to `QuantExt::IrLgm1fConstantParametrization`.
#[derive(Debug, Clone)]
pub struct IrLgm1fConstantParametrization {
    base: IrBase,
    alpha: Parameter,
    kappa: Parameter,
}

impl IrLgm1fConstantParametrization {
    /// Create a parametrization with volatility `alpha ≥ 0` and reversion
    /// `kappa`.
    pub fn new(
        currency: Currency,
        curve: Arc<dyn YieldTermStructure>,
        alpha: Real,
        kappa: Real,
    ) -> Result<Self> {
        ensure!(alpha >= 0.0, "alpha ({alpha}) must be non-negative");
        Ok(Self {
            base: IrBase::new(currency, curve),
            alpha: Parameter::unconstrained(Array::from_slice(&[alpha.sqrt()])),
            kappa: Parameter::unconstrained(Array::from_slice(&[kappa])),
        })
    }

    fn alpha_value(&self) -> Real {
        self.direct(0, self.alpha.params()[0])
    }

    fn kappa_value(&self) -> Real {
        self.kappa.params()[0]
    }
}

impl Parametrization for IrLgm1fConstantParametrization {
    fn currency(&self) -> &Currency {
        &self.base.currency
    }

    fn number_of_parameters(&self) -> usize {
        2
    }

    fn parameter(&self, i: usize) -> Result<&Parameter> {
        match i {
            0 => Ok(&self.alpha),
            1 => Ok(&self.kappa),
            _ => no_such_parameter(i, 2),
        }
    }

    fn parameter_mut(&mut self, i: usize) -> Result<&mut Parameter> {
        match i {
            0 => Ok(&mut self.alpha),
            1 => Ok(&mut self.kappa),
            _ => no_such_parameter(i, 2),
        }
    }

    fn direct(&self, i: usize, x: Real) -> Real {
        if i == 0 {
            x * x
        } else {
            x
        }
    }

    fn inverse(&self, i: usize, y: Real) -> Real {
        if i == 0 {
            y.sqrt()
        } else {
            y
        }
    }
}

impl IrLgm1fParametrization for IrLgm1fConstantParametrization {
    ir_base_accessors!();

    fn zeta(&self, t: Time) -> Real {
        let a = self.alpha_value();
        a * a * t / (self.base.scaling * self.base.scaling)
    }

    fn h(&self, t: Time) -> Real {
        let k = self.kappa_value();
        let unscaled = if k.abs() < ZERO_CUTOFF {
            t
        } else {
            (1.0 - (-k * t).exp()) / k
        };
        self.base.scaling * unscaled + self.base.shift
    }

    fn alpha(&self, _t: Time) -> Real {
        self.alpha_value() / self.base.scaling
    }

    fn h_prime(&self, t: Time) -> Real {
        self.base.scaling * (-self.kappa_value() * t).exp()
    }

    fn h_prime2(&self, t: Time) -> Real {
        let k = self.kappa_value();
        -self.base.scaling * k * (-k * t).exp()
    }

    fn kappa(&self, _t: Time) -> Real {
        self.kappa_value()
    }
}

// ── Piecewise constant ───────────────────────────────────────────────────────

/// Piecewise constant `α` and `κ` on independent grids.
///
/// Corresponds to `QuantExt::IrLgm1fPiecewiseConstantParametrization`.
#[derive(Debug, Clone)]
pub struct IrLgm1fPiecewiseConstantParametrization {
    base: IrBase,
    alpha: PiecewiseConstantHelper1,
    kappa: PiecewiseConstantHelper2,
}

impl IrLgm1fPiecewiseConstantParametrization {
    /// Create a parametrization; `alpha` has one value more than
    /// `alpha_times`, likewise for `kappa`.
    pub fn new(
        currency: Currency,
        curve: Arc<dyn YieldTermStructure>,
        alpha_times: &[Time],
        alpha: &[Real],
        kappa_times: &[Time],
        kappa: &[Real],
    ) -> Result<Self> {
        Ok(Self {
            base: IrBase::new(currency, curve),
            alpha: PiecewiseConstantHelper1::new(alpha_times, alpha)?,
            kappa: PiecewiseConstantHelper2::new(kappa_times, kappa)?,
        })
    }
}

impl Parametrization for IrLgm1fPiecewiseConstantParametrization {
    fn currency(&self) -> &Currency {
        &self.base.currency
    }

    fn number_of_parameters(&self) -> usize {
        2
    }

    fn parameter(&self, i: usize) -> Result<&Parameter> {
        match i {
            0 => Ok(self.alpha.parameter()),
            1 => Ok(self.kappa.parameter()),
            _ => no_such_parameter(i, 2),
        }
    }

    fn parameter_mut(&mut self, i: usize) -> Result<&mut Parameter> {
        match i {
            0 => Ok(self.alpha.parameter_mut()),
            1 => Ok(self.kappa.parameter_mut()),
            _ => no_such_parameter(i, 2),
        }
    }

    fn parameter_times(&self, i: usize) -> &[Time] {
        match i {
            0 => self.alpha.times(),
            1 => self.kappa.times(),
            _ => &[],
        }
    }

    fn direct(&self, i: usize, x: Real) -> Real {
        if i == 0 {
            PiecewiseConstantHelper1::direct(x)
        } else {
            PiecewiseConstantHelper2::direct(x)
        }
    }

    fn inverse(&self, i: usize, y: Real) -> Real {
        if i == 0 {
            PiecewiseConstantHelper1::inverse(y)
        } else {
            PiecewiseConstantHelper2::inverse(y)
        }
    }

    fn update(&mut self) {
        self.alpha.update();
        self.kappa.update();
    }
}

impl IrLgm1fParametrization for IrLgm1fPiecewiseConstantParametrization {
    ir_base_accessors!();

    fn zeta(&self, t: Time) -> Real {
        self.alpha.int_y_sqr(t) / (self.base.scaling * self.base.scaling)
    }

    fn h(&self, t: Time) -> Real {
        self.base.scaling * self.kappa.int_exp_m_int_y(t) + self.base.shift
    }

    fn alpha(&self, t: Time) -> Real {
        self.alpha.y(t) / self.base.scaling
    }

    fn h_prime(&self, t: Time) -> Real {
        self.base.scaling * self.kappa.exp_m_int_y(t)
    }

    fn h_prime2(&self, t: Time) -> Real {
        -self.base.scaling * self.kappa.exp_m_int_y(t) * self.kappa.y(t)
    }

    fn kappa(&self, t: Time) -> Real {
        self.kappa.y(t)
    }
}

// ── Hull–White adaptor ────────────────────────────────────────────────────────

/// LGM parametrization driven by piecewise constant Hull–White `σ` and `κ`.
///
/// `ζ(t) = ∫ σ² exp(2∫κ)` and `H(t) = ∫ exp(-∫κ)`, so that
/// [`hull_white_sigma`](IrLgm1fParametrization::hull_white_sigma) returns
/// `σ(t)` again.
///
/// Corresponds to `QuantExt::IrLgm1fPiecewiseConstantHullWhiteAdaptor`.
#[derive(Debug, Clone)]
pub struct IrLgm1fPiecewiseConstantHullWhiteAdaptor {
    base: IrBase,
    sigma_kappa: PiecewiseConstantHelper3,
    kappa: PiecewiseConstantHelper2,
}

impl IrLgm1fPiecewiseConstantHullWhiteAdaptor {
    /// Create an adaptor from Hull–White volatilities and reversions.
    pub fn new(
        currency: Currency,
        curve: Arc<dyn YieldTermStructure>,
        sigma_times: &[Time],
        sigma: &[Real],
        kappa_times: &[Time],
        kappa: &[Real],
    ) -> Result<Self> {
        Ok(Self {
            base: IrBase::new(currency, curve),
            sigma_kappa: PiecewiseConstantHelper3::new(sigma_times, sigma, kappa_times, kappa)?,
            kappa: PiecewiseConstantHelper2::new(kappa_times, kappa)?,
        })
    }
}

impl Parametrization for IrLgm1fPiecewiseConstantHullWhiteAdaptor {
    fn currency(&self) -> &Currency {
        &self.base.currency
    }

    fn number_of_parameters(&self) -> usize {
        2
    }

    fn parameter(&self, i: usize) -> Result<&Parameter> {
        match i {
            0 => Ok(self.sigma_kappa.parameter1()),
            1 => Ok(self.sigma_kappa.parameter2()),
            _ => no_such_parameter(i, 2),
        }
    }

    fn parameter_mut(&mut self, i: usize) -> Result<&mut Parameter> {
        match i {
            0 => Ok(self.sigma_kappa.parameter1_mut()),
            1 => Ok(self.sigma_kappa.parameter2_mut()),
            _ => no_such_parameter(i, 2),
        }
    }

    fn parameter_times(&self, i: usize) -> &[Time] {
        match i {
            0 => self.sigma_kappa.times1(),
            1 => self.sigma_kappa.times2(),
            _ => &[],
        }
    }

    fn direct(&self, i: usize, x: Real) -> Real {
        if i == 0 {
            PiecewiseConstantHelper1::direct(x)
        } else {
            x
        }
    }

    fn inverse(&self, i: usize, y: Real) -> Real {
        if i == 0 {
            PiecewiseConstantHelper1::inverse(y)
        } else {
            y
        }
    }

    fn update(&mut self) {
        self.sigma_kappa.update();
        let kappa = self.sigma_kappa.parameter2().params().clone();
        let synced = self.kappa.parameter_mut().set_params(kappa.as_slice());
        debug_assert!(synced.is_ok(), "reversion grids out of sync: {synced:?}");
        self.kappa.update();
    }
}

impl IrLgm1fParametrization for IrLgm1fPiecewiseConstantHullWhiteAdaptor {
    ir_base_accessors!();

    fn zeta(&self, t: Time) -> Real {
        self.sigma_kappa.int_y1_sqr_exp_2_int_y2(t) / (self.base.scaling * self.base.scaling)
    }

    fn h(&self, t: Time) -> Real {
        self.base.scaling * self.kappa.int_exp_m_int_y(t) + self.base.shift
    }

    fn alpha(&self, t: Time) -> Real {
        self.sigma_kappa.y1(t) / (self.base.scaling * self.kappa.exp_m_int_y(t))
    }

    fn h_prime(&self, t: Time) -> Real {
        self.base.scaling * self.kappa.exp_m_int_y(t)
    }

    fn h_prime2(&self, t: Time) -> Real {
        -self.base.scaling * self.kappa.exp_m_int_y(t) * self.kappa(t)
    }

    fn kappa(&self, t: Time) -> Real {
        self.sigma_kappa.y2(t)
    }

    fn hull_white_sigma(&self, t: Time) -> Real {
        self.sigma_kappa.y1(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parametrization::{first_derivative, second_derivative};
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;
    use ql_currencies::currencies::EUR;
    use ql_termstructures::FlatForward;
    use ql_time::{Actual365Fixed, Date};

    fn curve() -> Arc<dyn YieldTermStructure> {
        Arc::new(FlatForward::new(
            Date::from_ymd(2016, 1, 4).unwrap(),
            0.02,
            Actual365Fixed,
        ))
    }

    #[test]
    fn constant_closed_forms_match_finite_differences() {
        let p = IrLgm1fConstantParametrization::new(EUR, curve(), 0.01, 0.02).unwrap();
        let t = 3.0;
        assert_abs_diff_eq!(p.zeta(t), 1e-4 * t, epsilon = 1e-16);
        assert_abs_diff_eq!(p.h(t), (1.0 - (-0.06f64).exp()) / 0.02, epsilon = 1e-14);
        assert_abs_diff_eq!(p.alpha(t), 0.01, epsilon = 1e-15);
        assert_abs_diff_eq!(p.h_prime(t), first_derivative(|s| p.h(s), t), epsilon = 1e-8);
        assert_abs_diff_eq!(p.h_prime2(t), second_derivative(|s| p.h(s), t), epsilon = 1e-6);
        assert_abs_diff_eq!(p.kappa(t), 0.02, epsilon = 1e-15);
        assert_abs_diff_eq!(p.hull_white_sigma(t), 0.01 * (-0.06f64).exp(), epsilon = 1e-15);
    }

    #[test]
    fn constant_zero_reversion() {
        let p = IrLgm1fConstantParametrization::new(EUR, curve(), 0.01, 0.0).unwrap();
        assert_abs_diff_eq!(p.h(2.5), 2.5, epsilon = 1e-15);
    }

    #[test]
    fn shift_and_scaling() {
        let mut p = IrLgm1fConstantParametrization::new(EUR, curve(), 0.01, 0.02).unwrap();
        let (h, z) = (p.h(2.0), p.zeta(2.0));
        p.set_shift(0.5);
        p.set_scaling(2.0);
        assert_abs_diff_eq!(p.h(2.0), 2.0 * h + 0.5, epsilon = 1e-14);
        assert_abs_diff_eq!(p.zeta(2.0), z / 4.0, epsilon = 1e-16);
    }

    #[test]
    fn piecewise_matches_constant_for_flat_inputs() {
        let c = IrLgm1fConstantParametrization::new(EUR, curve(), 0.01, 0.02).unwrap();
        let p = IrLgm1fPiecewiseConstantParametrization::new(
            EUR,
            curve(),
            &[1.0, 2.0],
            &[0.01, 0.01, 0.01],
            &[1.5],
            &[0.02, 0.02],
        )
        .unwrap();
        for &t in &[0.0, 0.3, 1.0, 1.7, 4.0] {
            assert_abs_diff_eq!(p.zeta(t), c.zeta(t), epsilon = 1e-15);
            assert_abs_diff_eq!(p.h(t), c.h(t), epsilon = 1e-13);
            assert_abs_diff_eq!(p.h_prime(t), c.h_prime(t), epsilon = 1e-13);
        }
        assert_eq!(p.parameter_times(0), &[1.0, 2.0]);
        assert_eq!(p.parameter_times(1), &[1.5]);
    }

    #[test]
    fn hull_white_adaptor_recovers_sigma() {
        let p = IrLgm1fPiecewiseConstantHullWhiteAdaptor::new(
            EUR,
            curve(),
            &[1.0],
            &[0.008, 0.012],
            &[2.0],
            &[0.03, 0.01],
        )
        .unwrap();
        for &t in &[0.5, 1.5, 3.0] {
            assert_abs_diff_eq!(p.hull_white_sigma(t), p.h_prime(t) * p.alpha(t), epsilon = 1e-12);
            assert_abs_diff_eq!(
                p.alpha(t) * p.alpha(t),
                first_derivative(|s| p.zeta(s), t),
                epsilon = 1e-9
            );
        }
        assert_abs_diff_eq!(p.hull_white_sigma(1.5), 0.012, epsilon = 1e-15);
        assert_abs_diff_eq!(p.kappa(2.5), 0.01, epsilon = 1e-15);
    }

    #[test]
    fn hull_white_adaptor_update_syncs_reversion() {
        let mut p = IrLgm1fPiecewiseConstantHullWhiteAdaptor::new(
            EUR,
            curve(),
            &[],
            &[0.01],
            &[],
            &[0.01],
        )
        .unwrap();
        p.set_param(1, 0, 0.05).unwrap();
        assert_abs_diff_eq!(p.h_prime(1.0), (-0.05f64).exp(), epsilon = 1e-15);
    }

    #[test]
    fn hull_white_adaptor_update_moves_h_and_zeta_together() {
        let mut p = IrLgm1fPiecewiseConstantHullWhiteAdaptor::new(
            EUR,
            curve(),
            &[],
            &[0.01],
            &[2.0],
            &[0.03, 0.01],
        )
        .unwrap();
        p.set_param(1, 1, 0.04).unwrap();
        assert_abs_diff_eq!(p.kappa(2.5), 0.04, epsilon = 1e-15);
        let h = (1.0 - (-0.06f64).exp()) / 0.03
            + (-0.06f64).exp() * (1.0 - (-0.04f64).exp()) / 0.04;
        assert_abs_diff_eq!(p.h(3.0), h, epsilon = 1e-14);
        let zeta = 1e-4 * ((0.12f64).exp() - 1.0) / 0.06
            + 1e-4 * (0.12f64).exp() * ((0.08f64).exp() - 1.0) / 0.08;
        assert_abs_diff_eq!(p.zeta(3.0), zeta, epsilon = 1e-16);
        for &t in &[0.5, 2.5] {
            assert_abs_diff_eq!(p.hull_white_sigma(t), p.h_prime(t) * p.alpha(t), epsilon = 1e-12);
        }
    }

    #[test]
    fn parameter_index_out_of_range() {
        let p = IrLgm1fConstantParametrization::new(EUR, curve(), 0.01, 0.02).unwrap();
        assert!(p.parameter(2).is_err());
        assert!(IrLgm1fConstantParametrization::new(EUR, curve(), -0.01, 0.02).is_err());
    }

    proptest! {
        #[test]
        fn transforms_round_trip(y in 0.0f64..1.0, k in -0.5f64..0.5) {
            let p = IrLgm1fConstantParametrization::new(EUR, curve(), 0.01, 0.02).unwrap();
            prop_assert!((p.direct(0, p.inverse(0, y)) - y).abs() < 1e-14);
            prop_assert!((p.direct(1, p.inverse(1, k)) - k).abs() < 1e-15);
        }
    }
}
