//! Black–Scholes FX parametrizations (translates `fxbsparametrization.hpp`,
//! `fxbsconstantparametrization.hpp` and
//! `fxbspiecewiseconstantparametrization.hpp`).
//!
//! The currency of an FX parametrization is the foreign currency; the spot
//! quote is the price of one unit of it in domestic currency.

use super::piecewise_constant::PiecewiseConstantHelper1;
use super::{first_derivative, no_such_parameter, Parametrization};
use crate::parameter::Parameter;
use ql_core::{ensure, errors::Result, fail, Real, Time};
use ql_currencies::Currency;
use ql_math::Array;
use ql_quotes::Quote;
use std::sync::Arc;

/// A Black–Scholes FX parametrization with a single volatility parameter.
pub trait FxBsParametrization: Parametrization {
    /// Today's FX spot (domestic per unit of foreign).
    fn fx_spot_today(&self) -> &Arc<dyn Quote>;

    /// Integrated variance `∫_0^t σ²`.
    fn variance(&self, t: Time) -> Real;

    /// Instantaneous volatility.
    fn sigma(&self, t: Time) -> Real {
        first_derivative(|s| self.variance(s), t).max(0.0).sqrt()
    }

    /// `√variance(t)`.
    fn std_deviation(&self, t: Time) -> Real {
        self.variance(t).sqrt()
    }
}

pub(crate) fn check_spot_quote(spot: &Arc<dyn Quote>) -> Result<()> {
    let Some(v) = spot.value() else {
        fail!("spot quote has no value")
    };
    ensure!(v > 0.0, "spot ({v}) must be positive");
    Ok(())
}

/// Constant FX volatility.
///
/// Corresponds to `QuantExt::FxBsConstantParametrization`.
#[derive(Debug, Clone)]
pub struct FxBsConstantParametrization {
    currency: Currency,
    spot: Arc<dyn Quote>,
    sigma: Parameter,
}

impl FxBsConstantParametrization {
    /// Create a parametrization for foreign `currency`.
    pub fn new(currency: Currency, fx_spot_today: Arc<dyn Quote>, sigma: Real) -> Result<Self> {
        check_spot_quote(&fx_spot_today)?;
        ensure!(sigma >= 0.0, "sigma ({sigma}) must be non-negative");
        Ok(Self {
            currency,
            spot: fx_spot_today,
            sigma: Parameter::unconstrained(Array::from_slice(&[sigma.sqrt()])),
        })
    }

    fn sigma_value(&self) -> Real {
        PiecewiseConstantHelper1::direct(self.sigma.params()[0])
    }
}

impl Parametrization for FxBsConstantParametrization {
    fn currency(&self) -> &Currency {
        &self.currency
    }

    fn number_of_parameters(&self) -> usize {
        1
    }

    fn parameter(&self, i: usize) -> Result<&Parameter> {
        match i {
            0 => Ok(&self.sigma),
            _ => no_such_parameter(i, 1),
        }
    }

    fn parameter_mut(&mut self, i: usize) -> Result<&mut Parameter> {
        match i {
            0 => Ok(&mut self.sigma),
            _ => no_such_parameter(i, 1),
        }
    }

    fn direct(&self, _i: usize, x: Real) -> Real {
        PiecewiseConstantHelper1::direct(x)
    }

    fn inverse(&self, _i: usize, y: Real) -> Real {
        PiecewiseConstantHelper1::inverse(y)
    }
}

impl FxBsParametrization for FxBsConstantParametrization {
    fn fx_spot_today(&self) -> &Arc<dyn Quote> {
        &self.spot
    }

    fn variance(&self, t: Time) -> Real {
        let s = self.sigma_value();
        s * s * t
    }

    fn sigma(&self, _t: Time) -> Real {
        self.sigma_value()
    }
}

/// Piecewise constant FX volatility.
///
/// Corresponds to `QuantExt::FxBsPiecewiseConstantParametrization`.
#[derive(Debug, Clone)]
pub struct FxBsPiecewiseConstantParametrization {
    currency: Currency,
    spot: Arc<dyn Quote>,
    sigma: PiecewiseConstantHelper1,
}

impl FxBsPiecewiseConstantParametrization {
    /// Create a parametrization; `sigma` has one value more than `times`.
    pub fn new(
        currency: Currency,
        fx_spot_today: Arc<dyn Quote>,
        times: &[Time],
        sigma: &[Real],
    ) -> Result<Self> {
        check_spot_quote(&fx_spot_today)?;
        Ok(Self {
            currency,
            spot: fx_spot_today,
            sigma: PiecewiseConstantHelper1::new(times, sigma)?,
        })
    }
}

impl Parametrization for FxBsPiecewiseConstantParametrization {
    fn currency(&self) -> &Currency {
        &self.currency
    }

    fn number_of_parameters(&self) -> usize {
        1
    }

    fn parameter(&self, i: usize) -> Result<&Parameter> {
        match i {
            0 => Ok(self.sigma.parameter()),
            _ => no_such_parameter(i, 1),
        }
    }

    fn parameter_mut(&mut self, i: usize) -> Result<&mut Parameter> {
        match i {
            0 => Ok(self.sigma.parameter_mut()),
            _ => no_such_parameter(i, 1),
        }
    }

    fn parameter_times(&self, i: usize) -> &[Time] {
        if i == 0 {
            self.sigma.times()
        } else {
            &[]
        }
    }

    fn direct(&self, _i: usize, x: Real) -> Real {
        PiecewiseConstantHelper1::direct(x)
    }

    fn inverse(&self, _i: usize, y: Real) -> Real {
        PiecewiseConstantHelper1::inverse(y)
    }

    fn update(&mut self) {
        self.sigma.update();
    }
}

impl FxBsParametrization for FxBsPiecewiseConstantParametrization {
    fn fx_spot_today(&self) -> &Arc<dyn Quote> {
        &self.spot
    }

    fn variance(&self, t: Time) -> Real {
        self.sigma.int_y_sqr(t)
    }

    fn sigma(&self, t: Time) -> Real {
        self.sigma.y(t)
    }
}
