//! Black–Scholes equity parametrizations (translates
//! `eqbsparametrization.hpp`, `eqbsconstantparametrization.hpp` and
//! `eqbspiecewiseconstantparametrization.hpp`).
//!
//! An equity is quoted in its own currency, which must be one of the
//! model's interest rate currencies.  Besides the volatility it carries its
//! spot, the FX spot from its currency into the domestic one, the curve
//! used to grow the forward and the dividend yield curve.

use super::fx_bs::check_spot_quote;
use super::piecewise_constant::PiecewiseConstantHelper1;
use super::{first_derivative, no_such_parameter, Parametrization};
use crate::parameter::Parameter;
use ql_core::{ensure, errors::Result, Real, Time};
use ql_currencies::Currency;
use ql_math::Array;
use ql_quotes::Quote;
use ql_termstructures::YieldTermStructure;
use std::sync::Arc;

/// A Black–Scholes equity parametrization with a single volatility
/// parameter.
pub trait EqBsParametrization: Parametrization {
    /// Today's equity spot in the equity currency.
    fn eq_spot_today(&self) -> &Arc<dyn Quote>;

    /// Today's FX spot from the equity currency into the domestic one.
    fn fx_spot_today(&self) -> &Arc<dyn Quote>;

    /// Curve growing the equity forward.
    fn equity_ir_curve_today(&self) -> &Arc<dyn YieldTermStructure>;

    /// Dividend yield curve.
    fn equity_div_yield_curve_today(&self) -> &Arc<dyn YieldTermStructure>;

    /// Name of the equity.
    fn eq_name(&self) -> &str;

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

/// Market data common to the equity parametrizations.
#[derive(Debug, Clone)]
pub struct EqBsMarket {
    /// Equity name.
    pub name: String,
    /// Equity currency.
    pub currency: Currency,
    /// Equity spot.
    pub eq_spot: Arc<dyn Quote>,
    /// FX spot from the equity currency into the domestic one.
    pub fx_spot: Arc<dyn Quote>,
    /// Forecast curve of the equity currency.
    pub ir_curve: Arc<dyn YieldTermStructure>,
    /// Dividend yield curve.
    pub div_curve: Arc<dyn YieldTermStructure>,
}

impl EqBsMarket {
    fn validated(self) -> Result<Self> {
        ensure!(!self.name.is_empty(), "equity name must not be empty");
        check_spot_quote(&self.eq_spot)?;
        check_spot_quote(&self.fx_spot)?;
        Ok(self)
    }
}

macro_rules! eq_market_accessors {
    () => {
        fn eq_spot_today(&self) -> &Arc<dyn Quote> {
            &self.market.eq_spot
        }

        fn fx_spot_today(&self) -> &Arc<dyn Quote> {
            &self.market.fx_spot
        }

        fn equity_ir_curve_today(&self) -> &Arc<dyn YieldTermStructure> {
            &self.market.ir_curve
        }

        fn equity_div_yield_curve_today(&self) -> &Arc<dyn YieldTermStructure> {
            &self.market.div_curve
        }

        fn eq_name(&self) -> &str {
            &self.market.name
        }
    };
}

/// Constant equity volatility.
///
/// Corresponds to `QuantExt::EqBsConstantParametrization`.
#[derive(Debug, Clone)]
pub struct EqBsConstantParametrization {
    market: EqBsMarket,
    sigma: Parameter,
}

impl EqBsConstantParametrization {
    /// Create a parametrization.
    pub fn new(market: EqBsMarket, sigma: Real) -> Result<Self> {
        ensure!(sigma >= 0.0, "sigma ({sigma}) must be non-negative");
        Ok(Self {
            market: market.validated()?,
            sigma: Parameter::unconstrained(Array::from_slice(&[sigma.sqrt()])),
        })
    }

    fn sigma_value(&self) -> Real {
        PiecewiseConstantHelper1::direct(self.sigma.params()[0])
    }
}

impl Parametrization for EqBsConstantParametrization {
    fn currency(&self) -> &Currency {
        &self.market.currency
    }

    fn name(&self) -> &str {
        &self.market.name
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

impl EqBsParametrization for EqBsConstantParametrization {
    eq_market_accessors!();

    fn variance(&self, t: Time) -> Real {
        let s = self.sigma_value();
        s * s * t
    }

    fn sigma(&self, _t: Time) -> Real {
        self.sigma_value()
    }
}

/// Piecewise constant equity volatility.
///
/// Corresponds to `QuantExt::EqBsPiecewiseConstantParametrization`.
#[derive(Debug, Clone)]
pub struct EqBsPiecewiseConstantParametrization {
    market: EqBsMarket,
    sigma: PiecewiseConstantHelper1,
}

impl EqBsPiecewiseConstantParametrization {
    /// Create a parametrization; `sigma` has one value more than `times`.
    pub fn new(market: EqBsMarket, times: &[Time], sigma: &[Real]) -> Result<Self> {
        Ok(Self {
            market: market.validated()?,
            sigma: PiecewiseConstantHelper1::new(times, sigma)?,
        })
    }
}

impl Parametrization for EqBsPiecewiseConstantParametrization {
    fn currency(&self) -> &Currency {
        &self.market.currency
    }

    fn name(&self) -> &str {
        &self.market.name
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

impl EqBsParametrization for EqBsPiecewiseConstantParametrization {
    eq_market_accessors!();

    fn variance(&self, t: Time) -> Real {
        self.sigma.int_y_sqr(t)
    }

    fn sigma(&self, t: Time) -> Real {
        self.sigma.y(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ql_currencies::currencies::USD;
    use ql_quotes::SimpleQuote;
    use ql_termstructures::FlatForward;
    use ql_time::{Actual365Fixed, Date};

    fn market(name: &str) -> EqBsMarket {
        let today = Date::from_ymd(2016, 1, 4).unwrap();
        EqBsMarket {
            name: name.to_string(),
            currency: USD,
            eq_spot: Arc::new(SimpleQuote::new(100.0)),
            fx_spot: Arc::new(SimpleQuote::new(1.0)),
            ir_curve: Arc::new(FlatForward::new(today, 0.03, Actual365Fixed)),
            div_curve: Arc::new(FlatForward::new(today, 0.01, Actual365Fixed)),
        }
    }

    #[test]
    fn constant_equity() {
        let p = EqBsConstantParametrization::new(market("SP5"), 0.2).unwrap();
        assert_eq!(p.name(), "SP5");
        assert_eq!(p.eq_name(), "SP5");
        assert_eq!(p.currency(), &USD);
        assert_abs_diff_eq!(p.variance(0.5), 0.02, epsilon = 1e-15);
        assert_abs_diff_eq!(p.std_deviation(0.5), 0.02f64.sqrt(), epsilon = 1e-15);
    }

    #[test]
    fn piecewise_equity() {
        let p = EqBsPiecewiseConstantParametrization::new(market("SP5"), &[1.0, 2.0], &[0.2, 0.25, 0.3])
            .unwrap();
        assert_abs_diff_eq!(p.variance(3.0), 0.04 + 0.0625 + 0.09, epsilon = 1e-15);
        assert_abs_diff_eq!(p.sigma(1.2), 0.25, epsilon = 1e-15);
        assert_eq!(p.parameter_times(0), &[1.0, 2.0]);
    }

    #[test]
    fn empty_name_rejected() {
        assert!(EqBsConstantParametrization::new(market(""), 0.2).is_err());
    }
}
