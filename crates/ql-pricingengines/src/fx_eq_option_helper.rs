//! European FX and equity option calibration helper (translates
//! `fxeqoptionhelper.hpp`).
//!
//! The market value is the Black price off the helper's own spot, curves
//! and volatility quote. The model value comes from the analytic engine of
//! the cross-asset model for the helper's FX or EQ component.

use crate::analytic_cc_lgm_fx_option_engine::{fx_forward_today, fx_option_value};
use crate::analytic_xasset_lgm_equity_option_engine::{eq_forward_today, eq_option_value};
use crate::black_formula::{black_formula, black_formula_implied_std_dev};
use ql_core::{ensure, errors::Result, fail, Real, Time, Volatility};
use ql_instruments::{OptionType, PlainVanillaPayoff};
use ql_models::{price_error, AssetType, CalibrationErrorType, CalibrationHelper, CrossAssetModel};
use ql_quotes::Quote;
use ql_termstructures::YieldTermStructure;
use std::sync::Arc;

const MIN_IMPLIED_VOL: Volatility = 0.0010;
const MAX_IMPLIED_VOL: Volatility = 10.0;
const IMPLIED_VOL_ACCURACY: Real = 1.0e-12;
const IMPLIED_VOL_MAX_EVALUATIONS: usize = 5000;

/// Market data of an FX or equity option helper.
///
/// For an FX option `domestic_yield` and `foreign_yield` are the curves of
/// the two currencies and `spot` is the FX rate. For an equity option they
/// are the equity rate curve and the dividend yield curve and `spot` is the
/// equity spot.
#[derive(Debug, Clone)]
pub struct FxEqOptionMarket {
    /// Spot of the underlying.
    pub spot: Arc<dyn Quote>,
    /// Black volatility quote.
    pub volatility: Arc<dyn Quote>,
    /// Discount curve of the payment currency.
    pub domestic_yield: Arc<dyn YieldTermStructure>,
    /// Foreign (FX) or dividend (EQ) curve.
    pub foreign_yield: Arc<dyn YieldTermStructure>,
}

/// A European FX or equity option used to calibrate the Black–Scholes
/// volatility of a cross-asset model component.
///
/// Without an explicit strike the option is struck at the forward.
/// Strikes at or above the forward give calls, strikes below give puts.
///
/// Corresponds to `QuantExt::FxEqOptionHelper`.
#[derive(Debug, Clone)]
pub struct FxEqOptionHelper {
    asset: AssetType,
    index: usize,
    expiry: Time,
    strike: Option<Real>,
    market: FxEqOptionMarket,
    error_type: CalibrationErrorType,
}

impl FxEqOptionHelper {
    /// Helper on component `index` of asset type `asset` (FX or EQ) expiring
    /// at `expiry`.
    pub fn new(
        asset: AssetType,
        index: usize,
        expiry: Time,
        strike: Option<Real>,
        market: FxEqOptionMarket,
        error_type: CalibrationErrorType,
    ) -> Result<Self> {
        ensure!(
            matches!(asset, AssetType::Fx | AssetType::Eq),
            "FX/EQ option helper requires an FX or EQ component, got {asset}"
        );
        ensure!(expiry > 0.0, "expiry ({expiry}) must be positive");
        if let Some(k) = strike {
            ensure!(k > 0.0, "strike ({k}) must be positive");
        }
        let helper = Self {
            asset,
            index,
            expiry,
            strike,
            market,
            error_type,
        };
        helper.spot()?;
        let vol = helper.volatility()?;
        ensure!(vol >= 0.0, "volatility ({vol}) must be non-negative");
        Ok(helper)
    }

    /// Asset type of the calibrated component.
    pub fn asset_type(&self) -> AssetType {
        self.asset
    }

    /// Index of the calibrated component.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Expiry time.
    pub fn expiry(&self) -> Time {
        self.expiry
    }

    fn spot(&self) -> Result<Real> {
        match self.market.spot.value() {
            Some(v) if v > 0.0 => Ok(v),
            Some(v) => fail!("spot ({v}) must be positive"),
            None => fail!("spot quote has no value"),
        }
    }

    /// Current value of the volatility quote.
    pub fn volatility(&self) -> Result<Volatility> {
        match self.market.volatility.value() {
            Some(v) => Ok(v),
            None => fail!("volatility quote has no value"),
        }
    }

    /// Discount factor to expiry in the payment currency.
    pub fn discount(&self) -> Real {
        self.market.domestic_yield.discount(self.expiry)
    }

    /// Forward off the helper's market data.
    pub fn forward(&self) -> Result<Real> {
        Ok(self.spot()? * self.market.foreign_yield.discount(self.expiry) / self.discount())
    }

    /// The payoff: struck at the market forward unless a strike was given.
    pub fn payoff(&self) -> Result<PlainVanillaPayoff> {
        let forward = self.forward()?;
        let strike = self.strike.unwrap_or(forward);
        let option_type = if strike >= forward {
            OptionType::Call
        } else {
            OptionType::Put
        };
        Ok(PlainVanillaPayoff::new(option_type, strike))
    }

    fn black_price(&self, payoff: &PlainVanillaPayoff, vol: Volatility) -> Result<Real> {
        black_formula(
            payoff.option_type,
            payoff.strike,
            self.forward()?,
            vol * self.expiry.sqrt(),
            self.discount(),
        )
    }

    /// Black price of the option at the quoted volatility.
    pub fn market_price(&self) -> Result<Real> {
        self.black_price(&self.payoff()?, self.volatility()?)
    }

    /// Black volatility implied from `price`, clamped to `[0.001, 10]`.
    pub fn implied_volatility(&self, price: Real) -> Result<Volatility> {
        let payoff = self.payoff()?;
        if price <= self.black_price(&payoff, MIN_IMPLIED_VOL)? {
            return Ok(MIN_IMPLIED_VOL);
        }
        if price >= self.black_price(&payoff, MAX_IMPLIED_VOL)? {
            return Ok(MAX_IMPLIED_VOL);
        }
        let sd = black_formula_implied_std_dev(
            payoff.option_type,
            payoff.strike,
            self.forward()?,
            price,
            self.discount(),
            Some(self.volatility()?.max(MIN_IMPLIED_VOL) * self.expiry.sqrt()),
            IMPLIED_VOL_ACCURACY,
            IMPLIED_VOL_MAX_EVALUATIONS,
        )?;
        Ok(sd / self.expiry.sqrt())
    }
}

impl CalibrationHelper<CrossAssetModel> for FxEqOptionHelper {
    fn market_value(&self) -> Real {
        self.market_price().unwrap_or(Real::NAN)
    }

    fn model_value(&self, model: &CrossAssetModel) -> Result<Real> {
        let payoff = self.payoff()?;
        match self.asset {
            AssetType::Fx => {
                let (discount, forward) = fx_forward_today(model, self.index, self.expiry)?;
                fx_option_value(model, self.index, 0.0, self.expiry, &payoff, discount, forward)
            }
            _ => {
                let (discount, forward) = eq_forward_today(model, self.index, self.expiry)?;
                eq_option_value(model, self.index, 0.0, self.expiry, &payoff, discount, forward)
            }
        }
    }

    fn calibration_error(&self, model: &CrossAssetModel) -> Result<Real> {
        let model_value = self.model_value(model)?;
        match self.error_type {
            CalibrationErrorType::ImpliedVolError => {
                Ok(self.implied_volatility(model_value)? - self.volatility()?)
            }
            kind => Ok(price_error(kind, self.market_price()?, model_value)),
        }
    }
}
