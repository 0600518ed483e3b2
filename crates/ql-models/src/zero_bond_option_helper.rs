//! Zero bond option calibration helper for the LGM model.

use crate::calibration_helper::{price_error, CalibrationErrorType, CalibrationHelper};
use crate::lgm::LinearGaussMarkovModel;
use ql_core::{ensure, errors::Result, Real, Time};
use ql_instruments::OptionType;

/// European option on a zero bond with a quoted premium.
///
/// The option expires at `expiry` and delivers the bond maturing at
/// `maturity` for `strike`.
#[derive(Debug, Clone)]
pub struct LgmZeroBondOptionHelper {
    option_type: OptionType,
    strike: Real,
    expiry: Time,
    maturity: Time,
    market_value: Real,
    error_type: CalibrationErrorType,
}

impl LgmZeroBondOptionHelper {
    /// Create a helper; only price based error types are supported.
    pub fn new(
        option_type: OptionType,
        strike: Real,
        expiry: Time,
        maturity: Time,
        market_value: Real,
        error_type: CalibrationErrorType,
    ) -> Result<Self> {
        ensure!(
            maturity > expiry && expiry > 0.0,
            "maturity ({maturity}) > expiry ({expiry}) > 0 required"
        );
        ensure!(strike > 0.0, "strike ({strike}) must be positive");
        ensure!(market_value > 0.0, "market value ({market_value}) must be positive");
        ensure!(
            error_type != CalibrationErrorType::ImpliedVolError,
            "implied volatility error not supported for zero bond options"
        );
        Ok(Self {
            option_type,
            strike,
            expiry,
            maturity,
            market_value,
            error_type,
        })
    }

    /// Helper whose market value is the model value under `model`.
    pub fn from_model(
        model: &LinearGaussMarkovModel,
        option_type: OptionType,
        strike: Real,
        expiry: Time,
        maturity: Time,
        error_type: CalibrationErrorType,
    ) -> Result<Self> {
        let value =
            model.discount_bond_option(option_type, strike, expiry, expiry, maturity, None)?;
        Self::new(option_type, strike, expiry, maturity, value, error_type)
    }

    /// Expiry time.
    pub fn expiry(&self) -> Time {
        self.expiry
    }
}

impl CalibrationHelper<LinearGaussMarkovModel> for LgmZeroBondOptionHelper {
    fn market_value(&self) -> Real {
        self.market_value
    }

    fn model_value(&self, model: &LinearGaussMarkovModel) -> Result<Real> {
        model.discount_bond_option(
            self.option_type,
            self.strike,
            self.expiry,
            self.expiry,
            self.maturity,
            None,
        )
    }

    fn calibration_error(&self, model: &LinearGaussMarkovModel) -> Result<Real> {
        Ok(price_error(self.error_type, self.market_value, self.model_value(model)?))
    }
}
