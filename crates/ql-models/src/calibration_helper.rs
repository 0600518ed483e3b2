//! Calibration instruments (translates `ql/models/calibrationhelper.hpp`).

use ql_core::{errors::Result, Real};

/// How a helper measures the distance between model and market.
///
/// Corresponds to `QuantLib::BlackCalibrationHelper::CalibrationErrorType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalibrationErrorType {
    /// `|model − market| / market`.
    #[default]
    RelativePriceError,
    /// `market − model`.
    PriceError,
    /// Difference of the Black volatilities implied from both prices.
    ImpliedVolError,
}

/// An instrument with a market value against which a model of type `M`
/// is calibrated.
///
/// Helpers receive the model by reference on every evaluation, so they
/// never hold a handle to it.
pub trait CalibrationHelper<M: ?Sized>: std::fmt::Debug + Send + Sync {
    /// Market value of the instrument.
    fn market_value(&self) -> Real;

    /// Value of the instrument under `model`.
    fn model_value(&self, model: &M) -> Result<Real>;

    /// Error entering the calibration objective.
    fn calibration_error(&self, model: &M) -> Result<Real>;
}

/// Price based calibration error shared by the helpers; anything other
/// than [`CalibrationErrorType::RelativePriceError`] is the plain
/// difference.
pub fn price_error(kind: CalibrationErrorType, market: Real, model: Real) -> Real {
    match kind {
        CalibrationErrorType::RelativePriceError => (market - model).abs() / market,
        _ => market - model,
    }
}
