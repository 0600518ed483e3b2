//! # ql-pricingengines
//!
//! Analytic engines pricing European FX and equity options under the
//! cross-asset model, the Black formula they reduce to, and the FX/EQ
//! option calibration helper built on them.
//!
//! ## Engines
//!
//! - [`AnalyticCcLgmFxOptionEngine`] — FX options, variance from the model
//! - [`AnalyticXAssetLgmEquityOptionEngine`] — equity options, variance from the model
//!
//! ## Helpers
//!
//! - [`FxEqOptionHelper`] — calibrates FX or EQ volatilities of a `CrossAssetModel`

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod analytic_cc_lgm_fx_option_engine;
pub mod analytic_xasset_lgm_equity_option_engine;
pub mod black_formula;
pub mod fx_eq_option_helper;

pub use analytic_cc_lgm_fx_option_engine::{
    fx_forward_today, fx_option_value, AnalyticCcLgmFxOptionEngine,
};
pub use analytic_xasset_lgm_equity_option_engine::{
    eq_forward_today, eq_option_value, AnalyticXAssetLgmEquityOptionEngine,
};
pub use black_formula::{
    black_formula, black_formula_implied_std_dev, black_formula_implied_std_dev_approximation,
};
pub use fx_eq_option_helper::{FxEqOptionHelper, FxEqOptionMarket};
