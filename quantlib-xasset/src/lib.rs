//! # quantlib-xasset
//!
//! A cross-asset Gaussian model (linear Gauss–Markov interest rates,
//! Black–Scholes FX and equity factors under one correlation matrix) with
//! its closed-form analytics, calibration and model-implied term
//! structures.
//!
//! This crate is a **façade** that re-exports the underlying workspace
//! crates. Application code should depend on this crate rather than the
//! individual `ql-*` crates.
//!
//! ## Quick start
//!
//! ```rust
//! use quantlib_xasset::currencies::currencies::{EUR, USD};
//! use quantlib_xasset::models::cross_asset::analytics::fx_fx_covariance;
//! use quantlib_xasset::models::{
//!     CrossAssetModel, FxBsConstantParametrization, IrLgm1fConstantParametrization, ModelFactor,
//! };
//! use quantlib_xasset::quotes::{Quote, SimpleQuote};
//! use quantlib_xasset::termstructures::{FlatForward, YieldTermStructure};
//! use quantlib_xasset::time::{Actual365Fixed, Date};
//! use std::sync::Arc;
//!
//! let today = Date::from_ymd(2016, 1, 4).unwrap();
//! let eur: Arc<dyn YieldTermStructure> = Arc::new(FlatForward::new(today, 0.02, Actual365Fixed));
//! let usd: Arc<dyn YieldTermStructure> = Arc::new(FlatForward::new(today, 0.03, Actual365Fixed));
//! let spot: Arc<dyn Quote> = Arc::new(SimpleQuote::new(0.9));
//!
//! let model = CrossAssetModel::new(
//!     vec![
//!         ModelFactor::Ir(Box::new(IrLgm1fConstantParametrization::new(EUR, eur, 0.0, 0.01).unwrap())),
//!         ModelFactor::Ir(Box::new(IrLgm1fConstantParametrization::new(USD, usd, 0.0, 0.01).unwrap())),
//!         ModelFactor::Fx(Box::new(FxBsConstantParametrization::new(USD, spot, 0.15).unwrap())),
//!     ],
//!     None,
//! )
//! .unwrap();
//!
//! // without rate volatility the log FX variance is σ² t
//! let var = fx_fx_covariance(&model, 0, 0, 0.0, 2.0).unwrap();
//! assert!((var - 0.15 * 0.15 * 2.0).abs() < 1e-10);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, and error definitions.
pub use ql_core as core;

/// Dates and day counters.
pub use ql_time as time;

/// Linear algebra, distributions, solvers, integrators and optimisers.
pub use ql_math as math;

/// Currency definitions.
pub use ql_currencies as currencies;

/// Market quotes.
pub use ql_quotes as quotes;

/// Yield curves and Black volatility surfaces.
pub use ql_termstructures as termstructures;

/// Option types and payoffs.
pub use ql_instruments as instruments;

/// Parametrizations, the LGM model and the cross-asset model.
pub use ql_models as models;

/// Black formula, analytic FX and equity option engines and their
/// calibration helper.
pub use ql_pricingengines as pricingengines;

/// Term structures implied by the cross-asset model.
pub use ql_modelimplied as modelimplied;
