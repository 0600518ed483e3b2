//! # ql-models
//!
//! Linear Gauss–Markov interest rate models, Black–Scholes FX and equity
//! factors and the cross-asset model joining them.
//!
//! ## Layers
//!
//! ```text
//! Parameter ─► Parametrization (IR LGM1F, FX BS, EQ BS)
//!                   │
//!                   ├─► LinearGaussMarkovModel        (one currency)
//!                   └─► CrossAssetModel               (IR, FX, EQ + correlation)
//!                           ├── analytics             (closed-form moments)
//!                           ├── CrossAssetStateProcess
//!                           └── Gaussian1dCrossAssetAdaptor
//!
//! LinkableCalibratedModel + CalibrationHelper ─► calibration of either model
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Infrastructure ───────────────────────────────────────────────────────
pub mod calibrated_model;
pub mod calibration_helper;
pub mod parameter;
pub mod parametrization;

// ── Models ───────────────────────────────────────────────────────────────
pub mod cross_asset;
pub mod lgm;

// ── Calibration instruments ──────────────────────────────────────────────
pub mod zero_bond_option_helper;

// ── Re-exports ───────────────────────────────────────────────────────────
pub use calibrated_model::{calibrate_model, CalibrationOutcome, LinkableCalibratedModel};
pub use calibration_helper::{price_error, CalibrationErrorType, CalibrationHelper};
pub use cross_asset::{
    AssetType, CrossAssetModel, CrossAssetStateProcess, ExactStep, Gaussian1dCrossAssetAdaptor,
    ModelFactor, SharedCrossAssetModel,
};
pub use lgm::LinearGaussMarkovModel;
pub use parameter::Parameter;
pub use parametrization::{
    EqBsConstantParametrization, EqBsMarket, EqBsParametrization,
    EqBsPiecewiseConstantParametrization, FxBsConstantParametrization, FxBsParametrization,
    FxBsPiecewiseConstantParametrization, IrLgm1fConstantParametrization, IrLgm1fParametrization,
    IrLgm1fPiecewiseConstantHullWhiteAdaptor, IrLgm1fPiecewiseConstantParametrization,
    Parametrization,
};
pub use zero_bond_option_helper::LgmZeroBondOptionHelper;
