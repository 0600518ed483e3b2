//! # ql-modelimplied
//!
//! Term structures implied by a cross-asset model at a displaced reference
//! and model state: yield curves from the LGM components and Black
//! volatility surfaces from the FX and equity components.
//!
//! Every structure shares the model through a
//! [`SharedCrossAssetModel`](ql_models::SharedCrossAssetModel), registers
//! itself as an observer and forwards model notifications to its own
//! observers. A structure is either date based (moved with `move_to_date`,
//! relative time measured on the model's curve) or purely time based
//! (moved with `move_to_time`).

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

mod reference;

/// LGM implied yield curves and their target-corrected variants.
pub mod yield_curve;

/// FX and equity Black volatility surfaces implied by the model.
pub mod vol_surface;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use vol_surface::{
    CrossAssetModelImpliedEqVolTermStructure, CrossAssetModelImpliedFxVolTermStructure,
    EqVolState, FxVolState,
};
pub use yield_curve::{
    LgmImpliedYieldTermStructure, LgmImpliedYtsFwdFwdCorrected, LgmImpliedYtsSpotCorrected,
};
