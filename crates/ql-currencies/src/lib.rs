//! # ql-currencies
//!
//! Currency definitions used to key the factors of the cross-asset model.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Currency data.
pub mod currency;

/// Predefined currencies.
pub mod currencies;

pub use currency::Currency;
