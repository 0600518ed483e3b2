//! # ql-instruments
//!
//! Option payoffs and the European option priced by the cross-asset
//! engines.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod instrument;
pub mod option;
pub mod payoff;

pub use instrument::{Instrument, PricingEngine, PricingResults};
pub use option::{EuropeanOption, EuropeanOptionArguments};
pub use payoff::{OptionType, Payoff, PlainVanillaPayoff, StrikedPayoff};
