//! `VolatilityTermStructure` — base trait for volatility term structures
//! (translates `ql/termstructures/voltermstructure.hpp`).

use crate::term_structure::TermStructure;
use ql_core::Real;

/// Base trait for all volatility term structures: a term structure with a
/// valid strike range.
///
/// Corresponds to `QuantLib::VolatilityTermStructure`.
pub trait VolatilityTermStructure: TermStructure {
    /// The minimum strike for which the term structure is defined.
    fn min_strike(&self) -> Real;

    /// The maximum strike for which the term structure is defined.
    fn max_strike(&self) -> Real;

    /// `true` if `strike` lies within the valid strike range.
    fn check_strike(&self, strike: Real) -> bool {
        strike >= self.min_strike() && strike <= self.max_strike()
    }
}
