//! `BlackVolTermStructure` — Black-volatility term structures
//! (translates `ql/termstructures/volatility/equityfx/blackvoltermstructure.hpp`).
//!
//! Provides the `BlackVolTermStructure` trait and `BlackConstantVol`, the
//! flat surface market FX/EQ calibration helpers quote against.

use crate::term_structure::{TermStructure, TermStructureData};
use crate::volatility_term_structure::VolatilityTermStructure;
use ql_core::{Real, Time, Volatility};
use ql_time::{Date, DayCounter};

/// A Black-volatility term structure.
///
/// Implementors must provide at least one of
/// [`black_vol_impl`](BlackVolTermStructure::black_vol_impl) (σ(t, k)) and
/// [`black_variance_impl`](BlackVolTermStructure::black_variance_impl)
/// (σ²·t); the other is derived.
///
/// Corresponds to `QuantLib::BlackVolTermStructure`.
pub trait BlackVolTermStructure: VolatilityTermStructure {
    /// Return the Black volatility for time `t` and strike `strike`.
    fn black_vol_impl(&self, t: Time, strike: Real) -> Volatility {
        if t <= 0.0 {
            return 0.0;
        }
        (self.black_variance_impl(t, strike) / t).sqrt()
    }

    /// Return the Black variance `σ²·t` for time `t` and strike `strike`.
    fn black_variance_impl(&self, t: Time, strike: Real) -> Real {
        let vol = self.black_vol_impl(t, strike);
        vol * vol * t
    }

    /// Black volatility for a date and strike.
    fn black_vol(&self, date: Date, strike: Real) -> Volatility {
        self.black_vol_impl(self.time_from_reference(date), strike)
    }

    /// Black variance for a date and strike.
    fn black_variance(&self, date: Date, strike: Real) -> Real {
        self.black_variance_impl(self.time_from_reference(date), strike)
    }

    /// Black volatility for a time and strike.
    fn black_vol_time(&self, t: Time, strike: Real) -> Volatility {
        self.black_vol_impl(t, strike)
    }

    /// Black variance for a time and strike.
    fn black_variance_time(&self, t: Time, strike: Real) -> Real {
        self.black_variance_impl(t, strike)
    }
}

// ── BlackConstantVol ──────────────────────────────────────────────────────────

/// A flat (constant) Black volatility surface.
///
/// Corresponds to `QuantLib::BlackConstantVol`.
#[derive(Debug, Clone)]
pub struct BlackConstantVol {
    data: TermStructureData,
    volatility: Volatility,
}

impl BlackConstantVol {
    /// Create a constant Black vol surface.
    pub fn new(
        reference_date: Date,
        volatility: Volatility,
        day_counter: impl DayCounter + 'static,
    ) -> Self {
        Self {
            data: TermStructureData::new(reference_date, day_counter),
            volatility,
        }
    }

    /// The constant volatility value.
    pub fn volatility(&self) -> Volatility {
        self.volatility
    }
}

impl TermStructure for BlackConstantVol {
    fn reference_date(&self) -> Date {
        self.data.reference_date
    }

    fn day_counter(&self) -> &dyn DayCounter {
        &*self.data.day_counter
    }
}

impl VolatilityTermStructure for BlackConstantVol {
    fn min_strike(&self) -> Real {
        Real::NEG_INFINITY
    }

    fn max_strike(&self) -> Real {
        Real::INFINITY
    }
}

impl BlackVolTermStructure for BlackConstantVol {
    fn black_vol_impl(&self, _t: Time, _strike: Real) -> Volatility {
        self.volatility
    }

    fn black_variance_impl(&self, t: Time, _strike: Real) -> Real {
        self.volatility * self.volatility * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ql_time::Actual365Fixed;

    #[test]
    fn constant_vol_value_and_variance() {
        let ref_date = Date::from_ymd(2025, 1, 2).unwrap();
        let surface = BlackConstantVol::new(ref_date, 0.20, Actual365Fixed);

        assert_abs_diff_eq!(surface.black_vol_time(1.0, 100.0), 0.20, epsilon = 1e-15);
        assert_abs_diff_eq!(surface.black_variance_time(2.0, 100.0), 0.08, epsilon = 1e-15);
        assert!(surface.check_strike(1e12));
    }

    #[test]
    fn constant_vol_at_date() {
        let ref_date = Date::from_ymd(2025, 1, 2).unwrap();
        let surface = BlackConstantVol::new(ref_date, 0.25, Actual365Fixed);

        let d1 = Date::from_ymd(2026, 1, 2).unwrap();
        assert_abs_diff_eq!(surface.black_vol(d1, 100.0), 0.25, epsilon = 1e-15);
        assert_abs_diff_eq!(surface.black_variance(d1, 100.0), 0.0625, epsilon = 1e-15);
    }
}
