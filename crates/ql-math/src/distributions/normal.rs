//! Normal (Gaussian) distribution (translates
//! `ql/math/distributions/normaldistribution.hpp`).
//!
//! Delegates to `statrs`. Its erfc-based CDF carries an absolute error of
//! order 1e-11 around `|x| ≈ 1` and its inverse round-trips to about 1e-12;
//! consumers comparing prices should use relative tolerances.

use ql_core::Real;
use statrs::distribution::{Continuous, ContinuousCDF, Normal};
use std::sync::OnceLock;

fn standard() -> &'static Normal {
    static STANDARD: OnceLock<Normal> = OnceLock::new();
    STANDARD.get_or_init(Normal::standard)
}

/// The standard normal probability density function.
#[inline]
pub fn normal_pdf(x: Real) -> Real {
    standard().pdf(x)
}

/// The standard normal cumulative distribution function Φ(x).
///
/// Corresponds to `QuantLib::CumulativeNormalDistribution`.
#[inline]
pub fn normal_cdf(x: Real) -> Real {
    standard().cdf(x)
}

/// The inverse standard normal CDF, defined on `(0, 1)`.
///
/// Corresponds to `QuantLib::InverseCumulativeNormal`.
pub fn normal_cdf_inverse(p: Real) -> ql_core::Result<Real> {
    ql_core::ensure!(p > 0.0 && p < 1.0, "probability ({p}) must be in (0, 1)");
    Ok(standard().inverse_cdf(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn reference_values() {
        assert_abs_diff_eq!(normal_cdf(0.0), 0.5, epsilon = 1e-16);
        assert_abs_diff_eq!(normal_cdf(1.0), 0.841_344_746_068_542_9, epsilon = 1e-10);
        assert_relative_eq!(
            normal_cdf(-3.0),
            0.001_349_898_031_630_094_6,
            max_relative = 1e-8
        );
        assert_abs_diff_eq!(
            normal_pdf(0.0),
            1.0 / (2.0 * std::f64::consts::PI).sqrt(),
            epsilon = 1e-16
        );
    }

    #[test]
    fn inverse_round_trip() {
        for p in [1e-6, 0.025, 0.5, 0.9, 0.999] {
            let x = normal_cdf_inverse(p).unwrap();
            assert_relative_eq!(normal_cdf(x), p, max_relative = 1e-7);
        }
        assert!(normal_cdf_inverse(1.0).is_err());
    }

    #[test]
    fn cdf_is_symmetric_to_working_precision() {
        for x in [0.3, 1.0, 2.5] {
            assert_abs_diff_eq!(normal_cdf(x) + normal_cdf(-x), 1.0, epsilon = 1e-10);
        }
    }
}
