//! Numerical integration (translates `ql/math/integrals/integral.hpp`,
//! `ql/math/integrals/simpsonintegral.hpp` and the piecewise integral used by
//! the cross-asset analytics).
//!
//! Integrators are object safe so that a model can own one behind an
//! `Arc<dyn Integrator>` and share it with every analytic formula.

use ql_core::{
    ensure,
    errors::{Error, Result},
    Real,
};
use std::sync::Arc;

use crate::comparison::close_enough;

/// A numerical integrator.
///
/// Corresponds to the abstract `QuantLib::Integrator` class.  Reversed
/// bounds integrate with a negative sign, equal bounds give zero.
pub trait Integrator: std::fmt::Debug + Send + Sync {
    /// Integrate `f` on `[a, b]`, `a < b`.
    fn integrate_ordered(&self, f: &dyn Fn(Real) -> Real, a: Real, b: Real) -> Result<Real>;

    /// Integrate `f` between `a` and `b` in any order.
    fn integrate(&self, f: &dyn Fn(Real) -> Real, a: Real, b: Real) -> Result<Real> {
        if a == b {
            Ok(0.0)
        } else if b > a {
            self.integrate_ordered(f, a, b)
        } else {
            Ok(-self.integrate_ordered(f, b, a)?)
        }
    }
}

// ── Simpson ───────────────────────────────────────────────────────────────────

/// Simpson's rule obtained by Richardson extrapolation of successively
/// refined trapezoid estimates.
///
/// The refinement stops when two consecutive Simpson estimates differ by at
/// most the absolute accuracy, but never before the sixth refinement, so
/// that coarse grids cannot accidentally agree.
///
/// Corresponds to `QuantLib::SimpsonIntegral`.
#[derive(Debug, Clone)]
pub struct SimpsonIntegral {
    absolute_accuracy: Real,
    max_iterations: usize,
}

const MIN_SIMPSON_ITERATIONS: usize = 5;

impl SimpsonIntegral {
    /// Create a new Simpson integrator.
    pub fn new(absolute_accuracy: Real, max_iterations: usize) -> Self {
        Self {
            absolute_accuracy,
            max_iterations,
        }
    }

    fn refine(f: &dyn Fn(Real) -> Real, a: Real, b: Real, previous: Real, n: usize) -> Real {
        // Adds the midpoints of the current n intervals.
        let dx = (b - a) / n as Real;
        let sum: Real = (0..n).map(|i| f(a + (i as Real + 0.5) * dx)).sum();
        0.5 * (previous + dx * sum)
    }
}

impl Integrator for SimpsonIntegral {
    fn integrate_ordered(&self, f: &dyn Fn(Real) -> Real, a: Real, b: Real) -> Result<Real> {
        let mut trapezoid = 0.5 * (f(a) + f(b)) * (b - a);
        let mut simpson = trapezoid;
        let mut n = 1;
        for i in 1..self.max_iterations {
            let refined = Self::refine(f, a, b, trapezoid, n);
            n *= 2;
            let next = (4.0 * refined - trapezoid) / 3.0;
            if (simpson - next).abs() <= self.absolute_accuracy && i > MIN_SIMPSON_ITERATIONS {
                return Ok(next);
            }
            trapezoid = refined;
            simpson = next;
        }
        Err(Error::Convergence {
            iterations: self.max_iterations,
            message: format!(
                "Simpson integral on [{a}, {b}] did not reach accuracy {}",
                self.absolute_accuracy
            ),
        })
    }
}

// ── Piecewise ─────────────────────────────────────────────────────────────────

/// Integrates piecewise between critical points (discontinuities of the
/// integrand), delegating each smooth piece to an inner integrator.
///
/// With `avoid_critical_points` set, each piece is shrunk by a relative
/// `1e-10` at both ends so that the inner rule never samples a jump.
#[derive(Debug, Clone)]
pub struct PiecewiseIntegral {
    integrator: Arc<dyn Integrator>,
    critical_points: Vec<Real>,
    avoid_critical_points: bool,
}

const CRITICAL_POINT_EPS: Real = 1e-10;

impl PiecewiseIntegral {
    /// Create a piecewise integrator.  The critical points are sorted and
    /// de-duplicated.
    pub fn new(
        integrator: Arc<dyn Integrator>,
        critical_points: &[Real],
        avoid_critical_points: bool,
    ) -> Result<Self> {
        ensure!(
            critical_points.iter().all(|t| t.is_finite()),
            "critical points must be finite"
        );
        let mut points = critical_points.to_vec();
        points.sort_by(Real::total_cmp);
        points.dedup_by(|a, b| close_enough(*a, *b));
        Ok(Self {
            integrator,
            critical_points: points,
            avoid_critical_points,
        })
    }

    /// The sorted, unique critical points.
    pub fn critical_points(&self) -> &[Real] {
        &self.critical_points
    }

    fn integrate_piece(&self, f: &dyn Fn(Real) -> Real, a: Real, b: Real) -> Result<Real> {
        if close_enough(a, b) {
            return Ok(0.0);
        }
        if self.avoid_critical_points {
            self.integrator
                .integrate(f, a * (1.0 + CRITICAL_POINT_EPS), b * (1.0 - CRITICAL_POINT_EPS))
        } else {
            self.integrator.integrate(f, a, b)
        }
    }
}

impl Integrator for PiecewiseIntegral {
    fn integrate_ordered(&self, f: &dyn Fn(Real) -> Real, a: Real, b: Real) -> Result<Real> {
        let mut left = a;
        let mut total = 0.0;
        for &c in self
            .critical_points
            .iter()
            .filter(|&&c| c > a && c < b)
        {
            total += self.integrate_piece(f, left, c)?;
            left = c;
        }
        total += self.integrate_piece(f, left, b)?;
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn simpson_polynomial_and_exponential() {
        let simpson = SimpsonIntegral::new(1e-10, 30);
        let cubic = simpson.integrate(&|x: Real| x * x * x - 2.0 * x, 0.0, 2.0).unwrap();
        assert_abs_diff_eq!(cubic, 0.0, epsilon = 1e-12);
        let e = simpson.integrate(&|x: Real| x.exp(), 0.0, 1.0).unwrap();
        assert_abs_diff_eq!(e, 1f64.exp() - 1.0, epsilon = 1e-10);
    }

    #[test]
    fn reversed_bounds_change_sign() {
        let simpson = SimpsonIntegral::new(1e-10, 30);
        let forward = simpson.integrate(&|x: Real| x * x, 1.0, 3.0).unwrap();
        let backward = simpson.integrate(&|x: Real| x * x, 3.0, 1.0).unwrap();
        assert_abs_diff_eq!(forward, 26.0 / 3.0, epsilon = 1e-10);
        assert_abs_diff_eq!(backward, -forward, epsilon = 1e-14);
    }

    #[test]
    fn simpson_reports_non_convergence() {
        let simpson = SimpsonIntegral::new(1e-16, 4);
        assert!(matches!(
            simpson.integrate(&|x: Real| x.sin(), 0.0, 10.0),
            Err(Error::Convergence { .. })
        ));
    }

    #[test]
    fn piecewise_handles_step_functions_exactly() {
        let step = |t: Real| if t < 1.0 { 0.05 } else if t < 2.5 { 0.08 } else { 0.02 };
        let inner: Arc<dyn Integrator> = Arc::new(SimpsonIntegral::new(1e-12, 100));
        let piecewise = PiecewiseIntegral::new(inner.clone(), &[2.5, 1.0, 1.0], true).unwrap();
        assert_eq!(piecewise.critical_points(), &[1.0, 2.5]);
        let value = piecewise.integrate(&step, 0.0, 4.0).unwrap();
        assert_abs_diff_eq!(value, 0.05 + 0.08 * 1.5 + 0.02 * 1.5, epsilon = 1e-9);
        let partial = piecewise.integrate(&step, 0.5, 2.0).unwrap();
        assert_abs_diff_eq!(partial, 0.05 * 0.5 + 0.08, epsilon = 1e-9);
    }
}
