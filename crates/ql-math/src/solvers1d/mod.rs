//! 1D root finding (translates `ql/math/solver1d.hpp` and
//! `ql/math/solvers1d/brent.hpp`).
//!
//! [`Brent`] either searches for a bracket starting from a guess and a step
//! ([`Brent::solve`]) or works on a caller-supplied bracket
//! ([`Brent::solve_in`]).  Optional lower/upper bounds are enforced on every
//! trial point, which the implied standard deviation inversion uses to stay
//! non-negative.

use ql_core::{
    ensure,
    errors::{Error, Result},
    Real,
};

const DEFAULT_MAX_EVALUATIONS: usize = 100;
const GROWTH_FACTOR: Real = 1.6;

/// Brent's method root finder.
///
/// Corresponds to `QuantLib::Brent`.
#[derive(Debug, Clone)]
pub struct Brent {
    max_evaluations: usize,
    lower_bound: Option<Real>,
    upper_bound: Option<Real>,
}

impl Default for Brent {
    fn default() -> Self {
        Self {
            max_evaluations: DEFAULT_MAX_EVALUATIONS,
            lower_bound: None,
            upper_bound: None,
        }
    }
}

impl Brent {
    /// Create a solver with the default evaluation limit and no bounds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of function evaluations.
    pub fn with_max_evaluations(mut self, n: usize) -> Self {
        self.max_evaluations = n;
        self
    }

    /// Enforce a lower bound on every trial point.
    pub fn with_lower_bound(mut self, bound: Real) -> Self {
        self.lower_bound = Some(bound);
        self
    }

    /// Enforce an upper bound on every trial point.
    pub fn with_upper_bound(mut self, bound: Real) -> Self {
        self.upper_bound = Some(bound);
        self
    }

    fn enforce_bounds(&self, x: Real) -> Real {
        let x = self.lower_bound.map_or(x, |lo| x.max(lo));
        self.upper_bound.map_or(x, |hi| x.min(hi))
    }

    /// Find a root of `f` near `guess`, expanding a bracket of initial width
    /// `step` geometrically until the function changes sign.
    pub fn solve<F>(&self, mut f: F, accuracy: Real, guess: Real, step: Real) -> Result<Real>
    where
        F: FnMut(Real) -> Real,
    {
        ensure!(accuracy > 0.0, "accuracy ({accuracy}) must be positive");
        let accuracy = accuracy.max(Real::EPSILON);

        let root = self.enforce_bounds(guess);
        let f_root = f(root);
        if f_root == 0.0 {
            return Ok(root);
        }
        let (mut x_min, mut f_min, mut x_max, mut f_max) = if f_root > 0.0 {
            let x_min = self.enforce_bounds(root - step);
            (x_min, f(x_min), root, f_root)
        } else {
            let x_max = self.enforce_bounds(root + step);
            (root, f_root, x_max, f(x_max))
        };

        let mut evaluations = 2;
        while evaluations <= self.max_evaluations {
            if f_min * f_max <= 0.0 {
                if f_min == 0.0 {
                    return Ok(x_min);
                }
                if f_max == 0.0 {
                    return Ok(x_max);
                }
                return self.brent(&mut f, accuracy, (x_min, f_min), (x_max, f_max), evaluations);
            }
            if f_min.abs() < f_max.abs() {
                x_min = self.enforce_bounds(x_min + GROWTH_FACTOR * (x_min - x_max));
                f_min = f(x_min);
            } else {
                x_max = self.enforce_bounds(x_max + GROWTH_FACTOR * (x_max - x_min));
                f_max = f(x_max);
            }
            evaluations += 1;
        }
        Err(Error::Convergence {
            iterations: self.max_evaluations,
            message: format!("unable to bracket root starting from {guess} (step {step})"),
        })
    }

    /// Find a root of `f` inside `[x_min, x_max]`, which must bracket one.
    pub fn solve_in<F>(
        &self,
        mut f: F,
        accuracy: Real,
        guess: Real,
        x_min: Real,
        x_max: Real,
    ) -> Result<Real>
    where
        F: FnMut(Real) -> Real,
    {
        ensure!(accuracy > 0.0, "accuracy ({accuracy}) must be positive");
        ensure!(x_min < x_max, "invalid range: x_min ({x_min}) >= x_max ({x_max})");
        ensure!(
            guess >= x_min && guess <= x_max,
            "guess ({guess}) outside [{x_min}, {x_max}]"
        );
        let f_min = f(x_min);
        if f_min == 0.0 {
            return Ok(x_min);
        }
        let f_max = f(x_max);
        if f_max == 0.0 {
            return Ok(x_max);
        }
        ensure!(
            f_min * f_max < 0.0,
            "root not bracketed: f[{x_min},{x_max}] -> [{f_min},{f_max}]"
        );
        self.brent(&mut f, accuracy.max(Real::EPSILON), (x_min, f_min), (x_max, f_max), 2)
    }

    fn brent<F>(
        &self,
        f: &mut F,
        accuracy: Real,
        (mut x_min, mut f_min): (Real, Real),
        (mut x_max, mut f_max): (Real, Real),
        mut evaluations: usize,
    ) -> Result<Real>
    where
        F: FnMut(Real) -> Real,
    {
        let mut root = x_max;
        let mut f_root = f_max;
        let mut d: Real = 0.0;
        let mut e: Real = 0.0;

        while evaluations <= self.max_evaluations {
            if (f_root > 0.0 && f_max > 0.0) || (f_root < 0.0 && f_max < 0.0) {
                x_max = x_min;
                f_max = f_min;
                d = root - x_min;
                e = d;
            }
            if f_max.abs() < f_root.abs() {
                x_min = root;
                root = x_max;
                x_max = x_min;
                f_min = f_root;
                f_root = f_max;
                f_max = f_min;
            }
            let tolerance = 2.0 * Real::EPSILON * root.abs() + 0.5 * accuracy;
            let x_mid = 0.5 * (x_max - root);
            if x_mid.abs() <= tolerance || f_root == 0.0 {
                return Ok(root);
            }
            if e.abs() >= tolerance && f_min.abs() > f_root.abs() {
                let s = f_root / f_min;
                let (mut p, mut q) = if x_min == x_max {
                    (2.0 * x_mid * s, 1.0 - s)
                } else {
                    let q = f_min / f_max;
                    let r = f_root / f_max;
                    (
                        s * (2.0 * x_mid * q * (q - r) - (root - x_min) * (r - 1.0)),
                        (q - 1.0) * (r - 1.0) * (s - 1.0),
                    )
                };
                if p > 0.0 {
                    q = -q;
                }
                p = p.abs();
                let min1 = 3.0 * x_mid * q - (tolerance * q).abs();
                let min2 = (e * q).abs();
                if 2.0 * p < min1.min(min2) {
                    e = d;
                    d = p / q;
                } else {
                    d = x_mid;
                    e = d;
                }
            } else {
                d = x_mid;
                e = d;
            }
            x_min = root;
            f_min = f_root;
            root += if d.abs() > tolerance {
                d
            } else {
                tolerance.copysign(x_mid)
            };
            f_root = f(root);
            evaluations += 1;
        }
        Err(Error::Convergence {
            iterations: self.max_evaluations,
            message: "Brent solver: maximum number of function evaluations exceeded".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn brackets_from_guess() {
        let root = Brent::new()
            .solve(|x| x * x - 2.0, 1e-12, 0.5, 0.1)
            .unwrap();
        assert_abs_diff_eq!(root, 2f64.sqrt(), epsilon = 1e-10);
    }

    #[test]
    fn respects_lower_bound() {
        let root = Brent::new()
            .with_lower_bound(0.0)
            .solve(|x| x.exp() - 1.5, 1e-12, 0.01, 1.0)
            .unwrap();
        assert_abs_diff_eq!(root, 1.5f64.ln(), epsilon = 1e-10);
    }

    #[test]
    fn explicit_bracket() {
        let root = Brent::new()
            .solve_in(|x| x.cos() - x, 1e-14, 0.5, 0.0, 1.0)
            .unwrap();
        assert_abs_diff_eq!(root, 0.739_085_133_215_160_6, epsilon = 1e-12);
        assert!(Brent::new().solve_in(|x| x * x + 1.0, 1e-8, 0.5, 0.0, 1.0).is_err());
    }

    #[test]
    fn unbracketable_reports_convergence_error() {
        let err = Brent::new()
            .with_max_evaluations(20)
            .with_lower_bound(0.0)
            .solve(|x| 1.0 + x, 1e-10, 1.0, 0.5)
            .unwrap_err();
        assert!(matches!(err, Error::Convergence { .. }));
    }
}
