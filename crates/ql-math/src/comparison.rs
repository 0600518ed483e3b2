//! Comparison utilities (translates `ql/math/comparison.hpp`).

use ql_core::Real;

/// Default number of ulps used by [`close_enough`].
pub const DEFAULT_ULPS: u32 = 42;

/// Return `true` if `|a - b| <= epsilon`.
#[inline]
pub fn close(a: Real, b: Real, epsilon: Real) -> bool {
    (a - b).abs() <= epsilon
}

/// Knuth-style relative comparison with a tolerance of `n` machine epsilons.
///
/// When either operand is zero the absolute difference is compared against
/// the squared tolerance.
#[inline]
pub fn close_enough_n(a: Real, b: Real, n: u32) -> bool {
    if a == b {
        return true;
    }
    let diff = (a - b).abs();
    let tolerance = n as Real * Real::EPSILON;
    if a == 0.0 || b == 0.0 {
        return diff < tolerance * tolerance;
    }
    diff <= tolerance * a.abs() || diff <= tolerance * b.abs()
}

/// [`close_enough_n`] with [`DEFAULT_ULPS`].
#[inline]
pub fn close_enough(a: Real, b: Real) -> bool {
    close_enough_n(a, b, DEFAULT_ULPS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_basic() {
        assert!(close(1.0, 1.0 + 1e-11, 1e-10));
        assert!(!close(1.0, 1.0 + 1e-9, 1e-10));
    }

    #[test]
    fn close_enough_relative_and_zero() {
        assert!(close_enough(1.0, 1.0 + 5.0 * Real::EPSILON));
        assert!(!close_enough(1.0, 1.0 + 1e-12));
        assert!(close_enough(0.0, 1e-30));
        assert!(!close_enough(0.0, 1e-20));
    }
}
