//! Piecewise constant helpers (translates `piecewiseconstanthelper.hpp`).
//!
//! Each helper owns the [`Parameter`]s of one or two piecewise constant
//! functions on a breakpoint grid `t_0 < … < t_{n-1}` (`t_0 > 0`) and keeps
//! cumulative integrals at the breakpoints, so that every integral below is
//! a table lookup plus one closed-form tail.  Value `i` applies on
//! `[t_{i-1}, t_i)`, the last value is the flat extrapolation beyond
//! `t_{n-1}`.
//!
//! [`update`](PiecewiseConstantHelper1::update) must be called after any raw
//! value change.

use crate::parameter::Parameter;
use ql_core::{ensure, errors::Result, Real, Time};
use ql_math::Array;

/// Reversions below this are treated as zero.
const ZERO_CUTOFF: Real = 1.0e-6;

fn check_times(times: &[Time]) -> Result<()> {
    if let Some(&first) = times.first() {
        ensure!(first > 0.0, "first time ({first}) must be positive");
    }
    for w in times.windows(2) {
        ensure!(
            w[1] > w[0],
            "times must be strictly increasing, got {} after {}",
            w[1],
            w[0]
        );
    }
    Ok(())
}

fn check_values(times: &[Time], values: &[Real]) -> Result<()> {
    ensure!(
        values.len() == times.len() + 1,
        "number of values ({}) must be number of times ({}) plus one",
        values.len(),
        times.len()
    );
    Ok(())
}

/// Index of the first breakpoint strictly greater than `t`.
#[inline]
fn upper_bound(times: &[Time], t: Time) -> usize {
    times.partition_point(|&s| s <= t)
}

#[inline]
fn previous(times: &[Time], cache: &[Real], i: usize) -> (Time, Real) {
    if i == 0 {
        (0.0, 0.0)
    } else {
        (times[i - 1], cache[i - 1])
    }
}

/// `∫_0^dt exp(k a s) ds`; the zero-rate branch is taken on `|a|`, so every
/// helper switches at the same reversion level.
#[inline]
fn int_exp(a: Real, k: Real, dt: Time) -> Real {
    if a.abs() < ZERO_CUTOFF {
        dt
    } else {
        ((k * a * dt).exp() - 1.0) / (k * a)
    }
}

// ── Helper 1 ──────────────────────────────────────────────────────────────────

/// Piecewise constant non-negative function `y` with `∫ y²`.
///
/// Raw values are mapped by `x ↦ x²`.
#[derive(Debug, Clone)]
pub struct PiecewiseConstantHelper1 {
    times: Vec<Time>,
    y: Parameter,
    b: Vec<Real>,
}

impl PiecewiseConstantHelper1 {
    /// Create a helper from breakpoints and real (non-negative) values.
    pub fn new(times: &[Time], values: &[Real]) -> Result<Self> {
        check_times(times)?;
        check_values(times, values)?;
        for &v in values {
            ensure!(v >= 0.0, "value ({v}) must be non-negative");
        }
        let raw: Array = values.iter().map(|&v| Self::inverse(v)).collect();
        let mut helper = Self {
            times: times.to_vec(),
            y: Parameter::unconstrained(raw),
            b: vec![0.0; times.len()],
        };
        helper.update();
        Ok(helper)
    }

    /// Raw to real.
    #[inline]
    pub fn direct(x: Real) -> Real {
        x * x
    }

    /// Real to raw.
    #[inline]
    pub fn inverse(y: Real) -> Real {
        y.sqrt()
    }

    /// Breakpoints.
    pub fn times(&self) -> &[Time] {
        &self.times
    }

    /// The parameter (raw values).
    pub fn parameter(&self) -> &Parameter {
        &self.y
    }

    /// The mutable parameter; call [`update`](Self::update) afterwards.
    pub fn parameter_mut(&mut self) -> &mut Parameter {
        &mut self.y
    }

    /// Recompute `b_i = ∫_0^{t_i} y²`.
    pub fn update(&mut self) {
        let mut sum = 0.0;
        let mut t0 = 0.0;
        for (i, &t) in self.times.iter().enumerate() {
            let v = Self::direct(self.y.params()[i]);
            sum += v * v * (t - t0);
            self.b[i] = sum;
            t0 = t;
        }
    }

    /// `y(t)`.
    pub fn y(&self, t: Time) -> Real {
        Self::direct(self.y.params()[upper_bound(&self.times, t)])
    }

    /// `∫_0^t y(s)² ds`.
    pub fn int_y_sqr(&self, t: Time) -> Real {
        let i = upper_bound(&self.times, t);
        let (t0, b0) = previous(&self.times, &self.b, i);
        let v = Self::direct(self.y.params()[i]);
        b0 + v * v * (t - t0)
    }
}

// ── Helper 2 ──────────────────────────────────────────────────────────────────

/// Piecewise constant function `y` (typically a reversion speed) with
/// `exp(-∫ y)` and `∫ exp(-∫ y)`.
///
/// Raw values are the real values.
#[derive(Debug, Clone)]
pub struct PiecewiseConstantHelper2 {
    times: Vec<Time>,
    y: Parameter,
    b: Vec<Real>,
    c: Vec<Real>,
}

impl PiecewiseConstantHelper2 {
    /// Create a helper from breakpoints and values.
    pub fn new(times: &[Time], values: &[Real]) -> Result<Self> {
        check_times(times)?;
        check_values(times, values)?;
        let mut helper = Self {
            times: times.to_vec(),
            y: Parameter::unconstrained(Array::from_slice(values)),
            b: vec![0.0; times.len()],
            c: vec![0.0; times.len()],
        };
        helper.update();
        Ok(helper)
    }

    /// Raw to real.
    #[inline]
    pub fn direct(x: Real) -> Real {
        x
    }

    /// Real to raw.
    #[inline]
    pub fn inverse(y: Real) -> Real {
        y
    }

    /// Breakpoints.
    pub fn times(&self) -> &[Time] {
        &self.times
    }

    /// The parameter (raw values).
    pub fn parameter(&self) -> &Parameter {
        &self.y
    }

    /// The mutable parameter; call [`update`](Self::update) afterwards.
    pub fn parameter_mut(&mut self) -> &mut Parameter {
        &mut self.y
    }

    /// Recompute `b_i = ∫_0^{t_i} y` and `c_i = ∫_0^{t_i} exp(-∫_0^s y) ds`.
    pub fn update(&mut self) {
        let (mut sum_b, mut sum_c, mut t0): (Real, Real, Time) = (0.0, 0.0, 0.0);
        for (i, &t) in self.times.iter().enumerate() {
            let a = Self::direct(self.y.params()[i]);
            let dt = t - t0;
            sum_c += (-sum_b).exp() * int_exp(a, -1.0, dt);
            sum_b += a * dt;
            self.b[i] = sum_b;
            self.c[i] = sum_c;
            t0 = t;
        }
    }

    /// `y(t)`.
    pub fn y(&self, t: Time) -> Real {
        Self::direct(self.y.params()[upper_bound(&self.times, t)])
    }

    /// `exp(-∫_0^t y(s) ds)`.
    pub fn exp_m_int_y(&self, t: Time) -> Real {
        let i = upper_bound(&self.times, t);
        let (t0, b0) = previous(&self.times, &self.b, i);
        let a = Self::direct(self.y.params()[i]);
        (-(b0 + a * (t - t0))).exp()
    }

    /// `∫_0^t exp(-∫_0^s y(u) du) ds`.
    pub fn int_exp_m_int_y(&self, t: Time) -> Real {
        let i = upper_bound(&self.times, t);
        let (t0, c0) = previous(&self.times, &self.c, i);
        let b0 = if i == 0 { 0.0 } else { self.b[i - 1] };
        let a = Self::direct(self.y.params()[i]);
        c0 + (-b0).exp() * int_exp(a, -1.0, t - t0)
    }
}

// ── Helper 3 ──────────────────────────────────────────────────────────────────

/// Two piecewise constant functions `y1 ≥ 0` (raw `x ↦ x²`) and `y2`
/// (identity) on their own grids, with `∫ y1² exp(2 ∫ y2)`.
#[derive(Debug, Clone)]
pub struct PiecewiseConstantHelper3 {
    times1: Vec<Time>,
    times2: Vec<Time>,
    union: Vec<Time>,
    y1: Parameter,
    y2: Parameter,
    s: Vec<Real>,
    b: Vec<Real>,
}

impl PiecewiseConstantHelper3 {
    /// Create a helper from the two grids and their real values.
    pub fn new(
        times1: &[Time],
        values1: &[Real],
        times2: &[Time],
        values2: &[Real],
    ) -> Result<Self> {
        check_times(times1)?;
        check_times(times2)?;
        check_values(times1, values1)?;
        check_values(times2, values2)?;
        for &v in values1 {
            ensure!(v >= 0.0, "value ({v}) must be non-negative");
        }
        let mut union: Vec<Time> = times1.iter().chain(times2).copied().collect();
        union.sort_by(Real::total_cmp);
        union.dedup();
        let n = union.len();
        let mut helper = Self {
            times1: times1.to_vec(),
            times2: times2.to_vec(),
            union,
            y1: Parameter::unconstrained(
                values1
                    .iter()
                    .map(|&v| PiecewiseConstantHelper1::inverse(v))
                    .collect(),
            ),
            y2: Parameter::unconstrained(Array::from_slice(values2)),
            s: vec![0.0; n],
            b: vec![0.0; n],
        };
        helper.update();
        Ok(helper)
    }

    /// Breakpoints of `y1`.
    pub fn times1(&self) -> &[Time] {
        &self.times1
    }

    /// Breakpoints of `y2`.
    pub fn times2(&self) -> &[Time] {
        &self.times2
    }

    /// Parameter of `y1` (raw values).
    pub fn parameter1(&self) -> &Parameter {
        &self.y1
    }

    /// Parameter of `y2` (raw values).
    pub fn parameter2(&self) -> &Parameter {
        &self.y2
    }

    /// Mutable parameter of `y1`; call [`update`](Self::update) afterwards.
    pub fn parameter1_mut(&mut self) -> &mut Parameter {
        &mut self.y1
    }

    /// Mutable parameter of `y2`; call [`update`](Self::update) afterwards.
    pub fn parameter2_mut(&mut self) -> &mut Parameter {
        &mut self.y2
    }

    /// `y1(t)`.
    pub fn y1(&self, t: Time) -> Real {
        PiecewiseConstantHelper1::direct(self.y1.params()[upper_bound(&self.times1, t)])
    }

    /// `y2(t)`.
    pub fn y2(&self, t: Time) -> Real {
        self.y2.params()[upper_bound(&self.times2, t)]
    }

    /// Recompute the cumulative integrals on the union grid.
    pub fn update(&mut self) {
        let (mut sum_s, mut sum_b, mut t0): (Real, Real, Time) = (0.0, 0.0, 0.0);
        for i in 0..self.union.len() {
            let t = self.union[i];
            let (v1, a) = (self.y1(t0), self.y2(t0));
            let dt = t - t0;
            sum_s += v1 * v1 * (2.0 * sum_b).exp() * int_exp(a, 2.0, dt);
            sum_b += a * dt;
            self.s[i] = sum_s;
            self.b[i] = sum_b;
            t0 = t;
        }
    }

    /// `∫_0^t y1(s)² exp(2 ∫_0^s y2(u) du) ds`.
    pub fn int_y1_sqr_exp_2_int_y2(&self, t: Time) -> Real {
        let i = upper_bound(&self.union, t);
        let (t0, s0) = previous(&self.union, &self.s, i);
        let b0 = if i == 0 { 0.0 } else { self.b[i - 1] };
        let (v1, a) = (self.y1(t0), self.y2(t0));
        s0 + v1 * v1 * (2.0 * b0).exp() * int_exp(a, 2.0, t - t0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn helper1_integrates_squares() {
        let h = PiecewiseConstantHelper1::new(&[1.0, 2.0], &[0.01, 0.02, 0.03]).unwrap();
        assert_eq!(h.int_y_sqr(0.0), 0.0);
        assert_abs_diff_eq!(h.int_y_sqr(0.5), 0.5e-4, epsilon = 1e-16);
        assert_abs_diff_eq!(h.int_y_sqr(1.5), 1e-4 + 0.5 * 4e-4, epsilon = 1e-16);
        assert_abs_diff_eq!(h.int_y_sqr(3.0), 1e-4 + 4e-4 + 9e-4, epsilon = 1e-16);
        assert_abs_diff_eq!(h.y(1.0), 0.02, epsilon = 1e-16);
        assert_abs_diff_eq!(h.y(5.0), 0.03, epsilon = 1e-16);
    }

    #[test]
    fn helper2_reversion_integrals() {
        let h = PiecewiseConstantHelper2::new(&[1.0], &[0.05, 0.08]).unwrap();
        assert_abs_diff_eq!(h.exp_m_int_y(0.5), (-0.025f64).exp(), epsilon = 1e-14);
        assert_abs_diff_eq!(h.exp_m_int_y(1.5), (-0.05f64 - 0.04).exp(), epsilon = 1e-14);
        let expected = (1.0 - (-0.05f64).exp()) / 0.05
            + (-0.05f64).exp() * (1.0 - (-0.08f64 * 0.5).exp()) / 0.08;
        assert_abs_diff_eq!(h.int_exp_m_int_y(1.5), expected, epsilon = 1e-14);
    }

    #[test]
    fn helper2_zero_reversion_is_linear() {
        let h = PiecewiseConstantHelper2::new(&[], &[0.0]).unwrap();
        assert_abs_diff_eq!(h.int_exp_m_int_y(2.0), 2.0, epsilon = 1e-15);
        assert_eq!(h.exp_m_int_y(2.0), 1.0);
    }

    #[test]
    fn helper3_constant_functions() {
        let (s, k): (Real, Real) = (0.01, 0.03);
        let h = PiecewiseConstantHelper3::new(&[1.0], &[s, s], &[0.5, 2.0], &[k, k, k]).unwrap();
        let t = 3.0;
        let expected = s * s * ((2.0 * k * t).exp() - 1.0) / (2.0 * k);
        assert_abs_diff_eq!(h.int_y1_sqr_exp_2_int_y2(t), expected, epsilon = 1e-16);
        assert_abs_diff_eq!(h.int_y1_sqr_exp_2_int_y2(0.7), s * s * ((2.0 * k * 0.7).exp() - 1.0) / (2.0 * k), epsilon = 1e-16);
    }

    #[test]
    fn helper2_and_helper3_share_the_zero_reversion_switch() {
        // between half the cutoff and the cutoff both helpers are linear
        let a = 0.7 * ZERO_CUTOFF;
        let h2 = PiecewiseConstantHelper2::new(&[1.0], &[a, a]).unwrap();
        let h3 = PiecewiseConstantHelper3::new(&[1.0], &[0.01, 0.01], &[1.0], &[a, a]).unwrap();
        assert_eq!(h2.int_exp_m_int_y(0.5), 0.5);
        assert_abs_diff_eq!(h2.int_exp_m_int_y(2.0), 1.0 + (-a).exp(), epsilon = 1e-15);
        assert_abs_diff_eq!(h3.int_y1_sqr_exp_2_int_y2(0.5), 0.5e-4, epsilon = 1e-18);

        let a = 2.0 * ZERO_CUTOFF;
        let h3 = PiecewiseConstantHelper3::new(&[1.0], &[0.01, 0.01], &[1.0], &[a, a]).unwrap();
        let expected = 1e-4 * ((2.0 * a * 0.5).exp() - 1.0) / (2.0 * a);
        assert_abs_diff_eq!(h3.int_y1_sqr_exp_2_int_y2(0.5), expected, epsilon = 1e-18);
    }

    #[test]
    fn helper2_and_helper3_build_caches_on_several_buckets() {
        let h2 = PiecewiseConstantHelper2::new(&[1.0, 2.0], &[0.01, 0.02, 0.03]).unwrap();
        assert_abs_diff_eq!(h2.exp_m_int_y(3.0), (-0.06f64).exp(), epsilon = 1e-15);
        let h3 = PiecewiseConstantHelper3::new(&[1.0], &[0.01, 0.02], &[2.0], &[0.0, 0.0]).unwrap();
        assert_abs_diff_eq!(h3.int_y1_sqr_exp_2_int_y2(3.0), 1e-4 + 2.0 * 4e-4, epsilon = 1e-17);
    }

    #[test]
    fn invalid_grids_rejected() {
        assert!(PiecewiseConstantHelper1::new(&[0.0], &[0.1, 0.1]).is_err());
        assert!(PiecewiseConstantHelper1::new(&[2.0, 1.0], &[0.1, 0.1, 0.1]).is_err());
        assert!(PiecewiseConstantHelper1::new(&[1.0], &[0.1]).is_err());
        assert!(PiecewiseConstantHelper1::new(&[1.0], &[0.1, -0.1]).is_err());
        assert!(PiecewiseConstantHelper2::new(&[1.0, 1.0], &[0.1, 0.1, 0.1]).is_err());
    }

    #[test]
    fn update_after_raw_change() {
        let mut h = PiecewiseConstantHelper1::new(&[1.0], &[0.01, 0.01]).unwrap();
        h.parameter_mut().set_param(0, PiecewiseConstantHelper1::inverse(0.02)).unwrap();
        h.update();
        assert_abs_diff_eq!(h.int_y_sqr(2.0), 4e-4 + 1e-4, epsilon = 1e-16);
    }

    proptest! {
        #[test]
        fn int_y_sqr_is_non_decreasing(
            v in proptest::collection::vec(0.0f64..0.5, 4),
            a in 0.0f64..6.0,
            b in 0.0f64..6.0,
        ) {
            let h = PiecewiseConstantHelper1::new(&[0.5, 1.0, 3.0], &v).unwrap();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(h.int_y_sqr(lo) <= h.int_y_sqr(hi) + 1e-15);
        }

        #[test]
        fn exp_m_int_y_matches_direct_sum(v in proptest::collection::vec(-0.1f64..0.2, 3), t in 0.0f64..5.0) {
            let times = [1.0, 2.0];
            let h = PiecewiseConstantHelper2::new(&times, &v).unwrap();
            let mut integral: Real = 0.0;
            let mut t0 = 0.0;
            for (i, &ti) in times.iter().chain(std::iter::once(&Real::INFINITY)).enumerate() {
                let t1 = ti.min(t);
                if t1 > t0 {
                    integral += v[i] * (t1 - t0);
                    t0 = t1;
                }
            }
            prop_assert!((h.exp_m_int_y(t) - (-integral).exp()).abs() < 1e-13);
        }
    }
}
