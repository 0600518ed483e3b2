//! Model parametrizations (translates the `parametrization` family of the
//! cross-asset model: `parametrization.hpp`, `irlgm1fparametrization.hpp`,
//! `fxbsparametrization.hpp`, `eqbsparametrization.hpp` and their concrete
//! constant / piecewise constant variants).
//!
//! A parametrization is a container of time-dependent functions backed by
//! calibratable [`Parameter`]s.  Parameters hold **raw** values; the real
//! value of parameter `i` is `direct(i, raw)` and `inverse` maps back.
//! Volatility-like parameters use `x²` / `√y`, reversions the identity.

pub mod eq_bs;
pub mod fx_bs;
pub mod ir_lgm1f;
pub mod piecewise_constant;

use crate::parameter::Parameter;
use ql_core::{errors::Result, Real, Time};
use ql_currencies::Currency;
use ql_math::Array;

pub use eq_bs::{
    EqBsConstantParametrization, EqBsMarket, EqBsParametrization, EqBsPiecewiseConstantParametrization,
};
pub use fx_bs::{FxBsConstantParametrization, FxBsParametrization, FxBsPiecewiseConstantParametrization};
pub use ir_lgm1f::{
    IrLgm1fConstantParametrization, IrLgm1fParametrization,
    IrLgm1fPiecewiseConstantHullWhiteAdaptor, IrLgm1fPiecewiseConstantParametrization,
};
pub use piecewise_constant::{
    PiecewiseConstantHelper1, PiecewiseConstantHelper2, PiecewiseConstantHelper3,
};

// ── Finite difference scheme ──────────────────────────────────────────────────

/// Step of the first-derivative scheme.
pub const H: Time = 1.0e-6;
/// Step of the second-derivative scheme.
pub const H2: Time = 1.0e-4;

/// Right bump for first derivatives.
#[inline]
pub fn tr(t: Time) -> Time {
    if t > H / 2.0 {
        t + H / 2.0
    } else {
        H
    }
}

/// Left bump for first derivatives.
#[inline]
pub fn tl(t: Time) -> Time {
    (t - H / 2.0).max(0.0)
}

/// Right bump for second derivatives.
#[inline]
pub fn tr2(t: Time) -> Time {
    if t > H2 {
        t + H2
    } else {
        2.0 * H2
    }
}

/// Middle point for second derivatives.
#[inline]
pub fn tm2(t: Time) -> Time {
    if t > H2 {
        t
    } else {
        H2
    }
}

/// Left bump for second derivatives.
#[inline]
pub fn tl2(t: Time) -> Time {
    (t - H2).max(0.0)
}

/// First derivative of `f` at `t` by the symmetric bump scheme.
pub(crate) fn first_derivative(f: impl Fn(Time) -> Real, t: Time) -> Real {
    (f(tr(t)) - f(tl(t))) / (tr(t) - tl(t))
}

/// Second derivative of `f` at `t` by the symmetric bump scheme.
pub(crate) fn second_derivative(f: impl Fn(Time) -> Real, t: Time) -> Real {
    (f(tr2(t)) - 2.0 * f(tm2(t)) + f(tl2(t))) / (H2 * H2)
}

// ── Parametrization trait ─────────────────────────────────────────────────────

/// Base trait of all factor parametrizations.
///
/// After changing raw values through [`parameter_mut`](Self::parameter_mut)
/// the caller must invoke [`update`](Self::update) before evaluating any
/// function; [`set_param`](Self::set_param) does both.
///
/// Corresponds to `QuantExt::Parametrization`.
pub trait Parametrization: std::fmt::Debug + Send + Sync {
    /// Currency of the factor.
    fn currency(&self) -> &Currency;

    /// Name of the factor; the currency code unless overridden.
    fn name(&self) -> &str {
        self.currency().code
    }

    /// Number of parameters.
    fn number_of_parameters(&self) -> usize;

    /// Parameter `i` (raw values).
    fn parameter(&self, i: usize) -> Result<&Parameter>;

    /// Mutable parameter `i` (raw values); call `update` afterwards.
    fn parameter_mut(&mut self, i: usize) -> Result<&mut Parameter>;

    /// Breakpoints of parameter `i`; empty for constant parameters.
    fn parameter_times(&self, _i: usize) -> &[Time] {
        &[]
    }

    /// Raw to real transform of parameter `i`.
    fn direct(&self, _i: usize, x: Real) -> Real {
        x
    }

    /// Real to raw transform of parameter `i`.
    fn inverse(&self, _i: usize, y: Real) -> Real {
        y
    }

    /// Real values of parameter `i`.
    fn parameter_values(&self, i: usize) -> Result<Array> {
        Ok(self
            .parameter(i)?
            .params()
            .iter()
            .map(|&x| self.direct(i, x))
            .collect())
    }

    /// Recompute cached integrals after a raw value change.
    fn update(&mut self) {}

    /// Set raw value `j` of parameter `i` and update.
    fn set_param(&mut self, i: usize, j: usize, raw: Real) -> Result<()> {
        self.parameter_mut(i)?.set_param(j, raw)?;
        self.update();
        Ok(())
    }
}

/// Out of range error for parameter accessors.
pub(crate) fn no_such_parameter<T>(i: usize, n: usize) -> Result<T> {
    Err(ql_core::Error::IndexOutOfRange { index: i, size: n })
}
