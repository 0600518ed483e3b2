//! Closed-form moments of the cross-asset model (translates
//! `crossassetanalytics.hpp` and `crossassetanalyticsbase.hpp`).
//!
//! Integrands are built from [`Term`]s, boxed functions of the model and a
//! time, multiplied pointwise with [`p2`] to [`p5`] and integrated with the
//! model's integrator.  All moments refer to the interval `[t0, t0 + dt]`
//! under the domestic LGM measure.
//!
//! State layout: `z_i` is the LGM state of currency `i`, `x_j` the log FX
//! rate of currency `j + 1` against currency 0 and `s_k` the log equity
//! spot.  With `H_i`, `α_i` the LGM functions, `σ_j` the FX and `σ^s_k` the
//! equity volatilities, the foreign state drift is
//!
//! ```text
//! γ_i = −H_i α_i² + ρ^zz_0i H_0 α_0 α_i − ρ^zx_i,i−1 σ_{i−1} α_i      (γ_0 = 0)
//! ```

use super::{AssetType, CrossAssetModel};
use ql_core::{ensure, errors::Result, Real, Time};

/// A function of the model and a time.
pub type Term = Box<dyn Fn(&CrossAssetModel, Time) -> Real + Send + Sync>;

// ── Terms ────────────────────────────────────────────────────────────────────

/// `H_i(t)`.
pub fn hz(i: usize) -> Term {
    Box::new(move |m: &CrossAssetModel, t: Time| m.ir_at(i).h(t))
}

/// `α_i(t)`.
pub fn az(i: usize) -> Term {
    Box::new(move |m: &CrossAssetModel, t: Time| m.ir_at(i).alpha(t))
}

/// `ζ_i(t)`.
pub fn zetaz(i: usize) -> Term {
    Box::new(move |m: &CrossAssetModel, t: Time| m.ir_at(i).zeta(t))
}

/// FX volatility `σ_j(t)`.
pub fn sx(j: usize) -> Term {
    Box::new(move |m: &CrossAssetModel, t: Time| m.fx_at(j).sigma(t))
}

/// FX variance `∫₀ᵗ σ_j²`.
pub fn vx(j: usize) -> Term {
    Box::new(move |m: &CrossAssetModel, t: Time| m.fx_at(j).variance(t))
}

/// Equity volatility `σ^s_k(t)`.
pub fn ss(k: usize) -> Term {
    Box::new(move |m: &CrossAssetModel, t: Time| m.eq_at(k).sigma(t))
}

/// Equity variance `∫₀ᵗ (σ^s_k)²`.
pub fn vs(k: usize) -> Term {
    Box::new(move |m: &CrossAssetModel, t: Time| m.eq_at(k).variance(t))
}

fn fx_row(m: &CrossAssetModel, j: usize) -> usize {
    m.components(AssetType::Ir) + j
}

fn eq_row(m: &CrossAssetModel, k: usize) -> usize {
    m.components(AssetType::Ir) + m.components(AssetType::Fx) + k
}

/// IR–IR correlation.
pub fn rzz(i: usize, j: usize) -> Term {
    Box::new(move |m: &CrossAssetModel, _: Time| m.rho(i, j))
}

/// Correlation of IR factor `i` with FX factor `j`.
pub fn rzx(i: usize, j: usize) -> Term {
    Box::new(move |m: &CrossAssetModel, _: Time| m.rho(i, fx_row(m, j)))
}

/// FX–FX correlation.
pub fn rxx(i: usize, j: usize) -> Term {
    Box::new(move |m: &CrossAssetModel, _: Time| m.rho(fx_row(m, i), fx_row(m, j)))
}

/// Correlation of IR factor `i` with equity `k`.
pub fn rzs(i: usize, k: usize) -> Term {
    Box::new(move |m: &CrossAssetModel, _: Time| m.rho(i, eq_row(m, k)))
}

/// Correlation of FX factor `j` with equity `k`.
pub fn rxs(j: usize, k: usize) -> Term {
    Box::new(move |m: &CrossAssetModel, _: Time| m.rho(fx_row(m, j), eq_row(m, k)))
}

/// EQ–EQ correlation.
pub fn rss(k: usize, l: usize) -> Term {
    Box::new(move |m: &CrossAssetModel, _: Time| m.rho(eq_row(m, k), eq_row(m, l)))
}

/// Drift `γ_i` of the LGM state of currency `i` under the domestic
/// measure.
pub fn gamma(i: usize) -> Term {
    Box::new(move |m: &CrossAssetModel, t: Time| {
        if i == 0 {
            return 0.0;
        }
        let (ir0, iri) = (m.ir_at(0), m.ir_at(i));
        let ai = iri.alpha(t);
        -iri.h(t) * ai * ai + m.rho(0, i) * ir0.h(t) * ir0.alpha(t) * ai
            - m.rho(i, fx_row(m, i - 1)) * m.fx_at(i - 1).sigma(t) * ai
    })
}

// ── Products ─────────────────────────────────────────────────────────────────

/// Pointwise product of two terms.
pub fn p2(a: Term, b: Term) -> Term {
    Box::new(move |m: &CrossAssetModel, t: Time| a(m, t) * b(m, t))
}

/// Pointwise product of three terms.
pub fn p3(a: Term, b: Term, c: Term) -> Term {
    Box::new(move |m: &CrossAssetModel, t: Time| a(m, t) * b(m, t) * c(m, t))
}

/// Pointwise product of four terms.
pub fn p4(a: Term, b: Term, c: Term, d: Term) -> Term {
    Box::new(move |m: &CrossAssetModel, t: Time| a(m, t) * b(m, t) * c(m, t) * d(m, t))
}

/// Pointwise product of five terms.
pub fn p5(a: Term, b: Term, c: Term, d: Term, e: Term) -> Term {
    Box::new(move |m: &CrossAssetModel, t: Time| a(m, t) * b(m, t) * c(m, t) * d(m, t) * e(m, t))
}

/// `∫_a^b f` with the model's integrator.
pub fn integral(m: &CrossAssetModel, f: &Term, a: Time, b: Time) -> Result<Real> {
    m.integrate(&|t| f(m, t), a, b)
}

// `∫ (H_a(T) − H_a(s)) f(s) ds`
fn int_d(m: &CrossAssetModel, a: usize, f: &Term, t0: Time, t1: Time) -> Result<Real> {
    let ha = m.ir_at(a);
    Ok(ha.h(t1) * integral(m, f, t0, t1)? - m.integrate(&|t| ha.h(t) * f(m, t), t0, t1)?)
}

// `∫ (H_a(T) − H_a(s)) (H_b(T) − H_b(s)) f(s) ds`
fn int_dd(m: &CrossAssetModel, a: usize, b: usize, f: &Term, t0: Time, t1: Time) -> Result<Real> {
    let (ha, hb) = (m.ir_at(a), m.ir_at(b));
    let (ha_t, hb_t) = (ha.h(t1), hb.h(t1));
    Ok(ha_t * hb_t * integral(m, f, t0, t1)?
        - ha_t * m.integrate(&|t| hb.h(t) * f(m, t), t0, t1)?
        - hb_t * m.integrate(&|t| ha.h(t) * f(m, t), t0, t1)?
        + m.integrate(&|t| ha.h(t) * hb.h(t) * f(m, t), t0, t1)?)
}

// `½ (H(T)² ζ(T) − H(t0)² ζ(t0) − ∫ H² α²)`
fn half_convexity(m: &CrossAssetModel, i: usize, t0: Time, t1: Time) -> Result<Real> {
    let p = m.ir_at(i);
    let (h0, h1) = (p.h(t0), p.h(t1));
    let int = integral(m, &p4(hz(i), hz(i), az(i), az(i)), t0, t1)?;
    Ok(0.5 * (h1 * h1 * p.zeta(t1) - h0 * h0 * p.zeta(t0) - int))
}

// `H_i(T) ∫ γ_i − ∫ H_i γ_i`
fn drift_shift(m: &CrossAssetModel, i: usize, t0: Time, t1: Time) -> Result<Real> {
    if i == 0 {
        return Ok(0.0);
    }
    Ok(m.ir_at(i).h(t1) * integral(m, &gamma(i), t0, t1)?
        - integral(m, &p2(hz(i), gamma(i)), t0, t1)?)
}

fn check(m: &CrossAssetModel, t: AssetType, i: usize) -> Result<()> {
    m.idx(t, i).map(|_| ())
}

fn check_dt(dt: Time) -> Result<()> {
    ensure!(dt >= 0.0, "time step ({dt}) must be non-negative");
    Ok(())
}

// ── Expectations ─────────────────────────────────────────────────────────────

/// State-independent part of `E[z_i(t0 + dt)]`.
pub fn ir_expectation_1(m: &CrossAssetModel, i: usize, t0: Time, dt: Time) -> Result<Real> {
    check(m, AssetType::Ir, i)?;
    check_dt(dt)?;
    if i == 0 {
        return Ok(0.0);
    }
    integral(m, &gamma(i), t0, t0 + dt)
}

/// State-dependent part of `E[z_i(t0 + dt)]`.
pub fn ir_expectation_2(m: &CrossAssetModel, i: usize, zi_0: Real) -> Result<Real> {
    check(m, AssetType::Ir, i)?;
    Ok(zi_0)
}

/// State-independent part of `E[x_j(t0 + dt)]`.
pub fn fx_expectation_1(m: &CrossAssetModel, j: usize, t0: Time, dt: Time) -> Result<Real> {
    check(m, AssetType::Fx, j)?;
    check_dt(dt)?;
    let a = j + 1;
    let t1 = t0 + dt;
    let (dom, fgn) = (m.ir_at(0).term_structure(), m.ir_at(a).term_structure());
    let fx = m.fx_at(j);
    let mut res =
        (fgn.discount(t1) / fgn.discount(t0) * dom.discount(t0) / dom.discount(t1)).ln();
    res -= 0.5 * (fx.variance(t1) - fx.variance(t0));
    res += half_convexity(m, 0, t0, t1)?;
    res -= half_convexity(m, a, t0, t1)?;
    res += integral(m, &p4(hz(0), az(0), sx(j), rzx(0, j)), t0, t1)?;
    res -= drift_shift(m, a, t0, t1)?;
    Ok(res)
}

/// State-dependent part of `E[x_j(t0 + dt)]` given `x_j`, `z_{j+1}` and
/// `z_0` at `t0`.
pub fn fx_expectation_2(
    m: &CrossAssetModel,
    j: usize,
    t0: Time,
    x_0: Real,
    za_0: Real,
    z0_0: Real,
    dt: Time,
) -> Result<Real> {
    check(m, AssetType::Fx, j)?;
    check_dt(dt)?;
    let t1 = t0 + dt;
    let (h0, ha) = (m.ir_at(0), m.ir_at(j + 1));
    Ok(x_0 + (h0.h(t1) - h0.h(t0)) * z0_0 - (ha.h(t1) - ha.h(t0)) * za_0)
}

/// State-independent part of `E[s_k(t0 + dt)]`.
pub fn eq_expectation_1(m: &CrossAssetModel, k: usize, t0: Time, dt: Time) -> Result<Real> {
    check(m, AssetType::Eq, k)?;
    check_dt(dt)?;
    let t1 = t0 + dt;
    let eq = m.eq_at(k);
    let c = m.ccy_index(eq.currency())?;
    let (ir, div) = (eq.equity_ir_curve_today(), eq.equity_div_yield_curve_today());
    let mut res = (div.discount(t1) / div.discount(t0) * ir.discount(t0) / ir.discount(t1)).ln();
    res -= 0.5 * (eq.variance(t1) - eq.variance(t0));
    res += half_convexity(m, c, t0, t1)?;
    res += integral(m, &p4(rzs(0, k), hz(0), az(0), ss(k)), t0, t1)?;
    if c > 0 {
        res -= integral(m, &p3(rxs(c - 1, k), sx(c - 1), ss(k)), t0, t1)?;
        res += drift_shift(m, c, t0, t1)?;
    }
    Ok(res)
}

/// State-dependent part of `E[s_k(t0 + dt)]` given `s_k` and the LGM state
/// of the equity currency at `t0`.
pub fn eq_expectation_2(
    m: &CrossAssetModel,
    k: usize,
    t0: Time,
    s_0: Real,
    zc_0: Real,
    dt: Time,
) -> Result<Real> {
    check(m, AssetType::Eq, k)?;
    check_dt(dt)?;
    let c = m.ccy_index(m.eq_at(k).currency())?;
    let hc = m.ir_at(c);
    Ok(s_0 + (hc.h(t0 + dt) - hc.h(t0)) * zc_0)
}

// ── Covariances ──────────────────────────────────────────────────────────────

/// `Cov(z_i, z_j)`.
pub fn ir_ir_covariance(m: &CrossAssetModel, i: usize, j: usize, t0: Time, dt: Time) -> Result<Real> {
    check(m, AssetType::Ir, i)?;
    check(m, AssetType::Ir, j)?;
    check_dt(dt)?;
    integral(m, &p3(az(i), az(j), rzz(i, j)), t0, t0 + dt)
}

/// `Cov(z_i, x_j)`.
pub fn ir_fx_covariance(m: &CrossAssetModel, i: usize, j: usize, t0: Time, dt: Time) -> Result<Real> {
    check(m, AssetType::Ir, i)?;
    check(m, AssetType::Fx, j)?;
    check_dt(dt)?;
    let (a, t1) = (j + 1, t0 + dt);
    Ok(int_d(m, 0, &p3(az(i), az(0), rzz(i, 0)), t0, t1)?
        - int_d(m, a, &p3(az(i), az(a), rzz(i, a)), t0, t1)?
        + integral(m, &p3(az(i), sx(j), rzx(i, j)), t0, t1)?)
}

/// `Cov(x_i, x_j)`.
pub fn fx_fx_covariance(m: &CrossAssetModel, i: usize, j: usize, t0: Time, dt: Time) -> Result<Real> {
    check(m, AssetType::Fx, i)?;
    check(m, AssetType::Fx, j)?;
    check_dt(dt)?;
    let (a, b, t1) = (i + 1, j + 1, t0 + dt);
    Ok(int_dd(m, 0, 0, &p2(az(0), az(0)), t0, t1)?
        - int_dd(m, 0, b, &p3(az(0), az(b), rzz(0, b)), t0, t1)?
        - int_dd(m, a, 0, &p3(az(a), az(0), rzz(a, 0)), t0, t1)?
        + int_dd(m, a, b, &p3(az(a), az(b), rzz(a, b)), t0, t1)?
        + int_d(m, 0, &p3(az(0), sx(j), rzx(0, j)), t0, t1)?
        - int_d(m, a, &p3(az(a), sx(j), rzx(a, j)), t0, t1)?
        + int_d(m, 0, &p3(az(0), sx(i), rzx(0, i)), t0, t1)?
        - int_d(m, b, &p3(az(b), sx(i), rzx(b, i)), t0, t1)?
        + integral(m, &p3(sx(i), sx(j), rxx(i, j)), t0, t1)?)
}

/// `Cov(z_i, s_k)`.
pub fn ir_eq_covariance(m: &CrossAssetModel, i: usize, k: usize, t0: Time, dt: Time) -> Result<Real> {
    check(m, AssetType::Ir, i)?;
    check(m, AssetType::Eq, k)?;
    check_dt(dt)?;
    let c = m.ccy_index(m.eq_at(k).currency())?;
    let t1 = t0 + dt;
    Ok(int_d(m, c, &p3(az(i), az(c), rzz(i, c)), t0, t1)?
        + integral(m, &p3(az(i), ss(k), rzs(i, k)), t0, t1)?)
}

/// `Cov(x_j, s_k)`.
pub fn fx_eq_covariance(m: &CrossAssetModel, j: usize, k: usize, t0: Time, dt: Time) -> Result<Real> {
    check(m, AssetType::Fx, j)?;
    check(m, AssetType::Eq, k)?;
    check_dt(dt)?;
    let c = m.ccy_index(m.eq_at(k).currency())?;
    let (a, t1) = (j + 1, t0 + dt);
    Ok(int_dd(m, 0, c, &p3(az(0), az(c), rzz(0, c)), t0, t1)?
        - int_dd(m, a, c, &p3(az(a), az(c), rzz(a, c)), t0, t1)?
        + int_d(m, 0, &p3(az(0), ss(k), rzs(0, k)), t0, t1)?
        - int_d(m, a, &p3(az(a), ss(k), rzs(a, k)), t0, t1)?
        + int_d(m, c, &p3(sx(j), az(c), rzx(c, j)), t0, t1)?
        + integral(m, &p3(sx(j), ss(k), rxs(j, k)), t0, t1)?)
}

/// `Cov(s_k, s_l)`.
pub fn eq_eq_covariance(m: &CrossAssetModel, k: usize, l: usize, t0: Time, dt: Time) -> Result<Real> {
    check(m, AssetType::Eq, k)?;
    check(m, AssetType::Eq, l)?;
    check_dt(dt)?;
    let c = m.ccy_index(m.eq_at(k).currency())?;
    let d = m.ccy_index(m.eq_at(l).currency())?;
    let t1 = t0 + dt;
    Ok(int_dd(m, c, d, &p3(az(c), az(d), rzz(c, d)), t0, t1)?
        + int_d(m, c, &p3(az(c), ss(l), rzs(c, l)), t0, t1)?
        + int_d(m, d, &p3(az(d), ss(k), rzs(d, k)), t0, t1)?
        + integral(m, &p3(ss(k), ss(l), rss(k, l)), t0, t1)?)
}
