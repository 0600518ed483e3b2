//! Joint state process of the cross-asset model (translates
//! `crossassetstateprocess.hpp`).
//!
//! The state is Gaussian, so expectation and covariance over a step are
//! known in closed form and [`evolve`](CrossAssetStateProcess::evolve) is
//! exact for any step size.

use super::analytics::{
    eq_eq_covariance, eq_expectation_1, eq_expectation_2, fx_eq_covariance, fx_expectation_1,
    fx_expectation_2, fx_fx_covariance, ir_eq_covariance, ir_expectation_1, ir_expectation_2,
    ir_fx_covariance, ir_ir_covariance,
};
use super::{AssetType, CrossAssetModel};
use ql_core::{ensure, errors::Result, fail, Real, Time};
use ql_math::matrix_utilities::covariance_root;
use ql_math::{Array, Matrix};

/// State process of a [`CrossAssetModel`], laid out as
/// `z_0 … z_{n-1}, x_0 … x_{n-2}, s_0 … s_{m-1}`.
///
/// Corresponds to `QuantExt::CrossAssetStateProcess` with exact
/// discretization.
#[derive(Debug, Clone, Copy)]
pub struct CrossAssetStateProcess<'a> {
    model: &'a CrossAssetModel,
}

impl<'a> CrossAssetStateProcess<'a> {
    /// State process of `model`.
    pub fn new(model: &'a CrossAssetModel) -> Self {
        Self { model }
    }

    /// Dimension of the state.
    pub fn size(&self) -> usize {
        self.model.dimension()
    }

    /// State at time zero: zero LGM states, log FX and equity spots.
    pub fn initial_values(&self) -> Result<Array> {
        let m = self.model;
        let mut x = Array::zeros(self.size());
        for j in 0..m.components(AssetType::Fx) {
            x[m.p_idx(AssetType::Fx, j, 0)?] = log_spot(m.fx_at(j).fx_spot_today().value())?;
        }
        for k in 0..m.components(AssetType::Eq) {
            x[m.p_idx(AssetType::Eq, k, 0)?] = log_spot(m.eq_at(k).eq_spot_today().value())?;
        }
        Ok(x)
    }

    /// `E[X(t0 + dt) | X(t0) = x0]`.
    pub fn expectation(&self, t0: Time, x0: &Array, dt: Time) -> Result<Array> {
        let m = self.model;
        self.check_state(x0)?;
        let n_ir = m.components(AssetType::Ir);
        let mut e = Array::zeros(self.size());
        for i in 0..n_ir {
            e[i] = ir_expectation_1(m, i, t0, dt)? + ir_expectation_2(m, i, x0[i])?;
        }
        for j in 0..m.components(AssetType::Fx) {
            let p = m.p_idx(AssetType::Fx, j, 0)?;
            e[p] = fx_expectation_1(m, j, t0, dt)?
                + fx_expectation_2(m, j, t0, x0[p], x0[j + 1], x0[0], dt)?;
        }
        for k in 0..m.components(AssetType::Eq) {
            let p = m.p_idx(AssetType::Eq, k, 0)?;
            let c = m.ccy_index(m.eq_at(k).currency())?;
            e[p] = eq_expectation_1(m, k, t0, dt)? + eq_expectation_2(m, k, t0, x0[p], x0[c], dt)?;
        }
        Ok(e)
    }

    /// `Cov[X(t0 + dt) | X(t0) = x0]`; independent of `x0`.
    pub fn covariance(&self, t0: Time, x0: &Array, dt: Time) -> Result<Matrix> {
        let m = self.model;
        self.check_state(x0)?;
        let n = self.size();
        let layout = self.layout();
        let mut cov = Matrix::zeros(n, n);
        for a in 0..n {
            for b in a..n {
                let (sa, ia) = layout[a];
                let (sb, ib) = layout[b];
                let v = match (sa, sb) {
                    (AssetType::Ir, AssetType::Ir) => ir_ir_covariance(m, ia, ib, t0, dt)?,
                    (AssetType::Ir, AssetType::Fx) => ir_fx_covariance(m, ia, ib, t0, dt)?,
                    (AssetType::Ir, AssetType::Eq) => ir_eq_covariance(m, ia, ib, t0, dt)?,
                    (AssetType::Fx, AssetType::Fx) => fx_fx_covariance(m, ia, ib, t0, dt)?,
                    (AssetType::Fx, AssetType::Eq) => fx_eq_covariance(m, ia, ib, t0, dt)?,
                    (AssetType::Eq, AssetType::Eq) => eq_eq_covariance(m, ia, ib, t0, dt)?,
                    (s, t) => fail!("no covariance between {s} and {t} state variables"),
                };
                cov[(a, b)] = v;
                cov[(b, a)] = v;
            }
        }
        Ok(cov)
    }

    /// A root `S` of the covariance, `S Sᵀ = Cov`.
    pub fn std_deviation(&self, t0: Time, x0: &Array, dt: Time) -> Result<Matrix> {
        covariance_root(&self.covariance(t0, x0, dt)?)
    }

    /// `E + S dw` for a vector `dw` of independent standard normals.
    pub fn evolve(&self, t0: Time, x0: &Array, dt: Time, dw: &Array) -> Result<Array> {
        self.check_state(x0)?;
        self.step(t0, dt)?.evolve(x0, dw)
    }

    /// Precompute the state-independent moments of the step `[t0, t0 + dt]`.
    ///
    /// Path simulation over a fixed grid should build one step per interval
    /// and call [`ExactStep::evolve`] on each path.
    pub fn step(&self, t0: Time, dt: Time) -> Result<ExactStep<'a>> {
        let m = self.model;
        let n = self.size();
        let mut drift = Array::zeros(n);
        for i in 0..m.components(AssetType::Ir) {
            drift[i] = ir_expectation_1(m, i, t0, dt)?;
        }
        for j in 0..m.components(AssetType::Fx) {
            drift[m.p_idx(AssetType::Fx, j, 0)?] = fx_expectation_1(m, j, t0, dt)?;
        }
        for k in 0..m.components(AssetType::Eq) {
            drift[m.p_idx(AssetType::Eq, k, 0)?] = eq_expectation_1(m, k, t0, dt)?;
        }
        let root = self.std_deviation(t0, &Array::zeros(n), dt)?;
        Ok(ExactStep { model: m, t0, dt, drift, root })
    }

    // (asset type, component) of each state variable, in state order
    fn layout(&self) -> Vec<(AssetType, usize)> {
        AssetType::ALL
            .iter()
            .flat_map(|&t| (0..self.model.components(t)).map(move |i| (t, i)))
            .collect()
    }

    fn check_state(&self, x0: &Array) -> Result<()> {
        ensure!(
            x0.size() == self.size(),
            "state has size {}, state process has size {}",
            x0.size(),
            self.size()
        );
        Ok(())
    }
}

/// One step of the exact discretization with its state-independent drift
/// and covariance root cached.
#[derive(Debug, Clone)]
pub struct ExactStep<'a> {
    model: &'a CrossAssetModel,
    t0: Time,
    dt: Time,
    drift: Array,
    root: Matrix,
}

impl ExactStep<'_> {
    /// Start of the step.
    pub fn t0(&self) -> Time {
        self.t0
    }

    /// Length of the step.
    pub fn dt(&self) -> Time {
        self.dt
    }

    /// `E[X(t0 + dt) | X(t0) = x0]`.
    pub fn expectation(&self, x0: &Array) -> Result<Array> {
        let m = self.model;
        let n = self.drift.size();
        ensure!(x0.size() == n, "state has size {}, state process has size {n}", x0.size());
        let (t0, dt) = (self.t0, self.dt);
        let mut e = self.drift.clone();
        for i in 0..m.components(AssetType::Ir) {
            e[i] += ir_expectation_2(m, i, x0[i])?;
        }
        for j in 0..m.components(AssetType::Fx) {
            let p = m.p_idx(AssetType::Fx, j, 0)?;
            e[p] += fx_expectation_2(m, j, t0, x0[p], x0[j + 1], x0[0], dt)?;
        }
        for k in 0..m.components(AssetType::Eq) {
            let p = m.p_idx(AssetType::Eq, k, 0)?;
            let c = m.ccy_index(m.eq_at(k).currency())?;
            e[p] += eq_expectation_2(m, k, t0, x0[p], x0[c], dt)?;
        }
        Ok(e)
    }

    /// `E + S dw` for a vector `dw` of independent standard normals.
    pub fn evolve(&self, x0: &Array, dw: &Array) -> Result<Array> {
        ensure!(
            dw.size() == self.drift.size(),
            "random vector has size {}, state process has size {}",
            dw.size(),
            self.drift.size()
        );
        Ok(&self.expectation(x0)? + &self.root.mul_vec(dw))
    }
}

fn log_spot(value: Option<Real>) -> Result<Real> {
    match value {
        Some(v) if v > 0.0 => Ok(v.ln()),
        Some(v) => fail!("spot ({v}) must be positive"),
        None => fail!("spot quote has no value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cross_asset::ModelFactor;
    use crate::parametrization::{FxBsConstantParametrization, IrLgm1fConstantParametrization};
    use approx::assert_abs_diff_eq;
    use ql_currencies::currencies::{EUR, USD};
    use ql_quotes::{Quote, SimpleQuote};
    use ql_termstructures::{FlatForward, YieldTermStructure};
    use ql_time::{Actual365Fixed, Date};
    use std::sync::Arc;

    fn model() -> CrossAssetModel {
        let today = Date::from_ymd(2016, 1, 4).unwrap();
        let curve = |r: Real| -> Arc<dyn YieldTermStructure> {
            Arc::new(FlatForward::new(today, r, Actual365Fixed))
        };
        let spot: Arc<dyn Quote> = Arc::new(SimpleQuote::new(0.9));
        let mut m = CrossAssetModel::new(
            vec![
                ModelFactor::Ir(Box::new(
                    IrLgm1fConstantParametrization::new(EUR, curve(0.02), 0.01, 0.02).unwrap(),
                )),
                ModelFactor::Ir(Box::new(
                    IrLgm1fConstantParametrization::new(USD, curve(0.03), 0.012, 0.01).unwrap(),
                )),
                ModelFactor::Fx(Box::new(
                    FxBsConstantParametrization::new(USD, spot, 0.15).unwrap(),
                )),
            ],
            None,
        )
        .unwrap();
        m.set_correlation(AssetType::Ir, 0, AssetType::Fx, 0, -0.2).unwrap();
        m.set_correlation(AssetType::Ir, 1, AssetType::Fx, 0, 0.3).unwrap();
        m.set_correlation(AssetType::Ir, 0, AssetType::Ir, 1, 0.5).unwrap();
        m
    }

    #[test]
    fn initial_values_are_log_spots() {
        let m = model();
        let x = m.state_process().initial_values().unwrap();
        assert_eq!(x.size(), 3);
        assert_eq!(x[0], 0.0);
        assert_eq!(x[1], 0.0);
        assert_abs_diff_eq!(x[2], 0.9f64.ln(), epsilon = 1e-15);
    }

    #[test]
    fn covariance_is_symmetric_and_positive() {
        let m = model();
        let p = m.state_process();
        let x0 = p.initial_values().unwrap();
        let c = p.covariance(0.0, &x0, 5.0).unwrap();
        for i in 0..3 {
            assert!(c[(i, i)] > 0.0);
            for j in 0..3 {
                assert_eq!(c[(i, j)], c[(j, i)]);
            }
        }
        let s = p.std_deviation(0.0, &x0, 5.0).unwrap();
        let back = s.inner() * s.inner().transpose();
        for i in 0..3 {
            for j in 0..3 {
                assert_abs_diff_eq!(back[(i, j)], c[(i, j)], epsilon = 1e-14);
            }
        }
    }

    #[test]
    fn evolve_with_zero_shock_is_expectation() {
        let m = model();
        let p = m.state_process();
        let x0 = p.initial_values().unwrap();
        let e = p.expectation(1.0, &x0, 0.5).unwrap();
        let x1 = p.evolve(1.0, &x0, 0.5, &Array::zeros(3)).unwrap();
        assert_eq!(e.as_slice(), x1.as_slice());
        assert!(p.evolve(1.0, &x0, 0.5, &Array::zeros(2)).is_err());
    }

    #[test]
    fn cached_step_reproduces_evolve() {
        let m = model();
        let p = m.state_process();
        let x0 = p.initial_values().unwrap();
        let step = p.step(1.0, 0.5).unwrap();
        assert_eq!((step.t0(), step.dt()), (1.0, 0.5));
        let x1 = Array::from_slice(&[0.01, -0.02, x0[2] + 0.05]);
        let dw = Array::from_slice(&[0.3, -1.1, 0.7]);
        let direct = &p.expectation(1.0, &x1, 0.5).unwrap()
            + &p.std_deviation(1.0, &x1, 0.5).unwrap().mul_vec(&dw);
        let cached = step.evolve(&x1, &dw).unwrap();
        for i in 0..3 {
            assert_abs_diff_eq!(cached[i], direct[i], epsilon = 1e-15);
        }
        let e = p.expectation(1.0, &x1, 0.5).unwrap();
        assert_abs_diff_eq!(step.expectation(&x1).unwrap()[2], e[2], epsilon = 1e-15);
        assert!(step.evolve(&Array::zeros(2), &dw).is_err());
        assert!(step.evolve(&x1, &Array::zeros(2)).is_err());
    }
}
