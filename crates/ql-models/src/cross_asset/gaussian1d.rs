//! One currency of a cross-asset model seen as a one-factor Gaussian model
//! (translates `gaussian1dcrossassetadaptor.hpp`).

use super::{CrossAssetModel, SharedCrossAssetModel};
use ql_core::{ensure, errors::Result, Real, Time};
use ql_termstructures::YieldTermStructure;
use std::sync::{PoisonError, RwLockReadGuard};

/// Gaussian one-factor view of the LGM component of currency `ccy`, in the
/// standardized state `y = x / √ζ(t)`.
///
/// Corresponds to `QuantExt::Gaussian1dCrossAssetAdaptor`.
#[derive(Debug, Clone)]
pub struct Gaussian1dCrossAssetAdaptor {
    model: SharedCrossAssetModel,
    ccy: usize,
}

impl Gaussian1dCrossAssetAdaptor {
    /// Adapt currency `ccy` of `model`.
    pub fn new(model: SharedCrossAssetModel, ccy: usize) -> Result<Self> {
        model.read().unwrap_or_else(PoisonError::into_inner).lgm(ccy)?;
        Ok(Self { model, ccy })
    }

    /// The adapted model.
    pub fn model(&self) -> &SharedCrossAssetModel {
        &self.model
    }

    /// Currency index inside the model.
    pub fn ccy(&self) -> usize {
        self.ccy
    }

    fn read(&self) -> RwLockReadGuard<'_, CrossAssetModel> {
        self.model.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(m: &CrossAssetModel, ccy: usize, t: Time, y: Real) -> Real {
        y * m.ir_at(ccy).zeta(t).sqrt()
    }

    /// Numeraire at `t` in standardized state `y`.
    pub fn numeraire(&self, t: Time, y: Real, curve: Option<&dyn YieldTermStructure>) -> Result<Real> {
        let m = self.read();
        m.numeraire(self.ccy, t, Self::state(&m, self.ccy, t, y), curve)
    }

    /// Zero bond maturing at `maturity` seen from `t` in standardized state
    /// `y`.
    pub fn zerobond(
        &self,
        maturity: Time,
        t: Time,
        y: Real,
        curve: Option<&dyn YieldTermStructure>,
    ) -> Result<Real> {
        let m = self.read();
        m.discount_bond(self.ccy, t, maturity, Self::state(&m, self.ccy, t, y), curve)
    }

    /// Grid of `2 · grid_points + 1` standardized states at `maturity`,
    /// spanning `std_devs` conditional standard deviations around the
    /// expectation given `y` at `t`.
    pub fn y_grid(
        &self,
        std_devs: Real,
        grid_points: usize,
        maturity: Time,
        t: Time,
        y: Real,
    ) -> Result<Vec<Real>> {
        ensure!(grid_points > 0, "number of grid points must be positive");
        ensure!(
            maturity >= t && t >= 0.0,
            "grid requires 0 <= t ({t}) <= T ({maturity})"
        );
        let m = self.read();
        let p = m.ir_at(self.ccy);
        let (zeta_t, zeta_big_t) = (p.zeta(t), p.zeta(maturity));
        ensure!(zeta_big_t > 0.0, "zeta({maturity}) = {zeta_big_t} must be positive");
        let std_0_big_t = zeta_big_t.sqrt();
        let std_t_big_t = (zeta_big_t - zeta_t).max(0.0).sqrt();
        let x_t = y * zeta_t.sqrt();
        let h = std_devs / grid_points as Real;
        let n = grid_points as i64;
        Ok((-n..=n)
            .map(|j| (x_t + std_t_big_t * j as Real * h) / std_0_big_t)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cross_asset::ModelFactor;
    use crate::parametrization::IrLgm1fConstantParametrization;
    use approx::assert_abs_diff_eq;
    use ql_currencies::currencies::EUR;
    use ql_termstructures::FlatForward;
    use ql_time::{Actual365Fixed, Date};
    use std::sync::{Arc, RwLock};

    fn adaptor() -> (Gaussian1dCrossAssetAdaptor, Arc<dyn YieldTermStructure>) {
        let curve: Arc<dyn YieldTermStructure> = Arc::new(FlatForward::new(
            Date::from_ymd(2016, 1, 4).unwrap(),
            0.02,
            Actual365Fixed,
        ));
        let ir = IrLgm1fConstantParametrization::new(EUR, curve.clone(), 0.01, 0.02).unwrap();
        let model = CrossAssetModel::new(vec![ModelFactor::Ir(Box::new(ir))], None).unwrap();
        (
            Gaussian1dCrossAssetAdaptor::new(Arc::new(RwLock::new(model)), 0).unwrap(),
            curve,
        )
    }

    #[test]
    fn numeraire_at_origin_is_one() {
        let (g, _) = adaptor();
        assert_abs_diff_eq!(g.numeraire(0.0, 0.0, None).unwrap(), 1.0, epsilon = 1e-14);
        assert_abs_diff_eq!(g.numeraire(0.0, 1.5, None).unwrap(), 1.0, epsilon = 1e-14);
    }

    #[test]
    fn zerobond_today_is_curve_discount() {
        let (g, curve) = adaptor();
        assert_abs_diff_eq!(
            g.zerobond(3.0, 0.0, 0.7, None).unwrap(),
            curve.discount(3.0),
            epsilon = 1e-14
        );
    }

    #[test]
    fn grid_is_symmetric_around_conditional_mean() {
        let (g, _) = adaptor();
        let grid = g.y_grid(5.0, 10, 4.0, 0.0, 0.0).unwrap();
        assert_eq!(grid.len(), 21);
        assert_abs_diff_eq!(grid[10], 0.0, epsilon = 1e-15);
        assert_abs_diff_eq!(grid[20], 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(grid[0], -5.0, epsilon = 1e-12);
        assert!(g.y_grid(5.0, 10, 0.0, 0.0, 0.0).is_err());
        assert!(Gaussian1dCrossAssetAdaptor::new(g.model().clone(), 1).is_err());
    }
}
