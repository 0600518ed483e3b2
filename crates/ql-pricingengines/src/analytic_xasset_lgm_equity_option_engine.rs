//! Analytic equity option engine for the cross-asset model (translates
//! `analyticxassetlgmeqoptionengine.hpp`).
//!
//! The option is settled in the equity currency. Its log spot at expiry is
//! Gaussian under the model, so the Black formula applies with the model
//! variance of `ln S_k` and the forward `S_k(0) D(T) / P_k(T)` built from
//! the dividend and equity rate curves.

use crate::black_formula::black_formula;
use ql_core::{ensure, errors::Result, fail, Real, Time};
use ql_instruments::{EuropeanOptionArguments, PricingEngine, PricingResults, StrikedPayoff};
use ql_models::cross_asset::analytics::eq_eq_covariance;
use ql_models::{AssetType, CrossAssetModel, SharedCrossAssetModel};
use ql_termstructures::TermStructure;
use std::sync::{PoisonError, RwLockReadGuard};

/// Value at `t0` of a European option on equity `eq_index` expiring at
/// `expiry`, given the discount factor in the equity currency and the
/// equity forward.
pub fn eq_option_value(
    model: &CrossAssetModel,
    eq_index: usize,
    t0: Time,
    expiry: Time,
    payoff: &dyn StrikedPayoff,
    discount: Real,
    eq_forward: Real,
) -> Result<Real> {
    ensure!(
        expiry >= t0,
        "expiry ({expiry}) must not be before valuation time ({t0})"
    );
    let variance = eq_eq_covariance(model, eq_index, eq_index, t0, expiry - t0)?;
    black_formula(
        payoff.option_type(),
        payoff.strike(),
        eq_forward,
        variance.max(0.0).sqrt(),
        discount,
    )
}

/// Today's discount factor to `expiry` in the equity currency and the
/// forward of equity `eq_index`.
pub fn eq_forward_today(
    model: &CrossAssetModel,
    eq_index: usize,
    expiry: Time,
) -> Result<(Real, Real)> {
    let eq = model.eqbs(eq_index)?;
    let Some(spot) = eq.eq_spot_today().value() else {
        fail!("spot quote of equity {} has no value", eq.eq_name());
    };
    let discount = eq.equity_ir_curve_today().discount(expiry);
    let dividend = eq.equity_div_yield_curve_today().discount(expiry);
    Ok((discount, spot * dividend / discount))
}

/// Analytic engine for European equity options in a cross-asset model.
///
/// Corresponds to `QuantExt::AnalyticXAssetLgmEquityOptionEngine`.
#[derive(Debug, Clone)]
pub struct AnalyticXAssetLgmEquityOptionEngine {
    model: SharedCrossAssetModel,
    eq_index: usize,
}

impl AnalyticXAssetLgmEquityOptionEngine {
    /// Engine for equity component `eq_index` of `model`.
    pub fn new(model: SharedCrossAssetModel, eq_index: usize) -> Result<Self> {
        {
            let m = model.read().unwrap_or_else(PoisonError::into_inner);
            ensure!(
                eq_index < m.components(AssetType::Eq),
                "EQ index ({eq_index}) out of range, model has {} EQ components",
                m.components(AssetType::Eq)
            );
        }
        Ok(Self { model, eq_index })
    }

    /// The model.
    pub fn model(&self) -> &SharedCrossAssetModel {
        &self.model
    }

    /// Equity component priced by this engine.
    pub fn eq_index(&self) -> usize {
        self.eq_index
    }

    fn read(&self) -> RwLockReadGuard<'_, CrossAssetModel> {
        self.model.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Value at `t0` of the option expiring at `expiry`.
    pub fn value(
        &self,
        t0: Time,
        expiry: Time,
        payoff: &dyn StrikedPayoff,
        discount: Real,
        eq_forward: Real,
    ) -> Result<Real> {
        eq_option_value(&self.read(), self.eq_index, t0, expiry, payoff, discount, eq_forward)
    }

    /// Today's value of the option expiring at `expiry`.
    pub fn npv(&self, payoff: &dyn StrikedPayoff, expiry: Time) -> Result<Real> {
        let m = self.read();
        let (discount, forward) = eq_forward_today(&m, self.eq_index, expiry)?;
        eq_option_value(&m, self.eq_index, 0.0, expiry, payoff, discount, forward)
    }
}

impl PricingEngine<EuropeanOptionArguments> for AnalyticXAssetLgmEquityOptionEngine {
    fn calculate(&self, args: &EuropeanOptionArguments) -> Result<PricingResults> {
        let m = self.read();
        let expiry = m
            .eqbs(self.eq_index)?
            .equity_ir_curve_today()
            .time_from_reference(args.expiry);
        let (discount, forward) = eq_forward_today(&m, self.eq_index, expiry)?;
        let variance = eq_eq_covariance(&m, self.eq_index, self.eq_index, 0.0, expiry)?;
        let npv =
            eq_option_value(&m, self.eq_index, 0.0, expiry, &args.payoff, discount, forward)?;
        Ok(PricingResults::from_npv(npv)
            .with_result("forward", forward)
            .with_result("stdDev", variance.max(0.0).sqrt())
            .with_result("discount", discount))
    }
}
