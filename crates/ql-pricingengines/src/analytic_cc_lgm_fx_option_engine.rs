//! Analytic FX option engine for the cross-asset model (translates
//! `analyticcclgmfxoptionengine.hpp`).
//!
//! Under the cross-asset model the log FX rate at expiry is Gaussian, so a
//! European FX option is priced by the Black formula with the model
//! variance of `ln x_j` over the option life:
//!
//! $$V = P_d(T)\,\mathrm{Black}\big(K, F, \sqrt{\mathrm{Var}[\ln x_j(T)]}\big),
//! \qquad F = x_j(0)\,\frac{P_f(T)}{P_d(T)}$$

use crate::black_formula::black_formula;
use ql_core::{ensure, errors::Result, fail, Real, Time};
use ql_instruments::{EuropeanOptionArguments, PricingEngine, PricingResults, StrikedPayoff};
use ql_models::cross_asset::analytics::fx_fx_covariance;
use ql_models::{AssetType, CrossAssetModel, SharedCrossAssetModel};
use ql_termstructures::TermStructure;
use std::sync::{PoisonError, RwLockReadGuard};

/// Value at `t0` of a European option on FX component `fx_index` expiring
/// at `expiry`, given the domestic discount factor to expiry and the FX
/// forward.
pub fn fx_option_value(
    model: &CrossAssetModel,
    fx_index: usize,
    t0: Time,
    expiry: Time,
    payoff: &dyn StrikedPayoff,
    domestic_discount: Real,
    fx_forward: Real,
) -> Result<Real> {
    ensure!(
        expiry >= t0,
        "expiry ({expiry}) must not be before valuation time ({t0})"
    );
    let variance = fx_fx_covariance(model, fx_index, fx_index, t0, expiry - t0)?;
    black_formula(
        payoff.option_type(),
        payoff.strike(),
        fx_forward,
        variance.max(0.0).sqrt(),
        domestic_discount,
    )
}

/// Today's domestic discount factor to `expiry` and FX forward of component
/// `fx_index`, read from the curves and spot of the model.
pub fn fx_forward_today(
    model: &CrossAssetModel,
    fx_index: usize,
    expiry: Time,
) -> Result<(Real, Real)> {
    let fx = model.fxbs(fx_index)?;
    let Some(spot) = fx.fx_spot_today().value() else {
        fail!("FX spot quote of component {fx_index} has no value");
    };
    let domestic = model.irlgm1f(0)?.term_structure().discount(expiry);
    let foreign = model.irlgm1f(fx_index + 1)?.term_structure().discount(expiry);
    Ok((domestic, spot * foreign / domestic))
}

/// Analytic engine for European FX options in a cross-asset model.
///
/// Corresponds to `QuantExt::AnalyticCcLgmFxOptionEngine`.
#[derive(Debug, Clone)]
pub struct AnalyticCcLgmFxOptionEngine {
    model: SharedCrossAssetModel,
    fx_index: usize,
}

impl AnalyticCcLgmFxOptionEngine {
    /// Engine for FX component `fx_index` of `model`.
    pub fn new(model: SharedCrossAssetModel, fx_index: usize) -> Result<Self> {
        {
            let m = model.read().unwrap_or_else(PoisonError::into_inner);
            ensure!(
                fx_index < m.components(AssetType::Fx),
                "FX index ({fx_index}) out of range, model has {} FX components",
                m.components(AssetType::Fx)
            );
        }
        Ok(Self { model, fx_index })
    }

    /// The model.
    pub fn model(&self) -> &SharedCrossAssetModel {
        &self.model
    }

    /// FX component priced by this engine.
    pub fn fx_index(&self) -> usize {
        self.fx_index
    }

    fn read(&self) -> RwLockReadGuard<'_, CrossAssetModel> {
        self.model.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Value at `t0` of the option expiring at `expiry`; see
    /// [`fx_option_value`].
    pub fn value(
        &self,
        t0: Time,
        expiry: Time,
        payoff: &dyn StrikedPayoff,
        domestic_discount: Real,
        fx_forward: Real,
    ) -> Result<Real> {
        fx_option_value(
            &self.read(),
            self.fx_index,
            t0,
            expiry,
            payoff,
            domestic_discount,
            fx_forward,
        )
    }

    /// Today's value of the option expiring at `expiry`, off the model's
    /// curves and FX spot.
    pub fn npv(&self, payoff: &dyn StrikedPayoff, expiry: Time) -> Result<Real> {
        let m = self.read();
        let (discount, forward) = fx_forward_today(&m, self.fx_index, expiry)?;
        fx_option_value(&m, self.fx_index, 0.0, expiry, payoff, discount, forward)
    }
}

impl PricingEngine<EuropeanOptionArguments> for AnalyticCcLgmFxOptionEngine {
    fn calculate(&self, args: &EuropeanOptionArguments) -> Result<PricingResults> {
        let m = self.read();
        let expiry = m
            .irlgm1f(0)?
            .term_structure()
            .time_from_reference(args.expiry);
        let (discount, forward) = fx_forward_today(&m, self.fx_index, expiry)?;
        let variance = fx_fx_covariance(&m, self.fx_index, self.fx_index, 0.0, expiry)?;
        let npv =
            fx_option_value(&m, self.fx_index, 0.0, expiry, &args.payoff, discount, forward)?;
        Ok(PricingResults::from_npv(npv)
            .with_result("forward", forward)
            .with_result("stdDev", variance.max(0.0).sqrt())
            .with_result("discount", discount))
    }
}
