//! Bucketed FX and equity volatility calibration of a cross-asset model to
//! Black volatility quotes.

use ql_core::{Real, Time};
use ql_currencies::currencies::{EUR, USD};
use ql_math::optimization::{EndCriteria, LevenbergMarquardt};
use ql_models::{
    AssetType, CalibrationErrorType, CalibrationHelper, CrossAssetModel, EqBsMarket,
    EqBsPiecewiseConstantParametrization, FxBsPiecewiseConstantParametrization,
    IrLgm1fConstantParametrization, ModelFactor, Parametrization,
};
use ql_pricingengines::{FxEqOptionHelper, FxEqOptionMarket};
use ql_quotes::{Quote, SimpleQuote};
use ql_termstructures::{FlatForward, YieldTermStructure};
use ql_time::{Actual365Fixed, Date};
use std::sync::Arc;

const EXPIRIES: [Time; 4] = [1.0, 2.0, 3.0, 5.0];
const MARKET_VOLS: [Real; 4] = [0.12, 0.13, 0.125, 0.14];

fn curve(r: Real) -> Arc<dyn YieldTermStructure> {
    Arc::new(FlatForward::new(
        Date::from_ymd(2016, 1, 4).unwrap(),
        r,
        Actual365Fixed,
    ))
}

fn quote(v: Real) -> Arc<dyn Quote> {
    Arc::new(SimpleQuote::new(v))
}

fn model() -> CrossAssetModel {
    let times = &EXPIRIES[..3];
    let sp5 = EqBsMarket {
        name: "SP5".to_string(),
        currency: USD,
        eq_spot: quote(2100.0),
        fx_spot: quote(0.9),
        ir_curve: curve(0.03),
        div_curve: curve(0.01),
    };
    let mut m = CrossAssetModel::new(
        vec![
            ModelFactor::Ir(Box::new(
                IrLgm1fConstantParametrization::new(EUR, curve(0.02), 0.008, 0.02).unwrap(),
            )),
            ModelFactor::Ir(Box::new(
                IrLgm1fConstantParametrization::new(USD, curve(0.03), 0.010, 0.01).unwrap(),
            )),
            ModelFactor::Fx(Box::new(
                FxBsPiecewiseConstantParametrization::new(USD, quote(0.9), times, &[0.2; 4])
                    .unwrap(),
            )),
            ModelFactor::Eq(Box::new(
                EqBsPiecewiseConstantParametrization::new(sp5, times, &[0.3; 4]).unwrap(),
            )),
        ],
        None,
    )
    .unwrap();
    m.set_correlation(AssetType::Ir, 0, AssetType::Fx, 0, -0.2).unwrap();
    m.set_correlation(AssetType::Ir, 1, AssetType::Fx, 0, 0.25).unwrap();
    m.set_correlation(AssetType::Ir, 1, AssetType::Eq, 0, 0.1).unwrap();
    m.set_correlation(AssetType::Fx, 0, AssetType::Eq, 0, 0.3).unwrap();
    m
}

fn helpers(
    asset: AssetType,
    market: impl Fn(Real) -> FxEqOptionMarket,
    kind: CalibrationErrorType,
) -> Vec<Arc<dyn CalibrationHelper<CrossAssetModel>>> {
    EXPIRIES
        .iter()
        .zip(MARKET_VOLS)
        .map(|(&t, vol)| {
            Arc::new(FxEqOptionHelper::new(asset, 0, t, None, market(vol), kind).unwrap())
                as Arc<dyn CalibrationHelper<CrossAssetModel>>
        })
        .collect()
}

fn fx_market(vol: Real) -> FxEqOptionMarket {
    FxEqOptionMarket {
        spot: quote(0.9),
        volatility: quote(vol),
        domestic_yield: curve(0.02),
        foreign_yield: curve(0.03),
    }
}

fn eq_market(vol: Real) -> FxEqOptionMarket {
    FxEqOptionMarket {
        spot: quote(2100.0),
        volatility: quote(vol),
        domestic_yield: curve(0.03),
        foreign_yield: curve(0.01),
    }
}

fn end_criteria() -> EndCriteria {
    EndCriteria::new(1000, 100, 1e-12, 1e-14, 1e-12)
}

#[test]
fn fx_bootstrap_reprices_all_quotes() {
    let mut m = model();
    let hs = helpers(AssetType::Fx, fx_market, CalibrationErrorType::RelativePriceError);
    m.calibrate_bs_volatilities_iterative(
        AssetType::Fx,
        0,
        &hs,
        &LevenbergMarquardt::default(),
        &end_criteria(),
        None,
        &[],
    )
    .unwrap();
    for h in &hs {
        assert!(h.calibration_error(&m).unwrap().abs() < 1e-6);
    }
    let fitted = m.fxbs(0).unwrap().parameter_values(0).unwrap();
    assert!(fitted.iter().all(|v| (v - 0.2).abs() > 1e-3));
    // equity buckets untouched
    assert!(m
        .eqbs(0)
        .unwrap()
        .parameter_values(0)
        .unwrap()
        .iter()
        .all(|v| (v - 0.3).abs() < 1e-15));
}

#[test]
fn eq_bootstrap_with_implied_vol_error() {
    let mut m = model();
    let hs = helpers(AssetType::Eq, eq_market, CalibrationErrorType::ImpliedVolError);
    let outcomes = m
        .calibrate_bs_volatilities_iterative(
            AssetType::Eq,
            0,
            &hs,
            &LevenbergMarquardt::default(),
            &end_criteria(),
            None,
            &[],
        )
        .unwrap();
    assert_eq!(outcomes.len(), EXPIRIES.len());
    for h in &hs {
        assert!(h.calibration_error(&m).unwrap().abs() < 1e-6);
    }
}
