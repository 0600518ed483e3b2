//! Calibration round trips: market values generated by a model at known
//! parameters are fitted by a model started elsewhere.

use approx::assert_relative_eq;
use ql_core::{Real, Time};
use ql_currencies::currencies::{EUR, USD};
use ql_instruments::OptionType;
use ql_math::normal_cdf;
use ql_math::optimization::{EndCriteria, LevenbergMarquardt};
use ql_models::cross_asset::analytics::fx_fx_covariance;
use ql_models::{
    price_error, AssetType, CalibrationErrorType, CalibrationHelper, CrossAssetModel,
    FxBsPiecewiseConstantParametrization, IrLgm1fConstantParametrization,
    IrLgm1fPiecewiseConstantParametrization, LgmZeroBondOptionHelper, LinearGaussMarkovModel,
    LinkableCalibratedModel, ModelFactor, Parametrization,
};
use ql_quotes::{Quote, SimpleQuote};
use ql_termstructures::{FlatForward, YieldTermStructure};
use ql_time::{Actual365Fixed, Date};
use std::sync::Arc;

fn curve(r: Real) -> Arc<dyn YieldTermStructure> {
    Arc::new(FlatForward::new(
        Date::from_ymd(2016, 1, 4).unwrap(),
        r,
        Actual365Fixed,
    ))
}

fn end_criteria() -> EndCriteria {
    EndCriteria::new(500, 50, 1e-12, 1e-14, 1e-12)
}

// ── LGM ──────────────────────────────────────────────────────────────────────

fn lgm(alpha: &[Real]) -> LinearGaussMarkovModel {
    LinearGaussMarkovModel::new(Box::new(
        IrLgm1fPiecewiseConstantParametrization::new(
            EUR,
            curve(0.02),
            &[1.0, 2.0, 3.0, 4.0],
            alpha,
            &[],
            &[0.01],
        )
        .unwrap(),
    ))
}

fn zero_bond_helpers(
    truth: &LinearGaussMarkovModel,
) -> Vec<Arc<dyn CalibrationHelper<LinearGaussMarkovModel>>> {
    let ts = curve(0.02);
    (1..=5)
        .map(|i| {
            let (expiry, maturity) = (i as Time, i as Time + 5.0);
            let strike = ts.discount(maturity) / ts.discount(expiry);
            let h = LgmZeroBondOptionHelper::from_model(
                truth,
                OptionType::Call,
                strike,
                expiry,
                maturity,
                CalibrationErrorType::PriceError,
            )
            .unwrap();
            Arc::new(h) as Arc<dyn CalibrationHelper<LinearGaussMarkovModel>>
        })
        .collect()
}

#[test]
fn lgm_volatility_bootstrap_recovers_generating_parameters() {
    let alpha = [0.008, 0.010, 0.012, 0.009, 0.011];
    let truth = lgm(&alpha);
    let helpers = zero_bond_helpers(&truth);

    let mut model = lgm(&[0.015; 5]);
    let outcomes = model
        .calibrate_volatilities_iterative(
            &helpers,
            &LevenbergMarquardt::default(),
            &end_criteria(),
            None,
            &[],
        )
        .unwrap();
    assert_eq!(outcomes.len(), 5);
    for o in &outcomes {
        assert!(o.end_criteria.succeeded(), "{:?}", o.end_criteria);
    }
    let fitted = model.parametrization().parameter_values(0).unwrap();
    for (f, a) in fitted.iter().zip(alpha) {
        assert_relative_eq!(*f, a, max_relative = 1e-5);
    }
    // reversion untouched
    assert_eq!(model.parametrization().parameter_values(1).unwrap()[0], 0.01);
    for h in &helpers {
        assert!(h.calibration_error(&model).unwrap().abs() < 1e-9);
    }
}

#[test]
fn lgm_global_calibration_with_fixed_reversion() {
    let truth = LinearGaussMarkovModel::new(Box::new(
        IrLgm1fConstantParametrization::new(EUR, curve(0.02), 0.011, 0.01).unwrap(),
    ));
    let ts = curve(0.02);
    let helpers: Vec<Arc<dyn CalibrationHelper<LinearGaussMarkovModel>>> = [2.0, 5.0]
        .into_iter()
        .map(|expiry: Time| {
            let strike = ts.discount(expiry + 10.0) / ts.discount(expiry);
            Arc::new(
                LgmZeroBondOptionHelper::from_model(
                    &truth,
                    OptionType::Put,
                    strike,
                    expiry,
                    expiry + 10.0,
                    CalibrationErrorType::PriceError,
                )
                .unwrap(),
            ) as Arc<dyn CalibrationHelper<LinearGaussMarkovModel>>
        })
        .collect();
    let mut model = LinearGaussMarkovModel::new(Box::new(
        IrLgm1fConstantParametrization::new(EUR, curve(0.02), 0.02, 0.01).unwrap(),
    ));
    let outcome = model
        .calibrate(
            &helpers,
            &LevenbergMarquardt::default(),
            &end_criteria(),
            None,
            &[1.0, 2.0],
            &[false, true],
        )
        .unwrap();
    assert!(outcome.end_criteria.succeeded());
    assert_relative_eq!(model.parametrization().alpha(3.0), 0.011, max_relative = 1e-6);
    assert_eq!(model.parametrization().kappa(3.0), 0.01);
}

// ── FX ───────────────────────────────────────────────────────────────────────

/// European FX option priced with the analytic FX variance of the model.
#[derive(Debug)]
struct FxOption {
    expiry: Time,
    strike: Real,
    market: Real,
}

impl FxOption {
    fn value(m: &CrossAssetModel, expiry: Time, strike: Real) -> ql_core::Result<Real> {
        let dom = m.irlgm1f(0)?.term_structure().discount(expiry);
        let fgn = m.irlgm1f(1)?.term_structure().discount(expiry);
        let spot = m.fxbs(0)?.fx_spot_today().value().unwrap_or(0.0);
        let forward = spot * fgn / dom;
        let sd = fx_fx_covariance(m, 0, 0, 0.0, expiry)?.sqrt();
        let d1 = (forward / strike).ln() / sd + 0.5 * sd;
        Ok(dom * (forward * normal_cdf(d1) - strike * normal_cdf(d1 - sd)))
    }
}

impl CalibrationHelper<CrossAssetModel> for FxOption {
    fn market_value(&self) -> Real {
        self.market
    }

    fn model_value(&self, model: &CrossAssetModel) -> ql_core::Result<Real> {
        Self::value(model, self.expiry, self.strike)
    }

    fn calibration_error(&self, model: &CrossAssetModel) -> ql_core::Result<Real> {
        Ok(price_error(
            CalibrationErrorType::PriceError,
            self.market,
            self.model_value(model)?,
        ))
    }
}

fn fx_model(vols: &[Real]) -> CrossAssetModel {
    let spot: Arc<dyn Quote> = Arc::new(SimpleQuote::new(0.9));
    CrossAssetModel::new(
        vec![
            ModelFactor::Ir(Box::new(
                IrLgm1fConstantParametrization::new(EUR, curve(0.02), 0.01, 0.02).unwrap(),
            )),
            ModelFactor::Ir(Box::new(
                IrLgm1fConstantParametrization::new(USD, curve(0.03), 0.012, 0.01).unwrap(),
            )),
            ModelFactor::Fx(Box::new(
                FxBsPiecewiseConstantParametrization::new(USD, spot, &[1.0, 2.0, 3.0], vols)
                    .unwrap(),
            )),
        ],
        None,
    )
    .unwrap()
}

fn fx_helpers(truth: &CrossAssetModel) -> Vec<Arc<dyn CalibrationHelper<CrossAssetModel>>> {
    [0.5, 1.5, 2.5, 3.5]
        .into_iter()
        .map(|expiry: Time| {
            let strike = 0.9 * (0.01 * expiry).exp();
            Arc::new(FxOption {
                expiry,
                strike,
                market: FxOption::value(truth, expiry, strike).unwrap(),
            }) as Arc<dyn CalibrationHelper<CrossAssetModel>>
        })
        .collect()
}

#[test]
fn fx_volatility_bootstrap_recovers_generating_parameters() {
    let vols = [0.10, 0.12, 0.14, 0.16];
    let truth = fx_model(&vols);
    let helpers = fx_helpers(&truth);
    let mut model = fx_model(&[0.2; 4]);
    let ir_before = model.irlgm1f(1).unwrap().parameter_values(0).unwrap();

    let outcomes = model
        .calibrate_bs_volatilities_iterative(
            AssetType::Fx,
            0,
            &helpers,
            &LevenbergMarquardt::default(),
            &end_criteria(),
            None,
            &[],
        )
        .unwrap();
    assert_eq!(outcomes.len(), 4);
    let fitted = model.fxbs(0).unwrap().parameter_values(0).unwrap();
    for (f, v) in fitted.iter().zip(vols) {
        assert_relative_eq!(*f, v, max_relative = 1e-5);
    }
    assert_eq!(model.irlgm1f(1).unwrap().parameter_values(0).unwrap(), ir_before);
}

#[test]
fn fx_volatility_global_calibration() {
    let vols = [0.10, 0.12, 0.14, 0.16];
    let truth = fx_model(&vols);
    let helpers = fx_helpers(&truth);
    let mut model = fx_model(&[0.2; 4]);
    let outcome = model
        .calibrate_bs_volatilities_global(
            AssetType::Fx,
            0,
            &helpers,
            &LevenbergMarquardt::default(),
            &end_criteria(),
            None,
            &[],
        )
        .unwrap();
    assert!(outcome.end_criteria.succeeded(), "{:?}", outcome.end_criteria);
    let fitted = model.fxbs(0).unwrap().parameter_values(0).unwrap();
    for (f, v) in fitted.iter().zip(vols) {
        assert_relative_eq!(*f, v, max_relative = 1e-5);
    }
    assert!(model
        .calibrate_bs_volatilities_global(
            AssetType::Ir,
            0,
            &helpers,
            &LevenbergMarquardt::default(),
            &end_criteria(),
            None,
            &[],
        )
        .is_err());
}
