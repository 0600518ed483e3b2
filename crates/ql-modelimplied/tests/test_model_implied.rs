//! Model-implied term structures against a three currency cross-asset model
//! with an equity: consistency with the model's analytics, reaction to
//! parameter changes and the fallbacks of the trait implementations.

use approx::{assert_abs_diff_eq, assert_relative_eq};
use ql_core::{Observable, Observer, Real};
use ql_currencies::currencies::{EUR, GBP, USD};
use ql_models::cross_asset::analytics::fx_fx_covariance;
use ql_models::{
    AssetType, CrossAssetModel, EqBsConstantParametrization, EqBsMarket,
    FxBsConstantParametrization, IrLgm1fConstantParametrization, ModelFactor, Parametrization,
    SharedCrossAssetModel,
};
use ql_modelimplied::{
    CrossAssetModelImpliedEqVolTermStructure, CrossAssetModelImpliedFxVolTermStructure,
    EqVolState, FxVolState, LgmImpliedYieldTermStructure,
};
use ql_quotes::{Quote, SimpleQuote};
use ql_termstructures::{BlackVolTermStructure, FlatForward, TermStructure, YieldTermStructure};
use ql_time::{Actual365Fixed, Date};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, Weak};
use tracing_subscriber::EnvFilter;

fn today() -> Date {
    Date::from_ymd(2016, 1, 4).unwrap()
}

fn curve(r: Real) -> Arc<dyn YieldTermStructure> {
    Arc::new(FlatForward::new(today(), r, Actual365Fixed))
}

fn quote(v: Real) -> Arc<dyn Quote> {
    Arc::new(SimpleQuote::new(v))
}

fn model(ir_vol: Real) -> SharedCrossAssetModel {
    let ftse = EqBsMarket {
        name: "FTSE".to_string(),
        currency: GBP,
        eq_spot: quote(6000.0),
        fx_spot: quote(1.15),
        ir_curve: curve(0.025),
        div_curve: curve(0.03),
    };
    let mut m = CrossAssetModel::new(
        vec![
            ModelFactor::Ir(Box::new(
                IrLgm1fConstantParametrization::new(EUR, curve(0.02), ir_vol, 0.02).unwrap(),
            )),
            ModelFactor::Ir(Box::new(
                IrLgm1fConstantParametrization::new(USD, curve(0.03), ir_vol, 0.01).unwrap(),
            )),
            ModelFactor::Ir(Box::new(
                IrLgm1fConstantParametrization::new(GBP, curve(0.025), ir_vol, 0.015).unwrap(),
            )),
            ModelFactor::Fx(Box::new(
                FxBsConstantParametrization::new(USD, quote(0.9), 0.15).unwrap(),
            )),
            ModelFactor::Fx(Box::new(
                FxBsConstantParametrization::new(GBP, quote(1.15), 0.10).unwrap(),
            )),
            ModelFactor::Eq(Box::new(EqBsConstantParametrization::new(ftse, 0.22).unwrap())),
        ],
        None,
    )
    .unwrap();
    m.set_correlation(AssetType::Ir, 0, AssetType::Fx, 0, -0.3).unwrap();
    m.set_correlation(AssetType::Ir, 1, AssetType::Fx, 0, 0.2).unwrap();
    m.set_correlation(AssetType::Ir, 2, AssetType::Eq, 0, 0.1).unwrap();
    m.set_correlation(AssetType::Fx, 0, AssetType::Fx, 1, 0.4).unwrap();
    Arc::new(RwLock::new(m))
}

#[derive(Debug, Default)]
struct Counter(AtomicUsize);

impl Observer for Counter {
    fn update(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

impl Counter {
    fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

// ── Yield curves ─────────────────────────────────────────────────────────────

#[test]
fn implied_curve_matches_model_zero_bonds() {
    let m = model(0.01);
    let yts = LgmImpliedYieldTermStructure::new(m.clone(), 1, Actual365Fixed, false).unwrap();
    let date = today() + 730;
    yts.move_to_date(date, 0.02).unwrap();
    let tau = yts.relative_time().unwrap();
    assert_abs_diff_eq!(tau, 2.0, epsilon = 1e-12);
    assert_eq!(yts.reference_date(), date);
    let model = m.read().unwrap();
    for t in [0.5, 1.0, 3.0, 10.0] {
        let expected = model.discount_bond(1, tau, tau + t, 0.02, None).unwrap();
        assert_relative_eq!(yts.discount(t), expected, max_relative = 1e-14);
    }
}

#[test]
fn purely_time_based_curve_keeps_model_reference_date() {
    let yts = LgmImpliedYieldTermStructure::new(model(0.01), 0, Actual365Fixed, true).unwrap();
    yts.move_to_time(5.0, -0.01).unwrap();
    assert_eq!(yts.reference_date(), today());
    assert_eq!(yts.relative_time().unwrap(), 5.0);
    assert_eq!(yts.state(), -0.01);
}

// ── FX and EQ surfaces ───────────────────────────────────────────────────────

#[test]
fn fx_surface_matches_model_fx_variance() {
    let m = model(0.008);
    let s = CrossAssetModelImpliedFxVolTermStructure::new(m.clone(), 0, Actual365Fixed, false)
        .unwrap();
    assert_eq!(s.black_variance_time(0.0, 0.9), 0.0);
    let model = m.read().unwrap();
    for t in [1.0, 3.0, 7.0] {
        let expected = fx_fx_covariance(&model, 0, 0, 0.0, t).unwrap();
        assert_relative_eq!(s.try_black_variance(t, 0.0).unwrap(), expected, max_relative = 1e-8);
    }
}

#[test]
fn surfaces_move_with_state() {
    let m = model(0.01);
    let fx = CrossAssetModelImpliedFxVolTermStructure::new(m.clone(), 1, Actual365Fixed, true)
        .unwrap();
    let eq = CrossAssetModelImpliedEqVolTermStructure::new(m, 0, Actual365Fixed, false).unwrap();
    assert_eq!(fx.state().log_fx_spot, 1.15f64.ln());
    assert_eq!(eq.state().log_eq_spot, 6000f64.ln());

    let state = FxVolState {
        ir_domestic: 0.01,
        ir_foreign: -0.01,
        log_fx_spot: 1.2f64.ln(),
    };
    fx.move_to_time(2.0, state).unwrap();
    assert_eq!(fx.state(), state);
    let v = fx.try_black_vol(1.0, 1.3).unwrap();
    assert!(v > 0.05 && v < 0.2, "implied FX vol {v}");

    eq.move_to_date(
        today() + 365,
        EqVolState {
            ir_state: 0.0,
            log_eq_spot: 6100f64.ln(),
        },
    )
    .unwrap();
    let v = eq.try_black_vol(2.0, 6000.0).unwrap();
    assert!(v > 0.15 && v < 0.3, "implied EQ vol {v}");
}

#[test]
fn parameter_change_propagates_to_surfaces() {
    let m = model(0.0);
    let s = CrossAssetModelImpliedFxVolTermStructure::new(m.clone(), 0, Actual365Fixed, false)
        .unwrap();
    let counter = Arc::new(Counter::default());
    s.register_observer(Arc::downgrade(&counter) as Weak<dyn Observer>);
    assert_abs_diff_eq!(s.black_vol_time(2.0, 0.0), 0.15, epsilon = 1e-8);

    {
        let mut model = m.write().unwrap();
        let fx = model.fxbs_mut(0).unwrap();
        let raw = fx.inverse(0, 0.25);
        fx.set_param(0, 0, raw).unwrap();
        model.update();
    }
    assert!(counter.count() >= 1);
    assert_abs_diff_eq!(s.black_vol_time(2.0, 0.0), 0.25, epsilon = 1e-8);
}

#[test]
fn dropped_structures_are_not_notified() {
    let m = model(0.01);
    let counter = Arc::new(Counter::default());
    {
        let yts = LgmImpliedYieldTermStructure::new(m.clone(), 0, Actual365Fixed, false).unwrap();
        yts.register_observer(Arc::downgrade(&counter) as Weak<dyn Observer>);
        m.write().unwrap().update();
        assert_eq!(counter.count(), 1);
    }
    m.write().unwrap().update();
    assert_eq!(counter.count(), 1);
}

// ── Fallbacks ────────────────────────────────────────────────────────────────

#[test]
fn trait_fallbacks_log_and_return_neutral_values() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let m = model(0.01);
    let yts = LgmImpliedYieldTermStructure::new(m.clone(), 0, Actual365Fixed, false).unwrap();
    let s = CrossAssetModelImpliedEqVolTermStructure::new(m, 0, Actual365Fixed, false).unwrap();
    let early = today() - 30;
    yts.move_to_date(early, 0.0).unwrap();
    s.move_to_date(early, s.state()).unwrap();

    assert!(yts.try_discount(1.0).is_err());
    assert!(yts.discount(1.0).is_nan());
    assert!(s.try_black_variance(1.0, 6000.0).is_err());
    assert_eq!(s.black_variance_time(1.0, 6000.0), 0.0);
}
