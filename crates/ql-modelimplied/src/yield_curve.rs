//! Yield curves implied by the LGM component of a cross-asset model
//! (translates `lgmimpliedyieldtermstructure.hpp`).
//!
//! The curve sits at relative time `τ` with LGM state `x` and discounts
//! with the model's conditional zero bond,
//!
//! $$P(t) = P^{\mathrm{LGM}}(\tau, \tau + t \mid x).$$
//!
//! Two decorators correct the model curve towards a target curve: the
//! forward-forward corrected curve reproduces the target's forward
//! discount factors seen from `τ`, the spot corrected curve reproduces the
//! target's spot discount factors.

use crate::reference::ModelReference;
use ql_core::{
    ensure, errors::Result, DiscountFactor, LazyObject, Observable, ObservableImpl, Observer,
    Real, Time,
};
use ql_models::SharedCrossAssetModel;
use ql_termstructures::{TermStructure, YieldTermStructure};
use ql_time::{Date, DayCounter};
use std::sync::{Arc, PoisonError, RwLock, Weak};
use tracing::warn;

/// Yield curve implied by IR component `ccy` of a cross-asset model at a
/// moved reference and LGM state.
///
/// Registered with the model: parameter changes invalidate the cached
/// relative time and are forwarded to the curve's own observers.
///
/// Corresponds to `QuantExt::LgmImpliedYieldTermStructure`.
#[derive(Debug)]
pub struct LgmImpliedYieldTermStructure {
    reference: ModelReference,
    ccy: usize,
    day_counter: Arc<dyn DayCounter>,
    state: RwLock<Real>,
    observable: ObservableImpl,
}

impl LgmImpliedYieldTermStructure {
    /// Curve of IR component `ccy`, at the model's reference date with
    /// zero state.
    pub fn new(
        model: SharedCrossAssetModel,
        ccy: usize,
        day_counter: impl DayCounter + 'static,
        purely_time_based: bool,
    ) -> Result<Arc<Self>> {
        let curve = Arc::new(Self {
            reference: ModelReference::new(model, ccy, purely_time_based)?,
            ccy,
            day_counter: Arc::new(day_counter),
            state: RwLock::new(0.0),
            observable: ObservableImpl::new(),
        });
        let observer: Weak<dyn Observer> = Arc::downgrade(&curve) as Weak<dyn Observer>;
        curve.reference.register(observer);
        Ok(curve)
    }

    /// The model.
    pub fn model(&self) -> &SharedCrossAssetModel {
        self.reference.model()
    }

    /// IR component of the model.
    pub fn ccy(&self) -> usize {
        self.ccy
    }

    /// `true` if the curve is moved by time rather than by date.
    pub fn purely_time_based(&self) -> bool {
        self.reference.purely_time_based()
    }

    /// Current LGM state.
    pub fn state(&self) -> Real {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Relative time of the reference date on the model's time axis.
    pub fn relative_time(&self) -> Result<Time> {
        self.reference.relative_time()
    }

    /// Move the reference date and set the LGM state.
    pub fn move_to_date(&self, date: Date, state: Real) -> Result<()> {
        self.reference.move_to_date(date)?;
        self.set_state(state);
        Ok(())
    }

    /// Move the relative time and set the LGM state; purely time based
    /// curves only.
    pub fn move_to_time(&self, t: Time, state: Real) -> Result<()> {
        self.reference.move_to_time(t)?;
        self.set_state(state);
        Ok(())
    }

    /// Set the LGM state, keeping the reference.
    pub fn set_state(&self, state: Real) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
        self.observable.notify();
    }

    /// Discount factor for time `t` from the reference.
    pub fn try_discount(&self, t: Time) -> Result<DiscountFactor> {
        ensure!(t >= 0.0, "negative time ({t}) given");
        let tau = self.relative_time()?;
        let state = self.state();
        self.reference
            .read_model()
            .discount_bond(self.ccy, tau, tau + t, state, None)
    }

    /// Today's discount factor of the model curve.
    pub(crate) fn model_curve_discount(&self, t: Time) -> Result<DiscountFactor> {
        let m = self.reference.read_model();
        Ok(m.irlgm1f(self.ccy)?.term_structure().discount(t))
    }
}

impl TermStructure for LgmImpliedYieldTermStructure {
    fn reference_date(&self) -> Date {
        self.reference.reference_date()
    }

    fn day_counter(&self) -> &dyn DayCounter {
        &*self.day_counter
    }
}

impl YieldTermStructure for LgmImpliedYieldTermStructure {
    fn discount_impl(&self, t: Time) -> DiscountFactor {
        self.try_discount(t).unwrap_or_else(|e| {
            warn!(ccy = self.ccy, t, error = %e, "model-implied discount failed");
            Real::NAN
        })
    }
}

impl Observer for LgmImpliedYieldTermStructure {
    fn update(&self) {
        self.reference.invalidate();
        self.observable.notify();
    }
}

impl Observable for LgmImpliedYieldTermStructure {
    fn register_observer(&self, observer: Weak<dyn Observer>) {
        self.observable.register(observer);
    }

    fn unregister_observer(&self, observer: &Weak<dyn Observer>) {
        self.observable.unregister(observer);
    }

    fn notify_observers(&self) {
        self.observable.notify();
    }
}

// ── Corrected curves ──────────────────────────────────────────────────────────

macro_rules! corrected_curve {
    ($name:ident, $doc:literal, $corresponds:literal) => {
        #[doc = $doc]
        ///
        #[doc = $corresponds]
        #[derive(Debug, Clone)]
        pub struct $name {
            implied: Arc<LgmImpliedYieldTermStructure>,
            target: Arc<dyn YieldTermStructure>,
        }

        impl $name {
            /// Correct `implied` towards `target`.
            pub fn new(
                implied: Arc<LgmImpliedYieldTermStructure>,
                target: Arc<dyn YieldTermStructure>,
            ) -> Self {
                Self { implied, target }
            }

            /// The uncorrected model curve; moves are applied to it.
            pub fn implied(&self) -> &Arc<LgmImpliedYieldTermStructure> {
                &self.implied
            }

            /// The target curve.
            pub fn target(&self) -> &Arc<dyn YieldTermStructure> {
                &self.target
            }
        }

        impl TermStructure for $name {
            fn reference_date(&self) -> Date {
                self.implied.reference_date()
            }

            fn day_counter(&self) -> &dyn DayCounter {
                self.implied.day_counter()
            }
        }

        impl YieldTermStructure for $name {
            fn discount_impl(&self, t: Time) -> DiscountFactor {
                self.try_discount(t).unwrap_or_else(|e| {
                    warn!(ccy = self.implied.ccy(), t, error = %e, "corrected discount failed");
                    Real::NAN
                })
            }
        }
    };
}

corrected_curve!(
    LgmImpliedYtsFwdFwdCorrected,
    "Model curve corrected so that forward discount factors seen from the \
     reference match the target curve.",
    "Corresponds to `QuantExt::LgmImpliedYtsFwdFwdCorrected`."
);

corrected_curve!(
    LgmImpliedYtsSpotCorrected,
    "Model curve corrected so that spot discount factors match the target \
     curve.",
    "Corresponds to `QuantExt::LgmImpliedYtsSpotCorrected`."
);

impl LgmImpliedYtsFwdFwdCorrected {
    /// `P(t) · T(τ+t)/T(τ) · P_m(τ)/P_m(τ+t)` for target `T` and model
    /// curve `P_m`.
    pub fn try_discount(&self, t: Time) -> Result<DiscountFactor> {
        let tau = self.implied.relative_time()?;
        let model = self.implied.try_discount(t)?;
        let target = self.target.discount(tau + t) / self.target.discount(tau);
        let native =
            self.implied.model_curve_discount(tau)? / self.implied.model_curve_discount(tau + t)?;
        Ok(model * target * native)
    }
}

impl LgmImpliedYtsSpotCorrected {
    /// `P(t) · T(t)/P_m(t)` for target `T` and model curve `P_m`.
    pub fn try_discount(&self, t: Time) -> Result<DiscountFactor> {
        let model = self.implied.try_discount(t)?;
        Ok(model * self.target.discount(t) / self.implied.model_curve_discount(t)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ql_currencies::currencies::EUR;
    use ql_models::{CrossAssetModel, IrLgm1fConstantParametrization, ModelFactor};
    use ql_termstructures::FlatForward;
    use ql_time::Actual365Fixed;

    fn today() -> Date {
        Date::from_ymd(2016, 1, 4).unwrap()
    }

    fn model() -> SharedCrossAssetModel {
        let curve: Arc<dyn YieldTermStructure> =
            Arc::new(FlatForward::new(today(), 0.02, Actual365Fixed));
        let ir = IrLgm1fConstantParametrization::new(EUR, curve, 0.01, 0.02).unwrap();
        Arc::new(RwLock::new(
            CrossAssetModel::new(vec![ModelFactor::Ir(Box::new(ir))], None).unwrap(),
        ))
    }

    #[test]
    fn reproduces_model_curve_at_origin() {
        let yts = LgmImpliedYieldTermStructure::new(model(), 0, Actual365Fixed, false).unwrap();
        assert_eq!(yts.reference_date(), today());
        assert_abs_diff_eq!(yts.discount(0.0), 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(yts.discount(5.0), (-0.1f64).exp(), epsilon = 1e-14);
    }

    #[test]
    fn moves_follow_the_time_base() {
        let dated = LgmImpliedYieldTermStructure::new(model(), 0, Actual365Fixed, false).unwrap();
        let timed = LgmImpliedYieldTermStructure::new(model(), 0, Actual365Fixed, true).unwrap();
        assert!(dated.move_to_time(1.0, 0.0).is_err());
        assert!(timed.move_to_date(today() + 365, 0.0).is_err());
        assert!(timed.move_to_time(-1.0, 0.0).is_err());

        dated.move_to_date(today() + 365, 0.01).unwrap();
        timed.move_to_time(1.0, 0.01).unwrap();
        assert_abs_diff_eq!(dated.relative_time().unwrap(), 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(dated.discount(3.0), timed.discount(3.0), epsilon = 1e-15);
        assert!(dated.try_discount(-0.5).is_err());
    }

    #[test]
    fn date_before_model_reference_fails() {
        let yts = LgmImpliedYieldTermStructure::new(model(), 0, Actual365Fixed, false).unwrap();
        yts.move_to_date(today() - 10, 0.0).unwrap();
        assert!(yts.try_discount(1.0).is_err());
        assert!(yts.discount(1.0).is_nan());
    }

    #[test]
    fn corrections_reproduce_target_at_zero_state() {
        let yts = LgmImpliedYieldTermStructure::new(model(), 0, Actual365Fixed, true).unwrap();
        let target: Arc<dyn YieldTermStructure> =
            Arc::new(FlatForward::new(today(), 0.035, Actual365Fixed));
        let spot = LgmImpliedYtsSpotCorrected::new(yts.clone(), target.clone());
        let fwd = LgmImpliedYtsFwdFwdCorrected::new(yts.clone(), target);
        assert_abs_diff_eq!(spot.discount(4.0), (-0.14f64).exp(), epsilon = 1e-14);

        // the correction swaps the model forward for the target forward
        yts.move_to_time(2.0, 0.0).unwrap();
        let ratio = fwd.discount(3.0) / yts.discount(3.0);
        assert_abs_diff_eq!(ratio, (-0.015f64 * 3.0).exp(), epsilon = 1e-14);
    }
}
