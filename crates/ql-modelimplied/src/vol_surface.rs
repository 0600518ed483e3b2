//! Black volatility surfaces implied by the FX and equity components of a
//! cross-asset model (translates
//! `crossassetmodelimpliedfxvoltermstructure.hpp` and
//! `crossassetmodelimpliedeqvoltermstructure.hpp`).
//!
//! At relative time `τ` and a given model state the surface prices a
//! European option expiring at `τ + t` with the analytic engine, using the
//! forward and discount factor the model implies for that state, and
//! inverts the Black formula to recover the variance.
//!
//! Inversion failures are reported by the `try_black_variance` methods. The
//! [`BlackVolTermStructure`] implementations log a warning and return zero
//! variance instead.

use crate::reference::ModelReference;
use ql_core::{
    ensure, errors::Result, fail, LazyObject, Observable, ObservableImpl, Observer, Real, Time,
};
use ql_instruments::{OptionType, PlainVanillaPayoff};
use ql_models::{AssetType, CrossAssetModel, Parametrization, SharedCrossAssetModel};
use ql_pricingengines::{black_formula_implied_std_dev, eq_option_value, fx_option_value};
use ql_termstructures::{
    BlackVolTermStructure, TermStructure, VolatilityTermStructure, YieldTermStructure,
};
use ql_time::{Date, DayCounter};
use std::sync::{Arc, PoisonError, RwLock, Weak};
use tracing::warn;

const IMPLIED_STD_DEV_ACCURACY: Real = 1.0e-10;
const IMPLIED_STD_DEV_MAX_EVALUATIONS: usize = 100;

/// Forward, discount factor and premium of the option priced at one
/// surface point.
struct PricedOption {
    payoff: PlainVanillaPayoff,
    forward: Real,
    discount: Real,
    premium: Real,
}

// Strikes that are zero or not finite mean at-the-money forward. Strikes at
// or above the forward are priced as calls, below as puts.
fn payoff_for(strike: Real, forward: Real) -> PlainVanillaPayoff {
    let strike = if strike.is_finite() && strike > 0.0 {
        strike
    } else {
        forward
    };
    let option_type = if strike >= forward {
        OptionType::Call
    } else {
        OptionType::Put
    };
    PlainVanillaPayoff::new(option_type, strike)
}

fn implied_variance(option: &PricedOption) -> Result<Real> {
    let sd = black_formula_implied_std_dev(
        option.payoff.option_type,
        option.payoff.strike,
        option.forward,
        option.premium,
        option.discount,
        None,
        IMPLIED_STD_DEV_ACCURACY,
        IMPLIED_STD_DEV_MAX_EVALUATIONS,
    )?;
    Ok(sd * sd)
}

fn log_spot(value: Option<Real>, what: &str) -> Result<Real> {
    match value {
        Some(v) if v > 0.0 => Ok(v.ln()),
        Some(v) => fail!("{what} spot ({v}) must be positive"),
        None => fail!("{what} spot quote has no value"),
    }
}

macro_rules! implied_vol_surface_common {
    ($name:ident, $state:ty, $what:literal) => {
        impl $name {
            /// The model.
            pub fn model(&self) -> &SharedCrossAssetModel {
                self.reference.model()
            }

            /// `true` if the surface is moved by time rather than by date.
            pub fn purely_time_based(&self) -> bool {
                self.reference.purely_time_based()
            }

            /// Relative time of the reference date on the model's time axis.
            pub fn relative_time(&self) -> Result<Time> {
                self.reference.relative_time()
            }

            /// Current model state.
            pub fn state(&self) -> $state {
                *self.state.read().unwrap_or_else(PoisonError::into_inner)
            }

            /// Set the model state, keeping the reference.
            pub fn set_state(&self, state: $state) {
                *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
                self.observable.notify();
            }

            /// Move the reference date and set the model state.
            pub fn move_to_date(&self, date: Date, state: $state) -> Result<()> {
                self.reference.move_to_date(date)?;
                self.set_state(state);
                Ok(())
            }

            /// Move the relative time and set the model state; purely time
            /// based surfaces only.
            pub fn move_to_time(&self, t: Time, state: $state) -> Result<()> {
                self.reference.move_to_time(t)?;
                self.set_state(state);
                Ok(())
            }

            /// Black variance for an option expiring `t` after the
            /// reference; zero for `t <= 0`.
            pub fn try_black_variance(&self, t: Time, strike: Real) -> Result<Real> {
                if t <= 0.0 {
                    return Ok(0.0);
                }
                let tau = self.relative_time()?;
                let option = {
                    let m = self.reference.read_model();
                    self.price(&m, tau, t, strike)?
                };
                implied_variance(&option)
            }

            /// Black volatility for an option expiring `t` after the
            /// reference.
            pub fn try_black_vol(&self, t: Time, strike: Real) -> Result<Real> {
                if t <= 0.0 {
                    return Ok(0.0);
                }
                Ok((self.try_black_variance(t, strike)? / t).sqrt())
            }
        }

        impl TermStructure for $name {
            fn reference_date(&self) -> Date {
                self.reference.reference_date()
            }

            fn day_counter(&self) -> &dyn DayCounter {
                &*self.day_counter
            }
        }

        impl VolatilityTermStructure for $name {
            fn min_strike(&self) -> Real {
                0.0
            }

            fn max_strike(&self) -> Real {
                Real::MAX
            }
        }

        impl BlackVolTermStructure for $name {
            fn black_variance_impl(&self, t: Time, strike: Real) -> Real {
                self.try_black_variance(t, strike).unwrap_or_else(|e| {
                    warn!(
                        component = self.index,
                        t,
                        strike,
                        error = %e,
                        "implied {} variance unavailable, using zero",
                        $what
                    );
                    0.0
                })
            }

            fn black_vol_impl(&self, t: Time, strike: Real) -> Real {
                if t <= 0.0 {
                    return 0.0;
                }
                (self.black_variance_impl(t, strike) / t).sqrt()
            }
        }

        impl Observer for $name {
            fn update(&self) {
                self.reference.invalidate();
                self.observable.notify();
            }
        }

        impl Observable for $name {
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
    };
}

// ── FX ────────────────────────────────────────────────────────────────────────

/// State of the FX surface: domestic and foreign LGM states and the log
/// FX spot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FxVolState {
    /// Domestic LGM state.
    pub ir_domestic: Real,
    /// Foreign LGM state.
    pub ir_foreign: Real,
    /// Log FX spot.
    pub log_fx_spot: Real,
}

/// Black volatility surface of FX component `fx_index` implied by a
/// cross-asset model.
///
/// Corresponds to `QuantExt::CrossAssetModelImpliedFxVolTermStructure`.
#[derive(Debug)]
pub struct CrossAssetModelImpliedFxVolTermStructure {
    reference: ModelReference,
    index: usize,
    day_counter: Arc<dyn DayCounter>,
    state: RwLock<FxVolState>,
    observable: ObservableImpl,
}

impl CrossAssetModelImpliedFxVolTermStructure {
    /// Surface of FX component `fx_index`, at the model's reference date with
    /// zero rate states and today's FX spot.
    pub fn new(
        model: SharedCrossAssetModel,
        fx_index: usize,
        day_counter: impl DayCounter + 'static,
        purely_time_based: bool,
    ) -> Result<Arc<Self>> {
        let state = {
            let m = model.read().unwrap_or_else(PoisonError::into_inner);
            ensure!(
                fx_index < m.components(AssetType::Fx),
                "FX index ({fx_index}) out of range, model has {} FX components",
                m.components(AssetType::Fx)
            );
            FxVolState {
                ir_domestic: 0.0,
                ir_foreign: 0.0,
                log_fx_spot: log_spot(m.fxbs(fx_index)?.fx_spot_today().value(), "FX")?,
            }
        };
        let surface = Arc::new(Self {
            reference: ModelReference::new(model, 0, purely_time_based)?,
            index: fx_index,
            day_counter: Arc::new(day_counter),
            state: RwLock::new(state),
            observable: ObservableImpl::new(),
        });
        let observer: Weak<dyn Observer> = Arc::downgrade(&surface) as Weak<dyn Observer>;
        surface.reference.register(observer);
        Ok(surface)
    }

    /// FX component of the model.
    pub fn fx_index(&self) -> usize {
        self.index
    }

    fn price(&self, m: &CrossAssetModel, tau: Time, t: Time, strike: Real) -> Result<PricedOption> {
        let s = self.state();
        let domestic = m.discount_bond(0, tau, tau + t, s.ir_domestic, None)?;
        let foreign = m.discount_bond(self.index + 1, tau, tau + t, s.ir_foreign, None)?;
        let forward = s.log_fx_spot.exp() * foreign / domestic;
        let payoff = payoff_for(strike, forward);
        let premium = fx_option_value(m, self.index, tau, tau + t, &payoff, domestic, forward)?;
        Ok(PricedOption {
            payoff,
            forward,
            discount: domestic,
            premium,
        })
    }
}

implied_vol_surface_common!(CrossAssetModelImpliedFxVolTermStructure, FxVolState, "FX");

// ── EQ ────────────────────────────────────────────────────────────────────────

/// State of the equity surface: LGM state of the equity currency and the
/// log equity spot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EqVolState {
    /// LGM state of the equity currency.
    pub ir_state: Real,
    /// Log equity spot.
    pub log_eq_spot: Real,
}

/// Black volatility surface of equity component `eq_index` implied by a
/// cross-asset model.
///
/// Corresponds to `QuantExt::CrossAssetModelImpliedEqVolTermStructure`.
#[derive(Debug)]
pub struct CrossAssetModelImpliedEqVolTermStructure {
    reference: ModelReference,
    index: usize,
    eq_ccy: usize,
    day_counter: Arc<dyn DayCounter>,
    state: RwLock<EqVolState>,
    observable: ObservableImpl,
}

impl CrossAssetModelImpliedEqVolTermStructure {
    /// Surface of equity component `eq_index`, at the model's reference date
    /// with zero rate state and today's equity spot.
    pub fn new(
        model: SharedCrossAssetModel,
        eq_index: usize,
        day_counter: impl DayCounter + 'static,
        purely_time_based: bool,
    ) -> Result<Arc<Self>> {
        let (state, eq_ccy) = {
            let m = model.read().unwrap_or_else(PoisonError::into_inner);
            ensure!(
                eq_index < m.components(AssetType::Eq),
                "EQ index ({eq_index}) out of range, model has {} EQ components",
                m.components(AssetType::Eq)
            );
            let eq = m.eqbs(eq_index)?;
            let state = EqVolState {
                ir_state: 0.0,
                log_eq_spot: log_spot(eq.eq_spot_today().value(), "equity")?,
            };
            (state, m.ccy_index(eq.currency())?)
        };
        let surface = Arc::new(Self {
            reference: ModelReference::new(model, 0, purely_time_based)?,
            index: eq_index,
            eq_ccy,
            day_counter: Arc::new(day_counter),
            state: RwLock::new(state),
            observable: ObservableImpl::new(),
        });
        let observer: Weak<dyn Observer> = Arc::downgrade(&surface) as Weak<dyn Observer>;
        surface.reference.register(observer);
        Ok(surface)
    }

    /// Equity component of the model.
    pub fn eq_index(&self) -> usize {
        self.index
    }

    fn price(&self, m: &CrossAssetModel, tau: Time, t: Time, strike: Real) -> Result<PricedOption> {
        let s = self.state();
        let eq = m.eqbs(self.index)?;
        let discount = m.discount_bond(self.eq_ccy, tau, tau + t, s.ir_state, None)?;
        let div = eq.equity_div_yield_curve_today();
        let dividend = div.discount(tau + t) / div.discount(tau);
        let forward = s.log_eq_spot.exp() * dividend / discount;
        let payoff = payoff_for(strike, forward);
        let premium = eq_option_value(m, self.index, tau, tau + t, &payoff, discount, forward)?;
        Ok(PricedOption {
            payoff,
            forward,
            discount,
            premium,
        })
    }
}

implied_vol_surface_common!(CrossAssetModelImpliedEqVolTermStructure, EqVolState, "EQ");
