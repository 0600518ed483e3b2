//! Cross-asset model (translates `crossassetmodel.hpp`).
//!
//! Joins one LGM model per currency, one Black–Scholes FX factor per
//! foreign currency and Black–Scholes equity factors under the domestic
//! (first currency) LGM measure.  Factors are grouped in the fixed order
//! IR, FX, INF, CR, EQ; the same order lays out the correlation matrix, the
//! state vector and the calibration arguments.
//!
//! ```text
//! factors      IR_0 … IR_{n-1} | FX_0 … FX_{n-2} | EQ_0 … EQ_{m-1}
//! arguments    (α, κ) per IR   | σ per FX        | σ per EQ
//! ```

pub mod analytics;
pub mod gaussian1d;
pub mod state_process;

use crate::calibrated_model::{CalibrationOutcome, LinkableCalibratedModel};
use crate::calibration_helper::CalibrationHelper;
use crate::lgm::LinearGaussMarkovModel;
use crate::parameter::Parameter;
use crate::parametrization::{EqBsParametrization, FxBsParametrization, IrLgm1fParametrization};
use ql_core::{
    ensure, ensure_post,
    errors::{Error, Result},
    Observable, ObservableImpl, Observer, Real, Time,
};
use ql_currencies::Currency;
use ql_instruments::OptionType;
use ql_math::matrix_utilities::min_symmetric_eigenvalue;
use ql_math::optimization::{Constraint, EndCriteria, OptimizationMethod};
use ql_math::{close_enough, Integrator, Matrix, PiecewiseIntegral, SimpsonIntegral};
use ql_termstructures::YieldTermStructure;
use std::sync::{Arc, RwLock, Weak};
use tracing::debug;

pub use gaussian1d::Gaussian1dCrossAssetAdaptor;
pub use state_process::{CrossAssetStateProcess, ExactStep};

/// A cross-asset model shared between its dependents.
pub type SharedCrossAssetModel = Arc<RwLock<CrossAssetModel>>;

/// Asset class of a model factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetType {
    /// Interest rates.
    Ir,
    /// Foreign exchange.
    Fx,
    /// Inflation.
    Inf,
    /// Credit.
    Cr,
    /// Equity.
    Eq,
}

impl AssetType {
    /// All asset types in layout order.
    pub const ALL: [AssetType; 5] = [Self::Ir, Self::Fx, Self::Inf, Self::Cr, Self::Eq];

    fn rank(self) -> usize {
        match self {
            Self::Ir => 0,
            Self::Fx => 1,
            Self::Inf => 2,
            Self::Cr => 3,
            Self::Eq => 4,
        }
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Ir => "IR",
            Self::Fx => "FX",
            Self::Inf => "INF",
            Self::Cr => "CR",
            Self::Eq => "EQ",
        })
    }
}

/// One factor handed to [`CrossAssetModel::new`].
#[derive(Debug)]
pub enum ModelFactor {
    /// An interest rate factor.
    Ir(Box<dyn IrLgm1fParametrization>),
    /// An FX factor for the foreign currency of the parametrization.
    Fx(Box<dyn FxBsParametrization>),
    /// An inflation factor for the given currency; not yet supported.
    Inf(Currency),
    /// An equity factor.
    Eq(Box<dyn EqBsParametrization>),
}

impl ModelFactor {
    /// Asset type of the factor.
    pub fn asset_type(&self) -> AssetType {
        match self {
            Self::Ir(_) => AssetType::Ir,
            Self::Fx(_) => AssetType::Fx,
            Self::Inf(_) => AssetType::Inf,
            Self::Eq(_) => AssetType::Eq,
        }
    }
}

/// Accuracy of the default inner Simpson integrator.
pub const DEFAULT_INTEGRATOR_ACCURACY: Real = 1.0e-8;
/// Maximum refinements of the default inner Simpson integrator.
pub const DEFAULT_INTEGRATOR_ITERATIONS: usize = 100;
/// Tolerance for negative eigenvalues of the correlation matrix.
const EIGENVALUE_TOLERANCE: Real = -1.0e-12;

/// The cross-asset model.
///
/// Corresponds to `QuantExt::CrossAssetModel`.
#[derive(Debug)]
pub struct CrossAssetModel {
    lgm: Vec<LinearGaussMarkovModel>,
    fx: Vec<Box<dyn FxBsParametrization>>,
    eq: Vec<Box<dyn EqBsParametrization>>,
    correlation: Matrix,
    integrator: Arc<dyn Integrator>,
    observable: ObservableImpl,
}

impl CrossAssetModel {
    /// Build a model from factors in the order IR, FX, INF, CR, EQ and a
    /// correlation matrix over all factors (`None` for independence).
    pub fn new(factors: Vec<ModelFactor>, correlation: Option<Matrix>) -> Result<Self> {
        let mut lgm = Vec::new();
        let mut fx = Vec::new();
        let mut eq = Vec::new();
        let mut last = AssetType::Ir;
        for factor in factors {
            let t = factor.asset_type();
            ensure!(
                t.rank() >= last.rank(),
                "factors must be given in the order IR, FX, INF, CR, EQ; got {t} after {last}"
            );
            last = t;
            match factor {
                ModelFactor::Ir(p) => lgm.push(LinearGaussMarkovModel::new(p)),
                ModelFactor::Fx(p) => fx.push(p),
                ModelFactor::Eq(p) => eq.push(p),
                ModelFactor::Inf(ccy) => {
                    return Err(Error::NotImplemented(format!("inflation factor ({ccy})")))
                }
            }
        }

        let n_ir = lgm.len();
        ensure!(n_ir > 0, "at least one interest rate factor required");
        ensure!(
            fx.len() + 1 == n_ir,
            "there must be exactly one FX factor per foreign currency: {n_ir} IR factors, {} FX factors",
            fx.len()
        );
        for i in 0..n_ir {
            for j in 0..i {
                ensure!(
                    lgm[i].parametrization().currency() != lgm[j].parametrization().currency(),
                    "IR currencies must be unique, {} is given twice",
                    lgm[i].parametrization().currency()
                );
            }
        }
        for (j, f) in fx.iter().enumerate() {
            let ir_ccy = lgm[j + 1].parametrization().currency();
            ensure!(
                f.currency() == ir_ccy,
                "FX factor {j} has currency {} but IR factor {} has currency {ir_ccy}",
                f.currency(),
                j + 1
            );
        }
        for (k, e) in eq.iter().enumerate() {
            ensure!(
                lgm.iter().any(|m| m.parametrization().currency() == e.currency()),
                "equity {} has currency {} which is not an IR currency",
                e.eq_name(),
                e.currency()
            );
            ensure!(
                eq[..k].iter().all(|o| o.eq_name() != e.eq_name()),
                "equity names must be unique, {} is given twice",
                e.eq_name()
            );
        }

        let n = n_ir + fx.len() + eq.len();
        let correlation = match correlation {
            Some(c) => c,
            None => Matrix::identity(n),
        };

        let mut model = Self {
            lgm,
            fx,
            eq,
            correlation,
            integrator: Arc::new(SimpsonIntegral::new(
                DEFAULT_INTEGRATOR_ACCURACY,
                DEFAULT_INTEGRATOR_ITERATIONS,
            )),
            observable: ObservableImpl::new(),
        };
        model.check_correlation_matrix()?;
        model.check_layout()?;
        model.integrator = model.piecewise(Arc::new(SimpsonIntegral::new(
            DEFAULT_INTEGRATOR_ACCURACY,
            DEFAULT_INTEGRATOR_ITERATIONS,
        )))?;
        debug!(
            ir = model.lgm.len(),
            fx = model.fx.len(),
            eq = model.eq.len(),
            parameters = model.total_number_of_parameters(),
            "cross asset model built"
        );
        Ok(model)
    }

    /// Replace the integrator used by the analytics; with `piecewise` set it
    /// is applied between the parameter breakpoints.
    pub fn with_integrator(mut self, integrator: Arc<dyn Integrator>, piecewise: bool) -> Result<Self> {
        self.integrator = if piecewise {
            self.piecewise(integrator)?
        } else {
            integrator
        };
        Ok(self)
    }

    fn piecewise(&self, inner: Arc<dyn Integrator>) -> Result<Arc<dyn Integrator>> {
        let mut times = Vec::new();
        for i in 0..self.number_of_arguments() {
            let (t, c, p) = self.argument_location(i)?;
            times.extend_from_slice(self.factor_parameter_times(t, c, p)?);
        }
        Ok(Arc::new(PiecewiseIntegral::new(inner, &times, true)?))
    }

    fn check_layout(&self) -> Result<()> {
        let mut seen = vec![false; self.dimension()];
        for t in AssetType::ALL {
            for i in 0..self.components(t) {
                let k = self.c_idx(t, i, 0)?;
                ensure_post!(!seen[k], "correlation index {k} assigned twice");
                seen[k] = true;
            }
        }
        ensure_post!(seen.iter().all(|s| *s), "correlation layout has gaps");
        Ok(())
    }

    // ── Layout ───────────────────────────────────────────────────────────────

    /// Number of factors of type `t`.
    pub fn components(&self, t: AssetType) -> usize {
        match t {
            AssetType::Ir => self.lgm.len(),
            AssetType::Fx => self.fx.len(),
            AssetType::Eq => self.eq.len(),
            AssetType::Inf | AssetType::Cr => 0,
        }
    }

    fn components_before(&self, t: AssetType) -> usize {
        AssetType::ALL
            .iter()
            .take_while(|s| **s != t)
            .map(|s| self.components(*s))
            .sum()
    }

    fn check_component(&self, t: AssetType, i: usize) -> Result<()> {
        let n = self.components(t);
        if i < n {
            Ok(())
        } else {
            Err(Error::IndexOutOfRange { index: i, size: n })
        }
    }

    /// Brownian motions driving factor `i` of type `t`.
    pub fn brownians(&self, t: AssetType, i: usize) -> Result<usize> {
        self.check_component(t, i)?;
        Ok(1)
    }

    /// State variables of factor `i` of type `t`.
    pub fn state_variables(&self, t: AssetType, i: usize) -> Result<usize> {
        self.check_component(t, i)?;
        Ok(1)
    }

    /// Calibration arguments of factor `i` of type `t`.
    pub fn arguments(&self, t: AssetType, i: usize) -> Result<usize> {
        self.check_component(t, i)?;
        Ok(if t == AssetType::Ir { 2 } else { 1 })
    }

    /// Number of Brownian motions (and state variables).
    pub fn dimension(&self) -> usize {
        self.lgm.len() + self.fx.len() + self.eq.len()
    }

    /// Position of factor `i` of type `t` in the factor list.
    pub fn idx(&self, t: AssetType, i: usize) -> Result<usize> {
        self.check_component(t, i)?;
        Ok(self.components_before(t) + i)
    }

    /// Row of Brownian `offset` of factor `i` of type `t` in the
    /// correlation matrix.
    pub fn c_idx(&self, t: AssetType, i: usize, offset: usize) -> Result<usize> {
        let n = self.brownians(t, i)?;
        ensure!(offset < n, "c_idx({t}, {i}, {offset}): offset out of range [0, {n})");
        Ok(self.components_before(t) + i + offset)
    }

    /// Position of state variable `offset` of factor `i` of type `t`.
    pub fn p_idx(&self, t: AssetType, i: usize, offset: usize) -> Result<usize> {
        let n = self.state_variables(t, i)?;
        ensure!(offset < n, "p_idx({t}, {i}, {offset}): offset out of range [0, {n})");
        Ok(self.components_before(t) + i + offset)
    }

    /// Position of argument `offset` of factor `i` of type `t`.
    pub fn a_idx(&self, t: AssetType, i: usize, offset: usize) -> Result<usize> {
        let n = self.arguments(t, i)?;
        ensure!(offset < n, "a_idx({t}, {i}, {offset}): offset out of range [0, {n})");
        let before: usize = AssetType::ALL
            .iter()
            .take_while(|s| **s != t)
            .map(|s| self.components(*s) * if *s == AssetType::Ir { 2 } else { 1 })
            .sum();
        Ok(before + n * i + offset)
    }

    fn argument_location(&self, k: usize) -> Result<(AssetType, usize, usize)> {
        let mut start = 0;
        for t in AssetType::ALL {
            let per = if t == AssetType::Ir { 2 } else { 1 };
            let len = self.components(t) * per;
            if k < start + len {
                return Ok((t, (k - start) / per, (k - start) % per));
            }
            start += len;
        }
        Err(Error::IndexOutOfRange { index: k, size: start })
    }

    // ── Components ───────────────────────────────────────────────────────────

    /// Index of the IR factor in currency `ccy`.
    pub fn ccy_index(&self, ccy: &Currency) -> Result<usize> {
        self.lgm
            .iter()
            .position(|m| m.parametrization().currency() == ccy)
            .ok_or_else(|| Error::InvalidArgument(format!("currency {ccy} not present in model")))
    }

    /// Index of the equity named `name`.
    pub fn eq_index(&self, name: &str) -> Result<usize> {
        self.eq
            .iter()
            .position(|e| e.eq_name() == name)
            .ok_or_else(|| Error::InvalidArgument(format!("equity {name} not present in model")))
    }

    /// LGM model of currency `i`.
    pub fn lgm(&self, i: usize) -> Result<&LinearGaussMarkovModel> {
        self.check_component(AssetType::Ir, i)?;
        Ok(&self.lgm[i])
    }

    /// IR parametrization of currency `i`.
    pub fn irlgm1f(&self, i: usize) -> Result<&dyn IrLgm1fParametrization> {
        Ok(self.lgm(i)?.parametrization())
    }

    /// FX parametrization `i` (currency `i + 1` against the domestic one).
    pub fn fxbs(&self, i: usize) -> Result<&dyn FxBsParametrization> {
        self.check_component(AssetType::Fx, i)?;
        Ok(&*self.fx[i])
    }

    /// Equity parametrization `i`.
    pub fn eqbs(&self, i: usize) -> Result<&dyn EqBsParametrization> {
        self.check_component(AssetType::Eq, i)?;
        Ok(&*self.eq[i])
    }

    /// Mutable IR parametrization; call [`update`](Self::update) afterwards.
    pub fn irlgm1f_mut(&mut self, i: usize) -> Result<&mut dyn IrLgm1fParametrization> {
        self.check_component(AssetType::Ir, i)?;
        Ok(self.lgm[i].parametrization_mut())
    }

    /// Mutable FX parametrization; call [`update`](Self::update) afterwards.
    pub fn fxbs_mut(&mut self, i: usize) -> Result<&mut dyn FxBsParametrization> {
        self.check_component(AssetType::Fx, i)?;
        Ok(&mut *self.fx[i])
    }

    /// Mutable equity parametrization; call [`update`](Self::update)
    /// afterwards.
    pub fn eqbs_mut(&mut self, i: usize) -> Result<&mut dyn EqBsParametrization> {
        self.check_component(AssetType::Eq, i)?;
        Ok(&mut *self.eq[i])
    }

    fn factor_parameter(&self, t: AssetType, i: usize, p: usize) -> Result<&Parameter> {
        self.check_component(t, i)?;
        match t {
            AssetType::Ir => self.lgm[i].parametrization().parameter(p),
            AssetType::Fx => self.fx[i].parameter(p),
            AssetType::Eq => self.eq[i].parameter(p),
            AssetType::Inf | AssetType::Cr => {
                Err(Error::NotImplemented(format!("{t} parametrizations")))
            }
        }
    }

    fn factor_parameter_mut(&mut self, t: AssetType, i: usize, p: usize) -> Result<&mut Parameter> {
        self.check_component(t, i)?;
        match t {
            AssetType::Ir => self.lgm[i].parametrization_mut().parameter_mut(p),
            AssetType::Fx => self.fx[i].parameter_mut(p),
            AssetType::Eq => self.eq[i].parameter_mut(p),
            AssetType::Inf | AssetType::Cr => {
                Err(Error::NotImplemented(format!("{t} parametrizations")))
            }
        }
    }

    fn factor_parameter_times(&self, t: AssetType, i: usize, p: usize) -> Result<&[Time]> {
        self.check_component(t, i)?;
        Ok(match t {
            AssetType::Ir => self.lgm[i].parametrization().parameter_times(p),
            AssetType::Fx => self.fx[i].parameter_times(p),
            AssetType::Eq => self.eq[i].parameter_times(p),
            AssetType::Inf | AssetType::Cr => &[],
        })
    }

    // Unchecked accessors for the analytics, which validate indices up front.

    pub(crate) fn ir_at(&self, i: usize) -> &dyn IrLgm1fParametrization {
        self.lgm[i].parametrization()
    }

    pub(crate) fn fx_at(&self, i: usize) -> &dyn FxBsParametrization {
        &*self.fx[i]
    }

    pub(crate) fn eq_at(&self, i: usize) -> &dyn EqBsParametrization {
        &*self.eq[i]
    }

    pub(crate) fn rho(&self, a: usize, b: usize) -> Real {
        self.correlation[(a, b)]
    }

    // ── Correlation ──────────────────────────────────────────────────────────

    /// The full correlation matrix.
    pub fn correlation(&self) -> &Matrix {
        &self.correlation
    }

    /// Correlation between factor `i` of type `s` and factor `j` of type
    /// `t`.
    pub fn correlation_of(&self, s: AssetType, i: usize, t: AssetType, j: usize) -> Result<Real> {
        Ok(self.correlation[(self.c_idx(s, i, 0)?, self.c_idx(t, j, 0)?)])
    }

    /// Set the correlation between two factors (both matrix entries).
    ///
    /// Only entry-wise checks are done; call
    /// [`check_correlation_matrix`](Self::check_correlation_matrix) once all
    /// entries are set.
    pub fn set_correlation(
        &mut self,
        s: AssetType,
        i: usize,
        t: AssetType,
        j: usize,
        value: Real,
    ) -> Result<()> {
        let (a, b) = (self.c_idx(s, i, 0)?, self.c_idx(t, j, 0)?);
        ensure!(
            (-1.0..=1.0).contains(&value),
            "correlation ({value}) must be in [-1, 1]"
        );
        ensure!(
            a != b || close_enough(value, 1.0),
            "correlation of {s} {i} with itself must be 1, got {value}"
        );
        self.correlation[(a, b)] = value;
        self.correlation[(b, a)] = value;
        self.notify_observers();
        Ok(())
    }

    /// Validate the correlation matrix: square of the model dimension,
    /// symmetric, unit diagonal, entries in `[-1, 1]` and positive
    /// semidefinite.
    pub fn check_correlation_matrix(&self) -> Result<()> {
        let c = &self.correlation;
        let n = self.dimension();
        ensure!(
            c.rows() == n && c.cols() == n,
            "correlation matrix is {}x{} but model dimension is {n}",
            c.rows(),
            c.cols()
        );
        for i in 0..n {
            ensure!(
                close_enough(c[(i, i)], 1.0),
                "correlation matrix has non unit diagonal element at ({i}, {i}): {}",
                c[(i, i)]
            );
            for j in 0..i {
                ensure!(
                    close_enough(c[(i, j)], c[(j, i)]),
                    "correlation matrix is not symmetric at ({i}, {j}): {} vs {}",
                    c[(i, j)],
                    c[(j, i)]
                );
                ensure!(
                    (-1.0..=1.0).contains(&c[(i, j)]),
                    "correlation matrix has out of range value at ({i}, {j}): {}",
                    c[(i, j)]
                );
            }
        }
        let min = min_symmetric_eigenvalue(c)?;
        ensure!(
            min >= EIGENVALUE_TOLERANCE,
            "correlation matrix is not positive semidefinite, smallest eigenvalue is {min}"
        );
        Ok(())
    }

    // ── IR formulas ──────────────────────────────────────────────────────────

    /// LGM numeraire of currency `ccy`.
    pub fn numeraire(
        &self,
        ccy: usize,
        t: Time,
        x: Real,
        curve: Option<&dyn YieldTermStructure>,
    ) -> Result<Real> {
        self.lgm(ccy)?.numeraire(t, x, curve)
    }

    /// Zero bond of currency `ccy`.
    pub fn discount_bond(
        &self,
        ccy: usize,
        t: Time,
        maturity: Time,
        x: Real,
        curve: Option<&dyn YieldTermStructure>,
    ) -> Result<Real> {
        self.lgm(ccy)?.discount_bond(t, maturity, x, curve)
    }

    /// Zero bond over numeraire of currency `ccy`.
    pub fn reduced_discount_bond(
        &self,
        ccy: usize,
        t: Time,
        maturity: Time,
        x: Real,
        curve: Option<&dyn YieldTermStructure>,
    ) -> Result<Real> {
        self.lgm(ccy)?.reduced_discount_bond(t, maturity, x, curve)
    }

    /// Zero bond option of currency `ccy`.
    #[allow(clippy::too_many_arguments)]
    pub fn discount_bond_option(
        &self,
        ccy: usize,
        option_type: OptionType,
        strike: Real,
        t: Time,
        expiry: Time,
        maturity: Time,
        curve: Option<&dyn YieldTermStructure>,
    ) -> Result<Real> {
        self.lgm(ccy)?
            .discount_bond_option(option_type, strike, t, expiry, maturity, curve)
    }

    // ── Numerics ─────────────────────────────────────────────────────────────

    /// The integrator used by the analytics.
    pub fn integrator(&self) -> &Arc<dyn Integrator> {
        &self.integrator
    }

    /// `∫_a^b f` with the model's integrator.
    pub fn integrate(&self, f: &dyn Fn(Time) -> Real, a: Time, b: Time) -> Result<Real> {
        self.integrator.integrate(f, a, b)
    }

    /// The joint state process.
    pub fn state_process(&self) -> CrossAssetStateProcess<'_> {
        CrossAssetStateProcess::new(self)
    }

    /// Total number of raw parameter values.
    pub fn total_number_of_parameters(&self) -> usize {
        (0..self.number_of_arguments())
            .filter_map(|i| self.argument(i).ok())
            .map(Parameter::size)
            .sum()
    }

    /// Refresh all parametrizations and notify observers.
    pub fn update(&mut self) {
        self.generate_arguments();
        self.notify_observers();
    }

    // ── Calibration ──────────────────────────────────────────────────────────

    /// Fix mask freeing argument `param` of factor `i` of type `t`, either
    /// one bucket or (with `None`) all of them.
    pub fn move_parameter(
        &self,
        t: AssetType,
        param: usize,
        i: usize,
        bucket: Option<usize>,
    ) -> Result<Vec<bool>> {
        let arg = self.a_idx(t, i, param)?;
        let mut offset = 0;
        for k in 0..arg {
            offset += self.argument(k)?.size();
        }
        let size = self.argument(arg)?.size();
        let mut fix = vec![true; self.total_number_of_parameters()];
        match bucket {
            Some(b) => {
                ensure!(b < size, "bucket ({b}) out of range [0, {size}) for {t} {i}");
                fix[offset + b] = false;
            }
            None => fix[offset..offset + size].iter_mut().for_each(|f| *f = false),
        }
        Ok(fix)
    }

    /// Bootstrap the volatilities of IR factor `ccy`, one helper per bucket.
    pub fn calibrate_ir_lgm1f_volatilities_iterative(
        &mut self,
        ccy: usize,
        helpers: &[Arc<dyn CalibrationHelper<LinearGaussMarkovModel>>],
        method: &dyn OptimizationMethod,
        end_criteria: &EndCriteria,
        constraint: Option<Arc<dyn Constraint>>,
        weights: &[Real],
    ) -> Result<Vec<CalibrationOutcome>> {
        self.check_component(AssetType::Ir, ccy)?;
        let outcome = self.lgm[ccy].calibrate_volatilities_iterative(
            helpers,
            method,
            end_criteria,
            constraint,
            weights,
        );
        self.update();
        outcome
    }

    /// Bootstrap the reversions of IR factor `ccy`, one helper per bucket.
    pub fn calibrate_ir_lgm1f_reversions_iterative(
        &mut self,
        ccy: usize,
        helpers: &[Arc<dyn CalibrationHelper<LinearGaussMarkovModel>>],
        method: &dyn OptimizationMethod,
        end_criteria: &EndCriteria,
        constraint: Option<Arc<dyn Constraint>>,
        weights: &[Real],
    ) -> Result<Vec<CalibrationOutcome>> {
        self.check_component(AssetType::Ir, ccy)?;
        let outcome = self.lgm[ccy].calibrate_reversions_iterative(
            helpers,
            method,
            end_criteria,
            constraint,
            weights,
        );
        self.update();
        outcome
    }

    /// Calibrate IR factor `ccy` globally; `fix_parameters` is a mask over
    /// its raw values.
    #[allow(clippy::too_many_arguments)]
    pub fn calibrate_ir_lgm1f_global(
        &mut self,
        ccy: usize,
        helpers: &[Arc<dyn CalibrationHelper<LinearGaussMarkovModel>>],
        method: &dyn OptimizationMethod,
        end_criteria: &EndCriteria,
        constraint: Option<Arc<dyn Constraint>>,
        weights: &[Real],
        fix_parameters: &[bool],
    ) -> Result<CalibrationOutcome> {
        self.check_component(AssetType::Ir, ccy)?;
        let outcome = self.lgm[ccy].calibrate(
            helpers,
            method,
            end_criteria,
            constraint,
            weights,
            fix_parameters,
        );
        self.update();
        outcome
    }

    /// Bootstrap the volatility buckets of FX or EQ factor `i`, helper `k`
    /// fixing bucket `k`.
    #[allow(clippy::too_many_arguments)]
    pub fn calibrate_bs_volatilities_iterative(
        &mut self,
        t: AssetType,
        i: usize,
        helpers: &[Arc<dyn CalibrationHelper<CrossAssetModel>>],
        method: &dyn OptimizationMethod,
        end_criteria: &EndCriteria,
        constraint: Option<Arc<dyn Constraint>>,
        weights: &[Real],
    ) -> Result<Vec<CalibrationOutcome>> {
        ensure!(
            matches!(t, AssetType::Fx | AssetType::Eq),
            "Black-Scholes calibration requires an FX or EQ factor, got {t}"
        );
        ensure!(
            weights.is_empty() || weights.len() == helpers.len(),
            "mismatch between number of helpers ({}) and weights ({})",
            helpers.len(),
            weights.len()
        );
        let mut outcomes = Vec::with_capacity(helpers.len());
        for k in 0..helpers.len() {
            let fix = self.move_parameter(t, 0, i, Some(k))?;
            let w = if weights.is_empty() { &[][..] } else { &weights[k..=k] };
            outcomes.push(self.calibrate(
                &helpers[k..=k],
                method,
                end_criteria,
                constraint.clone(),
                w,
                &fix,
            )?);
        }
        Ok(outcomes)
    }

    /// Calibrate all volatility buckets of FX or EQ factor `i` at once.
    #[allow(clippy::too_many_arguments)]
    pub fn calibrate_bs_volatilities_global(
        &mut self,
        t: AssetType,
        i: usize,
        helpers: &[Arc<dyn CalibrationHelper<CrossAssetModel>>],
        method: &dyn OptimizationMethod,
        end_criteria: &EndCriteria,
        constraint: Option<Arc<dyn Constraint>>,
        weights: &[Real],
    ) -> Result<CalibrationOutcome> {
        ensure!(
            matches!(t, AssetType::Fx | AssetType::Eq),
            "Black-Scholes calibration requires an FX or EQ factor, got {t}"
        );
        let fix = self.move_parameter(t, 0, i, None)?;
        self.calibrate(helpers, method, end_criteria, constraint, weights, &fix)
    }
}

impl Observable for CrossAssetModel {
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

impl LinkableCalibratedModel for CrossAssetModel {
    fn number_of_arguments(&self) -> usize {
        2 * self.lgm.len() + self.fx.len() + self.eq.len()
    }

    fn argument(&self, i: usize) -> Result<&Parameter> {
        let (t, c, p) = self.argument_location(i)?;
        self.factor_parameter(t, c, p)
    }

    fn argument_mut(&mut self, i: usize) -> Result<&mut Parameter> {
        let (t, c, p) = self.argument_location(i)?;
        self.factor_parameter_mut(t, c, p)
    }

    fn generate_arguments(&mut self) {
        for m in &mut self.lgm {
            m.parametrization_mut().update();
        }
        for p in &mut self.fx {
            p.update();
        }
        for p in &mut self.eq {
            p.update();
        }
    }
}
