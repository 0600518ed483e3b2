//! Reference time bookkeeping shared by the model-implied term structures.
//!
//! A model-implied structure sits at a displaced point of the model's time
//! axis. Date based structures store a reference date and derive the
//! relative time from the day counter and reference date of a model curve;
//! purely time based structures store the relative time directly.

use ql_core::{ensure, errors::Result, LazyObject, LazyState, Observable, Observer, Time};
use ql_models::{CrossAssetModel, SharedCrossAssetModel};
use ql_termstructures::TermStructure;
use ql_time::Date;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, Weak};

#[derive(Debug, Clone, Copy)]
struct Position {
    reference_date: Date,
    relative_time: Time,
}

/// Where on the model's time axis a model-implied structure sits.
#[derive(Debug)]
pub(crate) struct ModelReference {
    model: SharedCrossAssetModel,
    curve_ccy: usize,
    purely_time_based: bool,
    position: RwLock<Position>,
    lazy: LazyState,
}

impl ModelReference {
    /// Reference at time zero of `model`, measured on the curve of IR
    /// component `curve_ccy`.
    pub(crate) fn new(
        model: SharedCrossAssetModel,
        curve_ccy: usize,
        purely_time_based: bool,
    ) -> Result<Self> {
        let reference_date = {
            let m = read(&model);
            m.irlgm1f(curve_ccy)?.term_structure().reference_date()
        };
        Ok(Self {
            model,
            curve_ccy,
            purely_time_based,
            position: RwLock::new(Position {
                reference_date,
                relative_time: 0.0,
            }),
            lazy: LazyState::new(),
        })
    }

    pub(crate) fn model(&self) -> &SharedCrossAssetModel {
        &self.model
    }

    pub(crate) fn read_model(&self) -> RwLockReadGuard<'_, CrossAssetModel> {
        read(&self.model)
    }

    pub(crate) fn purely_time_based(&self) -> bool {
        self.purely_time_based
    }

    /// Subscribe `observer` to changes of the model.
    pub(crate) fn register(&self, observer: Weak<dyn Observer>) {
        self.read_model().register_observer(observer);
    }

    /// Current reference date; for purely time based structures the model's
    /// own reference date.
    pub(crate) fn reference_date(&self) -> Date {
        self.position
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .reference_date
    }

    /// Relative time of the reference, recomputed if the model or the
    /// reference date changed.
    pub(crate) fn relative_time(&self) -> Result<Time> {
        self.calculate()?;
        Ok(self
            .position
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .relative_time)
    }

    pub(crate) fn move_to_date(&self, date: Date) -> Result<()> {
        ensure!(
            !self.purely_time_based,
            "move to a date is not allowed for a purely time based structure"
        );
        self.position
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .reference_date = date;
        self.invalidate();
        Ok(())
    }

    pub(crate) fn move_to_time(&self, t: Time) -> Result<()> {
        ensure!(
            self.purely_time_based,
            "move to a time is only allowed for a purely time based structure"
        );
        ensure!(t >= 0.0, "relative time ({t}) must be non-negative");
        self.position
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .relative_time = t;
        Ok(())
    }
}

impl LazyObject for ModelReference {
    fn perform_calculations(&self) -> Result<()> {
        if self.purely_time_based {
            return Ok(());
        }
        let relative_time = {
            let m = self.read_model();
            let curve = m.irlgm1f(self.curve_ccy)?.term_structure();
            curve.time_from_reference(self.reference_date())
        };
        ensure!(
            relative_time >= 0.0,
            "reference date {} lies before the model reference date",
            self.reference_date()
        );
        self.position
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .relative_time = relative_time;
        Ok(())
    }

    fn lazy_state(&self) -> &LazyState {
        &self.lazy
    }
}

fn read(model: &SharedCrossAssetModel) -> RwLockReadGuard<'_, CrossAssetModel> {
    model.read().unwrap_or_else(PoisonError::into_inner)
}
