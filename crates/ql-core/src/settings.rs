//! Global library settings (translates `ql/settings.hpp`).
//!
//! [`Settings`] holds the **evaluation date**, the date "today" for every
//! date-based calculation.  Model-implied term structures that are not
//! purely time based fall back to it when no reference date has been moved
//! to explicitly.  Dates are stored as serial numbers so that this crate
//! stays independent of `ql-time`.

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

/// Process-wide settings.
pub struct Settings {
    evaluation_date: Mutex<Option<i32>>,
}

static INSTANCE: OnceLock<Settings> = OnceLock::new();

impl Settings {
    /// Return a reference to the global singleton.
    pub fn instance() -> &'static Settings {
        INSTANCE.get_or_init(|| Settings {
            evaluation_date: Mutex::new(None),
        })
    }

    fn slot(&self) -> MutexGuard<'_, Option<i32>> {
        self.evaluation_date
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// The current evaluation date serial number, `None` if unset.
    pub fn evaluation_date_serial(&self) -> Option<i32> {
        *self.slot()
    }

    /// Set the evaluation date as a serial number.
    pub fn set_evaluation_date_serial(&self, serial: i32) {
        *self.slot() = Some(serial);
    }

    /// Clear the evaluation date.
    pub fn reset_evaluation_date(&self) {
        *self.slot() = None;
    }
}

/// Guard that sets the evaluation date and restores the previous value when
/// dropped.  Mostly useful in tests.
#[must_use = "the previous evaluation date is restored when the guard drops"]
pub struct ScopedEvaluationDate {
    previous: Option<i32>,
}

impl ScopedEvaluationDate {
    /// Set the evaluation date to `serial` for the lifetime of the guard.
    pub fn new(serial: i32) -> Self {
        let settings = Settings::instance();
        let previous = settings.evaluation_date_serial();
        settings.set_evaluation_date_serial(serial);
        Self { previous }
    }
}

impl Drop for ScopedEvaluationDate {
    fn drop(&mut self) {
        let settings = Settings::instance();
        match self.previous {
            Some(serial) => settings.set_evaluation_date_serial(serial),
            None => settings.reset_evaluation_date(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoped_date_is_restored() {
        let outer = ScopedEvaluationDate::new(45_000);
        {
            let _inner = ScopedEvaluationDate::new(46_000);
            assert_eq!(Settings::instance().evaluation_date_serial(), Some(46_000));
        }
        assert_eq!(Settings::instance().evaluation_date_serial(), Some(45_000));
        drop(outer);
    }
}
