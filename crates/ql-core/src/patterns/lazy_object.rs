//! LazyObject pattern (translates `ql/patterns/lazyobject.hpp`).
//!
//! A lazy object caches an expensive derived quantity and recomputes it only
//! after one of its inputs has notified a change.  Model-implied term
//! structures use it to refresh their relative reference time after the
//! underlying cross-asset model moved.
//!
//! The bookkeeping is held in atomics so that lazy objects stay `Sync` and
//! can sit behind the `Arc<dyn ...>` term-structure handles.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Trait for objects that lazily compute and cache their results.
///
/// Implementors provide [`perform_calculations`][Self::perform_calculations]
/// and expose their [`LazyState`]; the remaining methods implement the
/// `calculated_` / freeze logic of QuantLib's `LazyObject`.
pub trait LazyObject {
    /// Perform the actual (expensive) calculation.
    fn perform_calculations(&self) -> crate::errors::Result<()>;

    /// The embedded bookkeeping state.
    fn lazy_state(&self) -> &LazyState;

    /// Ensure results are up-to-date.
    ///
    /// If the cache is stale and the object is not frozen, runs
    /// [`perform_calculations`][Self::perform_calculations].  A failed
    /// calculation leaves the cache stale.
    fn calculate(&self) -> crate::errors::Result<()> {
        let state = self.lazy_state();
        if !state.calculated.load(Ordering::Acquire) && !self.is_frozen() {
            state.calculated.store(true, Ordering::Release);
            if let Err(e) = self.perform_calculations() {
                state.calculated.store(false, Ordering::Release);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Mark the cached result as stale without triggering a recalculation.
    fn invalidate(&self) {
        self.lazy_state().calculated.store(false, Ordering::Release);
    }

    /// Prevent automatic recalculation until [`unfreeze`][Self::unfreeze] is
    /// called.
    fn freeze(&self) {
        self.lazy_state().freeze_count.fetch_add(1, Ordering::AcqRel);
    }

    /// Undo one call to [`freeze`][Self::freeze].
    fn unfreeze(&self) {
        let _ = self.lazy_state().freeze_count.fetch_update(
            Ordering::AcqRel,
            Ordering::Acquire,
            |n| n.checked_sub(1),
        );
    }

    /// Return `true` if the cache is currently valid.
    fn is_calculated(&self) -> bool {
        self.lazy_state().calculated.load(Ordering::Acquire)
    }

    /// Return `true` if recalculation is currently deferred.
    fn is_frozen(&self) -> bool {
        self.lazy_state().freeze_count.load(Ordering::Acquire) > 0
    }
}

/// Bookkeeping fields required by [`LazyObject`].
///
/// # Example
/// ```
/// use std::sync::atomic::{AtomicU64, Ordering};
/// use ql_core::patterns::lazy_object::{LazyObject, LazyState};
///
/// #[derive(Default)]
/// struct Shifted {
///     state: LazyState,
///     result: AtomicU64,
/// }
///
/// impl LazyObject for Shifted {
///     fn perform_calculations(&self) -> ql_core::errors::Result<()> {
///         self.result.store(42, Ordering::Relaxed);
///         Ok(())
///     }
///     fn lazy_state(&self) -> &LazyState { &self.state }
/// }
///
/// let obj = Shifted::default();
/// obj.calculate().unwrap();
/// assert_eq!(obj.result.load(Ordering::Relaxed), 42);
/// ```
#[derive(Debug, Default)]
pub struct LazyState {
    calculated: AtomicBool,
    freeze_count: AtomicU32,
}

impl LazyState {
    /// Create a new state where the cache is initially stale.
    pub fn new() -> Self {
        Self::default()
    }
}
