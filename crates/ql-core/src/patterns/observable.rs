//! Observer / Observable pattern (translates `ql/patterns/observable.hpp`).
//!
//! Model parametrizations, quotes and cross-asset models notify dependents
//! (model-implied term structures, calibration helpers) whenever their state
//! changes.  Dependents react in [`Observer::update`], usually by flagging a
//! cached value as stale.
//!
//! The observer list lives behind a `Mutex` so that observables can be shared
//! across threads inside `Arc`s, which the term-structure traits require.

use std::sync::{Arc, Mutex, Weak};

/// An object that can notify interested parties when it changes.
///
/// All methods take `&self` so that shared (`Arc`) observables can be
/// subscribed to by any holder of a reference.
pub trait Observable {
    /// Register an observer to receive future change notifications.
    fn register_observer(&self, observer: Weak<dyn Observer>);

    /// Remove a previously registered observer.
    fn unregister_observer(&self, observer: &Weak<dyn Observer>);

    /// Notify all currently registered observers that this object has changed.
    fn notify_observers(&self);
}

/// An object that reacts to changes in [`Observable`]s it has subscribed to.
pub trait Observer: Send + Sync {
    /// Called by every observable this observer is registered with when that
    /// observable changes state.
    fn update(&self);
}

/// Observer-list bookkeeping that can be embedded in any observable type
/// (equivalent to `Observable::Impl` in QuantLib).
#[derive(Default)]
pub struct ObservableImpl {
    observers: Mutex<Vec<Weak<dyn Observer>>>,
}

impl ObservableImpl {
    /// Create a new, empty observer list.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Weak<dyn Observer>>> {
        // A panic inside an observer's update must not disable notifications.
        self.observers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Register an observer.  Registering the same observer twice is a no-op.
    pub fn register(&self, observer: Weak<dyn Observer>) {
        let mut observers = self.lock();
        if !observers.iter().any(|o| Weak::ptr_eq(o, &observer)) {
            observers.push(observer);
        }
    }

    /// Remove an observer (by pointer equality of the `Weak`).
    pub fn unregister(&self, observer: &Weak<dyn Observer>) {
        self.lock().retain(|o| !Weak::ptr_eq(o, observer));
    }

    /// Number of live observers.
    pub fn len(&self) -> usize {
        self.lock().iter().filter(|w| w.strong_count() > 0).count()
    }

    /// `true` if no live observer is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Notify all live observers, pruning dead `Weak` references.
    ///
    /// The list lock is released before any `update` runs, so observers may
    /// register or unregister themselves while being notified.
    pub fn notify(&self) {
        let live: Vec<Arc<dyn Observer>> = {
            let mut observers = self.lock();
            observers.retain(|w| w.strong_count() > 0);
            observers.iter().filter_map(Weak::upgrade).collect()
        };
        for obs in live {
            obs.update();
        }
    }
}

impl std::fmt::Debug for ObservableImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableImpl")
            .field("observers", &self.len())
            .finish()
    }
}

impl Observable for ObservableImpl {
    fn register_observer(&self, observer: Weak<dyn Observer>) {
        self.register(observer);
    }

    fn unregister_observer(&self, observer: &Weak<dyn Observer>) {
        self.unregister(observer);
    }

    fn notify_observers(&self) {
        self.notify();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct CountingObserver {
        count: AtomicU32,
    }

    impl Observer for CountingObserver {
        fn update(&self) {
            self.count.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn weak(obs: &Arc<CountingObserver>) -> Weak<dyn Observer> {
        Arc::downgrade(obs) as Weak<dyn Observer>
    }

    #[test]
    fn register_and_notify() {
        let obs = Arc::new(CountingObserver::default());
        let observable = ObservableImpl::new();
        observable.register(weak(&obs));
        observable.notify();
        observable.notify();
        assert_eq!(obs.count.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn double_registration_notifies_once() {
        let obs = Arc::new(CountingObserver::default());
        let observable = ObservableImpl::new();
        observable.register(weak(&obs));
        observable.register(weak(&obs));
        observable.notify();
        assert_eq!(obs.count.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn dead_observer_pruned() {
        let observable = ObservableImpl::new();
        {
            let obs = Arc::new(CountingObserver::default());
            observable.register(weak(&obs));
            assert_eq!(observable.len(), 1);
        }
        observable.notify();
        assert!(observable.is_empty());
    }

    #[test]
    fn unregister() {
        let obs = Arc::new(CountingObserver::default());
        let observable = ObservableImpl::new();
        observable.register(weak(&obs));
        observable.unregister(&weak(&obs));
        observable.notify();
        assert_eq!(obs.count.load(Ordering::Relaxed), 0);
    }
}
