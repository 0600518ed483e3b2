//! `Quote` trait and `SimpleQuote` implementation.
//!
//! Translates `ql/quote.hpp` and `ql/quotes/simplequote.hpp`.

use ql_core::{
    patterns::observable::{Observable, ObservableImpl, Observer},
    Real,
};
use std::sync::{RwLock, Weak};

/// A market-observable value.
///
/// Corresponds to `QuantLib::Quote`.
pub trait Quote: Observable + std::fmt::Debug + Send + Sync {
    /// Return the current value.
    ///
    /// Returns `None` if the quote is not currently valid / set.
    fn value(&self) -> Option<Real>;

    /// Return `true` if the quote is currently valid.
    fn is_valid(&self) -> bool {
        self.value().is_some()
    }
}

/// A simple, mutable market quote.
///
/// Setting or resetting the value notifies registered observers when the
/// value actually changes.
///
/// Corresponds to `QuantLib::SimpleQuote`.
#[derive(Debug, Default)]
pub struct SimpleQuote {
    value: RwLock<Option<Real>>,
    observable: ObservableImpl,
}

impl SimpleQuote {
    /// Create a new quote with the given value.
    pub fn new(value: Real) -> Self {
        Self {
            value: RwLock::new(Some(value)),
            observable: ObservableImpl::new(),
        }
    }

    /// Create an empty (invalid) quote.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Set a new value, returning the difference to the previous one
    /// (0 when the quote was empty).
    pub fn set_value(&self, value: Real) -> Real {
        let previous = self.replace(Some(value));
        if previous != Some(value) {
            self.observable.notify();
        }
        previous.map_or(0.0, |p| value - p)
    }

    /// Clear the value, making the quote invalid.
    pub fn reset(&self) {
        if self.replace(None).is_some() {
            self.observable.notify();
        }
    }

    fn replace(&self, value: Option<Real>) -> Option<Real> {
        let mut guard = self
            .value
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        std::mem::replace(&mut *guard, value)
    }
}

impl Observable for SimpleQuote {
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

impl Quote for SimpleQuote {
    fn value(&self) -> Option<Real> {
        *self
            .value
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl Observer for Counter {
        fn update(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn simple_quote() {
        let q = SimpleQuote::new(1.05);
        assert!(q.is_valid());
        assert_eq!(q.value(), Some(1.05));
    }

    #[test]
    fn empty_quote() {
        let q = SimpleQuote::empty();
        assert!(!q.is_valid());
        assert_eq!(q.value(), None);
    }

    #[test]
    fn changes_are_notified_once() {
        let q = SimpleQuote::new(1.0);
        let counter = Arc::new(Counter::default());
        let weak: Weak<dyn Observer> = Arc::downgrade(&counter) as Weak<dyn Observer>;
        q.register_observer(weak);
        assert_eq!(q.set_value(1.5), 0.5);
        q.set_value(1.5);
        q.reset();
        q.reset();
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }
}
