//! `Instrument` base trait and pricing-engine interface.
//!
//! Translates `ql/instrument.hpp` and `ql/pricingengine.hpp`.
//!
//! Instruments hold their terms only; an engine receives the instrument's
//! arguments and returns [`PricingResults`].

use ql_core::{errors::Result, Real, Settings};
use ql_time::Date;
use std::collections::HashMap;

/// Results of pricing an instrument.
///
/// Contains the NPV and optionally additional named results
/// (e.g. "forward", "stdDev").
#[derive(Debug, Clone, Default)]
pub struct PricingResults {
    /// Net present value.
    pub npv: Real,
    /// Additional named results.
    pub additional_results: HashMap<String, Real>,
}

impl PricingResults {
    /// Create pricing results with just an NPV.
    pub fn from_npv(npv: Real) -> Self {
        Self {
            npv,
            additional_results: HashMap::new(),
        }
    }

    /// Add a named result.
    pub fn with_result(mut self, key: impl Into<String>, value: Real) -> Self {
        self.additional_results.insert(key.into(), value);
        self
    }

    /// Look up a named result.
    pub fn result(&self, key: &str) -> Option<Real> {
        self.additional_results.get(key).copied()
    }
}

/// Base trait for all pricing engines.
///
/// Corresponds to `QuantLib::PricingEngine`.
pub trait PricingEngine<Args>: std::fmt::Debug + Send + Sync {
    /// Price the instrument described by `args`.
    fn calculate(&self, args: &Args) -> Result<PricingResults>;
}

/// Base trait for all financial instruments.
///
/// Corresponds to `QuantLib::Instrument`.
pub trait Instrument: std::fmt::Debug + Send + Sync {
    /// The maturity or last relevant date.
    fn maturity_date(&self) -> Date;

    /// Whether the maturity lies before the global evaluation date.  Always
    /// `false` while no evaluation date is set.
    fn is_expired(&self) -> bool {
        Settings::instance()
            .evaluation_date_serial()
            .is_some_and(|today| self.maturity_date().serial() < today)
    }
}
