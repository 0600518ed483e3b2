//! European vanilla options.
//!
//! Translates `ql/instruments/vanillaoption.hpp` and
//! `ql/instruments/europeanoption.hpp` for the European exercise the
//! cross-asset engines support.

use crate::instrument::{Instrument, PricingEngine, PricingResults};
use crate::payoff::{OptionType, PlainVanillaPayoff};
use ql_core::{errors::Result, Real};
use ql_time::Date;

/// Arguments sent to an engine pricing a European option.
///
/// Corresponds to `QuantLib::OneAssetOption::arguments`.
#[derive(Debug, Clone, PartialEq)]
pub struct EuropeanOptionArguments {
    /// The payoff.
    pub payoff: PlainVanillaPayoff,
    /// The exercise date.
    pub expiry: Date,
}

/// A plain vanilla option with a single exercise date.
///
/// Corresponds to `QuantLib::EuropeanOption`.
#[derive(Debug, Clone)]
pub struct EuropeanOption {
    payoff: PlainVanillaPayoff,
    expiry: Date,
}

impl EuropeanOption {
    /// Create a new European option.
    pub fn new(payoff: PlainVanillaPayoff, expiry: Date) -> Self {
        Self { payoff, expiry }
    }

    /// Convenience: a European call/put.
    pub fn vanilla(option_type: OptionType, strike: Real, expiry: Date) -> Self {
        Self::new(PlainVanillaPayoff::new(option_type, strike), expiry)
    }

    /// The payoff.
    pub fn payoff(&self) -> &PlainVanillaPayoff {
        &self.payoff
    }

    /// The exercise date.
    pub fn expiry(&self) -> Date {
        self.expiry
    }

    /// Get the arguments for a pricing engine.
    pub fn arguments(&self) -> EuropeanOptionArguments {
        EuropeanOptionArguments {
            payoff: self.payoff.clone(),
            expiry: self.expiry,
        }
    }

    /// Price this option using the given engine.
    pub fn price(
        &self,
        engine: &dyn PricingEngine<EuropeanOptionArguments>,
    ) -> Result<PricingResults> {
        engine.calculate(&self.arguments())
    }
}

impl Instrument for EuropeanOption {
    fn maturity_date(&self) -> Date {
        self.expiry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ql_core::ScopedEvaluationDate;

    #[derive(Debug)]
    struct Intrinsic(Real);

    impl PricingEngine<EuropeanOptionArguments> for Intrinsic {
        fn calculate(&self, args: &EuropeanOptionArguments) -> Result<PricingResults> {
            use crate::payoff::Payoff;
            Ok(PricingResults::from_npv(args.payoff.value(self.0)))
        }
    }

    #[test]
    fn prices_through_engine() {
        let expiry = Date::from_ymd(2026, 6, 15).unwrap();
        let option = EuropeanOption::vanilla(OptionType::Call, 1.1, expiry);
        let res = option.price(&Intrinsic(1.3)).unwrap();
        assert!((res.npv - 0.2).abs() < 1e-14);
        assert_eq!(option.arguments().expiry, expiry);
    }

    #[test]
    fn expiry_against_evaluation_date() {
        let expiry = Date::from_ymd(2026, 6, 15).unwrap();
        let option = EuropeanOption::vanilla(OptionType::Put, 1.0, expiry);
        {
            let _today = ScopedEvaluationDate::new((expiry + 1).serial());
            assert!(option.is_expired());
        }
        {
            let _today = ScopedEvaluationDate::new(expiry.serial());
            assert!(!option.is_expired());
        }
    }
}
