//! `Currency` — the key under which the cross-asset model files its
//! interest-rate, FX and equity factors.
//!
//! Translates `ql/currency.hpp`.

use ql_core::{errors::Result, fail};

/// Data describing a single currency.
///
/// Two currencies are equal when their ISO codes are equal.
///
/// Corresponds to `QuantLib::Currency`.
#[derive(Debug, Clone, Copy, Eq)]
pub struct Currency {
    /// Full name (e.g. "U.S. Dollar").
    pub name: &'static str,
    /// ISO 4217 alphabetic code (e.g. "USD").
    pub code: &'static str,
    /// ISO 4217 numeric code (e.g. 840).
    pub numeric_code: u16,
    /// Number of fractional units per whole unit (e.g. 100 for cents).
    pub fractions_per_unit: u16,
}

impl Currency {
    /// Look a currency up by its ISO code among the predefined ones.
    pub fn from_code(code: &str) -> Result<Currency> {
        match crate::currencies::ALL.iter().find(|c| c.code == code) {
            Some(c) => Ok(*c),
            None => fail!("unknown currency code '{code}'"),
        }
    }
}

impl PartialEq for Currency {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl std::hash::Hash for Currency {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currencies::{EUR, USD};

    #[test]
    fn lookup_by_code() {
        assert_eq!(Currency::from_code("EUR").unwrap(), EUR);
        assert_ne!(Currency::from_code("USD").unwrap(), EUR);
        assert_eq!(USD.to_string(), "USD");
        assert!(Currency::from_code("XXX").is_err());
    }
}
