//! Predefined currencies (translates `ql/currencies/*.hpp`).

use crate::currency::Currency;

/// Euro.
pub const EUR: Currency = Currency {
    name: "Euro",
    code: "EUR",
    numeric_code: 978,
    fractions_per_unit: 100,
};

/// U.S. Dollar.
pub const USD: Currency = Currency {
    name: "U.S. Dollar",
    code: "USD",
    numeric_code: 840,
    fractions_per_unit: 100,
};

/// British Pound.
pub const GBP: Currency = Currency {
    name: "British Pound",
    code: "GBP",
    numeric_code: 826,
    fractions_per_unit: 100,
};

/// Japanese Yen.
pub const JPY: Currency = Currency {
    name: "Japanese Yen",
    code: "JPY",
    numeric_code: 392,
    fractions_per_unit: 1,
};

/// Swiss Franc.
pub const CHF: Currency = Currency {
    name: "Swiss Franc",
    code: "CHF",
    numeric_code: 756,
    fractions_per_unit: 100,
};

/// Swedish Krona.
pub const SEK: Currency = Currency {
    name: "Swedish Krona",
    code: "SEK",
    numeric_code: 752,
    fractions_per_unit: 100,
};

/// Canadian Dollar.
pub const CAD: Currency = Currency {
    name: "Canadian Dollar",
    code: "CAD",
    numeric_code: 124,
    fractions_per_unit: 100,
};

/// Every predefined currency, searched by [`Currency::from_code`].
pub static ALL: [Currency; 7] = [EUR, USD, GBP, JPY, CHF, SEK, CAD];
