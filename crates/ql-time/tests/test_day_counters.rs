//! Integration tests for the Actual day counters.

use approx::assert_relative_eq;
use ql_time::{Actual360, Actual365Fixed, Date, DayCounter};

fn date(y: u16, m: u8, d: u8) -> Date {
    Date::from_ymd(y, m, d).unwrap()
}

#[test]
fn actual_365_fixed_over_leap_year() {
    let dc = Actual365Fixed;
    let d1 = date(2024, 1, 1);
    let d2 = date(2025, 1, 1);
    assert_eq!(dc.day_count(d1, d2), 366);
    assert_relative_eq!(dc.year_fraction(d1, d2), 366.0 / 365.0, epsilon = 1e-15);
    assert_eq!(dc.name(), "Actual/365 (Fixed)");
}

#[test]
fn actual_360_half_year() {
    let dc = Actual360;
    let d1 = date(2023, 1, 1);
    let d2 = date(2023, 7, 1);
    assert_relative_eq!(dc.year_fraction(d1, d2), 181.0 / 360.0, epsilon = 1e-15);
}

#[test]
fn year_fraction_is_additive() {
    let dc = Actual365Fixed;
    let (a, b, c) = (date(2020, 3, 15), date(2021, 8, 2), date(2030, 12, 31));
    assert_relative_eq!(
        dc.year_fraction(a, c),
        dc.year_fraction(a, b) + dc.year_fraction(b, c),
        epsilon = 1e-14
    );
}
