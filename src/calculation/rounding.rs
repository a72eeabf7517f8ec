//! Currency-aware monetary rounding.
//!
//! Every amount on a payroll record is rounded to its currency's minor unit
//! with round-half-to-even.

use rust_decimal::{Decimal, RoundingStrategy};

/// Minor unit used when a currency is not listed below.
pub const DEFAULT_MINOR_UNITS: u32 = 2;

const ZERO_DECIMAL_CURRENCIES: [&str; 6] = ["CLP", "ISK", "JPY", "KRW", "UGX", "VND"];
const THREE_DECIMAL_CURRENCIES: [&str; 7] = ["BHD", "IQD", "JOD", "KWD", "LYD", "OMR", "TND"];

/// Returns the number of decimal places of a currency's minor unit.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::minor_units;
///
/// assert_eq!(minor_units("USD"), 2);
/// assert_eq!(minor_units("JPY"), 0);
/// assert_eq!(minor_units("KWD"), 3);
/// ```
pub fn minor_units(currency: &str) -> u32 {
    if ZERO_DECIMAL_CURRENCIES.contains(&currency) {
        0
    } else if THREE_DECIMAL_CURRENCIES.contains(&currency) {
        3
    } else {
        DEFAULT_MINOR_UNITS
    }
}

/// Rounds a value to the given number of places, half-to-even.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::round_half_even;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let value = Decimal::from_str("2.345").unwrap();
/// assert_eq!(round_half_even(value, 2), Decimal::from_str("2.34").unwrap());
/// ```
pub fn round_half_even(value: Decimal, places: u32) -> Decimal {
    value.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// Rounds a monetary amount to the minor unit of `currency`.
///
/// The result always carries exactly the minor unit's scale, so `3950`
/// in USD renders as `3950.00`.
pub fn round_money(value: Decimal, currency: &str) -> Decimal {
    let places = minor_units(currency);
    let mut rounded = round_half_even(value, places);
    rounded.rescale(places);
    rounded
}
