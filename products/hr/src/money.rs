//! Salary amounts: two-place decimals on the wire, minor units in storage.

use rust_decimal::{Decimal, prelude::ToPrimitive};

pub const MAX_DIGITS: u32 = 10;
pub const DECIMAL_PLACES: u32 = 2;

/// Renders stored minor units as a decimal with exactly two places.
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, DECIMAL_PLACES)
}

/// Converts a client amount to minor units, rejecting values that do not fit
/// a `DECIMAL(10, 2)` column.
pub fn to_cents(amount: Decimal) -> Result<i64, String> {
    let normalized = amount.normalize();
    if normalized.scale() > DECIMAL_PLACES {
        return Err(format!(
            "Ensure that there are no more than {DECIMAL_PLACES} decimal places."
        ));
    }
    let whole_digits = integer_digits(normalized);
    let max_whole = MAX_DIGITS - DECIMAL_PLACES;
    if whole_digits > max_whole {
        return Err(format!(
            "Ensure that there are no more than {max_whole} digits before the decimal point."
        ));
    }
    (normalized * Decimal::ONE_HUNDRED)
        .to_i64()
        .ok_or_else(|| "A valid number is required.".to_owned())
}

fn integer_digits(amount: Decimal) -> u32 {
    let whole = amount.trunc().abs().to_string();
    whole.trim_start_matches('0').len() as u32
}
