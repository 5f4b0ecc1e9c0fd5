//! Price helpers using decimal arithmetic.
//!
//! Catalog prices are decimals in the currency's standard unit (dollars, not cents).
//! The payment function expects an integer amount in minor units, so the conversion
//! lives here rather than at the call site.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Minor currency units per standard unit (cents per dollar).
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// Convert a standard-unit amount to integer minor units, rounding down.
///
/// Returns `None` if the result does not fit in an `i64`.
///
/// # Example
///
/// ```rust
/// # use pupusas_core::to_minor_units;
/// # use rust_decimal::Decimal;
/// let total = Decimal::new(10_005, 3); // 10.005
/// assert_eq!(to_minor_units(total), Some(1000));
/// ```
#[must_use]
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    amount
        .checked_mul(Decimal::from(MINOR_UNITS_PER_MAJOR))?
        .floor()
        .to_i64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_amount() {
        assert_eq!(to_minor_units(Decimal::new(15, 0)), Some(1500));
    }

    #[test]
    fn test_fractional_cents_round_down() {
        assert_eq!(to_minor_units(Decimal::new(19_999, 3)), Some(1999));
    }

    #[test]
    fn test_zero() {
        assert_eq!(to_minor_units(Decimal::ZERO), Some(0));
    }

    #[test]
    fn test_overflow_is_none() {
        assert_eq!(to_minor_units(Decimal::MAX), None);
    }
}
