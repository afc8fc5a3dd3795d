//! Monetary amount helpers with precise decimal arithmetic
//!
//! All amounts in the ledger are `rust_decimal::Decimal` (stored as
//! `NUMERIC` in the datastore). The chart of accounts operates in a single
//! whole-unit currency, so the helpers here round to zero decimal places.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Maximum difference between total debit and total credit for a journal
/// entry to be considered balanced.
pub const BALANCE_TOLERANCE: Decimal = dec!(0.01);

/// Returns true if the given debit/credit totals balance within
/// [`BALANCE_TOLERANCE`].
pub fn is_balanced(total_debit: Decimal, total_credit: Decimal) -> bool {
    (total_debit - total_credit).abs() <= BALANCE_TOLERANCE
}

/// Rounds an amount to whole currency units, half away from zero.
///
/// Matches the rounding applied when installment rows are generated, so a
/// schedule built from fractional monthly amounts lands on whole units.
pub fn round_unit(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Splits `total` into `parts` rounded shares plus the remainder left over
/// after rounding.
///
/// The shares are all equal (`round_unit(total / parts)`); the remainder is
/// `total - parts * share` and may be negative. Callers decide where the
/// remainder lands - the amortization scheduler adds it to the final
/// installment so the schedule sums to the principal exactly.
pub fn even_split(total: Decimal, parts: u32) -> Option<(Decimal, Decimal)> {
    if parts == 0 {
        return None;
    }
    let share = round_unit(total / Decimal::from(parts));
    let remainder = total - share * Decimal::from(parts);
    Some((share, remainder))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_within_tolerance() {
        assert!(is_balanced(dec!(100.00), dec!(100.00)));
        assert!(is_balanced(dec!(100.00), dec!(100.01)));
        assert!(is_balanced(dec!(100.01), dec!(100.00)));
    }

    #[test]
    fn test_unbalanced_beyond_tolerance() {
        assert!(!is_balanced(dec!(100.00), dec!(100.02)));
        assert!(!is_balanced(dec!(0), dec!(500)));
    }

    #[test]
    fn test_round_unit_half_away_from_zero() {
        assert_eq!(round_unit(dec!(333333.5)), dec!(333334));
        assert_eq!(round_unit(dec!(333333.4)), dec!(333333));
        assert_eq!(round_unit(dec!(-12.5)), dec!(-13));
    }

    #[test]
    fn test_even_split_exact() {
        let (share, remainder) = even_split(dec!(1000000), 10).unwrap();
        assert_eq!(share, dec!(100000));
        assert_eq!(remainder, dec!(0));
    }

    #[test]
    fn test_even_split_with_remainder() {
        let (share, remainder) = even_split(dec!(1000001), 3).unwrap();
        assert_eq!(share, dec!(333334));
        assert_eq!(remainder, dec!(-1));
        assert_eq!(share * dec!(3) + remainder, dec!(1000001));
    }

    #[test]
    fn test_even_split_zero_parts() {
        assert!(even_split(dec!(100), 0).is_none());
    }
}
