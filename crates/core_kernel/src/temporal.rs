//! Calendar helpers for repayment schedules

use chrono::{Months, NaiveDate};

/// Returns the date `months` whole months after `date`.
///
/// Day-of-month is clamped to the end of the target month, so stepping from
/// Jan 31 lands on Feb 28/29 rather than overflowing into March. Installment
/// due dates are produced by stepping from the schedule start date, one call
/// per installment number.
pub fn months_after(date: NaiveDate, months: u32) -> NaiveDate {
    // checked_add_months only fails outside chrono's representable range,
    // which NaiveDate inputs cannot reach with realistic tenors.
    date.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}
