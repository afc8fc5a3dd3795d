//! Pre-built Test Fixtures
//!
//! Ready-to-use test data for common ledger entities. Fixtures are
//! consistent and predictable so unit tests can assert exact values.

use chrono::NaiveDate;
use core_kernel::{BranchId, UserId};
use uuid::Uuid;

/// Fixture for dates used across schedule tests
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Default schedule start date
    pub fn schedule_start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).expect("valid date")
    }

    /// A due date safely in the past relative to the test clock
    pub fn long_past_due() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 6, 1).expect("valid date")
    }
}

/// Fixture for strings that appear in ledger records
pub struct StringFixtures;

impl StringFixtures {
    pub fn cash_account_code() -> &'static str {
        "1-10001"
    }

    pub fn cash_account_name() -> &'static str {
        "Kas"
    }

    pub fn payable_account_code() -> &'static str {
        "2-10100"
    }

    pub fn payable_account_name() -> &'static str {
        "Hutang Usaha"
    }

    pub fn supplier_name() -> &'static str {
        "CV Sumber Rejeki"
    }

    pub fn entry_description() -> &'static str {
        "Pembayaran supplier"
    }
}

/// Fixture for identifiers
pub struct IdFixtures;

impl IdFixtures {
    /// A stable acting user
    pub fn fixed_user() -> UserId {
        UserId::from_uuid(Uuid::from_u128(0x0f01))
    }

    pub fn fresh_branch() -> BranchId {
        BranchId::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_user_is_stable_across_calls() {
        assert_eq!(IdFixtures::fixed_user(), IdFixtures::fixed_user());
    }

    #[test]
    fn fresh_branches_are_unique() {
        assert_ne!(IdFixtures::fresh_branch(), IdFixtures::fresh_branch());
    }
}
