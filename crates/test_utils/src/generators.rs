//! Property-Based Test Generators
//!
//! Proptest strategies for generating random ledger data that maintains
//! domain invariants.

use core_kernel::{BranchId, PayableId};
use chrono::NaiveDate;
use domain_debt::{InterestType, ScheduleRequest};
use domain_journal::JournalLine;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Strategy for whole-unit positive amounts
pub fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..5_000_000_000i64).prop_map(Decimal::from)
}

/// Strategy for realistic tenors (months)
pub fn tenor_strategy() -> impl Strategy<Value = u32> {
    1u32..120u32
}

/// Strategy for interest rates as whole percentages
pub fn rate_strategy() -> impl Strategy<Value = Decimal> {
    (0u32..60u32).prop_map(Decimal::from)
}

/// Strategy for the three interest types
pub fn interest_type_strategy() -> impl Strategy<Value = InterestType> {
    prop_oneof![
        Just(InterestType::Flat),
        Just(InterestType::PerMonth),
        Just(InterestType::PerYear),
    ]
}

/// Strategy for schedule-start dates within a realistic range
pub fn start_date_strategy() -> impl Strategy<Value = NaiveDate> {
    (2020i32..2030i32, 1u32..=12u32, 1u32..=28u32).prop_map(|(y, m, d)| {
        NaiveDate::from_ymd_opt(y, m, d).expect("day <= 28 is valid in every month")
    })
}

/// Strategy for complete schedule requests
pub fn schedule_request_strategy() -> impl Strategy<Value = ScheduleRequest> {
    (
        amount_strategy(),
        rate_strategy(),
        interest_type_strategy(),
        tenor_strategy(),
        start_date_strategy(),
    )
        .prop_map(
            |(principal, interest_rate, interest_type, tenor_months, start_date)| {
                ScheduleRequest {
                    debt_id: PayableId::new(),
                    principal,
                    interest_rate,
                    interest_type,
                    tenor_months,
                    start_date,
                    branch_id: BranchId::new(),
                }
            },
        )
}

/// Strategy for a balanced line set: each generated amount produces one
/// debit line and one credit line of the same size
pub fn balanced_lines_strategy() -> impl Strategy<Value = Vec<JournalLine>> {
    prop::collection::vec(1i64..1_000_000_000i64, 1..8).prop_map(|amounts| {
        let mut lines = Vec::with_capacity(amounts.len() * 2);
        for (i, amount) in amounts.into_iter().enumerate() {
            let amount = Decimal::from(amount);
            lines.push(JournalLine {
                account_id: Uuid::new_v4(),
                account_code: format!("1-{:05}", i + 1),
                account_name: format!("Account {}", i + 1),
                debit_amount: amount,
                credit_amount: Decimal::ZERO,
                description: String::new(),
            });
            lines.push(JournalLine {
                account_id: Uuid::new_v4(),
                account_code: format!("2-{:05}", i + 1),
                account_name: format!("Contra {}", i + 1),
                debit_amount: Decimal::ZERO,
                credit_amount: amount,
                description: String::new(),
            });
        }
        lines
    })
}
