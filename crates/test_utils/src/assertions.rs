//! Custom Test Assertions
//!
//! Specialized assertion helpers for ledger types that give more meaningful
//! failure messages than bare assert_eq.

use core_kernel::is_balanced;
use domain_debt::PlannedInstallment;
use domain_journal::JournalLine;
use rust_decimal::Decimal;

/// Asserts that a line set balances within the ledger tolerance
pub fn assert_lines_balanced(lines: &[JournalLine]) {
    let debit: Decimal = lines.iter().map(|l| l.debit_amount).sum();
    let credit: Decimal = lines.iter().map(|l| l.credit_amount).sum();
    assert!(
        is_balanced(debit, credit),
        "Lines do not balance: debit={}, credit={}, {} lines",
        debit,
        credit,
        lines.len()
    );
}

/// Asserts that a schedule's principal column sums exactly to the principal
/// and that every total equals principal plus interest
pub fn assert_schedule_reconciled(rows: &[PlannedInstallment], principal: Decimal) {
    let sum: Decimal = rows.iter().map(|r| r.principal_amount).sum();
    assert_eq!(
        sum, principal,
        "Schedule principal column sums to {} but the principal is {}",
        sum, principal
    );
    for row in rows {
        assert_eq!(
            row.total_amount,
            row.principal_amount + row.interest_amount,
            "Installment #{} total {} != principal {} + interest {}",
            row.installment_number,
            row.total_amount,
            row.principal_amount,
            row.interest_amount
        );
    }
}

/// Asserts that installment numbers are 1-based and contiguous
pub fn assert_contiguous_numbers(rows: &[PlannedInstallment]) {
    for (index, row) in rows.iter().enumerate() {
        assert_eq!(
            row.installment_number as usize,
            index + 1,
            "Installment at position {} carries number {}",
            index,
            row.installment_number
        );
    }
}
