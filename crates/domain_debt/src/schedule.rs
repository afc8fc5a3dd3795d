//! Debt amortization scheduler
//!
//! Expands a payable into a flat repayment schedule: the principal is split
//! evenly across the tenor and the interest charge is the same on every row.
//! The interest-type names describe how the *total* charge is derived, not
//! how it is spread; none of the three produce a declining balance, and
//! changing that would silently reprice every schedule already issued.

use chrono::NaiveDate;
use core_kernel::{even_split, months_after, round_unit, BranchId, LedgerError, PayableId};
use infra_db::{DatabaseError, DebtRepository, InstallmentRow, NewInstallment};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// How the total interest charge is derived from the rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestType {
    /// One flat charge: `principal * rate / 100`
    Flat,
    /// Rate charged per month of tenor: `principal * rate / 100 * tenor`
    PerMonth,
    /// Annual rate prorated monthly: `principal * (rate / 12) / 100 * tenor`
    PerYear,
}

/// Input to schedule generation
#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    pub debt_id: PayableId,
    pub principal: Decimal,
    pub interest_rate: Decimal,
    pub interest_type: InterestType,
    pub tenor_months: u32,
    pub start_date: NaiveDate,
    pub branch_id: BranchId,
}

/// One calculated (not yet persisted) installment
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedInstallment {
    pub installment_number: u32,
    pub due_date: NaiveDate,
    pub principal_amount: Decimal,
    pub interest_amount: Decimal,
    pub total_amount: Decimal,
}

/// Total interest charged over the life of the schedule
fn total_interest(req: &ScheduleRequest) -> Decimal {
    let hundred = Decimal::ONE_HUNDRED;
    let tenor = Decimal::from(req.tenor_months);
    match req.interest_type {
        InterestType::Flat => req.principal * req.interest_rate / hundred,
        InterestType::PerMonth => req.principal * req.interest_rate / hundred * tenor,
        InterestType::PerYear => {
            req.principal * (req.interest_rate / Decimal::from(12)) / hundred * tenor
        }
    }
}

/// Calculates the full schedule without touching the datastore
///
/// Row `i` falls due `i` months after the start date (end-of-month clamped).
/// Amounts are rounded to whole units; whatever rounding drift accumulates
/// on the principal side is folded into the final row, so the schedule's
/// principal column sums to the principal exactly.
pub fn calculate_installments(
    req: &ScheduleRequest,
) -> Result<Vec<PlannedInstallment>, LedgerError> {
    if req.tenor_months == 0 {
        return Err(LedgerError::validation("Tenor must be at least one month"));
    }
    if req.principal <= Decimal::ZERO {
        return Err(LedgerError::validation("Principal must be positive"));
    }
    if req.interest_rate < Decimal::ZERO {
        return Err(LedgerError::validation("Interest rate must not be negative"));
    }

    let (monthly_principal, principal_remainder) = even_split(req.principal, req.tenor_months)
        .ok_or_else(|| LedgerError::validation("Tenor must be at least one month"))?;
    let monthly_interest = round_unit(total_interest(req) / Decimal::from(req.tenor_months));

    let mut rows = Vec::with_capacity(req.tenor_months as usize);
    for number in 1..=req.tenor_months {
        let mut principal_amount = monthly_principal;
        if number == req.tenor_months {
            principal_amount += principal_remainder;
        }

        rows.push(PlannedInstallment {
            installment_number: number,
            due_date: months_after(req.start_date, number),
            principal_amount,
            interest_amount: monthly_interest,
            total_amount: principal_amount + monthly_interest,
        });
    }

    Ok(rows)
}

/// Persists calculated schedules
pub struct InstallmentScheduler {
    debts: DebtRepository,
}

impl InstallmentScheduler {
    pub fn new(debts: DebtRepository) -> Self {
        Self { debts }
    }

    /// Calculates and stores the schedule for a payable
    ///
    /// Refuses (`Conflict`) if the debt already has any installment rows.
    /// The batch insert and the `tenor_months` update on the parent payable
    /// commit in one transaction.
    pub async fn generate(&self, req: &ScheduleRequest) -> Result<Vec<InstallmentRow>, LedgerError> {
        let planned = calculate_installments(req)?;

        let mut tx = self
            .debts
            .pool()
            .begin()
            .await
            .map_err(|e| DatabaseError::from(e).into_ledger())?;

        if self
            .debts
            .has_installments(&mut tx, req.debt_id.as_uuid())
            .await
            .map_err(|e| e.into_ledger())?
        {
            return Err(LedgerError::conflict(format!(
                "Installment schedule already exists for debt {}",
                req.debt_id
            )));
        }

        let new_rows: Vec<NewInstallment> = planned
            .iter()
            .map(|p| NewInstallment {
                id: Uuid::new_v4(),
                debt_id: req.debt_id.as_uuid(),
                installment_number: p.installment_number as i32,
                due_date: p.due_date,
                principal_amount: p.principal_amount,
                interest_amount: p.interest_amount,
                total_amount: p.total_amount,
                branch_id: req.branch_id.as_uuid(),
            })
            .collect();

        self.debts
            .insert_installments(&mut tx, &new_rows)
            .await
            .map_err(|e| e.into_ledger())?;
        self.debts
            .set_tenor(&mut tx, req.debt_id.as_uuid(), Some(req.tenor_months as i32))
            .await
            .map_err(|e| e.into_ledger())?;

        tx.commit()
            .await
            .map_err(|e| DatabaseError::from(e).into_ledger())?;

        info!(
            debt_id = %req.debt_id,
            tenor = req.tenor_months,
            principal = %req.principal,
            "installment schedule generated"
        );

        self.debts
            .installments_of(req.debt_id.as_uuid())
            .await
            .map_err(|e| e.into_ledger())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(
        principal: Decimal,
        rate: Decimal,
        interest_type: InterestType,
        tenor: u32,
    ) -> ScheduleRequest {
        ScheduleRequest {
            debt_id: PayableId::new(),
            principal,
            interest_rate: rate,
            interest_type,
            tenor_months: tenor,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            branch_id: BranchId::new(),
        }
    }

    #[test]
    fn flat_interest_splits_one_charge_over_the_tenor() {
        let req = request(dec!(1000000), dec!(12), InterestType::Flat, 10);
        let rows = calculate_installments(&req).unwrap();

        assert_eq!(rows.len(), 10);
        for row in &rows {
            assert_eq!(row.principal_amount, dec!(100000));
            assert_eq!(row.interest_amount, dec!(12000));
            assert_eq!(row.total_amount, dec!(112000));
        }
    }

    #[test]
    fn per_month_interest_multiplies_by_tenor() {
        let req = request(dec!(1000000), dec!(1), InterestType::PerMonth, 10);
        let rows = calculate_installments(&req).unwrap();

        // total interest = 1_000_000 * 1% * 10 = 100_000, so 10_000 a month
        for row in &rows {
            assert_eq!(row.interest_amount, dec!(10000));
        }
    }

    #[test]
    fn per_year_interest_prorates_the_annual_rate() {
        let req = request(dec!(1200000), dec!(12), InterestType::PerYear, 12);
        let rows = calculate_installments(&req).unwrap();

        // total = 1_200_000 * (12/12)% * 12 = 144_000, so 12_000 a month
        for row in &rows {
            assert_eq!(row.interest_amount, dec!(12000));
        }
    }

    #[test]
    fn last_row_absorbs_the_rounding_difference() {
        let req = request(dec!(1000001), dec!(0), InterestType::Flat, 3);
        let rows = calculate_installments(&req).unwrap();

        assert_eq!(rows[0].principal_amount, dec!(333334));
        assert_eq!(rows[1].principal_amount, dec!(333334));
        assert_eq!(rows[2].principal_amount, dec!(333333));

        let sum: Decimal = rows.iter().map(|r| r.principal_amount).sum();
        assert_eq!(sum, dec!(1000001));
    }

    #[test]
    fn due_dates_step_monthly_with_end_of_month_clamp() {
        let mut req = request(dec!(300000), dec!(0), InterestType::Flat, 3);
        req.start_date = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        let rows = calculate_installments(&req).unwrap();

        assert_eq!(rows[0].due_date, NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
        assert_eq!(rows[1].due_date, NaiveDate::from_ymd_opt(2026, 3, 31).unwrap());
        assert_eq!(rows[2].due_date, NaiveDate::from_ymd_opt(2026, 4, 30).unwrap());
    }

    #[test]
    fn numbers_are_one_based_and_contiguous() {
        let req = request(dec!(500000), dec!(5), InterestType::Flat, 5);
        let rows = calculate_installments(&req).unwrap();
        let numbers: Vec<u32> = rows.iter().map(|r| r.installment_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn zero_tenor_is_rejected() {
        let req = request(dec!(1000000), dec!(12), InterestType::Flat, 0);
        assert!(matches!(
            calculate_installments(&req),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn non_positive_principal_is_rejected() {
        let req = request(dec!(0), dec!(12), InterestType::Flat, 10);
        assert!(matches!(
            calculate_installments(&req),
            Err(LedgerError::Validation(_))
        ));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn principal_column_always_sums_to_the_principal(
                principal in 1i64..5_000_000_000i64,
                tenor in 1u32..120u32,
                rate in 0u32..50u32
            ) {
                let req = request(
                    Decimal::from(principal),
                    Decimal::from(rate),
                    InterestType::Flat,
                    tenor,
                );
                let rows = calculate_installments(&req).unwrap();
                let sum: Decimal = rows.iter().map(|r| r.principal_amount).sum();
                prop_assert_eq!(sum, Decimal::from(principal));
                prop_assert_eq!(rows.len(), tenor as usize);
            }

            #[test]
            fn every_total_is_principal_plus_interest(
                principal in 1i64..1_000_000_000i64,
                tenor in 1u32..60u32
            ) {
                let req = request(
                    Decimal::from(principal),
                    dec!(12),
                    InterestType::PerYear,
                    tenor,
                );
                for row in calculate_installments(&req).unwrap() {
                    prop_assert_eq!(
                        row.total_amount,
                        row.principal_amount + row.interest_amount
                    );
                }
            }
        }
    }
}
