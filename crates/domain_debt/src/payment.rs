//! Installment payment processor
//!
//! Settles one installment: the installment row, the parent payable's
//! running totals, and the journal entry recording the cash movement are
//! written inside a single transaction, so a failure anywhere leaves no
//! half-paid state behind.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use core_kernel::{BranchId, InstallmentId, JournalEntryId, LedgerError, PayableId};
use domain_journal::{AccountResolver, CreateJournalEntry, EntryLines, PostingEngine, ReferenceType};
use infra_db::{DatabaseError, DebtRepository, InstallmentRow};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Lifecycle state of the parent payable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayableStatus {
    Open,
    Partial,
    Paid,
}

impl PayableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayableStatus::Open => "open",
            PayableStatus::Partial => "partial",
            PayableStatus::Paid => "paid",
        }
    }
}

/// Input to [`PaymentProcessor::pay`]
#[derive(Debug, Clone)]
pub struct PayInstallment {
    pub installment_id: InstallmentId,
    /// Cash or bank account the payment leaves from
    pub payment_account_id: Uuid,
    /// Liability account carrying the payable
    pub liability_account_id: Uuid,
    pub branch_id: BranchId,
    pub notes: Option<String>,
}

/// What a successful payment settled
#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub installment_id: InstallmentId,
    pub debt_id: PayableId,
    pub journal_id: JournalEntryId,
    pub paid_amount: Decimal,
    pub payable_status: PayableStatus,
}

/// Aggregated view over non-paid installments
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstallmentSummary {
    pub total_pending: Decimal,
    pub total_overdue: Decimal,
    pub next_due_date: Option<NaiveDate>,
    pub next_due_amount: Option<Decimal>,
}

/// Settles installments and keeps the payable and journal in step
pub struct PaymentProcessor {
    debts: DebtRepository,
    resolver: Arc<AccountResolver>,
    posting: Arc<PostingEngine>,
}

impl PaymentProcessor {
    pub fn new(
        debts: DebtRepository,
        resolver: Arc<AccountResolver>,
        posting: Arc<PostingEngine>,
    ) -> Self {
        Self {
            debts,
            resolver,
            posting,
        }
    }

    /// Pays one installment in full
    ///
    /// The installment and its parent payable are row-locked for the
    /// duration; paying an already-paid installment is a `Conflict`. The
    /// journal entry is posted on the same connection, so either all three
    /// writes commit or none do.
    pub async fn pay(&self, req: &PayInstallment) -> Result<PaymentReceipt, LedgerError> {
        let liability = self
            .resolver
            .resolve_by_id(req.liability_account_id)
            .await?
            .ok_or_else(|| {
                LedgerError::not_found(format!(
                    "Liability account {} not found or not posting-eligible",
                    req.liability_account_id
                ))
            })?;
        let payment_account = self
            .resolver
            .resolve_by_id(req.payment_account_id)
            .await?
            .ok_or_else(|| {
                LedgerError::not_found(format!(
                    "Payment account {} not found or not posting-eligible",
                    req.payment_account_id
                ))
            })?;

        let mut tx = self
            .debts
            .pool()
            .begin()
            .await
            .map_err(|e| DatabaseError::from(e).into_ledger())?;

        let installment = self
            .debts
            .installment_for_update(&mut tx, req.installment_id.as_uuid())
            .await
            .map_err(|e| e.into_ledger())?
            .ok_or_else(|| {
                LedgerError::not_found(format!("Installment {} not found", req.installment_id))
            })?;

        if installment.status == "paid" {
            return Err(LedgerError::conflict(format!(
                "Installment #{} is already paid",
                installment.installment_number
            )));
        }

        let payable = self
            .debts
            .payable_for_update(&mut tx, installment.debt_id)
            .await
            .map_err(|e| e.into_ledger())?
            .ok_or_else(|| {
                LedgerError::not_found(format!("Debt {} not found", installment.debt_id))
            })?;

        let now = Utc::now();
        let amount = installment.total_amount;

        self.debts
            .mark_installment_paid(
                &mut tx,
                installment.id,
                now,
                amount,
                req.payment_account_id,
                req.notes.as_deref(),
            )
            .await
            .map_err(|e| e.into_ledger())?;

        let new_paid = payable.paid_amount + amount;
        let status = if new_paid >= payable.amount {
            PayableStatus::Paid
        } else {
            PayableStatus::Partial
        };
        let payable_paid_at = (status == PayableStatus::Paid).then_some(now);

        self.debts
            .update_payable_payment(
                &mut tx,
                payable.id,
                new_paid,
                status.as_str(),
                payable_paid_at,
            )
            .await
            .map_err(|e| e.into_ledger())?;

        let memo = format!(
            "Angsuran #{} - {}",
            installment.installment_number, payable.supplier_name
        );
        let entry = CreateJournalEntry {
            entry_date: now.date_naive(),
            description: memo.clone(),
            reference_type: ReferenceType::Payable,
            reference_id: Some(payable.id),
            branch_id: req.branch_id,
            lines: EntryLines::new()
                .debit(&liability, amount, memo.clone())
                .credit(&payment_account, amount, memo)
                .build(),
            auto_post: true,
            request_id: None,
        };

        let journal_id = self.posting.post_on(&mut tx, &entry).await?;

        tx.commit()
            .await
            .map_err(|e| DatabaseError::from(e).into_ledger())?;

        info!(
            installment_id = %req.installment_id,
            debt_id = %payable.id,
            %journal_id,
            paid_amount = %amount,
            payable_status = status.as_str(),
            "installment paid"
        );

        Ok(PaymentReceipt {
            installment_id: req.installment_id,
            debt_id: PayableId::from_uuid(payable.id),
            journal_id,
            paid_amount: amount,
            payable_status: status,
        })
    }

    /// Deletes an unpaid schedule and clears the payable's tenor
    ///
    /// Refuses (`Conflict`) if any installment of the debt is already paid.
    pub async fn delete(&self, debt_id: PayableId) -> Result<u64, LedgerError> {
        let mut tx = self
            .debts
            .pool()
            .begin()
            .await
            .map_err(|e| DatabaseError::from(e).into_ledger())?;

        if self
            .debts
            .has_paid_installments(&mut tx, debt_id.as_uuid())
            .await
            .map_err(|e| e.into_ledger())?
        {
            return Err(LedgerError::conflict(format!(
                "Schedule for debt {} has paid installments and cannot be deleted",
                debt_id
            )));
        }

        let removed = self
            .debts
            .delete_installments(&mut tx, debt_id.as_uuid())
            .await
            .map_err(|e| e.into_ledger())?;
        self.debts
            .set_tenor(&mut tx, debt_id.as_uuid(), None)
            .await
            .map_err(|e| e.into_ledger())?;

        tx.commit()
            .await
            .map_err(|e| DatabaseError::from(e).into_ledger())?;

        info!(%debt_id, removed, "installment schedule deleted");
        Ok(removed)
    }

    /// Flags every pending installment past its due date as overdue
    ///
    /// Returns the number of rows changed. Invoked by an external job, not
    /// by anything inside the core.
    pub async fn mark_overdue(&self) -> Result<u64, LedgerError> {
        let changed = self
            .debts
            .mark_overdue(Utc::now().date_naive())
            .await
            .map_err(|e| e.into_ledger())?;

        if changed > 0 {
            info!(changed, "installments marked overdue");
        }
        Ok(changed)
    }

    /// Totals over non-paid installments, optionally scoped to a branch
    pub async fn summarize(
        &self,
        branch_id: Option<BranchId>,
    ) -> Result<InstallmentSummary, LedgerError> {
        let rows = self
            .debts
            .unpaid_installments(branch_id.map(|b| b.as_uuid()))
            .await
            .map_err(|e| e.into_ledger())?;

        Ok(summarize_rows(&rows))
    }

    /// Full schedule for a debt, in installment order
    pub async fn installments_of(
        &self,
        debt_id: PayableId,
    ) -> Result<Vec<InstallmentRow>, LedgerError> {
        self.debts
            .installments_of(debt_id.as_uuid())
            .await
            .map_err(|e| e.into_ledger())
    }
}

/// Folds unpaid installment rows (already ordered by due date) into the
/// summary view
fn summarize_rows(rows: &[InstallmentRow]) -> InstallmentSummary {
    let mut summary = InstallmentSummary {
        total_pending: Decimal::ZERO,
        total_overdue: Decimal::ZERO,
        next_due_date: None,
        next_due_amount: None,
    };

    for row in rows {
        match row.status.as_str() {
            "pending" => {
                summary.total_pending += row.total_amount;
                if summary.next_due_date.is_none() {
                    summary.next_due_date = Some(row.due_date);
                    summary.next_due_amount = Some(row.total_amount);
                }
            }
            "overdue" => summary.total_overdue += row.total_amount,
            _ => {}
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(number: i32, status: &str, due: NaiveDate, total: Decimal) -> InstallmentRow {
        InstallmentRow {
            id: Uuid::new_v4(),
            debt_id: Uuid::new_v4(),
            installment_number: number,
            due_date: due,
            principal_amount: total,
            interest_amount: Decimal::ZERO,
            total_amount: total,
            status: status.to_string(),
            paid_at: None,
            paid_amount: None,
            payment_account_id: None,
            notes: None,
            branch_id: Uuid::new_v4(),
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn summary_splits_pending_and_overdue_totals() {
        let rows = vec![
            row(1, "overdue", d(2026, 7, 15), dec!(112000)),
            row(2, "pending", d(2026, 9, 15), dec!(112000)),
            row(3, "pending", d(2026, 10, 15), dec!(112000)),
        ];

        let summary = summarize_rows(&rows);
        assert_eq!(summary.total_pending, dec!(224000));
        assert_eq!(summary.total_overdue, dec!(112000));
    }

    #[test]
    fn next_due_comes_from_the_earliest_pending_row() {
        let rows = vec![
            row(1, "overdue", d(2026, 7, 15), dec!(100000)),
            row(2, "pending", d(2026, 9, 15), dec!(112000)),
            row(3, "pending", d(2026, 10, 15), dec!(113000)),
        ];

        let summary = summarize_rows(&rows);
        assert_eq!(summary.next_due_date, Some(d(2026, 9, 15)));
        assert_eq!(summary.next_due_amount, Some(dec!(112000)));
    }

    #[test]
    fn empty_schedule_summarizes_to_zero() {
        let summary = summarize_rows(&[]);
        assert_eq!(summary.total_pending, Decimal::ZERO);
        assert_eq!(summary.total_overdue, Decimal::ZERO);
        assert_eq!(summary.next_due_date, None);
        assert_eq!(summary.next_due_amount, None);
    }

    #[test]
    fn payable_status_strings_match_the_datastore() {
        assert_eq!(PayableStatus::Open.as_str(), "open");
        assert_eq!(PayableStatus::Partial.as_str(), "partial");
        assert_eq!(PayableStatus::Paid.as_str(), "paid");
    }
}
