//! Journal posting engine
//!
//! The single write path for journal entries. An entry is validated, given
//! an entry number, and written (header plus lines) inside one transaction;
//! a caller-supplied request id makes the write idempotent across retries.
//! Before the transaction commits the engine re-reads the persisted lines
//! and refuses to commit a header whose lines do not match.

use std::sync::Arc;

use chrono::Utc;
use core_kernel::{is_balanced, IdentityProvider, JournalEntryId, LedgerError, UserId};
use infra_db::{
    DatabaseError, JournalEntryRow, JournalLineRow, JournalRepository, NewJournalEntry,
    NewJournalLine,
};
use rust_decimal::Decimal;
use sqlx::{Acquire, PgConnection};
use tracing::{info, warn};
use uuid::Uuid;

use crate::entry_number::{DailySequence, EntryNumberSource};
use crate::model::{CreateJournalEntry, EntryStatus, ReferenceType};

/// Attempts at allocating a unique entry number before giving up
const MAX_NUMBER_ATTEMPTS: u32 = 3;

/// The double-entry write path
pub struct PostingEngine {
    journal: JournalRepository,
    identity: Arc<dyn IdentityProvider>,
    numbers: Arc<dyn EntryNumberSource>,
}

impl PostingEngine {
    pub fn new(journal: JournalRepository, identity: Arc<dyn IdentityProvider>) -> Self {
        let numbers = Arc::new(DailySequence::new(journal.clone()));
        Self::with_number_source(journal, identity, numbers)
    }

    /// Constructor with an explicit number source, used to exercise the
    /// collision retry
    pub fn with_number_source(
        journal: JournalRepository,
        identity: Arc<dyn IdentityProvider>,
        numbers: Arc<dyn EntryNumberSource>,
    ) -> Self {
        Self {
            journal,
            identity,
            numbers,
        }
    }

    /// Posts a journal entry in its own transaction
    pub async fn post(&self, input: &CreateJournalEntry) -> Result<JournalEntryId, LedgerError> {
        let mut tx = self
            .journal
            .pool()
            .begin()
            .await
            .map_err(|e| DatabaseError::from(e).into_ledger())?;

        // Dropping the transaction on the error path rolls everything back.
        let entry_id = self.post_on(&mut tx, input).await?;

        tx.commit()
            .await
            .map_err(|e| DatabaseError::from(e).into_ledger())?;

        Ok(entry_id)
    }

    /// Posts a journal entry on a caller-owned connection
    ///
    /// Lets the payment processor span a single transaction across the debt
    /// aggregates and the journal. The caller owns commit and rollback; any
    /// `Err` from here means nothing of the entry may be kept.
    pub async fn post_on(
        &self,
        conn: &mut PgConnection,
        input: &CreateJournalEntry,
    ) -> Result<JournalEntryId, LedgerError> {
        if input.lines.is_empty() {
            return Err(LedgerError::validation("Journal entry has no lines"));
        }

        let total_debit: Decimal = input.lines.iter().map(|l| l.debit_amount).sum();
        let total_credit: Decimal = input.lines.iter().map(|l| l.credit_amount).sum();
        if !is_balanced(total_debit, total_credit) {
            return Err(LedgerError::validation(format!(
                "Journal out of balance: debit {}, credit {}",
                total_debit, total_credit
            )));
        }

        let principal = self
            .identity
            .current_user()
            .ok_or_else(|| LedgerError::unauthorized("No authenticated user"))?;

        if let Some(request_id) = input.request_id {
            if let Some(existing) = self
                .journal
                .find_id_by_request(conn, request_id)
                .await
                .map_err(|e| e.into_ledger())?
            {
                info!(%request_id, journal_id = %existing, "request already posted, returning existing entry");
                return Ok(JournalEntryId::from_uuid(existing));
            }
        }

        for attempt in 1..=MAX_NUMBER_ATTEMPTS {
            let entry_number = self.numbers.next(&mut *conn, input.branch_id).await?;

            // Savepoint, so a failed attempt does not poison the caller's
            // transaction.
            let mut savepoint = conn
                .begin()
                .await
                .map_err(|e| DatabaseError::from(e).into_ledger())?;

            let entry_id = JournalEntryId::new_v7();
            let write = self
                .write_entry(
                    &mut savepoint,
                    entry_id,
                    &entry_number,
                    input,
                    principal,
                    total_debit,
                    total_credit,
                )
                .await;

            match write {
                Ok(()) => {
                    let summary = self
                        .journal
                        .line_summary(&mut savepoint, entry_id.as_uuid())
                        .await
                        .map_err(|e| e.into_ledger())?;

                    if summary.line_count as usize != input.lines.len()
                        || !is_balanced(summary.total_debit, summary.total_credit)
                    {
                        return Err(LedgerError::consistency(format!(
                            "Persisted lines do not match input: {} lines written (expected {}), debit {}, credit {}",
                            summary.line_count,
                            input.lines.len(),
                            summary.total_debit,
                            summary.total_credit
                        )));
                    }

                    savepoint
                        .commit()
                        .await
                        .map_err(|e| DatabaseError::from(e).into_ledger())?;

                    info!(
                        journal_id = %entry_id,
                        %entry_number,
                        reference_type = %input.reference_type,
                        %total_debit,
                        "journal entry posted"
                    );
                    return Ok(entry_id);
                }
                Err(err) if err.is_unique_violation() => {
                    let message = err.to_string();
                    savepoint
                        .rollback()
                        .await
                        .map_err(|e| DatabaseError::from(e).into_ledger())?;

                    // A concurrent writer with the same request id won the
                    // race; hand back its entry.
                    if message.contains("request_id") {
                        if let Some(request_id) = input.request_id {
                            if let Some(existing) = self
                                .journal
                                .find_id_by_request(conn, request_id)
                                .await
                                .map_err(|e| e.into_ledger())?
                            {
                                return Ok(JournalEntryId::from_uuid(existing));
                            }
                        }
                        return Err(LedgerError::conflict(message));
                    }

                    warn!(attempt, %entry_number, "entry number already taken, retrying");
                }
                Err(err) => return Err(err.into_ledger()),
            }
        }

        Err(LedgerError::conflict(format!(
            "Could not allocate a unique entry number after {} attempts",
            MAX_NUMBER_ATTEMPTS
        )))
    }

    #[allow(clippy::too_many_arguments)]
    async fn write_entry(
        &self,
        conn: &mut PgConnection,
        entry_id: JournalEntryId,
        entry_number: &str,
        input: &CreateJournalEntry,
        principal: UserId,
        total_debit: Decimal,
        total_credit: Decimal,
    ) -> Result<(), DatabaseError> {
        let status = if input.auto_post {
            EntryStatus::Posted
        } else {
            EntryStatus::Draft
        };

        let entry = NewJournalEntry {
            id: entry_id.as_uuid(),
            entry_number: entry_number.to_string(),
            entry_date: input.entry_date,
            description: input.description.clone(),
            reference_type: input.reference_type.as_str().to_string(),
            reference_id: input.reference_id,
            status: status.as_str().to_string(),
            total_debit,
            total_credit,
            branch_id: input.branch_id.as_uuid(),
            created_by: principal.as_uuid(),
            approved_by: input.auto_post.then(|| principal.as_uuid()),
            approved_at: input.auto_post.then(Utc::now),
            request_id: input.request_id,
        };

        self.journal.insert_entry(&mut *conn, &entry).await?;

        let lines: Vec<NewJournalLine> = input
            .lines
            .iter()
            .map(|line| NewJournalLine {
                account_id: line.account_id,
                account_code: line.account_code.clone(),
                account_name: line.account_name.clone(),
                debit_amount: line.debit_amount,
                credit_amount: line.credit_amount,
                description: line.description.clone(),
            })
            .collect();

        self.journal
            .insert_lines(&mut *conn, entry_id.as_uuid(), &lines)
            .await?;

        Ok(())
    }

    /// Flags a posted entry as voided, taking it out of derived balances
    ///
    /// The entry itself stays in place as historical record.
    pub async fn void(&self, entry_id: JournalEntryId, reason: &str) -> Result<(), LedgerError> {
        if reason.trim().is_empty() {
            return Err(LedgerError::validation("Void reason must not be empty"));
        }

        let principal = self
            .identity
            .current_user()
            .ok_or_else(|| LedgerError::unauthorized("No authenticated user"))?;

        let entry = self
            .journal
            .entry_by_id(entry_id.as_uuid())
            .await
            .map_err(|e| e.into_ledger())?
            .ok_or_else(|| {
                LedgerError::not_found(format!("Journal entry {} not found", entry_id))
            })?;

        if entry.is_voided {
            return Err(LedgerError::conflict(format!(
                "Journal entry {} is already voided",
                entry.entry_number
            )));
        }
        if entry.status != EntryStatus::Posted.as_str() {
            return Err(LedgerError::conflict(format!(
                "Only posted entries can be voided, {} is {}",
                entry.entry_number, entry.status
            )));
        }

        self.journal
            .mark_voided(entry_id.as_uuid(), reason, principal.as_uuid())
            .await
            .map_err(|e| e.into_ledger())?;

        info!(journal_id = %entry_id, entry_number = %entry.entry_number, "journal entry voided");
        Ok(())
    }

    /// Entries recorded against an originating business record, newest first
    pub async fn find_by_reference(
        &self,
        reference_type: ReferenceType,
        reference_id: Uuid,
    ) -> Result<Vec<JournalEntryRow>, LedgerError> {
        self.journal
            .find_by_reference(reference_type.as_str(), reference_id)
            .await
            .map_err(|e| e.into_ledger())
    }

    /// Lines of an entry, in line order
    pub async fn lines_of(
        &self,
        entry_id: JournalEntryId,
    ) -> Result<Vec<JournalLineRow>, LedgerError> {
        self.journal
            .lines_of(entry_id.as_uuid())
            .await
            .map_err(|e| e.into_ledger())
    }

    /// Derived balance of an account: debit minus credit over posted,
    /// non-voided entries
    pub async fn account_balance(&self, account_id: Uuid) -> Result<Decimal, LedgerError> {
        self.journal
            .account_balance(account_id)
            .await
            .map_err(|e| e.into_ledger())
    }
}
