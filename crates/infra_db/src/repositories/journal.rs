//! Journal repository
//!
//! Database access for journal entry headers and their lines. Header and
//! line inserts take `&mut PgConnection` so the posting engine can span one
//! transaction over the whole write (and the payment processor can span one
//! over the journal plus the debt aggregates).

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::DatabaseError;

/// Repository for journal entries and their lines
#[derive(Debug, Clone)]
pub struct JournalRepository {
    pool: PgPool,
}

/// Data for inserting a new journal entry header
#[derive(Debug, Clone)]
pub struct NewJournalEntry {
    pub id: Uuid,
    pub entry_number: String,
    pub entry_date: NaiveDate,
    pub description: String,
    pub reference_type: String,
    pub reference_id: Option<Uuid>,
    pub status: String,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub branch_id: Uuid,
    pub created_by: Uuid,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub request_id: Option<Uuid>,
}

/// Data for inserting a new journal line
#[derive(Debug, Clone)]
pub struct NewJournalLine {
    pub account_id: Uuid,
    pub account_code: String,
    pub account_name: String,
    pub debit_amount: Decimal,
    pub credit_amount: Decimal,
    pub description: String,
}

/// Database row for a journal entry header
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JournalEntryRow {
    pub id: Uuid,
    pub entry_number: String,
    pub entry_date: NaiveDate,
    pub description: String,
    pub reference_type: String,
    pub reference_id: Option<Uuid>,
    pub status: String,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub branch_id: Uuid,
    pub created_by: Uuid,
    pub is_voided: bool,
    pub created_at: DateTime<Utc>,
}

/// Database row for a journal line
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JournalLineRow {
    pub id: Uuid,
    pub journal_entry_id: Uuid,
    pub line_number: i32,
    pub account_id: Uuid,
    pub account_code: String,
    pub account_name: String,
    pub debit_amount: Decimal,
    pub credit_amount: Decimal,
    pub description: String,
}

/// Aggregate read-back of an entry's persisted lines
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct LineSummary {
    pub line_count: i64,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
}

const ENTRY_COLUMNS: &str = "id, entry_number, entry_date, description, reference_type, \
     reference_id, status, total_debit, total_credit, branch_id, created_by, is_voided, \
     created_at";

const LINE_COLUMNS: &str = "id, journal_entry_id, line_number, account_id, account_code, \
     account_name, debit_amount, credit_amount, description";

impl JournalRepository {
    /// Creates a new JournalRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool, for callers that open their own
    /// transactions around the conn-based methods
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Looks up an already-written entry by its idempotency key
    pub async fn find_id_by_request(
        &self,
        conn: &mut PgConnection,
        request_id: Uuid,
    ) -> Result<Option<Uuid>, DatabaseError> {
        let id: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM journal_entries WHERE request_id = $1")
                .bind(request_id)
                .fetch_optional(&mut *conn)
                .await?;

        Ok(id.map(|(id,)| id))
    }

    /// Returns the highest entry number matching `prefix` within a branch
    ///
    /// Entry numbers are zero-padded, so lexicographic DESC ordering yields
    /// the highest daily sequence.
    pub async fn last_entry_number(
        &self,
        conn: &mut PgConnection,
        branch_id: Uuid,
        prefix: &str,
    ) -> Result<Option<String>, DatabaseError> {
        let like = format!("{}%", prefix);
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT entry_number FROM journal_entries \
             WHERE branch_id = $1 AND entry_number LIKE $2 \
             ORDER BY entry_number DESC LIMIT 1",
        )
        .bind(branch_id)
        .bind(&like)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.map(|(n,)| n))
    }

    /// Inserts a journal entry header
    pub async fn insert_entry(
        &self,
        conn: &mut PgConnection,
        entry: &NewJournalEntry,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO journal_entries ( \
                id, entry_number, entry_date, description, reference_type, reference_id, \
                status, total_debit, total_credit, branch_id, created_by, approved_by, \
                approved_at, request_id \
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(entry.id)
        .bind(&entry.entry_number)
        .bind(entry.entry_date)
        .bind(&entry.description)
        .bind(&entry.reference_type)
        .bind(entry.reference_id)
        .bind(&entry.status)
        .bind(entry.total_debit)
        .bind(entry.total_credit)
        .bind(entry.branch_id)
        .bind(entry.created_by)
        .bind(entry.approved_by)
        .bind(entry.approved_at)
        .bind(entry.request_id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts the lines of an entry, preserving 1-based contiguous
    /// line numbers in input order
    pub async fn insert_lines(
        &self,
        conn: &mut PgConnection,
        journal_entry_id: Uuid,
        lines: &[NewJournalLine],
    ) -> Result<(), DatabaseError> {
        for (index, line) in lines.iter().enumerate() {
            sqlx::query(
                "INSERT INTO journal_entry_lines ( \
                    id, journal_entry_id, line_number, account_id, account_code, \
                    account_name, debit_amount, credit_amount, description \
                 ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(Uuid::new_v4())
            .bind(journal_entry_id)
            .bind(index as i32 + 1)
            .bind(line.account_id)
            .bind(&line.account_code)
            .bind(&line.account_name)
            .bind(line.debit_amount)
            .bind(line.credit_amount)
            .bind(&line.description)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Re-reads the persisted lines of an entry as count plus debit/credit
    /// sums, for post-write verification
    pub async fn line_summary(
        &self,
        conn: &mut PgConnection,
        journal_entry_id: Uuid,
    ) -> Result<LineSummary, DatabaseError> {
        let summary = sqlx::query_as::<_, LineSummary>(
            "SELECT COUNT(*) AS line_count, \
                    COALESCE(SUM(debit_amount), 0) AS total_debit, \
                    COALESCE(SUM(credit_amount), 0) AS total_credit \
             FROM journal_entry_lines WHERE journal_entry_id = $1",
        )
        .bind(journal_entry_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(summary)
    }

    /// Fetches an entry header by id
    pub async fn entry_by_id(&self, id: Uuid) -> Result<Option<JournalEntryRow>, DatabaseError> {
        let row = sqlx::query_as::<_, JournalEntryRow>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM journal_entries WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Retrieves journal entries for an originating business record
    pub async fn find_by_reference(
        &self,
        reference_type: &str,
        reference_id: Uuid,
    ) -> Result<Vec<JournalEntryRow>, DatabaseError> {
        let entries = sqlx::query_as::<_, JournalEntryRow>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM journal_entries \
             WHERE reference_type = $1 AND reference_id = $2 \
             ORDER BY entry_date DESC, created_at DESC"
        ))
        .bind(reference_type)
        .bind(reference_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Retrieves all lines for a journal entry, in line order
    pub async fn lines_of(
        &self,
        journal_entry_id: Uuid,
    ) -> Result<Vec<JournalLineRow>, DatabaseError> {
        let lines = sqlx::query_as::<_, JournalLineRow>(&format!(
            "SELECT {LINE_COLUMNS} FROM journal_entry_lines \
             WHERE journal_entry_id = $1 ORDER BY line_number"
        ))
        .bind(journal_entry_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Derived balance of an account: debits minus credits over posted,
    /// non-voided entries
    ///
    /// The ledger never maintains a running balance column; this sum is the
    /// only balance there is.
    pub async fn account_balance(&self, account_id: Uuid) -> Result<Decimal, DatabaseError> {
        let (balance,): (Decimal,) = sqlx::query_as(
            "SELECT COALESCE(SUM(l.debit_amount - l.credit_amount), 0) \
             FROM journal_entry_lines l \
             JOIN journal_entries e ON e.id = l.journal_entry_id \
             WHERE l.account_id = $1 AND e.status = 'posted' AND NOT e.is_voided",
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(balance)
    }

    /// Flags an entry as voided
    pub async fn mark_voided(
        &self,
        id: Uuid,
        reason: &str,
        voided_by: Uuid,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            "UPDATE journal_entries \
             SET is_voided = TRUE, void_reason = $2, voided_by = $3, voided_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(reason)
        .bind(voided_by)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
