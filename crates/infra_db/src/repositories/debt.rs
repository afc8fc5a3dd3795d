//! Debt repository
//!
//! Database access for the `accounts_payable` aggregate and its
//! `debt_installments` schedule rows. Methods used inside the payment
//! transaction take `&mut PgConnection` and lock the rows they read, so the
//! installment update, the payable update, and the journal posting commit
//! together.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::DatabaseError;

/// Repository for payables and their installment schedules
#[derive(Debug, Clone)]
pub struct DebtRepository {
    pool: PgPool,
}

/// Data for inserting one installment row of a new schedule
#[derive(Debug, Clone)]
pub struct NewInstallment {
    pub id: Uuid,
    pub debt_id: Uuid,
    pub installment_number: i32,
    pub due_date: NaiveDate,
    pub principal_amount: Decimal,
    pub interest_amount: Decimal,
    pub total_amount: Decimal,
    pub branch_id: Uuid,
}

/// Database row for an installment
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InstallmentRow {
    pub id: Uuid,
    pub debt_id: Uuid,
    pub installment_number: i32,
    pub due_date: NaiveDate,
    pub principal_amount: Decimal,
    pub interest_amount: Decimal,
    pub total_amount: Decimal,
    pub status: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub paid_amount: Option<Decimal>,
    pub payment_account_id: Option<Uuid>,
    pub notes: Option<String>,
    pub branch_id: Uuid,
}

/// Database row for the parent payable aggregate
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PayableRow {
    pub id: Uuid,
    pub supplier_name: String,
    pub amount: Decimal,
    pub paid_amount: Decimal,
    pub status: String,
    pub tenor_months: Option<i32>,
    pub branch_id: Uuid,
}

const INSTALLMENT_COLUMNS: &str = "id, debt_id, installment_number, due_date, \
     principal_amount, interest_amount, total_amount, status, paid_at, paid_amount, \
     payment_account_id, notes, branch_id";

const PAYABLE_COLUMNS: &str =
    "id, supplier_name, amount, paid_amount, status, tenor_months, branch_id";

impl DebtRepository {
    /// Creates a new DebtRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool, for callers that open their own
    /// transactions around the conn-based methods
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Returns true if any installment row exists for the debt
    pub async fn has_installments(
        &self,
        conn: &mut PgConnection,
        debt_id: Uuid,
    ) -> Result<bool, DatabaseError> {
        let row: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM debt_installments WHERE debt_id = $1 LIMIT 1")
                .bind(debt_id)
                .fetch_optional(&mut *conn)
                .await?;

        Ok(row.is_some())
    }

    /// Returns true if any installment for the debt is already paid
    pub async fn has_paid_installments(
        &self,
        conn: &mut PgConnection,
        debt_id: Uuid,
    ) -> Result<bool, DatabaseError> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM debt_installments WHERE debt_id = $1 AND status = 'paid' LIMIT 1",
        )
        .bind(debt_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.is_some())
    }

    /// Inserts a full schedule as one batch
    pub async fn insert_installments(
        &self,
        conn: &mut PgConnection,
        installments: &[NewInstallment],
    ) -> Result<(), DatabaseError> {
        for inst in installments {
            sqlx::query(
                "INSERT INTO debt_installments ( \
                    id, debt_id, installment_number, due_date, principal_amount, \
                    interest_amount, total_amount, status, branch_id \
                 ) VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8)",
            )
            .bind(inst.id)
            .bind(inst.debt_id)
            .bind(inst.installment_number)
            .bind(inst.due_date)
            .bind(inst.principal_amount)
            .bind(inst.interest_amount)
            .bind(inst.total_amount)
            .bind(inst.branch_id)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Sets or clears `tenor_months` on the parent payable
    pub async fn set_tenor(
        &self,
        conn: &mut PgConnection,
        debt_id: Uuid,
        tenor_months: Option<i32>,
    ) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE accounts_payable SET tenor_months = $2 WHERE id = $1")
            .bind(debt_id)
            .bind(tenor_months)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Fetches an installment and locks its row for the current transaction
    pub async fn installment_for_update(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<InstallmentRow>, DatabaseError> {
        let row = sqlx::query_as::<_, InstallmentRow>(&format!(
            "SELECT {INSTALLMENT_COLUMNS} FROM debt_installments WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row)
    }

    /// Fetches the parent payable and locks its row for the current
    /// transaction
    pub async fn payable_for_update(
        &self,
        conn: &mut PgConnection,
        debt_id: Uuid,
    ) -> Result<Option<PayableRow>, DatabaseError> {
        let row = sqlx::query_as::<_, PayableRow>(&format!(
            "SELECT {PAYABLE_COLUMNS} FROM accounts_payable WHERE id = $1 FOR UPDATE"
        ))
        .bind(debt_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row)
    }

    /// Marks an installment paid
    pub async fn mark_installment_paid(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        paid_at: DateTime<Utc>,
        paid_amount: Decimal,
        payment_account_id: Uuid,
        notes: Option<&str>,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            "UPDATE debt_installments \
             SET status = 'paid', paid_at = $2, paid_amount = $3, \
                 payment_account_id = $4, notes = $5 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(paid_at)
        .bind(paid_amount)
        .bind(payment_account_id)
        .bind(notes)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Updates the payable aggregate after an installment payment
    pub async fn update_payable_payment(
        &self,
        conn: &mut PgConnection,
        debt_id: Uuid,
        paid_amount: Decimal,
        status: &str,
        paid_at: Option<DateTime<Utc>>,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            "UPDATE accounts_payable \
             SET paid_amount = $2, status = $3, paid_at = $4 \
             WHERE id = $1",
        )
        .bind(debt_id)
        .bind(paid_amount)
        .bind(status)
        .bind(paid_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Deletes every installment row for a debt, returning the count removed
    pub async fn delete_installments(
        &self,
        conn: &mut PgConnection,
        debt_id: Uuid,
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM debt_installments WHERE debt_id = $1")
            .bind(debt_id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }

    /// Transitions every pending installment due strictly before `today`
    /// to overdue, returning the number of rows changed
    pub async fn mark_overdue(&self, today: NaiveDate) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "UPDATE debt_installments SET status = 'overdue' \
             WHERE status = 'pending' AND due_date < $1",
        )
        .bind(today)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// All non-paid (pending or overdue) installments, optionally scoped to
    /// a branch, ordered by due date
    pub async fn unpaid_installments(
        &self,
        branch_id: Option<Uuid>,
    ) -> Result<Vec<InstallmentRow>, DatabaseError> {
        let rows = match branch_id {
            Some(branch) => {
                sqlx::query_as::<_, InstallmentRow>(&format!(
                    "SELECT {INSTALLMENT_COLUMNS} FROM debt_installments \
                     WHERE status IN ('pending', 'overdue') AND branch_id = $1 \
                     ORDER BY due_date"
                ))
                .bind(branch)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, InstallmentRow>(&format!(
                    "SELECT {INSTALLMENT_COLUMNS} FROM debt_installments \
                     WHERE status IN ('pending', 'overdue') \
                     ORDER BY due_date"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows)
    }

    /// Full schedule for a debt, in installment order
    pub async fn installments_of(
        &self,
        debt_id: Uuid,
    ) -> Result<Vec<InstallmentRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, InstallmentRow>(&format!(
            "SELECT {INSTALLMENT_COLUMNS} FROM debt_installments \
             WHERE debt_id = $1 ORDER BY installment_number"
        ))
        .bind(debt_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
