//! Chart-of-accounts repository
//!
//! Read-side lookups against the `accounts` table. Account administration is
//! handled elsewhere in the system; the ledger core only resolves accounts
//! that are eligible to receive postings, which is why every query here
//! filters on `is_active AND NOT is_header`.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Repository for posting-eligible account lookups
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

/// Database row for an account
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountRow {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub account_type: String,
    pub is_header: bool,
    pub is_active: bool,
    pub branch_id: Uuid,
}

const ACCOUNT_COLUMNS: &str = "id, code, name, account_type, is_header, is_active, branch_id";

impl AccountRepository {
    /// Creates a new AccountRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Finds an active, non-header account by exact code within a branch
    ///
    /// Missing, inactive, and header accounts all come back as `None`;
    /// callers only ever distinguish presence from absence.
    pub async fn find_by_code(
        &self,
        code: &str,
        branch_id: Uuid,
    ) -> Result<Option<AccountRow>, DatabaseError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts \
             WHERE code = $1 AND branch_id = $2 AND is_active AND NOT is_header"
        ))
        .bind(code)
        .bind(branch_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Finds an active, non-header account by id
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<AccountRow>, DatabaseError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts \
             WHERE id = $1 AND is_active AND NOT is_header"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Substring search across code and name, limited to the given account
    /// types within a branch
    ///
    /// Returns the first match the database produces; when multiple accounts
    /// match, which one wins is not deterministic. Diagnostic use only.
    pub async fn search(
        &self,
        pattern: &str,
        type_names: &[String],
        branch_id: Uuid,
    ) -> Result<Option<AccountRow>, DatabaseError> {
        let like = format!("%{}%", pattern);
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts \
             WHERE branch_id = $1 AND account_type = ANY($2) \
               AND is_active AND NOT is_header \
               AND (code ILIKE $3 OR name ILIKE $3) \
             LIMIT 1"
        ))
        .bind(branch_id)
        .bind(type_names)
        .bind(&like)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
