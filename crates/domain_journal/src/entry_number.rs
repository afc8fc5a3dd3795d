//! Entry number generation
//!
//! Entry numbers are human-facing: `JE-<yyyymmdd>-NNNN-mmm`, a per-day,
//! per-branch sequence with a millisecond disambiguator. The generator is
//! best-effort only; real uniqueness comes from the database constraint on
//! `(branch_id, entry_number)` and the posting engine's retry.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use core_kernel::{BranchId, LedgerError};
use infra_db::JournalRepository;
use sqlx::PgConnection;

/// Width of the zero-padded daily sequence
///
/// Past 9999 entries in one day the sequence widens beyond the pad, and the
/// lexicographic max-number query stops advancing past the four-digit rows,
/// so every later entry that day carries sequence 10000 and is kept unique
/// only by the millisecond disambiguator and the database constraint.
const SEQUENCE_WIDTH: usize = 4;

/// Source of candidate entry numbers
///
/// A trait seam so tests can force the collision path the posting engine
/// retries through.
#[async_trait]
pub trait EntryNumberSource: Send + Sync {
    async fn next(
        &self,
        conn: &mut PgConnection,
        branch_id: BranchId,
    ) -> Result<String, LedgerError>;
}

/// The production source: daily prefix, max-suffix query, increment
pub struct DailySequence {
    repo: JournalRepository,
}

impl DailySequence {
    pub fn new(repo: JournalRepository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl EntryNumberSource for DailySequence {
    async fn next(
        &self,
        conn: &mut PgConnection,
        branch_id: BranchId,
    ) -> Result<String, LedgerError> {
        let now = Utc::now();
        let prefix = daily_prefix(now.date_naive());

        let last = self
            .repo
            .last_entry_number(conn, branch_id.as_uuid(), &prefix)
            .await
            .map_err(|e| e.into_ledger())?;

        let sequence = next_sequence(last.as_deref());
        Ok(compose(&prefix, sequence, now.timestamp_subsec_millis()))
    }
}

/// Prefix shared by every entry posted on `date`: `JE-<yyyymmdd>-`
pub fn daily_prefix(date: NaiveDate) -> String {
    format!("JE-{}-", date.format("%Y%m%d"))
}

/// Next sequence given the highest existing entry number for the prefix
///
/// An unparseable suffix restarts the day at 1 rather than failing the
/// posting.
pub fn next_sequence(last_entry_number: Option<&str>) -> u32 {
    last_entry_number
        .and_then(|number| number.split('-').nth(2))
        .and_then(|seq| seq.parse::<u32>().ok())
        .map_or(1, |seq| seq + 1)
}

/// Assembles the full entry number from its parts
pub fn compose(prefix: &str, sequence: u32, millis: u32) -> String {
    format!("{prefix}{sequence:0width$}-{millis:03}", width = SEQUENCE_WIDTH)
}
