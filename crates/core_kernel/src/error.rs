//! The shared error taxonomy for ledger operations
//!
//! Every public operation in the ledger core returns `Result<_, LedgerError>`
//! rather than panicking or raising across the caller boundary. The message
//! carried by a failure is expected to be shown to the operator verbatim.

use thiserror::Error;

/// Errors surfaced by the journal and debt domains
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Input rejected before anything was written (unbalanced journal,
    /// missing required field)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced account, installment, or debt does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The operation conflicts with existing data (duplicate entry number
    /// after exhausting retries, schedule already exists, delete refused,
    /// installment already paid)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Post-write verification detected a line-count or balance mismatch.
    /// Terminal for the call; the write was rolled back.
    #[error("Consistency error: {0}")]
    Consistency(String),

    /// No authenticated acting principal was available
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// An underlying datastore or network failure, wrapped with the
    /// original message
    #[error("External call failed: {0}")]
    External(String),
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        LedgerError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        LedgerError::Conflict(message.into())
    }

    pub fn consistency(message: impl Into<String>) -> Self {
        LedgerError::Consistency(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        LedgerError::Unauthorized(message.into())
    }

    pub fn external(message: impl std::fmt::Display) -> Self {
        LedgerError::External(message.to_string())
    }

    /// Returns true if this failure indicates the entity was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::NotFound(_))
    }

    /// Returns true if this failure is a conflict with existing data
    pub fn is_conflict(&self) -> bool {
        matches!(self, LedgerError::Conflict(_))
    }
}
