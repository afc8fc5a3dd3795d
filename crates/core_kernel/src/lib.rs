//! Core Kernel - Foundational types and utilities for the ledger core
//!
//! This crate provides the fundamental building blocks used across the
//! journal and debt domains:
//! - Strongly-typed identifiers
//! - Decimal rounding and balance helpers for monetary amounts
//! - Month arithmetic for repayment schedules
//! - The shared error taxonomy returned by every public ledger operation
//! - The acting-principal port consumed by the posting engine

pub mod amounts;
pub mod error;
pub mod identifiers;
pub mod identity;
pub mod temporal;

pub use amounts::{even_split, is_balanced, round_unit, BALANCE_TOLERANCE};
pub use error::LedgerError;
pub use identifiers::{
    AccountId, BranchId, InstallmentId, JournalEntryId, JournalLineId, PayableId, UserId,
};
pub use identity::{IdentityProvider, StaticIdentity};
pub use temporal::months_after;
