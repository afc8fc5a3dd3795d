//! Repository implementations for the ledger tables

pub mod accounts;
pub mod debt;
pub mod journal;
