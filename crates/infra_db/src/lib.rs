//! Infrastructure Database Layer
//!
//! This crate provides PostgreSQL access for the ledger core using SQLx.
//! It follows the repository pattern: each repository owns the SQL for one
//! table family and exposes row types, hiding the database details from the
//! domain layer.
//!
//! Write-path methods that must participate in a caller-owned transaction
//! take `&mut PgConnection`; read-side convenience methods run on the pool.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, DatabaseConfig, JournalRepository};
//!
//! let pool = create_pool(DatabaseConfig::from_env()?).await?;
//! let journals = JournalRepository::new(pool);
//! ```

pub mod error;
pub mod pool;
pub mod repositories;

pub use error::DatabaseError;
pub use pool::{create_pool, create_pool_from_url, DatabaseConfig, DatabasePool};
pub use repositories::accounts::{AccountRepository, AccountRow};
pub use repositories::debt::{
    DebtRepository, InstallmentRow, NewInstallment, PayableRow,
};
pub use repositories::journal::{
    JournalEntryRow, JournalLineRow, JournalRepository, LineSummary, NewJournalEntry,
    NewJournalLine,
};
