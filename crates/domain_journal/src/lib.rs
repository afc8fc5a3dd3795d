//! Journal domain - the double-entry posting engine and its collaborators
//!
//! This crate records every financial event as a balanced journal entry:
//!
//! - [`resolver::AccountResolver`] looks up posting-eligible accounts by
//!   code (cached, TTL-bounded) or - for diagnostics only - by fuzzy pattern.
//! - [`entry_number`] produces the per-day human-readable entry numbers;
//!   uniqueness is ultimately enforced by the datastore constraint plus the
//!   engine's bounded retry.
//! - [`posting::PostingEngine`] validates balance, writes header and lines
//!   in one transaction keyed by an optional idempotency id, verifies the
//!   persisted lines, and exposes voiding and the read side.
//!
//! Posted entries are append-only history: corrections are new entries or a
//! void flag, never in-place edits.

pub mod entry_number;
pub mod model;
pub mod posting;
pub mod resolver;

pub use entry_number::{DailySequence, EntryNumberSource};
pub use model::{
    AccountType, CreateJournalEntry, EntryLines, EntryStatus, JournalLine, ReferenceType,
};
pub use posting::PostingEngine;
pub use resolver::{AccountResolver, ResolvedAccount};
