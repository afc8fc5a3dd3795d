//! Strongly-typed identifiers for ledger entities
//!
//! Using newtype wrappers around UUIDs provides type safety and prevents
//! accidental mixing of different identifier types (a `PayableId` can never
//! be passed where an `InstallmentId` is expected).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates a new time-ordered identifier (v7)
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Strip prefix if present
                let uuid_str = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

// Chart of accounts / tenancy
define_id!(AccountId, "ACC");
define_id!(BranchId, "BRN");
define_id!(UserId, "USR");

// Journal domain identifiers
define_id!(JournalEntryId, "JNL");
define_id!(JournalLineId, "JLN");

// Debt domain identifiers
define_id!(PayableId, "PAYB");
define_id!(InstallmentId, "INST");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_journal_entry_id_display() {
        let id = JournalEntryId::new();
        let display = id.to_string();
        assert!(display.starts_with("JNL-"));
    }

    #[test]
    fn test_id_parsing_round_trip() {
        let original = PayableId::new();
        let parsed: PayableId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_id_parsing_without_prefix() {
        let uuid = Uuid::new_v4();
        let parsed: AccountId = uuid.to_string().parse().unwrap();
        assert_eq!(parsed, AccountId::from(uuid));
    }

    #[test]
    fn test_uuid_conversion() {
        let uuid = Uuid::new_v4();
        let branch_id = BranchId::from(uuid);
        let back: Uuid = branch_id.into();
        assert_eq!(uuid, back);
    }

    #[test]
    fn test_v7_ids_are_time_ordered() {
        let a = InstallmentId::new_v7();
        let b = InstallmentId::new_v7();
        assert!(a.as_uuid() <= b.as_uuid());
    }
}
