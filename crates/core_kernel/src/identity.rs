//! Acting-principal port
//!
//! The posting engine refuses to write a journal entry without an
//! authenticated principal. Session management itself lives outside the
//! ledger core; this trait is the seam through which the surrounding
//! application supplies the current user.

use crate::identifiers::UserId;

/// Supplies the identifier of the acting principal for the current request
pub trait IdentityProvider: Send + Sync {
    /// Returns the current user, or `None` when no one is authenticated
    fn current_user(&self) -> Option<UserId>;
}

/// Identity provider backed by a fixed user id
///
/// Useful for batch jobs that act as a system user, and for tests.
#[derive(Debug, Clone)]
pub struct StaticIdentity(Option<UserId>);

impl StaticIdentity {
    /// Always reports `user` as the acting principal
    pub fn user(user: UserId) -> Self {
        Self(Some(user))
    }

    /// Reports no authenticated principal
    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<UserId> {
        self.0
    }
}
