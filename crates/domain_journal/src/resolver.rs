//! Account resolver
//!
//! Posting rules refer to accounts by code; this resolver turns a code into
//! a posting-eligible account, caching hits for a short window because the
//! same handful of codes is resolved on every posting. The fuzzy pattern
//! lookup exists for diagnostics and backfills only and is never consulted
//! on the posting path.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use core_kernel::{BranchId, LedgerError};
use infra_db::{AccountRepository, AccountRow};
use tracing::debug;
use uuid::Uuid;

use crate::model::AccountType;

/// Default lifetime of a cached code lookup
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

/// An account eligible to receive postings
///
/// Carries exactly the fields a journal line snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAccount {
    pub id: Uuid,
    pub code: String,
    pub name: String,
}

impl From<AccountRow> for ResolvedAccount {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            name: row.name,
        }
    }
}

struct CachedAccount {
    account: ResolvedAccount,
    fetched_at: Instant,
}

/// Branch-scoped account lookups with a TTL-bounded cache over code hits
pub struct AccountResolver {
    repo: AccountRepository,
    cache: RwLock<HashMap<(Uuid, String), CachedAccount>>,
    ttl: Duration,
}

impl AccountResolver {
    pub fn new(repo: AccountRepository) -> Self {
        Self::with_ttl(repo, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(repo: AccountRepository, ttl: Duration) -> Self {
        Self {
            repo,
            cache: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Resolves an active, non-header account by exact code within a branch
    ///
    /// Missing, inactive, and header accounts all resolve to `Ok(None)`;
    /// callers distinguish nothing beyond presence. Hits are cached per
    /// `(branch, code)` until the TTL lapses or [`clear`](Self::clear) runs.
    pub async fn resolve_by_code(
        &self,
        code: &str,
        branch_id: BranchId,
    ) -> Result<Option<ResolvedAccount>, LedgerError> {
        let key = (branch_id.as_uuid(), code.to_string());

        if let Some(hit) = self.cached(&key) {
            return Ok(Some(hit));
        }

        let row = self
            .repo
            .find_by_code(code, branch_id.as_uuid())
            .await
            .map_err(|e| e.into_ledger())?;

        Ok(match row {
            Some(row) => {
                let account = ResolvedAccount::from(row);
                self.remember(key, account.clone());
                Some(account)
            }
            None => None,
        })
    }

    /// Resolves an account by id, for callers that already hold a reference
    /// and need the code/name snapshot
    ///
    /// Applies the same eligibility filters as the code lookup. Not cached.
    pub async fn resolve_by_id(
        &self,
        account_id: Uuid,
    ) -> Result<Option<ResolvedAccount>, LedgerError> {
        let row = self
            .repo
            .find_by_id(account_id)
            .await
            .map_err(|e| e.into_ledger())?;

        Ok(row.map(ResolvedAccount::from))
    }

    /// Fuzzy fallback: substring match on code or name among accounts of the
    /// given type, with the type expanded to its English and Indonesian
    /// labels
    ///
    /// When several accounts match, which one comes back is up to the
    /// database. Diagnostic use only; posting rules must configure explicit
    /// codes. Not cached.
    pub async fn resolve_by_pattern(
        &self,
        pattern: &str,
        account_type: AccountType,
        branch_id: BranchId,
    ) -> Result<Option<ResolvedAccount>, LedgerError> {
        let type_names = account_type.search_synonyms();
        let row = self
            .repo
            .search(pattern, &type_names, branch_id.as_uuid())
            .await
            .map_err(|e| e.into_ledger())?;

        if let Some(ref row) = row {
            debug!(
                pattern,
                account_type = %account_type,
                code = %row.code,
                "pattern lookup matched an account"
            );
        }

        Ok(row.map(ResolvedAccount::from))
    }

    /// Drops every cached lookup; called after external account-management
    /// events (rename, deactivation) so stale snapshots stop being served
    pub fn clear(&self) {
        self.cache.write().expect("account cache poisoned").clear();
    }

    fn cached(&self, key: &(Uuid, String)) -> Option<ResolvedAccount> {
        let cache = self.cache.read().expect("account cache poisoned");
        cache
            .get(key)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.account.clone())
    }

    fn remember(&self, key: (Uuid, String), account: ResolvedAccount) {
        let mut cache = self.cache.write().expect("account cache poisoned");
        cache.insert(
            key,
            CachedAccount {
                account,
                fetched_at: Instant::now(),
            },
        );
    }
}
