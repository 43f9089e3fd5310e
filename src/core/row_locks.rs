//! Row-level locks for account records
//!
//! Every account row owns one `tokio::sync::Mutex<()>`. A writer acquires the
//! locks for all rows it touches up front, in ascending account ID order, and
//! holds them until its `RowLocks` value is dropped.
//!
//! # Deadlock Freedom
//!
//! Two transfers moving money in opposite directions between the same pair of
//! accounts both request the lower ID first, so neither can hold one lock while
//! waiting on the other's.
//!
//! # Bounded Waits
//!
//! Each lock wait is capped by a timeout. On expiry every lock acquired so far
//! is released and `LedgerError::LockTimeout` is returned.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::types::{AccountId, LedgerError};

/// Table of per-account row locks
#[derive(Debug, Default)]
pub struct RowLockTable {
    /// One mutex per registered account
    ///
    /// Entries are cloned out of the map before awaiting so no shard lock is
    /// ever held across an `.await`.
    rows: DashMap<AccountId, Arc<Mutex<()>>>,
}

impl RowLockTable {
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
        }
    }

    /// Register the row lock for a newly created account
    pub fn register(&self, account: AccountId) {
        self.rows
            .entry(account)
            .or_insert_with(|| Arc::new(Mutex::new(())));
    }

    pub fn is_registered(&self, account: AccountId) -> bool {
        self.rows.contains_key(&account)
    }

    /// Acquire the row locks for `accounts` in ascending ID order
    ///
    /// Duplicate IDs are locked once. Accounts without a registered row are
    /// skipped; callers detect them through `RowLocks::guard` returning `None`.
    ///
    /// # Errors
    ///
    /// * `LedgerError::LockTimeout` - a lock was not granted within `timeout`;
    ///   locks acquired before it are released
    pub async fn acquire(
        &self,
        accounts: &[AccountId],
        timeout: Duration,
    ) -> Result<RowLocks, LedgerError> {
        let mut ordered = accounts.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        let mut guards = Vec::with_capacity(ordered.len());
        for account in ordered {
            let Some(row) = self.rows.get(&account).map(|row| Arc::clone(row.value())) else {
                debug!(account, "no row to lock");
                continue;
            };

            match tokio::time::timeout(timeout, row.lock_owned()).await {
                Ok(guard) => guards.push(RowGuard {
                    account,
                    _guard: guard,
                }),
                Err(_) => {
                    let waited_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
                    debug!(account, waited_ms, "row lock wait timed out");
                    return Err(LedgerError::lock_timeout(account, waited_ms));
                }
            }
        }

        Ok(RowLocks { guards })
    }
}

/// Proof that the caller holds the exclusive lock on one account row
#[derive(Debug)]
pub struct RowGuard {
    account: AccountId,
    _guard: OwnedMutexGuard<()>,
}

impl RowGuard {
    pub fn account(&self) -> AccountId {
        self.account
    }
}

/// Set of row locks held for the duration of one operation
///
/// Dropping it releases every lock.
#[derive(Debug)]
pub struct RowLocks {
    guards: Vec<RowGuard>,
}

impl RowLocks {
    /// Guard for `account`, if its row was locked
    pub fn guard(&self, account: AccountId) -> Option<&RowGuard> {
        self.guards.iter().find(|guard| guard.account == account)
    }

    /// Take over the locks held by `other`
    pub fn extend(&mut self, other: RowLocks) {
        self.guards.extend(other.guards);
    }

    /// Locked account IDs in acquisition order
    pub fn accounts(&self) -> Vec<AccountId> {
        self.guards.iter().map(RowGuard::account).collect()
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}
