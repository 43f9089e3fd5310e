//! In-memory account ledger
//!
//! This module provides `InMemoryAccountLedger`, the current-balance store of
//! the in-process storage engine.
//!
//! # Design
//!
//! Account rows live in a `DashMap`, so reads of different accounts never block
//! each other and each single-row read-modify-write runs under the shard lock
//! of its entry. Writers additionally hold the account's row lock from the
//! `RowLockTable`, acquired before the balance is inspected and released when
//! the enclosing operation ends.
//!
//! # Atomic Balance Updates
//!
//! `adjust_balance` checks `balance + delta >= 0` and writes the new balance
//! inside one `get_mut` on the map entry. There is no window between the check
//! and the write in which another writer could change the balance.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::debug;

use super::row_locks::{RowGuard, RowLockTable};
use super::traits::AccountLedger;
use crate::types::{Account, AccountId, LedgerError};

/// Thread-safe current-balance store
#[derive(Debug)]
pub struct InMemoryAccountLedger {
    /// Account rows by ID
    accounts: DashMap<AccountId, Account>,

    /// One row lock per account
    row_locks: RowLockTable,

    /// Next ID to hand out
    next_id: AtomicI64,

    /// Set once the store has been closed
    closed: AtomicBool,
}

impl InMemoryAccountLedger {
    /// Create a new empty ledger
    ///
    /// Account IDs are assigned sequentially starting at 1.
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            row_locks: RowLockTable::new(),
            next_id: AtomicI64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<(), LedgerError> {
        if self.is_closed() {
            return Err(LedgerError::storage_unavailable("account ledger is closed"));
        }
        Ok(())
    }
}

impl Default for InMemoryAccountLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountLedger for InMemoryAccountLedger {
    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn row_locks(&self) -> &RowLockTable {
        &self.row_locks
    }

    fn create(&self, name: &str, at: DateTime<Utc>) -> Result<Account, LedgerError> {
        self.ensure_open()?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let account = Account::new(id, name, at);

        // The row lock exists before the row becomes visible
        self.row_locks.register(id);
        self.accounts.insert(id, account.clone());

        Ok(account)
    }

    fn get(&self, account: AccountId) -> Result<Option<Account>, LedgerError> {
        self.ensure_open()?;
        Ok(self
            .accounts
            .get(&account)
            .map(|entry| entry.value().clone()))
    }

    fn list(&self) -> Result<Vec<Account>, LedgerError> {
        self.ensure_open()?;
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        accounts.sort_by_key(|account| account.id);
        Ok(accounts)
    }

    fn get_for_update(
        &self,
        row: &RowGuard,
        minimum: Decimal,
    ) -> Result<Option<Account>, LedgerError> {
        self.ensure_open()?;

        let account = row.account();
        match self.accounts.get(&account) {
            None => {
                debug!(account, reason = "not_found", "get_for_update rejected");
                Ok(None)
            }
            Some(entry) if entry.balance < minimum => {
                debug!(
                    account,
                    reason = "insufficient_funds",
                    "get_for_update rejected"
                );
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value().clone())),
        }
    }

    fn adjust_balance(
        &self,
        row: &RowGuard,
        delta: Decimal,
        at: DateTime<Utc>,
    ) -> Result<Decimal, LedgerError> {
        self.ensure_open()?;

        let account = row.account();
        let mut entry = self
            .accounts
            .get_mut(&account)
            .ok_or_else(|| LedgerError::account_not_found(account))?;

        let new_balance = entry
            .balance
            .checked_add(delta)
            .ok_or_else(|| LedgerError::arithmetic_overflow("adjust_balance", account))?;

        if new_balance < Decimal::ZERO {
            return Err(LedgerError::negative_balance(account, entry.balance, delta));
        }

        entry.balance = new_balance;
        entry.updated_at = at;
        Ok(new_balance)
    }

    fn set_balance(
        &self,
        row: &RowGuard,
        balance: Decimal,
        at: DateTime<Utc>,
    ) -> Result<Decimal, LedgerError> {
        self.ensure_open()?;

        let account = row.account();
        if balance < Decimal::ZERO {
            return Err(LedgerError::invalid_argument(format!(
                "balance of account {} cannot be set to negative {}",
                account, balance
            )));
        }

        let mut entry = self
            .accounts
            .get_mut(&account)
            .ok_or_else(|| LedgerError::account_not_found(account))?;
        entry.balance = balance;
        entry.updated_at = at;
        Ok(balance)
    }
}
