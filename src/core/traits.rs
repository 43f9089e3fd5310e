//! Core traits for the account ledger and the movement log
//!
//! These traits are the storage seam of the engine. The in-memory store
//! implements both; other stores, and test doubles that inject faults, plug in
//! behind the same interfaces.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::row_locks::{RowGuard, RowLockTable};
use crate::types::{Account, AccountId, LedgerError, Movement, NewMovement, Page, TimeRange};

/// Trait for the current-balance store
///
/// Every balance write takes a `RowGuard`, so only a caller holding the
/// account's row lock can change its balance.
pub trait AccountLedger: Send + Sync {
    /// Close the store; every later call fails with `StorageUnavailable`
    fn close(&self);

    /// Row locks for the accounts in this ledger
    fn row_locks(&self) -> &RowLockTable;

    /// Create an account with a zero balance
    fn create(&self, name: &str, at: DateTime<Utc>) -> Result<Account, LedgerError>;

    /// Look up an account
    fn get(&self, account: AccountId) -> Result<Option<Account>, LedgerError>;

    /// All accounts ordered by ID
    fn list(&self) -> Result<Vec<Account>, LedgerError>;

    /// Return the locked account only if its balance covers `minimum`
    ///
    /// `None` covers both "missing" and "insufficient"; callers cannot tell
    /// them apart.
    fn get_for_update(
        &self,
        row: &RowGuard,
        minimum: Decimal,
    ) -> Result<Option<Account>, LedgerError>;

    /// Atomically apply `balance += delta`, rejecting negative results
    ///
    /// Returns the new balance. On rejection the balance is unchanged.
    fn adjust_balance(
        &self,
        row: &RowGuard,
        delta: Decimal,
        at: DateTime<Utc>,
    ) -> Result<Decimal, LedgerError>;

    /// Overwrite the balance, bypassing the delta check
    ///
    /// Reserved for administrative balance initialization. `balance` must not
    /// be negative.
    fn set_balance(
        &self,
        row: &RowGuard,
        balance: Decimal,
        at: DateTime<Utc>,
    ) -> Result<Decimal, LedgerError>;
}

/// Trait for the append-only movement log
pub trait MovementLog: Send + Sync {
    /// Close the store; every later call fails with `StorageUnavailable`
    fn close(&self);

    /// Append a movement, assigning its ID and creation time
    ///
    /// Rejects movements that reference no account, reference the same
    /// account on both sides or carry a non-positive amount.
    fn append(&self, movement: NewMovement, at: DateTime<Utc>) -> Result<Movement, LedgerError>;

    /// Movements referencing `account`, newest first
    fn list_for_account(&self, account: AccountId, page: Page)
        -> Result<Vec<Movement>, LedgerError>;

    /// Movements referencing `account` created within `range`, newest first
    fn list_for_account_in_range(
        &self,
        account: AccountId,
        range: TimeRange,
        page: Page,
    ) -> Result<Vec<Movement>, LedgerError>;

    /// Signed sum of the account's movements created at or before `at`
    fn balance_at(&self, account: AccountId, at: DateTime<Utc>) -> Result<Decimal, LedgerError>;

    /// Total deposited into minus total withdrawn from `accounts`
    ///
    /// Transfers move money between accounts and never count.
    fn external_net_flow(&self, accounts: &HashSet<AccountId>) -> Result<Decimal, LedgerError>;
}
