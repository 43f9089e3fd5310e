//! Error types for the ledger engine
//!
//! This module defines every error the engine can report to its caller.
//!
//! # Error Categories
//!
//! - **Rejected input**: non-positive amounts, same-account transfers, malformed
//!   timestamps. Reported before any storage access.
//! - **Lookup failures**: missing accounts, and the combined
//!   not-found-or-insufficient signal used when acquiring a source account.
//! - **Rejected mutations**: balance updates that would go negative or overflow.
//! - **Contention**: lock waits that exceeded the configured timeout. These are
//!   the only retryable errors.
//! - **Storage**: the backing store is closed or failing.
//!
//! A transfer whose balances were applied but whose movement could not be
//! logged is not an error; it is reported as `TransferOutcome::Degraded`.

use crate::types::AccountId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the ledger engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Caller-supplied value rejected before touching storage
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// What was wrong with the input
        message: String,
    },

    /// Account does not exist
    #[error("Account {account} not found")]
    AccountNotFound {
        /// The account that was looked up
        account: AccountId,
    },

    /// Source account is missing or cannot cover the requested amount
    ///
    /// The two cases are deliberately indistinguishable to the caller.
    #[error("Account {account} not found or has insufficient funds")]
    InsufficientFundsOrNotFound {
        /// The source account of the rejected operation
        account: AccountId,
    },

    /// Applying the delta would leave the balance below zero
    #[error("Balance of account {account} cannot go negative: balance {balance}, delta {delta}")]
    NegativeBalance {
        /// Account whose update was rejected
        account: AccountId,
        /// Balance at the time of the rejected update
        balance: Decimal,
        /// Rejected delta
        delta: Decimal,
    },

    /// Decimal arithmetic overflowed
    #[error("Arithmetic overflow in {operation} for account {account}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Account involved
        account: AccountId,
    },

    /// Row lock could not be acquired within the configured wait
    ///
    /// Nothing was changed; the operation can be retried.
    #[error("Timed out after {waited_ms}ms waiting for the lock on account {account}")]
    LockTimeout {
        /// Account whose lock was contended
        account: AccountId,
        /// How long the caller waited
        waited_ms: u64,
    },

    /// Backing store is closed or failing
    #[error("Storage unavailable: {message}")]
    StorageUnavailable {
        /// Description of the storage failure
        message: String,
    },
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create an InvalidArgument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        LedgerError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an AccountNotFound error
    pub fn account_not_found(account: AccountId) -> Self {
        LedgerError::AccountNotFound { account }
    }

    /// Create an InsufficientFundsOrNotFound error
    pub fn insufficient_funds_or_not_found(account: AccountId) -> Self {
        LedgerError::InsufficientFundsOrNotFound { account }
    }

    /// Create a NegativeBalance error
    pub fn negative_balance(account: AccountId, balance: Decimal, delta: Decimal) -> Self {
        LedgerError::NegativeBalance {
            account,
            balance,
            delta,
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account: AccountId) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            account,
        }
    }

    /// Create a LockTimeout error
    pub fn lock_timeout(account: AccountId, waited_ms: u64) -> Self {
        LedgerError::LockTimeout { account, waited_ms }
    }

    /// Create a StorageUnavailable error
    pub fn storage_unavailable(message: impl Into<String>) -> Self {
        LedgerError::StorageUnavailable {
            message: message.into(),
        }
    }

    /// Whether the failed operation had no effect and may be retried as is
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::LockTimeout { .. })
    }
}
