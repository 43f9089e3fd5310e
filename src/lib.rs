//! Ledger Engine Library
//! # Overview
//!
//! This library provides a concurrency-safe money ledger: accounts with cached
//! balances, an append-only movement log, atomic transfers between accounts and
//! reconstruction of any account's balance at any past instant.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Account, Movement, LedgerError, etc.)
//! - [`core`] - Business logic components:
//!   - [`core::engine`] - Transfer coordination and balance reconstruction
//!   - [`core::account_ledger`] - Current balances guarded by row locks
//!   - [`core::movement_log`] - Append-only movement history
//!   - [`core::reconciliation`] - Cached versus reconstructed balance checks
//! - [`io`] - CSV replay input and account report output
//! - [`strategy`] - In-order and concurrent replay pipelines
//! - [`cli`] - CLI arguments parsing
//! - [`observability`] - Tracing subscriber setup for the binary
//!
//! # Movement Kinds
//!
//! - **Transfer**: Money moved between two accounts
//! - **Deposit**: Money entering the ledger (balance initialization)
//! - **Withdraw**: Money leaving the ledger (balance lowered by initialization)
//!
//! # Invariants
//!
//! - No balance is ever negative
//! - Every account's cached balance equals the signed sum of its movements
//! - The sum of all balances equals deposits minus withdrawals

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod observability;
pub mod strategy;
pub mod types;

pub use core::{
    AccountLedger, EngineConfig, InMemoryAccountLedger, InMemoryMovementLog, LedgerEngine,
    MovementLog,
};
pub use io::write_accounts_csv;
pub use types::{
    Account, AccountBalance, AccountId, BalanceAt, LedgerCommand, LedgerError, Movement,
    MovementId, MovementKind, TimeRange, TransferOutcome,
};
