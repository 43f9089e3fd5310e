//! Types module
//!
//! Contains core data structures used throughout the engine.
//! This module organizes types into logical submodules:
//! - `account`: Account state and balance snapshots
//! - `movement`: Movement log entries
//! - `query`: Pagination, time ranges and timestamp parsing
//! - `transfer`: Transfer outcomes
//! - `command`: Commands replayed from CSV input
//! - `error`: Error types for the ledger engine

pub mod account;
pub mod command;
pub mod error;
pub mod movement;
pub mod query;
pub mod transfer;

pub use account::{Account, AccountBalance, AccountId, BalanceAt};
pub use command::LedgerCommand;
pub use error::LedgerError;
pub use movement::{Movement, MovementId, MovementKind, NewMovement};
pub use query::{parse_timestamp, Page, TimeRange};
pub use transfer::TransferOutcome;
