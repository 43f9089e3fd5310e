//! Core business logic module
//!
//! This module contains the ledger engine and its storage:
//! - `traits` - Storage seams for the account ledger and the movement log
//! - `row_locks` - Per-account row locks acquired in ascending ID order
//! - `account_ledger` - In-memory current-balance store
//! - `movement_log` - In-memory append-only movement store
//! - `engine` - Transfer coordination and balance reconstruction
//! - `reconciliation` - Cached versus reconstructed balance checks
//! - `batch_processor` - Concurrent replay of command batches
//! - `config` / `clock` - Engine tunables and time source

pub mod account_ledger;
pub mod batch_processor;
pub mod clock;
pub mod config;
pub mod engine;
pub mod movement_log;
pub mod reconciliation;
pub mod row_locks;
pub mod traits;

pub use account_ledger::InMemoryAccountLedger;
pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use engine::LedgerEngine;
pub use movement_log::InMemoryMovementLog;
pub use reconciliation::{ConservationReport, Reconciliation};
pub use row_locks::{RowGuard, RowLockTable, RowLocks};
pub use traits::{AccountLedger, MovementLog};
