//! Processing strategy module for command replay
//!
//! This module defines the Strategy pattern for complete replay pipelines,
//! encompassing both CSV parsing and engine processing. This allows different
//! replay implementations (in-order, concurrent batch) to be selected at runtime.

use crate::cli::StrategyType;
use crate::core::{AccountLedger, EngineConfig, LedgerEngine, MovementLog};
use crate::io::AccountReport;
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::Path;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Processing strategy trait for complete replay pipelines
///
/// Each strategy reads ledger commands from a CSV file, applies them to a
/// fresh engine and writes the resulting account report to output.
pub trait ProcessingStrategy: Send + Sync {
    /// Replay commands from the input file and write the account report
    ///
    /// # Arguments
    ///
    /// * `input_path` - Path to the input CSV file containing ledger commands
    /// * `output` - Mutable reference to a writer for the account report
    ///
    /// # Returns
    ///
    /// * `Ok(())` if replay completed (rejected commands are logged, not fatal)
    /// * `Err(String)` if a fatal error occurred (file not found, I/O error, etc.)
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String>;
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of processing strategy to create (Sync or Async)
/// * `batch_config` - Optional configuration for async batch processing (ignored for sync)
/// * `engine_config` - Configuration for the engine each replay builds
/// * `as_of` - Instant for reconstructed balances; `None` means the end of the replay
pub fn create_strategy(
    strategy_type: StrategyType,
    batch_config: Option<BatchConfig>,
    engine_config: EngineConfig,
    as_of: Option<DateTime<Utc>>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(engine_config, as_of)),
        StrategyType::Async => {
            let batch_config = batch_config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(batch_config, engine_config, as_of))
        }
    }
}

/// Build the account report of a finished replay
///
/// Each row pairs the cached balance with the balance reconstructed from the
/// movement log at `as_of`, or at the engine's current time.
pub fn build_report<L: AccountLedger, M: MovementLog>(
    engine: &LedgerEngine<L, M>,
    as_of: Option<DateTime<Utc>>,
) -> Result<Vec<AccountReport>, String> {
    let at = as_of.unwrap_or_else(|| engine.now());
    let accounts = engine
        .list_accounts()
        .map_err(|e| format!("Failed to list accounts: {}", e))?;

    accounts
        .into_iter()
        .map(|account| {
            let reconstructed = engine
                .historical_balance(account.id, at)
                .map_err(|e| format!("Failed to reconstruct account {}: {}", account.id, e))?;
            Ok(AccountReport {
                account: account.id,
                name: account.name,
                balance: account.balance,
                reconstructed: reconstructed.balance,
            })
        })
        .collect()
}
