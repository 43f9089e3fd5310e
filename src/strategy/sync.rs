//! Synchronous replay strategy
//!
//! This module provides a single-threaded implementation of the
//! ProcessingStrategy trait. Commands are applied strictly in file order, so
//! the resulting balances and movement history are fully deterministic.
//!
//! # Design
//!
//! The SyncProcessingStrategy focuses on orchestration, delegating:
//! - CSV parsing to `SyncReader` (iterator interface)
//! - Command processing to `LedgerEngine`
//! - CSV output to `csv_format::write_accounts_csv`
//!
//! The engine's transfer path is async because it waits on row locks, so the
//! strategy drives it on a current-thread tokio runtime.

use crate::core::{EngineConfig, LedgerEngine};
use crate::io::csv_format::write_accounts_csv;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{build_report, ProcessingStrategy};
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct SyncProcessingStrategy {
    engine_config: EngineConfig,
    as_of: Option<DateTime<Utc>>,
}

impl SyncProcessingStrategy {
    pub fn new(engine_config: EngineConfig, as_of: Option<DateTime<Utc>>) -> Self {
        Self {
            engine_config,
            as_of,
        }
    }
}

impl Default for SyncProcessingStrategy {
    fn default() -> Self {
        Self::new(EngineConfig::default(), None)
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        let engine = LedgerEngine::in_memory(self.engine_config.clone());
        let reader = SyncReader::new(input_path)?;

        runtime.block_on(async {
            for result in reader {
                match result {
                    Ok(command) => {
                        let name = command.name();
                        if let Err(e) = engine.process_command(command).await {
                            warn!(command = name, error = %e, "command rejected");
                        }
                    }
                    Err(e) => warn!(error = %e, "skipping malformed row"),
                }
            }
        });

        let report = build_report(&engine, self.as_of)?;
        write_accounts_csv(&report, self.engine_config.amount_scale, output)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn run(strategy: &SyncProcessingStrategy, content: &str) -> String {
        let file = create_temp_csv(content);
        let mut output = Vec::new();
        strategy.process(file.path(), &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_sync_strategy_replays_transfers() {
        let output = run(
            &SyncProcessingStrategy::default(),
            "command,account,counterparty,amount,name\n\
             open,,,,alice\n\
             open,,,,bob\n\
             seed,1,,100,\n\
             transfer,1,2,30,\n",
        );

        assert_eq!(
            output,
            "account,name,balance,reconstructed\n\
             1,alice,70.00,70.00\n\
             2,bob,30.00,30.00\n"
        );
    }

    #[test]
    fn test_sync_strategy_skips_rejected_commands() {
        let output = run(
            &SyncProcessingStrategy::default(),
            "command,account,counterparty,amount,name\n\
             open,,,,alice\n\
             open,,,,bob\n\
             seed,1,,10,\n\
             transfer,1,2,50,\n\
             transfer,1,9,5,\n\
             transfer,1,2,abc,\n\
             transfer,1,2,4,\n",
        );

        assert!(output.contains("1,alice,6.00,6.00"));
        assert!(output.contains("2,bob,4.00,4.00"));
    }

    #[test]
    fn test_sync_strategy_handles_missing_file() {
        let strategy = SyncProcessingStrategy::default();
        let mut output = Vec::new();

        let result = strategy.process(Path::new("nonexistent.csv"), &mut output);

        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Failed to open file"));
    }

    #[test]
    fn test_sync_strategy_reconstructs_before_history() {
        let before_everything = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        let strategy = SyncProcessingStrategy::new(EngineConfig::default(), Some(before_everything));

        let output = run(
            &strategy,
            "command,account,counterparty,amount,name\n\
             open,,,,alice\n\
             seed,1,,25.5,\n",
        );

        assert_eq!(
            output,
            "account,name,balance,reconstructed\n1,alice,25.50,0.00\n"
        );
    }
}
