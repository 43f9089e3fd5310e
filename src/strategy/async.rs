//! Asynchronous batch replay strategy
//!
//! This module provides a multi-threaded implementation of the
//! ProcessingStrategy trait. It reads commands in batches and lets transfers
//! run concurrently wherever the command stream allows it.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncReader (batch CSV reading)
//!     ├── BatchProcessor (barrier segments + tokio tasks)
//!     └── LedgerEngine (shared stores, row locks)
//! ```
//!
//! # Ordering
//!
//! - Batches are processed sequentially
//! - Inside a batch, `open` and `seed` commands run in file order and wait for
//!   everything before them
//! - Transfers between two such commands are grouped by shared accounts;
//!   groups run as concurrent tasks and each group keeps file order, so the
//!   report matches the sync strategy

use crate::core::{BatchProcessor, EngineConfig, LedgerEngine};
use crate::io::async_reader::AsyncReader;
use crate::io::csv_format::write_accounts_csv;
use crate::strategy::{build_report, ProcessingStrategy};
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

/// Configuration for concurrent batch replay
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Commands read per batch
    pub batch_size: usize,
    /// Worker threads of the replay runtime
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig, replacing zero values with the defaults
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                default = default.batch_size,
                "invalid batch_size (0), using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                default = default.max_concurrent_batches,
                "invalid max_concurrent_batches (0), using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
    engine_config: EngineConfig,
    as_of: Option<DateTime<Utc>>,
}

impl AsyncProcessingStrategy {
    pub fn new(
        config: BatchConfig,
        engine_config: EngineConfig,
        as_of: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            config,
            engine_config,
            as_of,
        }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .enable_time()
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        let engine = LedgerEngine::in_memory(self.engine_config.clone());
        let processor = BatchProcessor::new(engine.clone());

        runtime.block_on(async {
            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| format!("Failed to open file '{}': {}", input_path.display(), e))?;

            // csv-async reads through the futures I/O traits
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                for result in processor.process_batch(batch).await {
                    if let Err(e) = result.result {
                        warn!(command = result.command.name(), error = %e, "command rejected");
                    }
                }
                debug!("batch replayed");
            }

            Ok::<(), String>(())
        })?;

        let report = build_report(&engine, self.as_of)?;
        write_accounts_csv(&report, self.engine_config.amount_scale, output)?;

        Ok(())
    }
}
