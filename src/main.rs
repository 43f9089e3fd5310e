//! Ledger Engine CLI
//!
//! Command-line interface for replaying ledger commands from CSV files.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- commands.csv > accounts.csv
//! cargo run -- --strategy sync commands.csv > accounts.csv
//! cargo run -- --strategy async --batch-size 2000 --max-concurrent 8 commands.csv > accounts.csv
//! cargo run -- --lock-timeout-ms 250 --as-of 2024-01-01T00:00:00Z commands.csv > accounts.csv
//! ```
//!
//! The program reads `open`, `seed` and `transfer` commands from the input
//! CSV file, applies them through the ledger engine using the selected replay
//! strategy, and writes every account's cached and reconstructed balance to
//! stdout. Diagnostics go to stderr, filtered by `RUST_LOG`.
//!
//! # Replay Strategies
//!
//! - **sync**: Commands applied one at a time in file order
//! - **async**: Transfers between `open`/`seed` commands run concurrently (default)
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, file not readable, etc.)

use ledger_engine::cli;
use ledger_engine::observability;
use ledger_engine::strategy;
use std::process;

fn main() {
    observability::init();

    let args = cli::parse_args();

    let strategy = {
        let batch_config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(
            args.strategy.clone(),
            batch_config,
            args.to_engine_config(),
            args.as_of,
        )
    };

    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.input_file, &mut output) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
