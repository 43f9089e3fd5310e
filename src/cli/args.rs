use crate::core::EngineConfig;
use crate::strategy::BatchConfig;
use crate::types::parse_timestamp;
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Replay ledger commands and report account balances
#[derive(Parser, Debug)]
#[command(name = "ledger-engine")]
#[command(about = "Replay ledger commands and report account balances", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing ledger commands
    #[arg(value_name = "INPUT", help = "Path to the input CSV file")]
    pub input_file: PathBuf,

    /// Replay strategy
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Replay strategy: 'sync' for in-order replay or 'async' for concurrent transfers"
    )]
    pub strategy: StrategyType,

    /// Number of commands per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of commands per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Worker threads for concurrent transfers (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Number of worker threads running transfers (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    /// Longest wait for a row lock
    #[arg(
        long = "lock-timeout-ms",
        value_name = "MILLIS",
        env = "LEDGER_LOCK_TIMEOUT_MS",
        help = "Longest wait for an account row lock in milliseconds (default: 5000)"
    )]
    pub lock_timeout_ms: Option<u64>,

    /// Upper bound on movement history page size
    #[arg(
        long = "max-page-limit",
        value_name = "LIMIT",
        env = "LEDGER_MAX_PAGE_LIMIT",
        help = "Largest page of movement history returned by one query (default: 100)"
    )]
    pub max_page_limit: Option<usize>,

    /// Instant at which balances are reconstructed for the report
    #[arg(
        long = "as-of",
        value_name = "RFC3339",
        value_parser = parse_timestamp,
        help = "Reconstruct balances as of this RFC 3339 timestamp (default: now)"
    )]
    pub as_of: Option<DateTime<Utc>>,
}

/// Available replay strategies
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Missing values fall back to the defaults; invalid ones are replaced by
    /// `BatchConfig::new` with a warning.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }

    /// Create an EngineConfig from CLI arguments and environment
    pub fn to_engine_config(&self) -> EngineConfig {
        if self.lock_timeout_ms.is_some() || self.max_page_limit.is_some() {
            let default = EngineConfig::default();
            EngineConfig::new(
                self.lock_timeout_ms
                    .map(Duration::from_millis)
                    .unwrap_or(default.lock_timeout),
                self.max_page_limit.unwrap_or(default.max_page_limit),
            )
        } else {
            EngineConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    // Strategy parsing tests
    #[rstest]
    #[case::default_strategy(&["program", "input.csv"], StrategyType::Async)]
    #[case::explicit_sync(&["program", "--strategy", "sync", "input.csv"], StrategyType::Sync)]
    #[case::explicit_async(&["program", "--strategy", "async", "input.csv"], StrategyType::Async)]
    fn test_strategy_parsing(#[case] args: &[&str], #[case] expected: StrategyType) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.strategy, expected);
    }

    // BatchConfig conversion tests
    #[rstest]
    #[case::all_defaults(&["program", "input.csv"], 1000, num_cpus::get())]
    #[case::custom_batch_size(&["program", "--batch-size", "2000", "input.csv"], 2000, num_cpus::get())]
    #[case::custom_max_concurrent(&["program", "--max-concurrent", "8", "input.csv"], 1000, 8)]
    #[case::zero_batch_size(&["program", "--batch-size", "0", "input.csv"], 1000, num_cpus::get())]
    #[case::zero_max_concurrent(&["program", "--max-concurrent", "0", "input.csv"], 1000, num_cpus::get())]
    fn test_batch_config_conversion(
        #[case] args: &[&str],
        #[case] expected_batch_size: usize,
        #[case] expected_max_concurrent: usize,
    ) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        let config = parsed.to_batch_config();

        assert_eq!(config.batch_size, expected_batch_size);
        assert_eq!(config.max_concurrent_batches, expected_max_concurrent);
    }

    // EngineConfig conversion tests
    #[rstest]
    #[case::defaults(&["program", "input.csv"], Duration::from_secs(5), 100)]
    #[case::lock_timeout(&["program", "--lock-timeout-ms", "250", "input.csv"], Duration::from_millis(250), 100)]
    #[case::max_page_limit(&["program", "--max-page-limit", "40", "input.csv"], Duration::from_secs(5), 40)]
    #[case::zero_lock_timeout(&["program", "--lock-timeout-ms", "0", "input.csv"], Duration::from_secs(5), 100)]
    #[case::page_limit_below_default(&["program", "--max-page-limit", "3", "input.csv"], Duration::from_secs(5), 10)]
    fn test_engine_config_conversion(
        #[case] args: &[&str],
        #[case] expected_timeout: Duration,
        #[case] expected_max_page_limit: usize,
    ) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        let config = parsed.to_engine_config();

        assert_eq!(config.lock_timeout, expected_timeout);
        assert_eq!(config.max_page_limit, expected_max_page_limit);
    }

    #[test]
    fn test_as_of_parsing() {
        let parsed =
            CliArgs::try_parse_from(["program", "--as-of", "2024-03-01T09:30:00Z", "input.csv"])
                .unwrap();

        assert_eq!(
            parsed.as_of,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap())
        );
    }

    // Error handling tests
    #[rstest]
    #[case::missing_input(&["program"])]
    #[case::invalid_strategy(&["program", "--strategy", "invalid", "input.csv"])]
    #[case::invalid_as_of(&["program", "--as-of", "yesterday", "input.csv"])]
    #[case::negative_lock_timeout(&["program", "--lock-timeout-ms", "-1", "input.csv"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        let result = CliArgs::try_parse_from(args);
        assert!(result.is_err());
    }
}
