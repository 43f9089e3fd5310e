//! Engine configuration
//!
//! Tunables for lock waits, history pagination and accepted amount precision.

use std::time::Duration;
use tracing::warn;

/// Configuration for the ledger engine
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Longest wait for a single row lock before giving up with `LockTimeout`
    pub lock_timeout: Duration,
    /// Page size used when the caller passes a non-positive limit
    pub default_page_limit: usize,
    /// Upper bound on any requested page size
    pub max_page_limit: usize,
    /// Maximum number of fractional digits accepted in amounts
    pub amount_scale: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(5),
            default_page_limit: 10,
            max_page_limit: 100,
            amount_scale: 2,
        }
    }
}

impl EngineConfig {
    /// Create a new EngineConfig with custom values
    ///
    /// Zero values fall back to the defaults with a warning. A maximum page
    /// limit below the default page limit is raised to it.
    pub fn new(lock_timeout: Duration, max_page_limit: usize) -> Self {
        let default = Self::default();

        let lock_timeout = if lock_timeout.is_zero() {
            warn!(
                default_ms = default.lock_timeout.as_millis() as u64,
                "invalid lock_timeout (0), using default"
            );
            default.lock_timeout
        } else {
            lock_timeout
        };

        let max_page_limit = if max_page_limit == 0 {
            warn!(
                default = default.max_page_limit,
                "invalid max_page_limit (0), using default"
            );
            default.max_page_limit
        } else {
            max_page_limit.max(default.default_page_limit)
        };

        Self {
            lock_timeout,
            max_page_limit,
            ..default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.lock_timeout, Duration::from_secs(5));
        assert_eq!(config.default_page_limit, 10);
        assert_eq!(config.max_page_limit, 100);
        assert_eq!(config.amount_scale, 2);
    }

    #[rstest]
    #[case::custom(Duration::from_millis(250), 50, Duration::from_millis(250), 50)]
    #[case::zero_timeout(Duration::ZERO, 50, Duration::from_secs(5), 50)]
    #[case::zero_max_page(Duration::from_millis(250), 0, Duration::from_millis(250), 100)]
    #[case::max_page_below_default(Duration::from_millis(250), 3, Duration::from_millis(250), 10)]
    fn test_new_falls_back_on_invalid_values(
        #[case] lock_timeout: Duration,
        #[case] max_page_limit: usize,
        #[case] expected_timeout: Duration,
        #[case] expected_max_page: usize,
    ) {
        let config = EngineConfig::new(lock_timeout, max_page_limit);
        assert_eq!(config.lock_timeout, expected_timeout);
        assert_eq!(config.max_page_limit, expected_max_page);
    }
}
