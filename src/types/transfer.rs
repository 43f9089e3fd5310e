//! Transfer results
//!
//! A transfer either completes fully or, when the movement log rejects the
//! audit record after balances were applied, completes in a degraded state that
//! operators must reconcile by hand.

use super::account::AccountBalance;
use super::error::LedgerError;
use super::movement::Movement;

/// Result of a transfer that moved money
#[derive(Debug, Clone, PartialEq)]
pub enum TransferOutcome {
    /// Balances updated and the TRANSFER movement recorded
    Completed {
        source: AccountBalance,
        destination: AccountBalance,
        movement: Movement,
    },

    /// Balances updated but the movement could not be recorded
    ///
    /// Must not be retried: retrying would move the money twice.
    Degraded {
        source: AccountBalance,
        destination: AccountBalance,
        logging_error: LedgerError,
    },
}

impl TransferOutcome {
    pub fn source(&self) -> AccountBalance {
        match self {
            TransferOutcome::Completed { source, .. } | TransferOutcome::Degraded { source, .. } => {
                *source
            }
        }
    }

    pub fn destination(&self) -> AccountBalance {
        match self {
            TransferOutcome::Completed { destination, .. }
            | TransferOutcome::Degraded { destination, .. } => *destination,
        }
    }

    /// The recorded movement, absent for degraded transfers
    pub fn movement(&self) -> Option<&Movement> {
        match self {
            TransferOutcome::Completed { movement, .. } => Some(movement),
            TransferOutcome::Degraded { .. } => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, TransferOutcome::Degraded { .. })
    }
}
