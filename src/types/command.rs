//! Ledger commands replayed by the CLI
//!
//! Each command maps onto one engine operation.

use super::account::AccountId;
use rust_decimal::Decimal;

/// A single replayable ledger command
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerCommand {
    /// Create an account with a zero balance
    Open { name: String },

    /// Administrative balance initialization
    Seed { account: AccountId, amount: Decimal },

    /// Move money between two accounts
    Transfer {
        source: AccountId,
        destination: AccountId,
        amount: Decimal,
    },
}

impl LedgerCommand {
    /// Whether this command may run concurrently with its neighbours
    ///
    /// Opens and seeds are ordering barriers: account IDs and seeded balances
    /// must be in place before the transfers that follow them.
    pub fn is_barrier(&self) -> bool {
        !matches!(self, LedgerCommand::Transfer { .. })
    }

    /// Accounts the command reads or writes
    pub fn accounts(&self) -> Vec<AccountId> {
        match self {
            LedgerCommand::Open { .. } => Vec::new(),
            LedgerCommand::Seed { account, .. } => vec![*account],
            LedgerCommand::Transfer {
                source,
                destination,
                ..
            } => vec![*source, *destination],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LedgerCommand::Open { .. } => "open",
            LedgerCommand::Seed { .. } => "seed",
            LedgerCommand::Transfer { .. } => "transfer",
        }
    }
}
