//! Movement-related types for the ledger engine
//!
//! A movement is one immutable entry of the movement log. Direction is encoded
//! by which side is populated, never by the sign of the amount.

use super::account::AccountId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Movement identifier
///
/// Monotonically increasing in append order.
pub type MovementId = i64;

/// Kinds of balance-affecting movements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MovementKind {
    /// Money moved between two accounts
    ///
    /// Both source and destination are set.
    Transfer,

    /// Money entering the ledger
    ///
    /// Only the destination is set.
    Deposit,

    /// Money leaving the ledger
    ///
    /// Only the source is set.
    Withdraw,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Transfer => "TRANSFER",
            MovementKind::Deposit => "DEPOSIT",
            MovementKind::Withdraw => "WITHDRAW",
        }
    }
}

impl std::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A movement as stored in the movement log
#[derive(Debug, Clone, PartialEq)]
pub struct Movement {
    pub id: MovementId,

    /// Debited account, absent for deposits
    pub source: Option<AccountId>,

    /// Credited account, absent for withdrawals
    pub destination: Option<AccountId>,

    /// Strictly positive amount
    pub amount: Decimal,

    pub kind: MovementKind,

    pub description: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Movement {
    /// Whether the account is on either side of this movement
    pub fn involves(&self, account: AccountId) -> bool {
        self.source == Some(account) || self.destination == Some(account)
    }

    /// Effect of this movement on the account's balance
    ///
    /// `-amount` when the account is the source, `+amount` when it is the
    /// destination and zero when the account is not involved. Source and
    /// destination never coincide, so no movement counts twice.
    pub fn signed_amount_for(&self, account: AccountId) -> Decimal {
        if self.source == Some(account) {
            -self.amount
        } else if self.destination == Some(account) {
            self.amount
        } else {
            Decimal::ZERO
        }
    }
}

/// A movement waiting to be appended
///
/// The log assigns the ID and creation timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovement {
    pub source: Option<AccountId>,
    pub destination: Option<AccountId>,
    pub amount: Decimal,
    pub kind: MovementKind,
    pub description: Option<String>,
}

impl NewMovement {
    /// A transfer from `source` to `destination`
    pub fn transfer(source: AccountId, destination: AccountId, amount: Decimal) -> Self {
        NewMovement {
            source: Some(source),
            destination: Some(destination),
            amount,
            kind: MovementKind::Transfer,
            description: None,
        }
    }

    /// Money entering the ledger into `destination`
    pub fn deposit(destination: AccountId, amount: Decimal) -> Self {
        NewMovement {
            source: None,
            destination: Some(destination),
            amount,
            kind: MovementKind::Deposit,
            description: None,
        }
    }

    /// Money leaving the ledger from `source`
    pub fn withdraw(source: AccountId, amount: Decimal) -> Self {
        NewMovement {
            source: Some(source),
            destination: None,
            amount,
            kind: MovementKind::Withdraw,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach the log-assigned identity
    pub fn into_movement(self, id: MovementId, created_at: DateTime<Utc>) -> Movement {
        Movement {
            id,
            source: self.source,
            destination: self.destination,
            amount: self.amount,
            kind: self.kind,
            description: self.description,
            created_at,
        }
    }
}
