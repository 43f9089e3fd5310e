//! Account-related types for the ledger engine
//!
//! This module defines the Account structure together with the small value
//! types the engine hands back after balance mutations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Account identifier
///
/// Assigned sequentially by the account store, starting at 1.
pub type AccountId = i64;

/// Account state as held by the account ledger
///
/// The `balance` field is a materialized cache of the signed sum of every
/// movement that references the account. It is never negative.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// The account ID
    pub id: AccountId,

    /// Display name, fixed at creation
    pub name: String,

    /// Current balance
    ///
    /// Only the transfer coordinator and the administrative balance
    /// initialization write this field, always under the account's row lock.
    pub balance: Decimal,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the balance was last written
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with a zero balance
    ///
    /// # Arguments
    ///
    /// * `id` - The ID assigned by the store
    /// * `name` - Display name
    /// * `created_at` - Creation timestamp, also used as the first `updated_at`
    pub fn new(id: AccountId, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Account {
            id,
            name: name.into(),
            balance: Decimal::ZERO,
            created_at,
            updated_at: created_at,
        }
    }

    /// Snapshot of this account's balance
    pub fn balance_snapshot(&self) -> AccountBalance {
        AccountBalance {
            account: self.id,
            balance: self.balance,
        }
    }
}

/// An account's balance right after a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountBalance {
    pub account: AccountId,
    pub balance: Decimal,
}

/// A reconstructed balance together with the instant it was computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceAt {
    pub account: AccountId,
    pub balance: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_account_starts_at_zero() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let account = Account::new(7, "Alice", created);

        assert_eq!(account.id, 7);
        assert_eq!(account.name, "Alice");
        assert_eq!(account.balance, Decimal::ZERO);
        assert_eq!(account.created_at, created);
        assert_eq!(account.updated_at, created);
    }

    #[test]
    fn test_balance_snapshot() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let mut account = Account::new(3, "Bob", created);
        account.balance = Decimal::new(4250, 2);

        let snapshot = account.balance_snapshot();
        assert_eq!(snapshot.account, 3);
        assert_eq!(snapshot.balance, Decimal::new(4250, 2));
    }
}
