//! Consistency checks between cached balances and the movement log
//!
//! The cached balance of every account is a projection of the movement log.
//! These checks recompute that projection and compare. Drift is expected only
//! after a degraded transfer.

use std::collections::HashSet;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::engine::LedgerEngine;
use super::traits::{AccountLedger, MovementLog};
use crate::types::{AccountId, LedgerError};

/// Cached versus reconstructed balance of one account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub account: AccountId,
    pub cached: Decimal,
    pub reconstructed: Decimal,
}

impl Reconciliation {
    pub fn is_consistent(&self) -> bool {
        self.cached == self.reconstructed
    }

    /// `cached - reconstructed`
    pub fn drift(&self) -> Decimal {
        self.cached - self.reconstructed
    }
}

/// Ledger-wide money conservation check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConservationReport {
    /// Sum of all cached balances
    pub total_balances: Decimal,

    /// Total deposited minus total withdrawn
    pub external_net_flow: Decimal,
}

impl ConservationReport {
    pub fn is_balanced(&self) -> bool {
        self.total_balances == self.external_net_flow
    }
}

impl<L: AccountLedger, M: MovementLog> LedgerEngine<L, M> {
    /// Compare an account's cached balance with its reconstructed balance
    ///
    /// Holds the account's row lock so no transfer is half applied while the
    /// two values are read.
    ///
    /// # Errors
    ///
    /// * `AccountNotFound` - no such account
    /// * `LockTimeout` - the row lock was not granted in time
    pub async fn reconcile_account(
        &self,
        account: AccountId,
    ) -> Result<Reconciliation, LedgerError> {
        let _locks = self
            .ledger()
            .row_locks()
            .acquire(&[account], self.config().lock_timeout)
            .await?;

        let cached = self
            .ledger()
            .get(account)?
            .ok_or_else(|| LedgerError::account_not_found(account))?
            .balance;
        let reconstructed = self.movements().balance_at(account, self.now())?;

        let reconciliation = Reconciliation {
            account,
            cached,
            reconstructed,
        };
        if !reconciliation.is_consistent() {
            warn!(
                account,
                %cached,
                %reconstructed,
                drift = %reconciliation.drift(),
                "cached balance drifted from movement log"
            );
        }
        Ok(reconciliation)
    }

    /// Check that the sum of all balances equals the money that entered minus
    /// the money that left the ledger
    ///
    /// Locks every account row, so transfers in flight finish before the
    /// totals are read. Accounts that appear while the locks are being taken
    /// are locked too. Both totals cover exactly the locked accounts, so an
    /// account created after the last listing is left out of both.
    pub async fn verify_conservation(&self) -> Result<ConservationReport, LedgerError> {
        let timeout = self.config().lock_timeout;
        let ids: Vec<AccountId> = self.ledger().list()?.iter().map(|a| a.id).collect();
        let mut locks = self.ledger().row_locks().acquire(&ids, timeout).await?;
        let mut locked: HashSet<AccountId> = locks.accounts().into_iter().collect();

        // Late accounts normally carry larger IDs than every held row; the
        // lock timeout bounds the wait when one does not
        let accounts = loop {
            let accounts = self.ledger().list()?;
            let missing: Vec<AccountId> = accounts
                .iter()
                .map(|account| account.id)
                .filter(|id| !locked.contains(id))
                .collect();
            if missing.is_empty() {
                break accounts;
            }

            debug!(accounts = missing.len(), "locking accounts created during the check");
            let more = self.ledger().row_locks().acquire(&missing, timeout).await?;
            locked.extend(more.accounts());
            locks.extend(more);
        };

        let mut total_balances = Decimal::ZERO;
        for account in &accounts {
            total_balances = total_balances
                .checked_add(account.balance)
                .ok_or_else(|| LedgerError::arithmetic_overflow("verify_conservation", account.id))?;
        }

        let report = ConservationReport {
            total_balances,
            external_net_flow: self.movements().external_net_flow(&locked)?,
        };
        if report.is_balanced() {
            info!(total = %report.total_balances, "ledger conserves money");
        } else {
            warn!(
                total_balances = %report.total_balances,
                external_net_flow = %report.external_net_flow,
                "ledger does not conserve money"
            );
        }
        Ok(report)
    }
}
