//! Ledger engine
//!
//! This module provides `LedgerEngine`, which coordinates the account ledger
//! and the movement log to move money between accounts and to reconstruct
//! balances from history.
//!
//! # Architecture
//!
//! ```text
//! LedgerEngine
//!     ├── Arc<L: AccountLedger>  (current balances + row locks)
//!     ├── Arc<M: MovementLog>    (append-only history)
//!     ├── Arc<dyn Clock>         (timestamps)
//!     └── EngineConfig           (lock wait, pagination, amount scale)
//! ```
//!
//! # Transfers
//!
//! A transfer locks both account rows in ascending ID order, checks the source
//! can cover the amount, debits the source, credits the destination and
//! appends one TRANSFER movement, all while both row locks are held. A failed
//! credit is compensated by re-crediting the source before the error is
//! returned. A failed append leaves the balances applied and is reported as
//! `TransferOutcome::Degraded`.
//!
//! # Thread Safety
//!
//! The engine is cheap to clone and every clone shares the same stores, so it
//! can be handed to any number of tokio tasks.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use super::account_ledger::InMemoryAccountLedger;
use super::clock::{Clock, SystemClock};
use super::config::EngineConfig;
use super::movement_log::InMemoryMovementLog;
use super::traits::{AccountLedger, MovementLog};
use crate::types::{
    Account, AccountBalance, AccountId, BalanceAt, LedgerCommand, LedgerError, Movement,
    NewMovement, Page, TimeRange, TransferOutcome,
};

/// Transfer coordinator and balance reconstructor
#[derive(Debug)]
pub struct LedgerEngine<L = InMemoryAccountLedger, M = InMemoryMovementLog> {
    /// Current-balance store
    ledger: Arc<L>,

    /// Movement history
    movements: Arc<M>,

    /// Source of every timestamp the engine writes
    clock: Arc<dyn Clock>,

    config: EngineConfig,
}

impl<L, M> Clone for LedgerEngine<L, M> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            movements: Arc::clone(&self.movements),
            clock: Arc::clone(&self.clock),
            config: self.config.clone(),
        }
    }
}

impl LedgerEngine {
    /// Create an engine backed by fresh in-memory stores
    pub fn in_memory(config: EngineConfig) -> Self {
        Self::new(
            Arc::new(InMemoryAccountLedger::new()),
            Arc::new(InMemoryMovementLog::new()),
            config,
        )
    }
}

impl<L: AccountLedger, M: MovementLog> LedgerEngine<L, M> {
    /// Create an engine over explicitly provided stores
    ///
    /// # Arguments
    ///
    /// * `ledger` - Shared current-balance store
    /// * `movements` - Shared movement log
    /// * `config` - Engine tunables
    ///
    /// The engine uses the system clock until `with_clock` replaces it.
    pub fn new(ledger: Arc<L>, movements: Arc<M>, config: EngineConfig) -> Self {
        Self {
            ledger,
            movements,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replace the clock used for every timestamp
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    pub fn movements(&self) -> &Arc<M> {
        &self.movements
    }

    /// Current time according to the engine's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Close both stores
    ///
    /// Every later operation fails with `StorageUnavailable`.
    pub fn close(&self) {
        self.ledger.close();
        self.movements.close();
        info!("ledger engine closed");
    }

    /// Reject amounts that are not strictly positive or carry too many decimals
    fn validate_amount(&self, amount: Decimal) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::invalid_argument(format!(
                "amount must be positive, got {}",
                amount
            )));
        }
        self.validate_scale(amount)
    }

    fn validate_scale(&self, amount: Decimal) -> Result<(), LedgerError> {
        if amount.normalize().scale() > self.config.amount_scale {
            return Err(LedgerError::invalid_argument(format!(
                "amount {} has more than {} decimal places",
                amount, self.config.amount_scale
            )));
        }
        Ok(())
    }

    /// Create an account with a zero balance
    pub fn create_account(&self, name: &str) -> Result<Account, LedgerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::invalid_argument("account name must not be empty"));
        }

        let account = self.ledger.create(name, self.clock.now())?;
        info!(account = account.id, name = %account.name, "account created");
        Ok(account)
    }

    pub fn get_account(&self, account: AccountId) -> Result<Option<Account>, LedgerError> {
        self.ledger.get(account)
    }

    /// All accounts ordered by ID
    pub fn list_accounts(&self) -> Result<Vec<Account>, LedgerError> {
        self.ledger.list()
    }

    /// Move `amount` from `source` to `destination`
    ///
    /// # Returns
    ///
    /// * `Ok(TransferOutcome::Completed)` - balances applied and movement logged
    /// * `Ok(TransferOutcome::Degraded)` - balances applied, movement not logged
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` - non-positive amount, excess scale or same account
    /// * `LockTimeout` - a row lock was not granted in time
    /// * `InsufficientFundsOrNotFound` - source missing or too poor
    /// * `AccountNotFound` - destination missing
    /// * any error from the credit, after the debit has been compensated
    ///
    /// Every error leaves both balances and the movement log unchanged.
    pub async fn transfer(
        &self,
        source: AccountId,
        destination: AccountId,
        amount: Decimal,
    ) -> Result<TransferOutcome, LedgerError> {
        self.validate_amount(amount)?;
        if source == destination {
            return Err(LedgerError::invalid_argument(format!(
                "cannot transfer from account {} to itself",
                source
            )));
        }

        let locks = self
            .ledger
            .row_locks()
            .acquire(&[source, destination], self.config.lock_timeout)
            .await?;

        let Some(source_row) = locks.guard(source) else {
            debug!(account = source, reason = "not_found", "transfer source rejected");
            return Err(LedgerError::insufficient_funds_or_not_found(source));
        };
        if self.ledger.get_for_update(source_row, amount)?.is_none() {
            return Err(LedgerError::insufficient_funds_or_not_found(source));
        }

        let Some(destination_row) = locks.guard(destination) else {
            return Err(LedgerError::account_not_found(destination));
        };
        if self.ledger.get(destination)?.is_none() {
            return Err(LedgerError::account_not_found(destination));
        }

        let now = self.clock.now();
        let source_balance = self.ledger.adjust_balance(source_row, -amount, now)?;

        let destination_balance = match self.ledger.adjust_balance(destination_row, amount, now) {
            Ok(balance) => balance,
            Err(credit_error) => {
                match self.ledger.adjust_balance(source_row, amount, now) {
                    Ok(_) => warn!(
                        source,
                        destination,
                        %amount,
                        error = %credit_error,
                        "credit failed, debit compensated"
                    ),
                    Err(compensation_error) => error!(
                        source,
                        destination,
                        %amount,
                        error = %credit_error,
                        compensation_error = %compensation_error,
                        "credit failed and debit could not be compensated"
                    ),
                }
                return Err(credit_error);
            }
        };

        let source_snapshot = AccountBalance {
            account: source,
            balance: source_balance,
        };
        let destination_snapshot = AccountBalance {
            account: destination,
            balance: destination_balance,
        };

        match self
            .movements
            .append(NewMovement::transfer(source, destination, amount), now)
        {
            Ok(movement) => {
                info!(
                    source,
                    destination,
                    %amount,
                    movement = movement.id,
                    "transfer completed"
                );
                Ok(TransferOutcome::Completed {
                    source: source_snapshot,
                    destination: destination_snapshot,
                    movement,
                })
            }
            Err(logging_error) => {
                warn!(
                    source,
                    destination,
                    %amount,
                    error = %logging_error,
                    "transfer applied but movement was not logged"
                );
                Ok(TransferOutcome::Degraded {
                    source: source_snapshot,
                    destination: destination_snapshot,
                    logging_error,
                })
            }
        }
    }

    /// Set an account's balance directly and log the change
    ///
    /// Raising the balance logs a DEPOSIT of the difference, lowering it logs
    /// a WITHDRAW of the difference and an unchanged balance logs nothing. If
    /// the movement cannot be logged the previous balance is restored and the
    /// logging error is returned.
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` - negative amount or excess scale
    /// * `LockTimeout` - the row lock was not granted in time
    /// * `AccountNotFound` - no such account
    pub async fn initialize_balance(
        &self,
        account: AccountId,
        amount: Decimal,
    ) -> Result<Account, LedgerError> {
        if amount < Decimal::ZERO {
            return Err(LedgerError::invalid_argument(format!(
                "initial balance must not be negative, got {}",
                amount
            )));
        }
        self.validate_scale(amount)?;

        let locks = self
            .ledger
            .row_locks()
            .acquire(&[account], self.config.lock_timeout)
            .await?;
        let row = locks
            .guard(account)
            .ok_or_else(|| LedgerError::account_not_found(account))?;
        let prior = self
            .ledger
            .get(account)?
            .ok_or_else(|| LedgerError::account_not_found(account))?
            .balance;

        let now = self.clock.now();
        self.ledger.set_balance(row, amount, now)?;

        let movement = match amount.cmp(&prior) {
            Ordering::Greater if prior.is_zero() => {
                Some(NewMovement::deposit(account, amount).with_description("Initial balance"))
            }
            Ordering::Greater => Some(
                NewMovement::deposit(account, amount - prior)
                    .with_description("Balance adjustment"),
            ),
            Ordering::Less => Some(
                NewMovement::withdraw(account, prior - amount)
                    .with_description("Balance adjustment"),
            ),
            Ordering::Equal => None,
        };

        if let Some(movement) = movement {
            if let Err(logging_error) = self.movements.append(movement, now) {
                if let Err(restore_error) = self.ledger.set_balance(row, prior, now) {
                    error!(
                        account,
                        %prior,
                        error = %restore_error,
                        "could not restore balance after failed initialization"
                    );
                }
                warn!(account, %amount, error = %logging_error, "balance initialization rolled back");
                return Err(logging_error);
            }
        }

        info!(account, %prior, %amount, "balance initialized");
        self.ledger
            .get(account)?
            .ok_or_else(|| LedgerError::account_not_found(account))
    }

    /// Movement history of an account, newest first
    ///
    /// `limit <= 0` uses the default page size, larger limits are clamped to
    /// the configured maximum and a negative `offset` starts at the first
    /// movement. Unknown accounts have an empty history.
    pub fn list_movements(
        &self,
        account: AccountId,
        limit: i64,
        offset: i64,
        range: Option<TimeRange>,
    ) -> Result<Vec<Movement>, LedgerError> {
        let page = Page::normalize(
            limit,
            offset,
            self.config.default_page_limit,
            self.config.max_page_limit,
        );

        match range {
            Some(range) => self.movements.list_for_account_in_range(account, range, page),
            None => self.movements.list_for_account(account, page),
        }
    }

    /// Balance of `account` as of `at`, rebuilt from the movement log
    ///
    /// Includes movements created exactly at `at`. The cached balance is never
    /// consulted; accounts without movements report zero.
    pub fn historical_balance(
        &self,
        account: AccountId,
        at: DateTime<Utc>,
    ) -> Result<BalanceAt, LedgerError> {
        let balance = self.movements.balance_at(account, at)?;
        Ok(BalanceAt {
            account,
            balance,
            timestamp: at,
        })
    }

    /// Apply one replayed command
    ///
    /// A degraded transfer is logged and counted as applied.
    pub async fn process_command(&self, command: LedgerCommand) -> Result<(), LedgerError> {
        match command {
            LedgerCommand::Open { name } => self.create_account(&name).map(|_| ()),
            LedgerCommand::Seed { account, amount } => {
                self.initialize_balance(account, amount).await.map(|_| ())
            }
            LedgerCommand::Transfer {
                source,
                destination,
                amount,
            } => {
                let outcome = self.transfer(source, destination, amount).await?;
                if let TransferOutcome::Degraded { logging_error, .. } = outcome {
                    warn!(source, destination, error = %logging_error, "replayed transfer is degraded");
                }
                Ok(())
            }
        }
    }
}
