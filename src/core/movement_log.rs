//! In-memory movement log
//!
//! This module provides `InMemoryMovementLog`, the append-only movement store
//! of the in-process storage engine.
//!
//! # Design
//!
//! Movements live in a `DashMap` keyed by movement ID. A second map indexes
//! movement IDs by account so history lookups and balance reconstruction only
//! visit the movements that reference the account. Entries are only ever
//! inserted; there is no update or delete path.
//!
//! # Ordering
//!
//! Listings are ordered newest first by `(created_at, id)`, so movements that
//! share a timestamp come back in reverse append order.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;

use super::traits::MovementLog;
use crate::types::{
    AccountId, LedgerError, Movement, MovementId, MovementKind, NewMovement, Page, TimeRange,
};

/// Thread-safe append-only movement store
#[derive(Debug)]
pub struct InMemoryMovementLog {
    /// Movements by ID
    movements: DashMap<MovementId, Movement>,

    /// Movement IDs referencing each account, in append order
    by_account: DashMap<AccountId, Vec<MovementId>>,

    /// Next ID to hand out
    next_id: AtomicI64,

    /// Set once the store has been closed
    closed: AtomicBool,
}

impl InMemoryMovementLog {
    /// Create a new empty movement log
    pub fn new() -> Self {
        Self {
            movements: DashMap::new(),
            by_account: DashMap::new(),
            next_id: AtomicI64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of movements ever appended
    pub fn len(&self) -> usize {
        self.movements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movements.is_empty()
    }

    fn ensure_open(&self) -> Result<(), LedgerError> {
        if self.is_closed() {
            return Err(LedgerError::storage_unavailable("movement log is closed"));
        }
        Ok(())
    }

    /// Reject movements that break the structural invariants of the log
    fn validate(movement: &NewMovement) -> Result<(), LedgerError> {
        if movement.amount <= Decimal::ZERO {
            return Err(LedgerError::invalid_argument(format!(
                "movement amount must be positive, got {}",
                movement.amount
            )));
        }

        match (movement.source, movement.destination) {
            (None, None) => Err(LedgerError::invalid_argument(
                "movement must reference a source or a destination account",
            )),
            (Some(source), Some(destination)) if source == destination => {
                Err(LedgerError::invalid_argument(format!(
                    "movement source and destination are both account {}",
                    source
                )))
            }
            _ => Ok(()),
        }
    }

    /// Movements referencing `account` matching `filter`, newest first
    fn collect_for_account<F>(&self, account: AccountId, filter: F) -> Vec<Movement>
    where
        F: Fn(&Movement) -> bool,
    {
        let ids = self
            .by_account
            .get(&account)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();

        let mut movements: Vec<Movement> = ids
            .iter()
            .filter_map(|id| self.movements.get(id).map(|entry| entry.value().clone()))
            .filter(|movement| movement.involves(account) && filter(movement))
            .collect();

        movements.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        movements
    }

    fn paginate(movements: Vec<Movement>, page: Page) -> Vec<Movement> {
        movements
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect()
    }
}

impl Default for InMemoryMovementLog {
    fn default() -> Self {
        Self::new()
    }
}

impl MovementLog for InMemoryMovementLog {
    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn append(&self, movement: NewMovement, at: DateTime<Utc>) -> Result<Movement, LedgerError> {
        self.ensure_open()?;
        Self::validate(&movement)?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let movement = movement.into_movement(id, at);

        // Insert the row before indexing it so readers never see a dangling ID
        self.movements.insert(id, movement.clone());
        for account in [movement.source, movement.destination].into_iter().flatten() {
            self.by_account.entry(account).or_default().push(id);
        }

        Ok(movement)
    }

    fn list_for_account(
        &self,
        account: AccountId,
        page: Page,
    ) -> Result<Vec<Movement>, LedgerError> {
        self.ensure_open()?;
        Ok(Self::paginate(
            self.collect_for_account(account, |_| true),
            page,
        ))
    }

    fn list_for_account_in_range(
        &self,
        account: AccountId,
        range: TimeRange,
        page: Page,
    ) -> Result<Vec<Movement>, LedgerError> {
        self.ensure_open()?;
        Ok(Self::paginate(
            self.collect_for_account(account, |movement| range.contains(movement.created_at)),
            page,
        ))
    }

    fn balance_at(&self, account: AccountId, at: DateTime<Utc>) -> Result<Decimal, LedgerError> {
        self.ensure_open()?;

        self.collect_for_account(account, |movement| movement.created_at <= at)
            .iter()
            .try_fold(Decimal::ZERO, |balance, movement| {
                balance
                    .checked_add(movement.signed_amount_for(account))
                    .ok_or_else(|| LedgerError::arithmetic_overflow("balance_at", account))
            })
    }

    fn external_net_flow(&self, accounts: &HashSet<AccountId>) -> Result<Decimal, LedgerError> {
        self.ensure_open()?;

        let covers = |account: Option<AccountId>| account.is_some_and(|id| accounts.contains(&id));
        self.movements
            .iter()
            .try_fold(Decimal::ZERO, |total, entry| {
                let movement = entry.value();
                let delta = match movement.kind {
                    MovementKind::Deposit if covers(movement.destination) => movement.amount,
                    MovementKind::Withdraw if covers(movement.source) => -movement.amount,
                    _ => Decimal::ZERO,
                };
                total.checked_add(delta).ok_or_else(|| {
                    LedgerError::arithmetic_overflow(
                        "external_net_flow",
                        movement.destination.or(movement.source).unwrap_or_default(),
                    )
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;
    use std::sync::Arc;

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn page(limit: usize, offset: usize) -> Page {
        Page { limit, offset }
    }

    fn dec(units: i64) -> Decimal {
        Decimal::new(units, 0)
    }

    #[test]
    fn test_append_assigns_increasing_ids() {
        let log = InMemoryMovementLog::new();

        let first = log.append(NewMovement::deposit(1, dec(100)), t(0)).unwrap();
        let second = log.append(NewMovement::transfer(1, 2, dec(40)), t(1)).unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(second.created_at, t(1));
        assert_eq!(second.kind, MovementKind::Transfer);
        assert_eq!(log.len(), 2);
    }

    #[rstest]
    #[case::zero_amount(NewMovement::deposit(1, Decimal::ZERO))]
    #[case::negative_amount(NewMovement::deposit(1, dec(-5)))]
    #[case::same_account(NewMovement::transfer(1, 1, dec(5)))]
    #[case::no_account(NewMovement { source: None, destination: None, amount: dec(5), kind: MovementKind::Deposit, description: None })]
    fn test_append_rejects_invalid_movements(#[case] movement: NewMovement) {
        let log = InMemoryMovementLog::new();

        let result = log.append(movement, t(0));

        assert!(matches!(result, Err(LedgerError::InvalidArgument { .. })));
        assert!(log.is_empty());
    }

    #[test]
    fn test_list_for_account_is_newest_first_on_both_sides() {
        let log = InMemoryMovementLog::new();
        log.append(NewMovement::deposit(1, dec(100)), t(0)).unwrap();
        log.append(NewMovement::transfer(1, 2, dec(10)), t(1)).unwrap();
        log.append(NewMovement::transfer(2, 1, dec(5)), t(2)).unwrap();
        log.append(NewMovement::deposit(3, dec(7)), t(3)).unwrap();

        let ids: Vec<MovementId> = log
            .list_for_account(1, page(10, 0))
            .unwrap()
            .iter()
            .map(|m| m.id)
            .collect();

        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_same_timestamp_ties_break_on_id() {
        let log = InMemoryMovementLog::new();
        log.append(NewMovement::deposit(1, dec(1)), t(0)).unwrap();
        log.append(NewMovement::deposit(1, dec(2)), t(0)).unwrap();

        let ids: Vec<MovementId> = log
            .list_for_account(1, page(10, 0))
            .unwrap()
            .iter()
            .map(|m| m.id)
            .collect();

        assert_eq!(ids, vec![2, 1]);
    }

    #[rstest]
    #[case::first_page(2, 0, vec![5, 4])]
    #[case::second_page(2, 2, vec![3, 2])]
    #[case::last_page(2, 4, vec![1])]
    #[case::past_end(2, 10, vec![])]
    fn test_list_for_account_paginates(
        #[case] limit: usize,
        #[case] offset: usize,
        #[case] expected: Vec<MovementId>,
    ) {
        let log = InMemoryMovementLog::new();
        for minute in 0..5 {
            log.append(NewMovement::deposit(1, dec(1)), t(minute)).unwrap();
        }

        let ids: Vec<MovementId> = log
            .list_for_account(1, page(limit, offset))
            .unwrap()
            .iter()
            .map(|m| m.id)
            .collect();

        assert_eq!(ids, expected);
    }

    #[test]
    fn test_list_in_range_is_inclusive() {
        let log = InMemoryMovementLog::new();
        for minute in 0..5 {
            log.append(NewMovement::deposit(1, dec(1)), t(minute)).unwrap();
        }
        let range = TimeRange::new(t(1), t(3)).unwrap();

        let ids: Vec<MovementId> = log
            .list_for_account_in_range(1, range, page(10, 0))
            .unwrap()
            .iter()
            .map(|m| m.id)
            .collect();

        assert_eq!(ids, vec![4, 3, 2]);
    }

    #[rstest]
    #[case::before_everything(-1, dec(0))]
    #[case::at_deposit(0, dec(100))]
    #[case::between(1, dec(100))]
    #[case::at_transfer_out(2, dec(60))]
    #[case::after_transfer_in(10, dec(70))]
    fn test_balance_at(#[case] minute: i64, #[case] expected: Decimal) {
        let log = InMemoryMovementLog::new();
        log.append(NewMovement::deposit(1, dec(100)), t(0)).unwrap();
        log.append(NewMovement::transfer(1, 2, dec(40)), t(2)).unwrap();
        log.append(NewMovement::transfer(2, 1, dec(10)), t(5)).unwrap();

        assert_eq!(log.balance_at(1, t(minute)).unwrap(), expected);
    }

    #[test]
    fn test_balance_at_unknown_account_is_zero() {
        let log = InMemoryMovementLog::new();
        assert_eq!(log.balance_at(99, t(0)).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_external_net_flow_ignores_transfers() {
        let log = InMemoryMovementLog::new();
        log.append(NewMovement::deposit(1, dec(100)), t(0)).unwrap();
        log.append(NewMovement::deposit(2, dec(50)), t(0)).unwrap();
        log.append(NewMovement::transfer(1, 2, dec(30)), t(1)).unwrap();
        log.append(NewMovement::withdraw(2, dec(20)), t(2)).unwrap();

        let everyone: HashSet<AccountId> = [1, 2].into_iter().collect();
        assert_eq!(log.external_net_flow(&everyone).unwrap(), dec(130));
    }

    #[test]
    fn test_external_net_flow_counts_only_given_accounts() {
        let log = InMemoryMovementLog::new();
        log.append(NewMovement::deposit(1, dec(100)), t(0)).unwrap();
        log.append(NewMovement::deposit(2, dec(50)), t(0)).unwrap();
        log.append(NewMovement::withdraw(2, dec(20)), t(1)).unwrap();
        log.append(NewMovement::deposit(3, dec(7)), t(2)).unwrap();

        let first: HashSet<AccountId> = [1].into_iter().collect();
        assert_eq!(log.external_net_flow(&first).unwrap(), dec(100));
        assert_eq!(log.external_net_flow(&HashSet::new()).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_closed_log_is_unavailable() {
        let log = InMemoryMovementLog::new();
        log.close();

        assert!(matches!(
            log.append(NewMovement::deposit(1, dec(1)), t(0)),
            Err(LedgerError::StorageUnavailable { .. })
        ));
        assert!(matches!(
            log.list_for_account(1, page(10, 0)),
            Err(LedgerError::StorageUnavailable { .. })
        ));
    }

    #[test]
    fn test_concurrent_appends_get_unique_ids() {
        use std::collections::HashSet;
        use std::thread;

        let log = Arc::new(InMemoryMovementLog::new());
        let mut handles = vec![];

        for i in 0..10 {
            let log = Arc::clone(&log);
            handles.push(thread::spawn(move || {
                log.append(NewMovement::deposit(1, dec(i + 1)), t(i)).unwrap().id
            }));
        }

        let ids: HashSet<MovementId> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(ids.len(), 10);
        assert_eq!(log.list_for_account(1, page(100, 0)).unwrap().len(), 10);
        assert_eq!(log.balance_at(1, t(100)).unwrap(), dec(55));
    }
}
