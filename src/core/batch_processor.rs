//! Concurrent batch replay of ledger commands
//!
//! This module provides the `BatchProcessor` struct, which applies a batch of
//! replayed commands to a shared `LedgerEngine` with as much concurrency as
//! the command stream allows.
//!
//! # Design
//!
//! `open` and `seed` commands are barriers: they run one at a time, in input
//! order, after everything before them has finished. The transfers between
//! two barriers form a segment. A segment is split into groups of transfers
//! connected through shared accounts; each group runs on its own tokio task in
//! input order, and groups run concurrently. Groups touch disjoint accounts, so
//! a replayed batch ends in the same state as applying every command in input
//! order.
//!
//! ```text
//! open open seed | 1→2 2→3 4→5 | seed | 1→2 1→3
//!  (in order)    |  {1→2 2→3}  |      |  {1→2 1→3}
//!                |  {4→5}      |      |
//! ```

use std::collections::HashMap;

use tracing::{debug, error};

use super::engine::LedgerEngine;
use super::traits::{AccountLedger, MovementLog};
use crate::types::{AccountId, LedgerCommand, LedgerError};

/// Result of applying a single command
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The command that was applied
    pub command: LedgerCommand,

    /// The result of applying it
    pub result: Result<(), LedgerError>,
}

/// Disjoint sets of accounts joined by the commands that touch them
#[derive(Debug, Default)]
struct AccountGroups {
    parents: HashMap<AccountId, AccountId>,
}

impl AccountGroups {
    fn find(&mut self, account: AccountId) -> AccountId {
        let mut root = account;
        while let Some(&parent) = self.parents.get(&root) {
            if parent == root {
                break;
            }
            root = parent;
        }

        // Path compression
        let mut current = account;
        while current != root {
            let next = self.parents.insert(current, root).unwrap_or(root);
            current = next;
        }
        root
    }

    fn union(&mut self, a: AccountId, b: AccountId) {
        let (root_a, root_b) = (self.find(a), self.find(b));
        if root_a != root_b {
            self.parents.insert(root_a.max(root_b), root_a.min(root_b));
        }
    }
}

/// Batch processor with barrier-delimited concurrent segments
#[derive(Debug)]
pub struct BatchProcessor<L, M> {
    /// Shared engine; clones share the same stores
    engine: LedgerEngine<L, M>,
}

impl<L, M> Clone for BatchProcessor<L, M> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}

impl<L, M> BatchProcessor<L, M>
where
    L: AccountLedger + 'static,
    M: MovementLog + 'static,
{
    pub fn new(engine: LedgerEngine<L, M>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &LedgerEngine<L, M> {
        &self.engine
    }

    /// Split a batch into runs of commands that may share a scheduling step
    ///
    /// Each barrier forms its own segment; consecutive transfers are grouped.
    /// Input order is preserved across and within segments.
    pub fn segment(&self, batch: Vec<LedgerCommand>) -> Vec<Vec<LedgerCommand>> {
        let mut segments: Vec<Vec<LedgerCommand>> = Vec::new();

        for command in batch {
            let extends_last = !command.is_barrier()
                && segments
                    .last()
                    .and_then(|segment| segment.last())
                    .is_some_and(|last| !last.is_barrier());

            match segments.last_mut() {
                Some(segment) if extends_last => segment.push(command),
                _ => segments.push(vec![command]),
            }
        }

        segments
    }

    /// Partition commands into groups that share no account
    ///
    /// Commands connected through a common account, directly or through a
    /// chain of other commands, land in the same group. Each entry carries its
    /// position in `commands`.
    ///
    /// # Guarantees
    ///
    /// - Each command appears in exactly one group
    /// - Commands within a group keep their input order
    /// - No account is touched by two different groups
    pub fn partition_by_accounts(
        &self,
        commands: Vec<LedgerCommand>,
    ) -> Vec<Vec<(usize, LedgerCommand)>> {
        let mut accounts = AccountGroups::default();
        for command in &commands {
            if let Some((first, rest)) = command.accounts().split_first() {
                for other in rest {
                    accounts.union(*first, *other);
                }
            }
        }

        let mut groups: Vec<Vec<(usize, LedgerCommand)>> = Vec::new();
        let mut group_of_root: HashMap<AccountId, usize> = HashMap::new();
        for (position, command) in commands.into_iter().enumerate() {
            match command.accounts().first() {
                Some(&account) => {
                    let root = accounts.find(account);
                    let index = *group_of_root.entry(root).or_insert_with(|| {
                        groups.push(Vec::new());
                        groups.len() - 1
                    });
                    groups[index].push((position, command));
                }
                None => groups.push(vec![(position, command)]),
            }
        }

        groups
    }

    /// Apply a group of commands sequentially, in the order given
    ///
    /// Errors are captured in the results and don't stop processing.
    pub async fn process_group(
        &self,
        group: Vec<(usize, LedgerCommand)>,
    ) -> Vec<(usize, ProcessingResult)> {
        let mut results = Vec::with_capacity(group.len());

        for (position, command) in group {
            let result = self.engine.process_command(command.clone()).await;
            results.push((position, ProcessingResult { command, result }));
        }

        results
    }

    /// Apply a run of transfers with one task per account group
    ///
    /// Transfers sharing an account take effect in input order. Results are
    /// returned in input order.
    pub async fn process_transfers(&self, transfers: Vec<LedgerCommand>) -> Vec<ProcessingResult> {
        let groups = self.partition_by_accounts(transfers);
        debug!(groups = groups.len(), "running transfer groups concurrently");

        let mut tasks = Vec::with_capacity(groups.len());
        for group in groups {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move { processor.process_group(group).await }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(group_results) => results.extend(group_results),
                Err(e) => error!(error = %e, "transfer group task failed to complete"),
            }
        }

        results.sort_by_key(|(position, _)| *position);
        results.into_iter().map(|(_, result)| result).collect()
    }

    /// Apply a batch of commands
    ///
    /// # Guarantees
    ///
    /// - Every command is applied, even if some fail
    /// - Barriers see the effects of every command before them
    /// - Commands sharing an account take effect in input order
    /// - Errors are captured in the results and don't stop processing
    /// - Results are in input order
    pub async fn process_batch(&self, batch: Vec<LedgerCommand>) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(batch.len());

        for segment in self.segment(batch) {
            let is_barrier = segment.first().is_some_and(LedgerCommand::is_barrier);
            if is_barrier {
                for command in segment {
                    let result = self.engine.process_command(command.clone()).await;
                    results.push(ProcessingResult { command, result });
                }
            } else {
                debug!(transfers = segment.len(), "running concurrent transfer segment");
                results.extend(self.process_transfers(segment).await);
            }
        }

        results
    }
}
