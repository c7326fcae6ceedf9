use std::collections::VecDeque;

use hashbrown::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::{
    op::{OpKind, PendingOp, RollbackData},
    types::{OperationId, Score, TargetRef, VoteDirection},
    vote::{VoteUpdate, score_delta},
};

use super::{
    clock::{Clock, IdGenerator, SequentialIds, SystemClock},
    indices::{VecIndex, remove_from_vec_index},
};

/// Registry tuning.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Operations older than this are purged by [`OptimisticUpdateManager::cleanup`].
    pub max_age_ms: u64,
    /// Trip a debug assertion when an unknown operation id is resolved.
    /// Ids recently purged by cleanup are exempt.
    pub assert_single_resolution: bool,
    /// How many purged ids are remembered for late resolutions.
    pub expired_id_capacity: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            max_age_ms: 60_000,
            assert_single_resolution: false,
            expired_id_capacity: 1024,
        }
    }
}

/// Result of recording an optimistic vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedVote {
    /// Handle for the later confirm or rollback.
    pub operation_id: OperationId,
    /// Update the caller must push into its UI state now.
    pub update: VoteUpdate,
}

/// Operation purged by [`OptimisticUpdateManager::cleanup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiredOp {
    /// The purged operation.
    pub op: PendingOp,
    /// Age at purge time.
    pub age_ms: u64,
}

/// Registry of pending optimistic operations.
///
/// Every recorded operation leaves the registry exactly once: through
/// [`confirm_operation`](Self::confirm_operation),
/// [`rollback_operation`](Self::rollback_operation), or an expiry sweep.
pub struct OptimisticUpdateManager {
    ops: HashMap<OperationId, PendingOp>,
    order: Vec<OperationId>,
    by_target: VecIndex<TargetRef>,
    expired: HashSet<OperationId>,
    expired_order: VecDeque<OperationId>,
    clock: Box<dyn Clock>,
    ids: Box<dyn IdGenerator>,
    config: ManagerConfig,
}

impl Default for OptimisticUpdateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl OptimisticUpdateManager {
    /// Manager using the wall clock and sequential ids.
    pub fn new() -> Self {
        Self::with_parts(
            ManagerConfig::default(),
            Box::new(SystemClock),
            Box::new(SequentialIds::default()),
        )
    }

    /// Manager with explicit configuration, clock, and id source.
    pub fn with_parts(config: ManagerConfig, clock: Box<dyn Clock>, ids: Box<dyn IdGenerator>) -> Self {
        Self {
            ops: HashMap::new(),
            order: Vec::new(),
            by_target: VecIndex::new(),
            expired: HashSet::new(),
            expired_order: VecDeque::new(),
            clock,
            ids,
            config,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Records an optimistic vote and returns the update to display.
    ///
    /// `previous_vote` and `previous_score` must describe the target as the
    /// caller sees it right now; they become this operation's rollback data.
    pub fn apply_optimistic_vote(
        &mut self,
        target: TargetRef,
        new_vote: Option<VoteDirection>,
        previous_vote: Option<VoteDirection>,
        previous_score: Score,
    ) -> AppliedVote {
        let update = VoteUpdate {
            vote_score: previous_score.saturating_add(score_delta(previous_vote, new_vote)),
            user_vote: new_vote,
        };

        let id = self.ids.next_id();
        let op = PendingOp {
            id,
            target: target.clone(),
            kind: OpKind::Vote { new_vote },
            rollback: RollbackData {
                previous_vote,
                previous_score,
            },
            created_at_ms: self.clock.now_ms(),
        };

        debug!(%id, %target, ?new_vote, score = update.vote_score, "optimistic vote applied");
        self.by_target.entry(target).or_default().push(id);
        self.order.push(id);
        self.ops.insert(id, op);

        AppliedVote {
            operation_id: id,
            update,
        }
    }

    /// Drops a successfully written operation. Unknown ids are ignored.
    pub fn confirm_operation(&mut self, id: OperationId) -> Option<PendingOp> {
        let op = self.take(id, "confirm")?;
        debug!(%id, target = %op.target, "optimistic operation confirmed");
        Some(op)
    }

    /// Removes a failed operation and returns it so the caller can apply
    /// [`PendingOp::rollback_update`]. Unknown ids are ignored.
    pub fn rollback_operation(&mut self, id: OperationId) -> Option<PendingOp> {
        let op = self.take(id, "rollback")?;
        warn!(
            %id,
            target = %op.target,
            previous_score = op.rollback.previous_score,
            "optimistic operation rolled back"
        );
        Some(op)
    }

    /// Snapshot of all pending operations in creation order.
    pub fn pending_operations(&self) -> Vec<PendingOp> {
        self.order
            .iter()
            .filter_map(|id| self.ops.get(id).cloned())
            .collect()
    }

    /// Pending operations for one target in creation order.
    pub fn pending_for(&self, target: &TargetRef) -> Vec<&PendingOp> {
        self.by_target
            .get(target)
            .into_iter()
            .flat_map(|ids| ids.iter())
            .filter_map(|id| self.ops.get(id))
            .collect()
    }

    /// True when at least one operation on `target` is pending.
    pub fn is_pending(&self, target: &TargetRef) -> bool {
        self.by_target.get(target).is_some_and(|ids| !ids.is_empty())
    }

    /// Looks up a pending operation.
    pub fn get(&self, id: OperationId) -> Option<&PendingOp> {
        self.ops.get(&id)
    }

    /// Number of pending operations.
    pub fn pending_len(&self) -> usize {
        self.ops.len()
    }

    /// Purges operations older than [`ManagerConfig::max_age_ms`].
    ///
    /// Purged operations are not rolled back; the returned list lets the
    /// caller decide whether a resync is needed.
    pub fn cleanup(&mut self) -> Vec<ExpiredOp> {
        let now = self.clock.now_ms();
        let max_age = self.config.max_age_ms;
        let stale: Vec<OperationId> = self
            .order
            .iter()
            .copied()
            .filter(|id| self.ops.get(id).is_some_and(|op| op.age_ms(now) > max_age))
            .collect();

        let mut purged = Vec::with_capacity(stale.len());
        for id in stale {
            if let Some(op) = self.remove(id) {
                let age_ms = op.age_ms(now);
                warn!(
                    %id,
                    target = %op.target,
                    age_ms,
                    "purging stale optimistic operation without rollback"
                );
                self.remember_expired(id);
                purged.push(ExpiredOp { op, age_ms });
            }
        }
        purged
    }

    fn take(&mut self, id: OperationId, action: &'static str) -> Option<PendingOp> {
        let op = self.remove(id);
        if op.is_none() {
            if self.expired.remove(&id) {
                debug!(%id, action, "late resolution of expired optimistic operation");
                return None;
            }
            debug!(%id, action, "ignoring unknown optimistic operation");
            debug_assert!(
                !self.config.assert_single_resolution,
                "{action} of unknown optimistic operation {id}"
            );
        }
        op
    }

    fn remember_expired(&mut self, id: OperationId) {
        if self.config.expired_id_capacity == 0 {
            return;
        }
        while self.expired_order.len() >= self.config.expired_id_capacity {
            if let Some(old) = self.expired_order.pop_front() {
                self.expired.remove(&old);
            }
        }
        self.expired_order.push_back(id);
        self.expired.insert(id);
    }

    fn remove(&mut self, id: OperationId) -> Option<PendingOp> {
        let op = self.ops.remove(&id)?;
        if let Some(pos) = self.order.iter().position(|x| *x == id) {
            self.order.remove(pos);
        }
        if let Some(ids) = self.by_target.get_mut(&op.target) {
            remove_from_vec_index(ids, id);
            if ids.is_empty() {
                self.by_target.remove(&op.target);
            }
        }
        Some(op)
    }
}
