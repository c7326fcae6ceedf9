//! Pending optimistic operation model.

use serde::{Deserialize, Serialize};

use crate::{
    types::{OperationId, Score, TargetRef, VoteDirection},
    vote::VoteUpdate,
};

/// What an optimistic operation changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpKind {
    /// A vote was cast, switched, or removed.
    Vote {
        /// Vote value optimistically applied.
        new_vote: Option<VoteDirection>,
    },
}

/// Target state captured before the optimistic mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackData {
    /// Vote shown before the operation.
    pub previous_vote: Option<VoteDirection>,
    /// Score shown before the operation.
    pub previous_score: Score,
}

/// One in-flight optimistic mutation awaiting confirm or rollback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOp {
    /// Handle used to resolve this operation.
    pub id: OperationId,
    /// Entity that was mutated.
    pub target: TargetRef,
    /// Mutation body.
    pub kind: OpKind,
    /// Pre-mutation snapshot.
    pub rollback: RollbackData,
    /// Creation time in milliseconds, used for expiry.
    pub created_at_ms: u64,
}

impl PendingOp {
    /// Update that restores the target to its pre-operation state.
    pub fn rollback_update(&self) -> VoteUpdate {
        VoteUpdate {
            vote_score: self.rollback.previous_score,
            user_vote: self.rollback.previous_vote,
        }
    }

    /// Milliseconds elapsed since creation at `now_ms`.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.created_at_ms)
    }
}
