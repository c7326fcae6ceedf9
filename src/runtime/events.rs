//! Runtime event stream payloads.

use crate::{
    types::{OperationId, TargetRef},
    vote::VoteUpdate,
};

/// Events emitted from the voting command loop.
///
/// Every operation produces exactly one `Applied` followed by at most one of
/// `Confirmed`, `RolledBack`, or `Expired`. A write that fails after its
/// operation expired still reports `RolledBack`, with nothing to restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteEvent {
    /// An optimistic vote was recorded; display `update` now.
    Applied {
        /// Operation handle.
        operation_id: OperationId,
        /// Voted entity.
        target: TargetRef,
        /// Optimistic state.
        update: VoteUpdate,
    },
    /// The remote write succeeded.
    Confirmed {
        /// Operation handle.
        operation_id: OperationId,
        /// Voted entity.
        target: TargetRef,
    },
    /// The remote write failed; display `restored`, when present, to restore
    /// prior state.
    RolledBack {
        /// Operation handle.
        operation_id: OperationId,
        /// Voted entity.
        target: TargetRef,
        /// Pre-operation state, or `None` if the operation had already expired.
        restored: Option<VoteUpdate>,
        /// Human-readable failure.
        error: String,
    },
    /// The operation aged out before resolving. Local state may diverge from
    /// the backend until the target is refetched.
    Expired {
        /// Operation handle.
        operation_id: OperationId,
        /// Voted entity.
        target: TargetRef,
        /// Age at purge time.
        age_ms: u64,
    },
}

impl VoteEvent {
    /// Operation this event refers to.
    pub fn operation_id(&self) -> OperationId {
        match self {
            Self::Applied { operation_id, .. }
            | Self::Confirmed { operation_id, .. }
            | Self::RolledBack { operation_id, .. }
            | Self::Expired { operation_id, .. } => *operation_id,
        }
    }
}
