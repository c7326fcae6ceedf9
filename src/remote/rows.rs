use serde::{Deserialize, Serialize};

use crate::types::{CommentId, PostId, TargetKind, TargetRef, UserId, VoteDirection};

/// Table holding votes for `kind`.
pub fn table_for(kind: TargetKind) -> &'static str {
    match kind {
        TargetKind::Post => "post_votes",
        TargetKind::Comment => "comment_votes",
    }
}

/// Column naming the voted entity in [`table_for`].
pub fn target_column(kind: TargetKind) -> &'static str {
    match kind {
        TargetKind::Post => "post_id",
        TargetKind::Comment => "comment_id",
    }
}

/// Upsert conflict key for `kind`.
pub fn conflict_key(kind: TargetKind) -> &'static str {
    match kind {
        TargetKind::Post => "user_id,post_id",
        TargetKind::Comment => "user_id,comment_id",
    }
}

/// Vote row as sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRow {
    /// Voting user.
    pub user_id: UserId,
    /// Set for post votes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<PostId>,
    /// Set for comment votes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<CommentId>,
    /// `1` for up, `-1` for down.
    pub vote_type: i8,
}

impl VoteRow {
    /// Row for `user_id` voting `direction` on `target`.
    pub fn new(target: &TargetRef, user_id: &UserId, direction: VoteDirection) -> Self {
        let (post_id, comment_id) = match target.kind {
            TargetKind::Post => (Some(target.id.clone()), None),
            TargetKind::Comment => (None, Some(target.id.clone())),
        };
        Self {
            user_id: user_id.clone(),
            post_id,
            comment_id,
            vote_type: direction.vote_type(),
        }
    }

    /// Decoded vote direction, if `vote_type` is valid.
    pub fn direction(&self) -> Option<VoteDirection> {
        VoteDirection::from_vote_type(i64::from(self.vote_type))
    }
}

/// One write issued against the vote tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum VoteRequest {
    /// Insert-or-update keyed by `on_conflict`.
    Upsert {
        /// Target table.
        table: String,
        /// Conflict key columns.
        on_conflict: String,
        /// Row body.
        row: VoteRow,
    },
    /// Delete of the user's row for one target.
    Delete {
        /// Target table.
        table: String,
        /// Column matched against `target_id`.
        target_column: String,
        /// Voted entity id.
        target_id: String,
        /// Voting user.
        user_id: UserId,
    },
}

impl VoteRequest {
    /// Upsert request for `direction`.
    pub fn upsert(target: &TargetRef, user_id: &UserId, direction: VoteDirection) -> Self {
        Self::Upsert {
            table: table_for(target.kind).to_string(),
            on_conflict: conflict_key(target.kind).to_string(),
            row: VoteRow::new(target, user_id, direction),
        }
    }

    /// Delete request for the user's vote on `target`.
    pub fn delete(target: &TargetRef, user_id: &UserId) -> Self {
        Self::Delete {
            table: table_for(target.kind).to_string(),
            target_column: target_column(target.kind).to_string(),
            target_id: target.id.clone(),
            user_id: user_id.clone(),
        }
    }
}
