//! Shared identifiers and vote-related enums.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Backend post identifier.
pub type PostId = String;
/// Backend comment identifier.
pub type CommentId = String;
/// Anonymous (device-bound) user identifier.
pub type UserId = String;
/// Aggregate up-minus-down vote count.
pub type Score = i64;

/// Opaque handle for one optimistic operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperationId(pub u64);

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op-{}", self.0)
    }
}

/// Kind of entity a vote is cast on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// Top-level post.
    Post,
    /// Threaded comment.
    Comment,
}

/// Direction of a cast vote. An absent vote is `None` at use sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteDirection {
    /// Upvote.
    Up,
    /// Downvote.
    Down,
}

impl VoteDirection {
    /// Contribution of this vote to the aggregate score.
    pub fn sign(self) -> Score {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }

    /// Backend `vote_type` column value.
    pub fn vote_type(self) -> i8 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }

    /// Inverse of [`VoteDirection::vote_type`].
    pub fn from_vote_type(v: i64) -> Option<Self> {
        match v {
            1 => Some(Self::Up),
            -1 => Some(Self::Down),
            _ => None,
        }
    }
}

/// Identity of a vote target: kind plus backend id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetRef {
    /// Target kind.
    pub kind: TargetKind,
    /// Backend id of the post or comment.
    pub id: String,
}

impl TargetRef {
    /// Reference to a post.
    pub fn post(id: impl Into<PostId>) -> Self {
        Self {
            kind: TargetKind::Post,
            id: id.into(),
        }
    }

    /// Reference to a comment.
    pub fn comment(id: impl Into<CommentId>) -> Self {
        Self {
            kind: TargetKind::Comment,
            id: id.into(),
        }
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TargetKind::Post => write!(f, "post:{}", self.id),
            TargetKind::Comment => write!(f, "comment:{}", self.id),
        }
    }
}

/// The signed-in anonymous user issuing votes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Backend user id.
    pub id: UserId,
}

impl CurrentUser {
    /// Wraps a user id.
    pub fn new(id: impl Into<UserId>) -> Self {
        Self { id: id.into() }
    }
}
