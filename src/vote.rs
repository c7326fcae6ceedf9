//! Client-side vote views, partial updates, and score math.

use serde::{Deserialize, Serialize};

use crate::types::{CommentId, PostId, Score, UserId, VoteDirection};

/// Post as rendered by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Backend post id.
    pub id: PostId,
    /// Author id.
    pub user_id: UserId,
    /// Post body.
    pub content: String,
    /// Aggregate score.
    pub vote_score: Score,
    /// Vote the current user has on this post.
    pub user_vote: Option<VoteDirection>,
    /// Number of comments in the thread.
    pub comment_count: u32,
    /// Creation time in milliseconds since epoch.
    pub created_at_ms: u64,
}

impl Post {
    /// Applies a vote update in place.
    pub fn apply_update(&mut self, update: &VoteUpdate) {
        update.apply_to(&mut self.vote_score, &mut self.user_vote);
    }
}

/// Comment as rendered by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Backend comment id.
    pub id: CommentId,
    /// Parent post id.
    pub post_id: PostId,
    /// Parent comment for threaded replies.
    pub parent_comment_id: Option<CommentId>,
    /// Comment body.
    pub content: String,
    /// Aggregate score.
    pub vote_score: Score,
    /// Vote the current user has on this comment.
    pub user_vote: Option<VoteDirection>,
}

impl Comment {
    /// Applies a vote update in place.
    pub fn apply_update(&mut self, update: &VoteUpdate) {
        update.apply_to(&mut self.vote_score, &mut self.user_vote);
    }
}

/// Partial update pushed into UI state for one target.
///
/// Both fields are always set: an optimistic apply and a rollback each fully
/// determine the vote state of the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteUpdate {
    /// Score to display.
    pub vote_score: Score,
    /// Vote to display.
    pub user_vote: Option<VoteDirection>,
}

impl VoteUpdate {
    /// Overwrites the given score and vote fields.
    pub fn apply_to(&self, score: &mut Score, vote: &mut Option<VoteDirection>) {
        *score = self.vote_score;
        *vote = self.user_vote;
    }
}

/// Vote value after tapping `tapped` while `current` is displayed.
///
/// Tapping the active direction toggles it off; anything else switches to it.
pub fn next_vote(current: Option<VoteDirection>, tapped: VoteDirection) -> Option<VoteDirection> {
    if current == Some(tapped) {
        None
    } else {
        Some(tapped)
    }
}

/// Score change caused by moving from `previous` to `next`.
pub fn score_delta(previous: Option<VoteDirection>, next: Option<VoteDirection>) -> Score {
    let sign = |v: Option<VoteDirection>| v.map_or(0, VoteDirection::sign);
    sign(next) - sign(previous)
}
