//! In-process vote backend.

use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
};

use hashbrown::HashMap;

use crate::types::{Score, TargetRef, UserId, VoteDirection};

use super::{RemoteError, RemoteResult, VoteClient, rows::VoteRequest};

#[derive(Default)]
struct Inner {
    votes: HashMap<(TargetRef, UserId), VoteDirection>,
    queued_failures: VecDeque<RemoteError>,
    always_fail: Option<RemoteError>,
    requests: Vec<VoteRequest>,
}

/// [`VoteClient`] keeping vote rows in memory.
///
/// Every request is logged, including ones that fail. Failures are consumed
/// from the `fail_next` queue first, then from `fail_always`.
#[derive(Default)]
pub struct MemoryVoteClient {
    inner: Mutex<Inner>,
}

impl MemoryVoteClient {
    /// Empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the next request with `err`. Calls queue up.
    pub fn fail_next(&self, err: RemoteError) {
        self.lock().queued_failures.push_back(err);
    }

    /// Fails every request with `err` until [`clear_failures`](Self::clear_failures).
    pub fn fail_always(&self, err: RemoteError) {
        self.lock().always_fail = Some(err);
    }

    /// Drops all injected failures.
    pub fn clear_failures(&self) {
        let mut inner = self.lock();
        inner.queued_failures.clear();
        inner.always_fail = None;
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<VoteRequest> {
        self.lock().requests.clone()
    }

    /// Stored vote of `user_id` on `target`.
    pub fn vote_of(&self, target: &TargetRef, user_id: &UserId) -> Option<VoteDirection> {
        self.lock().votes.get(&(target.clone(), user_id.clone())).copied()
    }

    /// Sum of stored votes on `target`.
    pub fn score_of(&self, target: &TargetRef) -> Score {
        self.lock()
            .votes
            .iter()
            .filter(|((t, _), _)| t == target)
            .map(|(_, v)| v.sign())
            .sum()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, req: VoteRequest) -> RemoteResult<MutexGuard<'_, Inner>> {
        let mut inner = self.lock();
        inner.requests.push(req);
        if let Some(err) = inner.queued_failures.pop_front() {
            return Err(err);
        }
        if let Some(err) = &inner.always_fail {
            return Err(err.clone());
        }
        Ok(inner)
    }
}

impl VoteClient for MemoryVoteClient {
    async fn upsert_vote(&self, target: &TargetRef, user_id: &UserId, direction: VoteDirection) -> RemoteResult<()> {
        let mut inner = self.record(VoteRequest::upsert(target, user_id, direction))?;
        inner.votes.insert((target.clone(), user_id.clone()), direction);
        Ok(())
    }

    async fn delete_vote(&self, target: &TargetRef, user_id: &UserId) -> RemoteResult<()> {
        let mut inner = self.record(VoteRequest::delete(target, user_id))?;
        inner.votes.remove(&(target.clone(), user_id.clone()));
        Ok(())
    }
}
