use std::sync::Arc;

use hashbrown::HashSet;
use tokio::{
    sync::{broadcast, mpsc, oneshot},
    time::{Duration, MissedTickBehavior},
};
use tracing::{info, warn};

use crate::{
    core::manager::{AppliedVote, OptimisticUpdateManager},
    op::PendingOp,
    remote::{RemoteError, VoteClient},
    types::{CommentId, CurrentUser, OperationId, PostId, Score, TargetRef, VoteDirection},
    vote::{Post, VoteUpdate, next_vote},
};

use super::events::VoteEvent;

/// Failure talking to the voting command loop.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    /// The loop has shut down.
    #[error("voting service is not running")]
    ChannelClosed,
}

/// Command loop tuning.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Bound of the command queue.
    pub command_queue_bound: usize,
    /// Capacity of the event broadcast buffer.
    pub event_capacity: usize,
    /// Period of the expiry sweep; `0` disables it.
    pub cleanup_interval_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_queue_bound: 256,
            event_capacity: 1024,
            cleanup_interval_ms: 30_000,
        }
    }
}

/// How one vote action ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The remote write succeeded and the optimistic state stands.
    Confirmed {
        /// Resolved operation.
        operation_id: OperationId,
        /// State now displayed.
        applied: VoteUpdate,
    },
    /// The remote write failed and the prior state was restored.
    RolledBack {
        /// Resolved operation.
        operation_id: OperationId,
        /// Restored state, or `None` if the operation had already expired.
        restored: Option<VoteUpdate>,
        /// Write failure.
        error: RemoteError,
    },
}

impl VoteOutcome {
    /// Operation this outcome resolves.
    pub fn operation_id(&self) -> OperationId {
        match self {
            Self::Confirmed { operation_id, .. } | Self::RolledBack { operation_id, .. } => *operation_id,
        }
    }

    /// True when the remote write succeeded.
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }

    /// Write failure, if any.
    pub fn error(&self) -> Option<&RemoteError> {
        match self {
            Self::Confirmed { .. } => None,
            Self::RolledBack { error, .. } => Some(error),
        }
    }

    /// State the caller should display once the action is over.
    pub fn final_update(&self) -> Option<VoteUpdate> {
        match self {
            Self::Confirmed { applied, .. } => Some(*applied),
            Self::RolledBack { restored, .. } => *restored,
        }
    }
}

/// Clonable handle to the voting service.
///
/// The optimistic registry lives inside a single command loop; remote writes
/// run on the caller's task so overlapping votes do not block each other.
pub struct VotingHandle<C> {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<VoteEvent>,
    client: Arc<C>,
}

impl<C> Clone for VotingHandle<C> {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
            client: Arc::clone(&self.client),
        }
    }
}

enum Command {
    Apply {
        target: TargetRef,
        new_vote: Option<VoteDirection>,
        previous_vote: Option<VoteDirection>,
        previous_score: Score,
        resp: oneshot::Sender<AppliedVote>,
    },
    Confirm {
        id: OperationId,
        resp: oneshot::Sender<bool>,
    },
    Rollback {
        id: OperationId,
        target: TargetRef,
        error: String,
        resp: oneshot::Sender<Option<VoteUpdate>>,
    },
    IsPending {
        target: TargetRef,
        resp: oneshot::Sender<bool>,
    },
    Pending {
        resp: oneshot::Sender<Vec<PendingOp>>,
    },
    InFlight {
        resp: oneshot::Sender<usize>,
    },
    Cleanup {
        resp: oneshot::Sender<usize>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Starts the voting command loop on the current tokio runtime.
pub fn spawn_voting_service<C: VoteClient>(
    manager: OptimisticUpdateManager,
    client: C,
    config: RuntimeConfig,
) -> VotingHandle<C> {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound);
    let (events_tx, _) = broadcast::channel::<VoteEvent>(config.event_capacity);
    let events_tx_loop = events_tx.clone();

    tokio::spawn(async move {
        let mut manager = manager;
        let mut in_flight = HashSet::<OperationId>::new();

        let sweep_enabled = config.cleanup_interval_ms > 0;
        let mut sweep = tokio::time::interval(Duration::from_millis(config.cleanup_interval_ms.max(1)));
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            max_age_ms = manager.config().max_age_ms,
            cleanup_interval_ms = config.cleanup_interval_ms,
            "voting service started"
        );

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    let Some(cmd) = cmd else { break; };
                    if handle_command(cmd, &mut manager, &mut in_flight, &events_tx_loop) {
                        break;
                    }
                }
                _ = sweep.tick(), if sweep_enabled => {
                    run_cleanup(&mut manager, &mut in_flight, &events_tx_loop);
                }
            }
        }

        info!(pending = manager.pending_len(), "voting service stopped");
    });

    VotingHandle {
        cmd_tx,
        events_tx,
        client: Arc::new(client),
    }
}

impl<C: VoteClient> VotingHandle<C> {
    /// Subscribes to optimistic, confirm, rollback, and expiry events.
    pub fn subscribe(&self) -> broadcast::Receiver<VoteEvent> {
        self.events_tx.subscribe()
    }

    /// Remote client used for writes.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Votes `direction` on `post`, toggling off when it matches the current vote.
    pub async fn vote_on_post(
        &self,
        post: &Post,
        direction: VoteDirection,
        user: &CurrentUser,
    ) -> Result<VoteOutcome, RuntimeError> {
        self.vote(TargetRef::post(post.id.clone()), post.user_vote, post.vote_score, direction, user)
            .await
    }

    /// Votes `direction` on a comment whose displayed state is
    /// `current_vote` / `current_score`.
    pub async fn vote_on_comment(
        &self,
        comment_id: &CommentId,
        current_vote: Option<VoteDirection>,
        current_score: Score,
        direction: VoteDirection,
        user: &CurrentUser,
    ) -> Result<VoteOutcome, RuntimeError> {
        self.vote(TargetRef::comment(comment_id.clone()), current_vote, current_score, direction, user)
            .await
    }

    /// True while a vote on the post awaits its remote write.
    pub async fn is_post_vote_pending(&self, post_id: &PostId) -> Result<bool, RuntimeError> {
        let target = TargetRef::post(post_id.clone());
        self.request(|resp| Command::IsPending { target, resp }).await
    }

    /// True while a vote on the comment awaits its remote write.
    pub async fn is_comment_vote_pending(&self, comment_id: &CommentId) -> Result<bool, RuntimeError> {
        let target = TargetRef::comment(comment_id.clone());
        self.request(|resp| Command::IsPending { target, resp }).await
    }

    /// Number of vote actions started but not yet finished.
    pub async fn pending_operations_count(&self) -> Result<usize, RuntimeError> {
        self.request(|resp| Command::InFlight { resp }).await
    }

    /// Snapshot of the optimistic registry.
    pub async fn pending_operations(&self) -> Result<Vec<PendingOp>, RuntimeError> {
        self.request(|resp| Command::Pending { resp }).await
    }

    /// Runs an expiry sweep now and returns how many operations were purged.
    pub async fn cleanup(&self) -> Result<usize, RuntimeError> {
        self.request(|resp| Command::Cleanup { resp }).await
    }

    /// Stops the command loop.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.request(|resp| Command::Shutdown { resp }).await
    }

    async fn vote(
        &self,
        target: TargetRef,
        current_vote: Option<VoteDirection>,
        current_score: Score,
        tapped: VoteDirection,
        user: &CurrentUser,
    ) -> Result<VoteOutcome, RuntimeError> {
        let new_vote = next_vote(current_vote, tapped);
        let applied = {
            let target = target.clone();
            self.request(|resp| Command::Apply {
                target,
                new_vote,
                previous_vote: current_vote,
                previous_score: current_score,
                resp,
            })
            .await?
        };
        let id = applied.operation_id;

        let write = match new_vote {
            Some(direction) => self.client.upsert_vote(&target, &user.id, direction).await,
            None => self.client.delete_vote(&target, &user.id).await,
        };

        match write {
            Ok(()) => {
                self.request(|resp| Command::Confirm { id, resp }).await?;
                Ok(VoteOutcome::Confirmed {
                    operation_id: id,
                    applied: applied.update,
                })
            }
            Err(error) => {
                warn!(%id, %target, %error, "vote write failed");
                let message = error.to_string();
                let restored = self
                    .request(|resp| Command::Rollback {
                        id,
                        target,
                        error: message,
                        resp,
                    })
                    .await?;
                Ok(VoteOutcome::RolledBack {
                    operation_id: id,
                    restored,
                    error,
                })
            }
        }
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }
}

fn handle_command(
    cmd: Command,
    manager: &mut OptimisticUpdateManager,
    in_flight: &mut HashSet<OperationId>,
    events_tx: &broadcast::Sender<VoteEvent>,
) -> bool {
    match cmd {
        Command::Apply {
            target,
            new_vote,
            previous_vote,
            previous_score,
            resp,
        } => {
            let applied = manager.apply_optimistic_vote(target.clone(), new_vote, previous_vote, previous_score);
            in_flight.insert(applied.operation_id);
            let _ = events_tx.send(VoteEvent::Applied {
                operation_id: applied.operation_id,
                target,
                update: applied.update,
            });
            let _ = resp.send(applied);
        }
        Command::Confirm { id, resp } => {
            in_flight.remove(&id);
            let confirmed = manager.confirm_operation(id);
            if let Some(op) = &confirmed {
                let _ = events_tx.send(VoteEvent::Confirmed {
                    operation_id: id,
                    target: op.target.clone(),
                });
            }
            let _ = resp.send(confirmed.is_some());
        }
        Command::Rollback {
            id,
            target,
            error,
            resp,
        } => {
            in_flight.remove(&id);
            let restored = manager.rollback_operation(id).map(|op| op.rollback_update());
            let _ = events_tx.send(VoteEvent::RolledBack {
                operation_id: id,
                target,
                restored,
                error,
            });
            let _ = resp.send(restored);
        }
        Command::IsPending { target, resp } => {
            let _ = resp.send(manager.is_pending(&target));
        }
        Command::Pending { resp } => {
            let _ = resp.send(manager.pending_operations());
        }
        Command::InFlight { resp } => {
            let _ = resp.send(in_flight.len());
        }
        Command::Cleanup { resp } => {
            let purged = run_cleanup(manager, in_flight, events_tx);
            let _ = resp.send(purged);
        }
        Command::Shutdown { resp } => {
            let _ = resp.send(());
            return true;
        }
    }

    false
}

fn run_cleanup(
    manager: &mut OptimisticUpdateManager,
    in_flight: &mut HashSet<OperationId>,
    events_tx: &broadcast::Sender<VoteEvent>,
) -> usize {
    let expired = manager.cleanup();
    for e in &expired {
        in_flight.remove(&e.op.id);
        let _ = events_tx.send(VoteEvent::Expired {
            operation_id: e.op.id,
            target: e.op.target.clone(),
            age_ms: e.age_ms,
        });
    }
    expired.len()
}
