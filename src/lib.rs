//! Optimistic vote reconciliation for the YipYap client.
//!
//! A vote is shown immediately, written to the backend, and then either
//! confirmed or rolled back to the exact state it replaced.
//!
//! # Examples
//!
//! Standalone registry usage with [`core::manager::OptimisticUpdateManager`]:
//! ```
//! use yipyap_votes::{
//!     core::manager::OptimisticUpdateManager,
//!     types::{TargetRef, VoteDirection},
//! };
//!
//! let mut manager = OptimisticUpdateManager::new();
//! let applied = manager.apply_optimistic_vote(
//!     TargetRef::post("p1"),
//!     Some(VoteDirection::Up),
//!     None,
//!     10,
//! );
//! assert_eq!(applied.update.vote_score, 11);
//!
//! let op = manager.rollback_operation(applied.operation_id).expect("pending");
//! assert_eq!(op.rollback_update().vote_score, 10);
//! assert_eq!(manager.pending_len(), 0);
//! ```
//!
//! Service usage with an in-memory backend:
//! ```
//! use yipyap_votes::{
//!     core::manager::OptimisticUpdateManager,
//!     remote::memory::MemoryVoteClient,
//!     runtime::handle::{spawn_voting_service, RuntimeConfig},
//!     types::{CurrentUser, VoteDirection},
//!     vote::Post,
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let handle = spawn_voting_service(
//!     OptimisticUpdateManager::new(),
//!     MemoryVoteClient::new(),
//!     RuntimeConfig::default(),
//! );
//! let mut post = Post {
//!     id: "p1".to_string(),
//!     user_id: "author".to_string(),
//!     content: "free pizza at the quad".to_string(),
//!     vote_score: 10,
//!     user_vote: None,
//!     comment_count: 0,
//!     created_at_ms: 0,
//! };
//! let me = CurrentUser::new("device-1");
//!
//! let outcome = handle.vote_on_post(&post, VoteDirection::Up, &me).await.expect("vote");
//! if let Some(update) = outcome.final_update() {
//!     post.apply_update(&update);
//! }
//! assert_eq!((post.vote_score, post.user_vote), (11, Some(VoteDirection::Up)));
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![deny(missing_docs)]

/// Optimistic operation registry plus clock and id sources.
pub mod core;
/// Pending operation model.
pub mod op;
/// Remote vote client abstraction and implementations.
pub mod remote;
/// Voting service handle and events.
pub mod runtime;
/// Shared identifiers and enums.
pub mod types;
/// Client vote views, updates, and score math.
pub mod vote;
