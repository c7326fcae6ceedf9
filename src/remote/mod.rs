//! Remote vote mutation client abstraction and implementations.

/// In-process client with failure injection.
pub mod memory;
/// Vote row wire model, tables, and conflict keys.
pub mod rows;
/// Local SQLite-backed client.
pub mod sqlite;

use crate::types::{TargetRef, UserId, VoteDirection};

/// Failure of a remote vote write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// Connectivity loss or transport failure.
    #[error("network error: {0}")]
    Network(String),
    /// The request did not complete in time.
    #[error("request timed out")]
    Timeout,
    /// The backend refused the write (constraint, row-level security, auth).
    #[error("rejected by backend ({code}): {message}")]
    Rejected {
        /// Backend error code.
        code: String,
        /// Backend error message.
        message: String,
    },
    /// Local storage failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<rusqlite::Error> for RemoteError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(value.to_string())
    }
}

/// Result alias for remote writes.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Request/response vote writes against the backend.
///
/// Implementations are keyed by `(user, target)`: an upsert overwrites any
/// existing vote and a delete of a missing vote succeeds.
pub trait VoteClient: Send + Sync + 'static {
    /// Inserts or overwrites the user's vote on `target`.
    fn upsert_vote(
        &self,
        target: &TargetRef,
        user_id: &UserId,
        direction: VoteDirection,
    ) -> impl Future<Output = RemoteResult<()>> + Send;

    /// Removes the user's vote on `target`.
    fn delete_vote(&self, target: &TargetRef, user_id: &UserId) -> impl Future<Output = RemoteResult<()>> + Send;
}
