//! SQLite-backed vote tables.

use std::{
    path::Path,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use rusqlite::{Connection, OptionalExtension, params};
use tokio::sync::Mutex;

use crate::types::{Score, TargetRef, UserId, VoteDirection};

use super::{
    RemoteError, RemoteResult, VoteClient,
    rows::{conflict_key, table_for, target_column},
};

/// [`VoteClient`] writing to local `post_votes` / `comment_votes` tables.
///
/// Mirrors the hosted schema: one row per `(user, target)` with upserts keyed
/// on that pair.
#[derive(Clone)]
pub struct SqliteVoteClient {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteVoteClient {
    /// Opens or creates the vote database at `path`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> RemoteResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    /// Opens an in-memory vote database.
    pub fn open_in_memory() -> RemoteResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> RemoteResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Stored vote of `user_id` on `target`.
    pub async fn vote_of(&self, target: &TargetRef, user_id: &UserId) -> RemoteResult<Option<VoteDirection>> {
        let sql = format!(
            "SELECT vote_type FROM {} WHERE user_id = ?1 AND {} = ?2",
            table_for(target.kind),
            target_column(target.kind)
        );
        let user_id = user_id.clone();
        let target_id = target.id.clone();
        let vote_type = self
            .with_conn(move |conn| {
                conn.query_row(&sql, params![user_id, target_id], |row| row.get::<_, i64>(0))
                    .optional()
            })
            .await?;
        Ok(vote_type.and_then(VoteDirection::from_vote_type))
    }

    /// Authoritative score of `target`: the sum of its `vote_type` column.
    pub async fn score_of(&self, target: &TargetRef) -> RemoteResult<Score> {
        let sql = format!(
            "SELECT COALESCE(SUM(vote_type), 0) FROM {} WHERE {} = ?1",
            table_for(target.kind),
            target_column(target.kind)
        );
        let target_id = target.id.clone();
        self.with_conn(move |conn| conn.query_row(&sql, params![target_id], |row| row.get(0)))
            .await
    }

    /// Number of vote rows for `target`.
    pub async fn vote_count(&self, target: &TargetRef) -> RemoteResult<usize> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ?1",
            table_for(target.kind),
            target_column(target.kind)
        );
        let target_id = target.id.clone();
        let count: i64 = self
            .with_conn(move |conn| conn.query_row(&sql, params![target_id], |row| row.get(0)))
            .await?;
        Ok(count as usize)
    }

    async fn with_conn<T, F>(&self, f: F) -> RemoteResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            f(&conn)
        })
        .await
        .map_err(|e| RemoteError::Storage(format!("join error: {e}")))?
        .map_err(RemoteError::from)
    }
}

impl VoteClient for SqliteVoteClient {
    async fn upsert_vote(&self, target: &TargetRef, user_id: &UserId, direction: VoteDirection) -> RemoteResult<()> {
        let sql = format!(
            "INSERT INTO {table}(user_id, {col}, vote_type, created_at_ms, updated_at_ms) \
             VALUES (?1, ?2, ?3, ?4, ?4) \
             ON CONFLICT({conflict}) DO UPDATE SET \
             vote_type = excluded.vote_type, updated_at_ms = excluded.updated_at_ms",
            table = table_for(target.kind),
            col = target_column(target.kind),
            conflict = conflict_key(target.kind),
        );
        let user_id = user_id.clone();
        let target_id = target.id.clone();
        let vote_type = i64::from(direction.vote_type());
        let ts_ms = now_ms() as i64;
        self.with_conn(move |conn| conn.execute(&sql, params![user_id, target_id, vote_type, ts_ms]))
            .await?;
        Ok(())
    }

    async fn delete_vote(&self, target: &TargetRef, user_id: &UserId) -> RemoteResult<()> {
        let sql = format!(
            "DELETE FROM {} WHERE user_id = ?1 AND {} = ?2",
            table_for(target.kind),
            target_column(target.kind)
        );
        let user_id = user_id.clone();
        let target_id = target.id.clone();
        self.with_conn(move |conn| conn.execute(&sql, params![user_id, target_id]))
            .await?;
        Ok(())
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
