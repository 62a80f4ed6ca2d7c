use crate::models::UrlRecord;
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

/// Insert-time failures carry which unique constraint fired, so the
/// caller can tell a code collision (retry with a fresh candidate)
/// from an already-shortened URL (fetch and return the existing row).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("short code already exists")]
    CodeConflict,
    #[error("original URL already shortened")]
    UrlConflict,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Durable table of short-code mappings. The sole source of truth;
/// the cache layer only ever holds derived copies.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables and unique indexes).
    async fn init(&self) -> Result<()>;

    /// Atomically insert a new mapping with `click_count = 0` and no
    /// last-access timestamp. The unique constraints on both columns
    /// are the authority on uniqueness; see [`StorageError`].
    async fn create_if_absent(
        &self,
        short_code: &str,
        original_url: &str,
    ) -> StorageResult<UrlRecord>;

    /// Look up a mapping by short code.
    async fn find_by_code(&self, short_code: &str) -> Result<Option<UrlRecord>>;

    /// Look up a mapping by original URL (idempotent-shorten check).
    async fn find_by_url(&self, original_url: &str) -> Result<Option<UrlRecord>>;

    /// Advisory existence pre-check. Cheap, but racy by itself: the
    /// constrained insert in `create_if_absent` remains the authority.
    async fn exists(&self, short_code: &str) -> Result<bool>;

    /// Atomically bump `click_count` and set `last_accessed_at` in a
    /// single UPDATE. Returns false when no row matches.
    async fn increment_and_touch(&self, short_code: &str, now: i64) -> Result<bool>;
}

/// Classify a sqlx error from the insert path into a tagged
/// [`StorageError`]. Unique violations name the offending column (or
/// constraint) in the driver message for both SQLite and Postgres.
pub(crate) fn classify_insert_error(err: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(ref db) = err {
        if db.is_unique_violation() {
            let message = db.message();
            if message.contains("original_url") {
                return StorageError::UrlConflict;
            }
            if message.contains("short_code") {
                return StorageError::CodeConflict;
            }
        }
    }
    StorageError::Other(err.into())
}

/// Current time as unix seconds, for server-assigned timestamps.
pub fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}
