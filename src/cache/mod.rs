//! Best-effort `code -> original URL` cache.
//!
//! The cache is a latency optimization on the redirect path, never an
//! authority: a miss says nothing about whether the code is assigned,
//! and every backend failure degrades to a miss (get) or a dropped
//! write (set). Counters and timestamps are never cached.

mod moka;
mod redis;

pub use self::moka::MokaCache;
pub use self::redis::RedisCache;

use async_trait::async_trait;

/// Key-value cache of `short_code -> original_url` with a TTL fixed
/// at construction time. Both operations are best-effort and must not
/// propagate backend errors.
#[async_trait]
pub trait UrlCache: Send + Sync {
    /// Fetch the cached URL for a code. Backend failures read as a miss.
    async fn get(&self, short_code: &str) -> Option<String>;

    /// Store a mapping under the configured TTL. Returns false when the
    /// write was dropped (backend failure); callers ignore this beyond
    /// logging.
    async fn set(&self, short_code: &str, original_url: &str) -> bool;
}
