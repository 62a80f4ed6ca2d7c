use async_trait::async_trait;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::warn;

use super::UrlCache;

const KEY_PREFIX: &str = "url:short:";

/// Redis-backed cache. Entries are written with `SET ... EX`, so the
/// server owns expiry. Operational errors are logged and absorbed.
pub struct RedisCache {
    conn: redis::aio::MultiplexedConnection,
    ttl_secs: u64,
}

impl RedisCache {
    /// Connect to Redis. Connection failure at startup is a hard
    /// error; failures after that degrade to misses.
    pub async fn connect(redis_url: &str, ttl: Duration) -> anyhow::Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self {
            conn,
            ttl_secs: ttl.as_secs().max(1),
        })
    }

    fn cache_key(short_code: &str) -> String {
        format!("{KEY_PREFIX}{short_code}")
    }
}

#[async_trait]
impl UrlCache for RedisCache {
    async fn get(&self, short_code: &str) -> Option<String> {
        let key = Self::cache_key(short_code);
        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(&key).await {
            Ok(value) => value,
            Err(err) => {
                warn!(short_code = %short_code, error = %err, "redis GET failed, treating as miss");
                None
            }
        }
    }

    async fn set(&self, short_code: &str, original_url: &str) -> bool {
        let key = Self::cache_key(short_code);
        let mut conn = self.conn.clone();
        match conn
            .set_ex::<_, _, ()>(&key, original_url, self.ttl_secs)
            .await
        {
            Ok(()) => true,
            Err(err) => {
                warn!(short_code = %short_code, error = %err, "redis SET failed, dropping cache write");
                false
            }
        }
    }
}
