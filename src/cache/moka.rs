use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;

use super::UrlCache;

/// In-process cache backed by moka, with a fixed time-to-live.
pub struct MokaCache {
    inner: Cache<String, String>,
}

impl MokaCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();
        Self { inner }
    }
}

#[async_trait]
impl UrlCache for MokaCache {
    async fn get(&self, short_code: &str) -> Option<String> {
        self.inner.get(short_code).await
    }

    async fn set(&self, short_code: &str, original_url: &str) -> bool {
        self.inner
            .insert(short_code.to_string(), original_url.to_string())
            .await;
        true
    }
}
