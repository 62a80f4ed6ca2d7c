//! Shortener service: orchestrates the code source, the uniqueness
//! store, and the cache.
//!
//! The service is stateless per call and holds no locks; the store's
//! unique constraints are the only synchronization point. Two
//! concurrent shortens of the same URL converge on one code, and two
//! shortens racing on the same candidate code leave exactly one winner.

use std::sync::Arc;

use anyhow::anyhow;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::UrlCache;
use crate::models::UrlRecord;
use crate::shortener::CodeSource;
use crate::storage::{now_unix, Storage, StorageError};

pub const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("short code not found")]
    NotFound,
    #[error("failed to allocate a unique short code after {0} attempts")]
    CodeSpaceExhausted(u32),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Result of a shorten call. `is_new` is false when the URL was
/// already mapped (by an earlier call or a concurrent winner).
#[derive(Debug, Clone)]
pub struct Shortened {
    pub record: UrlRecord,
    pub is_new: bool,
}

pub struct ShortenerService {
    storage: Arc<dyn Storage>,
    cache: Arc<dyn UrlCache>,
    codes: Arc<dyn CodeSource>,
    max_retries: u32,
}

impl ShortenerService {
    pub fn new(
        storage: Arc<dyn Storage>,
        cache: Arc<dyn UrlCache>,
        codes: Arc<dyn CodeSource>,
        max_retries: u32,
    ) -> Self {
        Self {
            storage,
            cache,
            codes,
            max_retries,
        }
    }

    /// Shorten a URL, idempotently.
    ///
    /// The caller has already validated the URL. The up-front
    /// `find_by_url` and the `exists` pre-check are both advisory;
    /// the constrained insert decides every race.
    pub async fn shorten(&self, original_url: &str) -> Result<Shortened, ServiceError> {
        if let Some(existing) = self.storage.find_by_url(original_url).await? {
            debug!(short_code = %existing.short_code, "URL already shortened");
            self.refresh_cache(&existing).await;
            return Ok(Shortened {
                record: existing,
                is_new: false,
            });
        }

        for attempt in 1..=self.max_retries {
            let candidate = self.codes.next_code();

            if self.storage.exists(&candidate).await? {
                warn!(
                    short_code = %candidate,
                    attempt,
                    max_retries = self.max_retries,
                    "short code collision"
                );
                continue;
            }

            match self.storage.create_if_absent(&candidate, original_url).await {
                Ok(record) => {
                    self.refresh_cache(&record).await;
                    info!(
                        short_code = %record.short_code,
                        attempt,
                        "created short URL"
                    );
                    return Ok(Shortened {
                        record,
                        is_new: true,
                    });
                }
                Err(StorageError::CodeConflict) => {
                    // Lost the insert race on this candidate.
                    warn!(
                        short_code = %candidate,
                        attempt,
                        max_retries = self.max_retries,
                        "short code collision at insert"
                    );
                    continue;
                }
                Err(StorageError::UrlConflict) => {
                    // A concurrent caller shortened this URL first;
                    // converge on the winner's code.
                    let winner = self
                        .storage
                        .find_by_url(original_url)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::Store(anyhow!(
                                "URL conflict reported but no record found for it"
                            ))
                        })?;
                    debug!(short_code = %winner.short_code, "lost shorten race, returning winner");
                    self.refresh_cache(&winner).await;
                    return Ok(Shortened {
                        record: winner,
                        is_new: false,
                    });
                }
                Err(StorageError::Other(err)) => return Err(ServiceError::Store(err)),
            }
        }

        Err(ServiceError::CodeSpaceExhausted(self.max_retries))
    }

    /// Resolve a code to its original URL, read-through.
    ///
    /// Click accounting runs on every resolve, cache hit or miss, so
    /// the cache stays a pure latency optimization. A failed counter
    /// update never fails the resolve.
    pub async fn resolve(&self, short_code: &str) -> Result<String, ServiceError> {
        if let Some(original_url) = self.cache.get(short_code).await {
            debug!(short_code = %short_code, "cache hit");
            self.touch(short_code).await;
            return Ok(original_url);
        }

        debug!(short_code = %short_code, "cache miss");
        let record = self
            .storage
            .find_by_code(short_code)
            .await?
            .ok_or(ServiceError::NotFound)?;

        self.refresh_cache(&record).await;
        self.touch(short_code).await;
        Ok(record.original_url)
    }

    /// Fetch click statistics straight from the store. Never consults
    /// the cache, which holds no counters.
    pub async fn stats(&self, short_code: &str) -> Result<UrlRecord, ServiceError> {
        self.storage
            .find_by_code(short_code)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    async fn refresh_cache(&self, record: &UrlRecord) {
        if !self
            .cache
            .set(&record.short_code, &record.original_url)
            .await
        {
            warn!(short_code = %record.short_code, "failed to populate cache");
        }
    }

    async fn touch(&self, short_code: &str) {
        match self.storage.increment_and_touch(short_code, now_unix()).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(short_code = %short_code, "no record found for click update")
            }
            Err(err) => {
                warn!(short_code = %short_code, error = %err, "failed to update click stats")
            }
        }
    }
}
