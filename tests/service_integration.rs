//! End-to-end tests for the shortener service: idempotent shorten,
//! read-through resolve with exact click accounting, collision-retry
//! budget, and degraded operation with a dead cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use tinylink::cache::{MokaCache, UrlCache};
use tinylink::service::{ServiceError, Shortened, ShortenerService};
use tinylink::shortener::{CodeGenerator, CodeSource};
use tinylink::storage::{SqliteStorage, Storage};

/// Inspectable cache used to observe population and force evictions.
#[derive(Default)]
struct TestCache {
    entries: Mutex<HashMap<String, String>>,
}

impl TestCache {
    async fn evict_all(&self) {
        self.entries.lock().await.clear();
    }

    async fn contains(&self, code: &str) -> bool {
        self.entries.lock().await.contains_key(code)
    }

    async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait]
impl UrlCache for TestCache {
    async fn get(&self, short_code: &str) -> Option<String> {
        self.entries.lock().await.get(short_code).cloned()
    }

    async fn set(&self, short_code: &str, original_url: &str) -> bool {
        self.entries
            .lock()
            .await
            .insert(short_code.to_string(), original_url.to_string());
        true
    }
}

/// A cache that is completely down: every read misses, every write
/// is dropped.
struct DeadCache;

#[async_trait]
impl UrlCache for DeadCache {
    async fn get(&self, _short_code: &str) -> Option<String> {
        None
    }

    async fn set(&self, _short_code: &str, _original_url: &str) -> bool {
        false
    }
}

/// Deterministic code source: yields the scripted codes in order and
/// repeats the last one once exhausted.
struct ScriptedCodes {
    codes: Vec<String>,
    next: AtomicUsize,
}

impl ScriptedCodes {
    fn new(codes: &[&str]) -> Self {
        Self {
            codes: codes.iter().map(|c| c.to_string()).collect(),
            next: AtomicUsize::new(0),
        }
    }
}

impl CodeSource for ScriptedCodes {
    fn next_code(&self) -> String {
        let i = self.next.fetch_add(1, Ordering::SeqCst);
        self.codes[i.min(self.codes.len() - 1)].clone()
    }
}

async fn create_storage() -> Arc<dyn Storage> {
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();
    Arc::new(storage)
}

fn service_with(
    storage: Arc<dyn Storage>,
    cache: Arc<dyn UrlCache>,
    codes: Arc<dyn CodeSource>,
) -> ShortenerService {
    ShortenerService::new(storage, cache, codes, 3)
}

async fn default_service() -> (ShortenerService, Arc<TestCache>) {
    let cache = Arc::new(TestCache::default());
    let service = service_with(
        create_storage().await,
        Arc::clone(&cache) as Arc<dyn UrlCache>,
        Arc::new(CodeGenerator::default()),
    );
    (service, cache)
}

#[tokio::test]
async fn shorten_is_idempotent() {
    let (service, _cache) = default_service().await;

    let first = service.shorten("https://example.com/a").await.unwrap();
    assert!(first.is_new);

    let second = service.shorten("https://example.com/a").await.unwrap();
    assert!(!second.is_new);
    assert_eq!(first.record.short_code, second.record.short_code);

    // A different URL gets a different code.
    let other = service.shorten("https://example.com/b").await.unwrap();
    assert!(other.is_new);
    assert_ne!(other.record.short_code, first.record.short_code);
}

#[tokio::test]
async fn resolve_serves_from_cache_and_from_store() {
    let (service, cache) = default_service().await;

    let Shortened { record, .. } = service.shorten("https://example.com/a").await.unwrap();
    let code = record.short_code;

    // Shorten populated the cache.
    assert!(cache.contains(&code).await);
    assert_eq!(
        service.resolve(&code).await.unwrap(),
        "https://example.com/a"
    );

    // Force an eviction: resolve falls back to the store and
    // repopulates the cache.
    cache.evict_all().await;
    assert_eq!(
        service.resolve(&code).await.unwrap(),
        "https://example.com/a"
    );
    assert!(cache.contains(&code).await);
}

#[tokio::test]
async fn click_count_advances_on_every_resolve() {
    let (service, cache) = default_service().await;

    let Shortened { record, .. } = service.shorten("https://example.com/a").await.unwrap();
    let code = record.short_code;

    // Mixed hit/miss pattern: evict before every other resolve.
    for i in 0..6 {
        if i % 2 == 0 {
            cache.evict_all().await;
        }
        service.resolve(&code).await.unwrap();
    }

    let stats = service.stats(&code).await.unwrap();
    assert_eq!(stats.click_count, 6);
}

#[tokio::test]
async fn last_accessed_is_null_until_first_resolve() {
    let (service, _cache) = default_service().await;

    let Shortened { record, .. } = service.shorten("https://example.com/a").await.unwrap();
    let code = record.short_code;

    let stats = service.stats(&code).await.unwrap();
    assert_eq!(stats.click_count, 0);
    assert_eq!(stats.last_accessed_at, None);

    service.resolve(&code).await.unwrap();

    let stats = service.stats(&code).await.unwrap();
    assert_eq!(stats.click_count, 1);
    assert!(stats.last_accessed_at.is_some());
}

#[tokio::test]
async fn unknown_code_is_not_found() {
    let (service, _cache) = default_service().await;

    assert!(matches!(
        service.resolve("ZZZZZ").await,
        Err(ServiceError::NotFound)
    ));
    assert!(matches!(
        service.stats("ZZZZZ").await,
        Err(ServiceError::NotFound)
    ));
}

#[tokio::test]
async fn stats_never_touches_the_cache() {
    let (service, cache) = default_service().await;

    let Shortened { record, .. } = service.shorten("https://example.com/a").await.unwrap();
    cache.evict_all().await;

    service.stats(&record.short_code).await.unwrap();
    assert_eq!(cache.len().await, 0);

    // And it does not count as a click either.
    let stats = service.stats(&record.short_code).await.unwrap();
    assert_eq!(stats.click_count, 0);
}

#[tokio::test]
async fn collision_retry_succeeds_within_budget() {
    let storage = create_storage().await;

    // Occupy two candidate codes so the first two attempts collide.
    storage
        .create_if_absent("taken", "https://example.com/x")
        .await
        .unwrap();
    storage
        .create_if_absent("also1", "https://example.com/y")
        .await
        .unwrap();

    let service = service_with(
        Arc::clone(&storage),
        Arc::new(TestCache::default()),
        Arc::new(ScriptedCodes::new(&["taken", "also1", "fresh"])),
    );

    let shortened = service.shorten("https://example.com/a").await.unwrap();
    assert!(shortened.is_new);
    assert_eq!(shortened.record.short_code, "fresh");
}

#[tokio::test]
async fn exhausted_retry_budget_reports_code_space_exhausted() {
    let storage = create_storage().await;

    storage
        .create_if_absent("taken", "https://example.com/x")
        .await
        .unwrap();

    // Every attempt yields the occupied code.
    let service = service_with(
        Arc::clone(&storage),
        Arc::new(TestCache::default()),
        Arc::new(ScriptedCodes::new(&["taken"])),
    );

    let err = service.shorten("https://example.com/a").await.unwrap_err();
    assert!(matches!(err, ServiceError::CodeSpaceExhausted(3)), "got {err:?}");
}

#[tokio::test]
async fn concurrent_shortens_of_same_url_converge() {
    let storage = create_storage().await;
    let cache: Arc<dyn UrlCache> = Arc::new(TestCache::default());
    let service = Arc::new(service_with(
        storage,
        cache,
        Arc::new(CodeGenerator::default()),
    ));

    let mut handles = vec![];
    for _ in 0..10 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service.shorten("https://example.com/racy").await
        }));
    }

    let mut codes = vec![];
    let mut new_count = 0;
    for handle in handles {
        let shortened = handle.await.unwrap().unwrap();
        if shortened.is_new {
            new_count += 1;
        }
        codes.push(shortened.record.short_code);
    }

    codes.sort();
    codes.dedup();
    assert_eq!(codes.len(), 1, "all callers must converge on one code");
    assert_eq!(new_count, 1, "exactly one caller creates the mapping");
}

#[tokio::test]
async fn service_survives_a_dead_cache() {
    let service = service_with(
        create_storage().await,
        Arc::new(DeadCache),
        Arc::new(CodeGenerator::default()),
    );

    let shortened = service.shorten("https://example.com/a").await.unwrap();
    assert!(shortened.is_new);
    let code = shortened.record.short_code;

    // Resolve degrades to a store round-trip but keeps working, and
    // clicks still count.
    for _ in 0..3 {
        assert_eq!(
            service.resolve(&code).await.unwrap(),
            "https://example.com/a"
        );
    }
    assert_eq!(service.stats(&code).await.unwrap().click_count, 3);
}

#[tokio::test]
async fn moka_cache_backend_works_end_to_end() {
    let storage = create_storage().await;
    let cache = Arc::new(MokaCache::new(
        1_000,
        std::time::Duration::from_secs(60),
    ));
    let service = service_with(storage, cache, Arc::new(CodeGenerator::default()));

    let shortened = service.shorten("https://example.com/a").await.unwrap();
    assert_eq!(
        service.resolve(&shortened.record.short_code).await.unwrap(),
        "https://example.com/a"
    );
}
